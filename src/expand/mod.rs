//! Body expansion: prologue, variables, body, graphics directives, epilogue.

use crate::{
    request::{Params, VarValue},
    utils::julia_path,
};

/// One `name = literal` statement per variable pair, in order.
pub fn var_assignments(vars: &[(String, VarValue)]) -> Vec<String> {
    vars.iter()
        .map(|(name, value)| format!("{} = {}", name, value.to_julia()))
        .collect()
}

/// Assemble the exact source text to evaluate.
///
/// Segments are joined with `\n`; absent ones leave no blank line. The
/// graphics directives are appended only when `graphics` is among the
/// result parameters and a target file is known.
pub fn expand_body(body: &str, params: &Params, var_lines: &[String]) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(var_lines.len() + 5);
    if let Some(prologue) = &params.prologue {
        lines.push(prologue.clone());
    }
    lines.extend(var_lines.iter().cloned());
    lines.push(body.to_string());
    if params.wants_graphics() {
        if let Some(file) = &params.graphics_file {
            lines.push(format!("plot!(size=({}, {}))", params.width, params.height));
            lines.push(format!("savefig({})", julia_path(file)));
        }
    }
    if let Some(epilogue) = &params.epilogue {
        lines.push(epilogue.clone());
    }
    lines.join("\n")
}
