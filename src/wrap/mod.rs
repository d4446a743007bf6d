//! Wrapping templates and the trampoline statement.
//!
//! Each {result kind × session persistence} pair maps to one `WrapVariant`,
//! which owns a `Template`: fixed text around a body slot. Every template
//! assigns its result to [`RESULT_VAR`].

use std::path::Path;

use crate::{
    request::{ResultKind, SessionKey},
    utils::{julia_path, julia_string},
};

/// Intermediate variable holding the block's result inside the session.
pub const RESULT_VAR: &str = "_babel_result";

/// Package providing `@capture_out`.
pub const CAPTURE_PACKAGE: &str = "Suppressor";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// The body is spliced in as-is.
    Verbatim,
    /// The body is first rendered through the inner template, then embedded
    /// as a string literal.
    Literal(&'static Template),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub preamble: &'static str,
    pub slot: Slot,
    pub postamble: &'static str,
}

impl Template {
    pub fn render(&self, body: &str) -> String {
        let filled = match self.slot {
            Slot::Verbatim => body.to_string(),
            Slot::Literal(inner) => julia_string(&inner.render(body)),
        };
        let mut out = String::with_capacity(self.preamble.len() + filled.len() + self.postamble.len());
        out.push_str(self.preamble);
        out.push_str(&filled);
        out.push_str(self.postamble);
        out
    }
}

const CAPTURE_FORM: Template = Template {
    preamble: "@capture_out begin\n",
    slot: Slot::Verbatim,
    postamble: "\nend",
};

// The capture macro must see source text, so in a persistent session it is
// parsed and evaluated from a string at top level.
const CAPTURE_PERSISTENT: Template = Template {
    preamble: "_babel_result = begin\neval(Meta.parse(",
    slot: Slot::Literal(&CAPTURE_FORM),
    postamble: "))\nend",
};

const CAPTURE_EPHEMERAL: Template = Template {
    preamble: "_babel_result = @capture_out begin\n",
    slot: Slot::Verbatim,
    postamble: "\nend",
};

const VALUE_PERSISTENT: Template = Template {
    preamble: "_babel_result = begin\n",
    slot: Slot::Verbatim,
    postamble: "\nend",
};

const VALUE_EPHEMERAL: Template = Template {
    preamble: "_babel_result = let\n",
    slot: Slot::Verbatim,
    postamble: "\nend",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapVariant {
    CapturePersistent,
    CaptureEphemeral,
    ValuePersistent,
    ValueEphemeral,
}

impl WrapVariant {
    pub fn select(kind: ResultKind, session: &SessionKey) -> Self {
        match (kind, session.is_persistent()) {
            (ResultKind::Output, true) => Self::CapturePersistent,
            (ResultKind::Output, false) => Self::CaptureEphemeral,
            (ResultKind::Value, true) => Self::ValuePersistent,
            (ResultKind::Value, false) => Self::ValueEphemeral,
        }
    }

    pub fn template(self) -> &'static Template {
        match self {
            Self::CapturePersistent => &CAPTURE_PERSISTENT,
            Self::CaptureEphemeral => &CAPTURE_EPHEMERAL,
            Self::ValuePersistent => &VALUE_PERSISTENT,
            Self::ValueEphemeral => &VALUE_EPHEMERAL,
        }
    }

    pub fn captures_output(self) -> bool {
        matches!(self, Self::CapturePersistent | Self::CaptureEphemeral)
    }
}

/// Wrap an expanded body for the given result kind and session.
pub fn wrap(body: &str, kind: ResultKind, session: &SessionKey) -> String {
    WrapVariant::select(kind, session).template().render(body)
}

/// The single line sent to the session: load the capture package when
/// needed, include the source file, then print the result into the output
/// file.
pub fn trampoline(kind: ResultKind, source: &Path, output: &Path) -> String {
    let mut line = String::new();
    if kind == ResultKind::Output {
        line.push_str(&format!("using {}; ", CAPTURE_PACKAGE));
    }
    line.push_str(&format!("include({}); ", julia_path(source)));
    line.push_str(&format!(
        "open(io -> print(io, {}), {}, \"w\")",
        RESULT_VAR,
        julia_path(output)
    ));
    line
}

/// Commented block echoing the request parameters and the wrapped source
/// into the session transcript.
pub fn diagnostic_block(params_json: &str, wrapped: &str) -> String {
    let mut out = String::from("# ---- babel parameters ----\n");
    for line in params_json.lines() {
        out.push_str("# ");
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("# ---- babel wrapped source ----\n");
    for line in wrapped.lines() {
        out.push_str("# ");
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("# ----");
    out
}
