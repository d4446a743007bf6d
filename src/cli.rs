use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use juliabab::ResultKind;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsArg {
    Value,
    Output,
}

impl From<ResultsArg> for ResultKind {
    fn from(value: ResultsArg) -> Self {
        match value {
            ResultsArg::Value => ResultKind::Value,
            ResultsArg::Output => ResultKind::Output,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "juliabab", about = "Evaluate source blocks in Julia sessions", version)]
pub struct Cli {
    /// Block body. Read from --file or stdin when omitted.
    #[arg(value_name = "BODY", conflicts_with_all = ["file", "request"])]
    pub body: Option<String>,

    /// Read the block body from a file.
    #[arg(long, conflicts_with = "request")]
    pub file: Option<PathBuf>,

    /// JSON request (or array of requests) to evaluate in order.
    #[arg(long)]
    pub request: Option<PathBuf>,

    /// Session name; "none" evaluates in an isolated let-block.
    #[arg(long)]
    pub session: Option<String>,

    /// What the block returns: the last value or the printed output.
    #[arg(long, value_enum, default_value_t = ResultsArg::Value)]
    pub results: ResultsArg,

    /// Variable binding as name=value. Can be repeated.
    #[arg(long = "var", value_name = "NAME=VALUE", action = clap::ArgAction::Append)]
    pub vars: Vec<String>,

    /// Line evaluated before the variables and body.
    #[arg(long)]
    pub prologue: Option<String>,

    /// Line evaluated after the body.
    #[arg(long)]
    pub epilogue: Option<String>,

    /// Plot width for --graphics.
    #[arg(long)]
    pub width: Option<u32>,

    /// Plot height for --graphics.
    #[arg(long)]
    pub height: Option<u32>,

    /// Save the current plot to FILE after the body runs.
    #[arg(long, value_name = "FILE")]
    pub graphics: Option<PathBuf>,

    /// Echo parameters and wrapped source into the session transcript.
    #[arg(long)]
    pub debug: bool,

    /// Print the paths of the temporary source/output files.
    #[arg(long = "report-side-files")]
    pub report_side_files: bool,

    /// Print the wrapped source and the trampoline without running Julia.
    #[arg(long = "print-wrapped")]
    pub print_wrapped: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
