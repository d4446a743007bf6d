//! Evaluate literate-programming source blocks in long-lived Julia sessions.
//!
//! A block is expanded (prologue, variables, body, graphics directives,
//! epilogue), wrapped for its result kind and session scope, written to a
//! temporary source file, and loaded in the session by a one-line
//! trampoline that prints the result into a temporary output file. The
//! caller polls that file and reads it back.

pub mod config;
pub mod execution;
pub mod expand;
pub mod process;
pub mod request;
pub mod transport;
pub mod utils;
pub mod wrap;

pub use execution::{evaluate, evaluate_in, EvalOptions, ExecutionResult};
pub use process::{Launcher, Session, SessionError, SessionManager};
pub use request::{EvaluationRequest, Params, ResultKind, SessionKey, VarValue};
pub use transport::{PollPolicy, SUPPRESSED_SENTINEL};
