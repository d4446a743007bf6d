//! Evaluation pipeline: expand, wrap, hand off through side-files, wait,
//! read back.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::{
    config::Config,
    expand::{expand_body, var_assignments},
    process::{Launcher, Session, SessionManager},
    request::EvaluationRequest,
    transport::{read_output, wait_for_output, PollPolicy, SideFiles, MAX_LINE_LENGTH},
    wrap::{diagnostic_block, trampoline, wrap},
};

/// Per-call evaluation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalOptions {
    /// Echo parameters and wrapped source into the session transcript.
    pub debug: bool,
    pub poll: PollPolicy,
    pub max_line_length: usize,
    /// Report the side-file paths in the result.
    pub report_side_files: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            debug: false,
            poll: PollPolicy::default(),
            max_line_length: MAX_LINE_LENGTH,
            report_side_files: false,
        }
    }
}

impl EvalOptions {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            debug: cfg.get_bool("JULIABAB_DEBUG"),
            poll: cfg.poll_policy(),
            max_line_length: cfg.max_line_length(),
            report_side_files: cfg.get_bool("REPORT_SIDE_FILES"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Captured text, or the suppression sentinel.
    pub output: String,
    pub suppressed: bool,
    /// The wait ran out before the session wrote anything.
    pub timed_out: bool,
    pub attempts: u32,
    /// Graphics file the block was asked to save, if any.
    pub graphics: Option<PathBuf>,
    /// (source, output) paths, when reporting was asked for.
    pub side_files: Option<(PathBuf, PathBuf)>,
}

/// Everything generated for one request before anything is sent.
#[derive(Debug)]
pub struct Prepared {
    pub expanded: String,
    pub wrapped: String,
    pub trampoline: String,
    pub files: SideFiles,
}

/// Expand and wrap the request, write the source side-file, and build the
/// trampoline.
pub fn prepare(request: &EvaluationRequest) -> Result<Prepared> {
    let var_lines = var_assignments(&request.params.vars);
    let expanded = expand_body(&request.body, &request.params, &var_lines);
    let wrapped = wrap(&expanded, request.result_kind, &request.session);
    let files = SideFiles::create(&wrapped)?;
    let trampoline = trampoline(request.result_kind, files.source_path(), files.output_path());
    debug!(session = %request.session, source = %files.source_path().display(), "prepared block");
    Ok(Prepared { expanded, wrapped, trampoline, files })
}

/// Evaluate `request` in `session` and return what it wrote back.
///
/// A session that never writes yields an empty result once the poll budget
/// is spent; that is reported through `timed_out`, not as an error.
pub async fn evaluate<S>(session: &mut S, request: &EvaluationRequest, opts: &EvalOptions) -> Result<ExecutionResult>
where
    S: Session + ?Sized,
{
    let prepared = prepare(request)?;

    if opts.debug {
        let params = serde_json::to_string_pretty(&request.params)?;
        session
            .send(&diagnostic_block(&params, &prepared.wrapped))
            .await
            .context("sending debug trace")?;
    }
    session
        .send(&prepared.trampoline)
        .await
        .with_context(|| format!("sending block to session {}", session.name()))?;

    let outcome = wait_for_output(prepared.files.output_path(), opts.poll).await;
    if !outcome.ready {
        warn!(
            session = session.name(),
            waited_ms = opts.poll.budget().as_millis() as u64,
            "no output before deadline, reading whatever is there"
        );
    }
    let record = read_output(prepared.files.output_path(), opts.max_line_length).await?;
    if record.suppressed {
        warn!(session = session.name(), max = opts.max_line_length, "output suppressed");
    }

    let graphics = if request.params.wants_graphics() {
        request.params.graphics_file.clone()
    } else {
        None
    };
    let side_files = opts.report_side_files.then(|| prepared.files.into_paths());

    Ok(ExecutionResult {
        output: record.text,
        suppressed: record.suppressed,
        timed_out: !outcome.ready,
        attempts: outcome.attempts,
        graphics,
        side_files,
    })
}

/// Route `request` to its session in `manager` and evaluate it there. The
/// session stays locked for the whole round trip.
pub async fn evaluate_in<L: Launcher>(
    manager: &SessionManager<L>,
    request: &EvaluationRequest,
    opts: &EvalOptions,
) -> Result<ExecutionResult> {
    let shared = manager.session(request.session.session_name()).await?;
    let mut session = shared.lock().await;
    evaluate(&mut *session, request, opts).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{ResultKind, SessionKey};

    #[test]
    fn test_prepare_writes_wrapped_source() {
        let req = EvaluationRequest::new("1+1", ResultKind::Value, SessionKey::Ephemeral);
        let prepared = prepare(&req).unwrap();
        assert_eq!(prepared.expanded, "1+1");
        assert_eq!(
            std::fs::read_to_string(prepared.files.source_path()).unwrap(),
            "_babel_result = let\n1+1\nend"
        );
        assert!(prepared.trampoline.contains(&prepared.files.output_path().display().to_string()));
    }

    #[test]
    fn test_options_from_config() {
        let mut cfg = Config::load_from(PathBuf::from("/nonexistent/.juliababrc"));
        cfg.set("JULIABAB_DEBUG", "true");
        cfg.set("POLL_ATTEMPTS", "3");
        let opts = EvalOptions::from_config(&cfg);
        assert!(opts.debug);
        assert_eq!(opts.poll.attempts, 3);
        assert!(!opts.report_side_files);
    }
}
