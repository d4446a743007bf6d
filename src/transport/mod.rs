//! Side-file hand-off: source/output temp files, the polling wait, and the
//! oversized-output policy.

use std::{
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use tempfile::Builder;
use tracing::debug;

use crate::utils::has_line_longer_than;

/// Returned instead of the payload when a line is too long.
pub const SUPPRESSED_SENTINEL: &str = "Output suppressed (line too long)";

/// Longest line (in characters) returned as-is.
pub const MAX_LINE_LENGTH: usize = 12000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self { interval: Duration::from_millis(100), attempts: 100 }
    }
}

impl PollPolicy {
    /// Upper bound on the time spent waiting.
    pub fn budget(&self) -> Duration {
        self.interval.checked_mul(self.attempts).unwrap_or(Duration::MAX)
    }
}

/// The two temp files of one evaluation.
///
/// Both are detached from drop-based cleanup as soon as they exist: a
/// session may still run the trampoline after the caller stops waiting, so
/// removal is left to the OS temp directory lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideFiles {
    source: PathBuf,
    output: PathBuf,
}

impl SideFiles {
    /// Create both files and write `source_code` to the source file.
    /// The output file starts empty.
    pub fn create(source_code: &str) -> Result<Self> {
        let (mut file, source) = Builder::new()
            .prefix("babel-julia-src-")
            .suffix(".jl")
            .tempfile()
            .context("creating source side-file")?
            .keep()
            .context("keeping source side-file")?;
        file.write_all(source_code.as_bytes())
            .and_then(|_| file.flush())
            .with_context(|| format!("writing source side-file: {}", source.display()))?;
        let (_, output) = Builder::new()
            .prefix("babel-julia-out-")
            .tempfile()
            .context("creating output side-file")?
            .keep()
            .context("keeping output side-file")?;
        Ok(Self { source, output })
    }

    pub fn source_path(&self) -> &Path {
        &self.source
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// (source, output)
    pub fn into_paths(self) -> (PathBuf, PathBuf) {
        (self.source, self.output)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOutcome {
    /// Size checks performed.
    pub attempts: u32,
    /// False when the budget ran out with the file still empty.
    pub ready: bool,
}

async fn file_len(path: &Path) -> u64 {
    tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0)
}

/// Poll `path` until it is non-empty or the attempt budget is spent.
///
/// Running out of attempts is not an error; the caller reads whatever is
/// there. An empty result and a still-pending one look the same.
pub async fn wait_for_output(path: &Path, policy: PollPolicy) -> WaitOutcome {
    for attempt in 1..=policy.attempts {
        if file_len(path).await > 0 {
            debug!(attempt, path = %path.display(), "output side-file ready");
            return WaitOutcome { attempts: attempt, ready: true };
        }
        tokio::time::sleep(policy.interval).await;
    }
    WaitOutcome { attempts: policy.attempts, ready: file_len(path).await > 0 }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    pub text: String,
    pub suppressed: bool,
}

/// Apply the line-length policy: all of `raw`, or the sentinel.
pub fn police(raw: String, max_line_length: usize) -> OutputRecord {
    if has_line_longer_than(&raw, max_line_length) {
        OutputRecord { text: SUPPRESSED_SENTINEL.to_string(), suppressed: true }
    } else {
        OutputRecord { text: raw, suppressed: false }
    }
}

/// Read the output side-file and police it.
pub async fn read_output(path: &Path, max_line_length: usize) -> Result<OutputRecord> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading output side-file: {}", path.display()))?;
    Ok(police(String::from_utf8_lossy(&bytes).into_owned(), max_line_length))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_police_boundary() {
        let at_limit = "x".repeat(MAX_LINE_LENGTH);
        let rec = police(at_limit.clone(), MAX_LINE_LENGTH);
        assert!(!rec.suppressed);
        assert_eq!(rec.text, at_limit);

        let over = format!("short\n{}\n", "x".repeat(MAX_LINE_LENGTH + 1));
        let rec = police(over, MAX_LINE_LENGTH);
        assert!(rec.suppressed);
        assert_eq!(rec.text, SUPPRESSED_SENTINEL);
    }

    #[test]
    fn test_default_policy_budget() {
        assert_eq!(PollPolicy::default().budget(), Duration::from_secs(10));
    }

    #[test]
    fn test_budget_saturates_on_overflow() {
        let policy = PollPolicy { interval: Duration::from_secs(u64::MAX / 2), attempts: 100 };
        assert_eq!(policy.budget(), Duration::MAX);
    }

    fn remove(files: SideFiles) {
        let (src, out) = files.into_paths();
        let _ = std::fs::remove_file(src);
        let _ = std::fs::remove_file(out);
    }

    #[test]
    fn test_side_files_written_and_left_on_disk() {
        let files = SideFiles::create("1+1").unwrap();
        let src = files.source_path().to_path_buf();
        let out = files.output_path().to_path_buf();
        assert_eq!(std::fs::read_to_string(&src).unwrap(), "1+1");
        assert_eq!(std::fs::metadata(&out).unwrap().len(), 0);
        assert_eq!(src.extension().and_then(|e| e.to_str()), Some("jl"));
        let copy = files.clone();
        drop(files);
        assert!(src.exists());
        assert!(out.exists());
        remove(copy);
    }

    #[tokio::test]
    async fn test_wait_returns_once_written() {
        let files = SideFiles::create("").unwrap();
        std::fs::write(files.output_path(), "2").unwrap();
        let outcome = wait_for_output(files.output_path(), PollPolicy::default()).await;
        assert_eq!(outcome, WaitOutcome { attempts: 1, ready: true });
        remove(files);
    }

    #[tokio::test]
    async fn test_wait_gives_up_without_error() {
        let files = SideFiles::create("").unwrap();
        let policy = PollPolicy { interval: Duration::from_millis(1), attempts: 3 };
        let outcome = wait_for_output(files.output_path(), policy).await;
        assert_eq!(outcome, WaitOutcome { attempts: 3, ready: false });
        let rec = read_output(files.output_path(), MAX_LINE_LENGTH).await.unwrap();
        assert_eq!(rec.text, "");
        remove(files);
    }
}
