//! Julia interpreter process: spawn, line input, transcript draining.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader},
    process::{Child, ChildStdin, Command},
};
use tracing::debug;

use super::{Launcher, Session, SessionError};
use crate::config::Config;

struct ProcessHandle {
    child: Child,
    stdin: ChildStdin,
}

/// A `julia -i` process fed through its stdin. Output goes to the log.
pub struct JuliaSession {
    name: String,
    handle: ProcessHandle,
}

#[async_trait]
impl Session for JuliaSession {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&mut self, text: &str) -> Result<(), SessionError> {
        if let Ok(Some(status)) = self.handle.child.try_wait() {
            debug!(session = %self.name, %status, "julia exited");
            return Err(SessionError::Closed(self.name.clone()));
        }
        let mut payload = text.to_string();
        if !payload.ends_with('\n') {
            payload.push('\n');
        }
        let stdin = &mut self.handle.stdin;
        let result = match stdin.write_all(payload.as_bytes()).await {
            Ok(()) => stdin.flush().await,
            Err(e) => Err(e),
        };
        result.map_err(|e| match e.kind() {
            std::io::ErrorKind::BrokenPipe => SessionError::Closed(self.name.clone()),
            _ => SessionError::Io { session: self.name.clone(), source: e },
        })
    }
}

pub async fn start_julia(name: &str, program: &str, args: &[String]) -> Result<JuliaSession, SessionError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let spawn_err = |source| SessionError::Spawn {
        session: name.to_string(),
        program: program.to_string(),
        source,
    };
    let mut child: Child = cmd.spawn().map_err(spawn_err)?;
    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| spawn_err(std::io::Error::other("no stdin")))?;
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(drain_transcript(name.to_string(), "stdout", stdout));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(drain_transcript(name.to_string(), "stderr", stderr));
    }

    Ok(JuliaSession {
        name: name.to_string(),
        handle: ProcessHandle { child, stdin },
    })
}

// Keeps the pipes from filling up and blocking the interpreter.
async fn drain_transcript<R>(session: String, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(session = %session, stream, "{}", line);
    }
}

#[derive(Debug, Clone)]
pub struct JuliaLauncher {
    pub program: String,
    pub args: Vec<String>,
}

impl JuliaLauncher {
    pub fn from_config(cfg: &Config) -> Self {
        Self { program: cfg.julia_program(), args: cfg.julia_args() }
    }
}

#[async_trait]
impl Launcher for JuliaLauncher {
    type Session = JuliaSession;

    async fn launch(&self, name: &str) -> Result<JuliaSession, SessionError> {
        start_julia(name, &self.program, &self.args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let err = start_julia("main", "definitely-not-a-julia-binary", &[])
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SessionError::Spawn { .. }));
        assert!(err.to_string().contains("session main"));
    }
}
