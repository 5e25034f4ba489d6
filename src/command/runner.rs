// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! External process execution.

use crate::error::Result;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// A program, its arguments and the extra environment it runs with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, env: Vec<(String, String)>) -> Self {
        self.env = env;
        self
    }

    /// Command line for logs and error messages; the environment is left out
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether the arguments start with `prefix`
    pub fn has_args_prefix(&self, prefix: &[&str]) -> bool {
        self.args.len() >= prefix.len() && self.args.iter().zip(prefix).all(|(a, p)| a == p)
    }
}

/// What a finished process produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout followed by stderr, kept for diagnostics
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

/// Runs external programs. Calls block until the process exits; there is no timeout.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion and capture stdout and stderr
    async fn output(&self, invocation: &Invocation) -> Result<CommandOutput>;

    /// Run to completion while forwarding every output line to the log
    async fn run_logged(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

/// [`CommandRunner`] spawning real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    fn command(invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        cmd.envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn output(&self, invocation: &Invocation) -> Result<CommandOutput> {
        debug!("Running: {}", invocation.command_line());

        let output = Self::command(invocation).output().await?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    async fn run_logged(&self, invocation: &Invocation) -> Result<CommandOutput> {
        info!("Running: {}", invocation.command_line());

        let mut child = Self::command(invocation).spawn()?;
        let program = invocation.program.as_str();

        let (stdout, stderr) = futures::join!(
            forward_lines(child.stdout.take(), program, false),
            forward_lines(child.stderr.take(), program, true)
        );
        let status = child.wait().await?;

        Ok(CommandOutput {
            code: status.code(),
            stdout: stdout?,
            stderr: stderr?,
        })
    }
}

/// Log every line of `reader` and return everything read.
///
/// Lines are split on raw bytes and decoded lossily, so the pipe is drained
/// to EOF whatever the child writes.
async fn forward_lines<R>(reader: Option<R>, program: &str, is_stderr: bool) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Ok(String::new());
    };

    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut captured = String::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        if is_stderr {
            warn!(program = %program, "{}", line);
        } else {
            info!(program = %program, "{}", line);
        }
        captured.push_str(line);
        captured.push('\n');
    }
    Ok(captured)
}
