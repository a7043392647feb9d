//! Running one external command with a time limit.

use crate::RunnerError;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Environment variables never passed to user programs.
const SECRET_ENV: &[&str] = &[
    "THINKFIRST_API_KEY",
    "GROQ_API_KEY",
    "OPENAI_API_KEY",
    "OPENWEATHER_API_KEY",
    "NEWS_API_KEY",
];

#[derive(Debug)]
pub(crate) struct StepOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug)]
pub(crate) enum StepOutcome {
    Finished(StepOutput),
    TimedOut,
}

/// Run `program` in `dir`, feeding `stdin` if given.
///
/// The child is killed when `limit` elapses. Output is cut to
/// `max_bytes` per stream.
pub(crate) async fn run_step(
    program: &str,
    args: &[String],
    dir: &Path,
    stdin: Option<&str>,
    limit: Duration,
    max_bytes: usize,
) -> Result<StepOutcome, RunnerError> {
    let mut command = prepare(program, args, dir, stdin.is_some());

    debug!(program, ?args, "Spawning");
    let mut child = command.spawn().map_err(|e| RunnerError::Spawn {
        program: program.to_string(),
        reason: e.to_string(),
    })?;
    let pipe = child.stdin.take();
    let input = stdin.map(str::to_owned);

    let work = async move {
        if let (Some(mut pipe), Some(input)) = (pipe, input) {
            // A program that exits without reading closes the pipe early.
            if let Err(e) = pipe.write_all(input.as_bytes()).await {
                debug!(error = %e, "Child stopped reading stdin");
            }
        }
        child.wait_with_output().await
    };

    match tokio::time::timeout(limit, work).await {
        Ok(Ok(output)) => Ok(StepOutcome::Finished(StepOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: truncate(String::from_utf8_lossy(&output.stdout).into_owned(), max_bytes),
            stderr: truncate(String::from_utf8_lossy(&output.stderr).into_owned(), max_bytes),
        })),
        Ok(Err(e)) => Err(RunnerError::Io(e.to_string())),
        Err(_) => {
            warn!(program, limit_ms = limit.as_millis() as u64, "Step timed out");
            Ok(StepOutcome::TimedOut)
        }
    }
}

fn prepare(program: &str, args: &[String], dir: &Path, piped_stdin: bool) -> Command {
    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(dir)
        .stdin(if piped_stdin {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for key in SECRET_ENV {
        command.env_remove(key);
    }
    command
}

/// Cut `text` to at most `max_bytes` on a char boundary.
pub(crate) fn truncate(mut text: String, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
    text.push_str("\n[output truncated]");
    text
}
