//! Code execution for the ThinkFirst editor.
//!
//! Learners can run the snippet they are working on. Each request gets
//! its own scratch directory: the source is written there, compiled if
//! the language needs it, then run with piped stdin. Compile and run
//! share one time limit; a child still running when it expires is
//! killed. The directory is removed when the request finishes.
//!
//! This is NOT a sandbox. Programs run as the server's user with the
//! server's filesystem and network. Keep `[runner] enabled = false`
//! on any server reachable by people you do not trust.

mod process;
pub mod toolchain;

use process::{StepOutcome, run_step};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thinkfirst_config::RunnerConfig;
use toolchain::{SourcePaths, Toolchain, default_toolchains};
use tracing::{debug, info};

pub use toolchain::{Invocation, SourceStem};

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Failed to start {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for RunnerError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// A snippet to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub code: String,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
}

/// What happened when a snippet ran.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResult {
    /// Standard output, or `"No output"` when the program printed nothing.
    pub output: String,
    pub error: Option<String>,
    /// Seconds, rounded to milliseconds.
    pub execution_time: f64,
    pub language: String,
    pub success: bool,
}

impl ExecuteResult {
    fn failed(language: &str, error: String, execution_time: f64) -> Self {
        Self {
            output: String::new(),
            error: Some(error),
            execution_time,
            language: language.to_string(),
            success: false,
        }
    }
}

pub struct CodeRunner {
    toolchains: Vec<(String, Toolchain)>,
    timeout: Duration,
    max_output_bytes: usize,
}

impl CodeRunner {
    pub fn new(config: &RunnerConfig) -> Self {
        Self {
            toolchains: default_toolchains(),
            timeout: Duration::from_secs(config.timeout_secs),
            max_output_bytes: config.max_output_bytes,
        }
    }

    /// Add a language, replacing any existing one with the same name.
    pub fn with_toolchain(mut self, name: &str, toolchain: Toolchain) -> Self {
        let name = name.to_lowercase();
        self.toolchains.retain(|(n, _)| *n != name);
        self.toolchains.push((name, toolchain));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Canonical language names, in registration order.
    pub fn languages(&self) -> Vec<&str> {
        self.toolchains.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Find a toolchain by name or alias, ignoring case.
    pub fn resolve(&self, language: &str) -> Option<(&str, &Toolchain)> {
        let wanted = language.trim().to_lowercase();
        self.toolchains
            .iter()
            .find(|(name, t)| *name == wanted || t.aliases.iter().any(|a| *a == wanted))
            .map(|(name, t)| (name.as_str(), t))
    }

    /// Compile (if needed) and run one snippet.
    ///
    /// Unknown languages, compile errors, non-zero exits and timeouts
    /// are all reported in the result with `success = false`. An `Err`
    /// means the runner itself failed: no scratch directory, or a
    /// compiler or interpreter that is not installed.
    pub async fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResult, RunnerError> {
        let Some((language, toolchain)) = self.resolve(&request.language) else {
            return Ok(ExecuteResult::failed(
                &request.language,
                format!("Unsupported language: {}", request.language),
                0.0,
            ));
        };

        let scratch = tempfile::Builder::new()
            .prefix("thinkfirst-exec-")
            .tempdir()?;
        let stem = toolchain.stem_for(&request.code);
        let paths = SourcePaths::new(scratch.path(), &stem, &toolchain.extension);
        tokio::fs::write(&paths.src, &request.code).await?;

        let started = Instant::now();

        if let Some(compile) = &toolchain.compile {
            let (program, args) = compile.render(&paths);
            let remaining = self.timeout.saturating_sub(started.elapsed());
            match run_step(
                &program,
                &args,
                scratch.path(),
                None,
                remaining,
                self.max_output_bytes,
            )
            .await?
            {
                StepOutcome::TimedOut => return Ok(self.timed_out(language)),
                StepOutcome::Finished(out) if !out.success => {
                    debug!(language, "Compilation failed");
                    return Ok(ExecuteResult::failed(
                        language,
                        format!("Compilation Error:\n{}", out.stderr),
                        elapsed_secs(started),
                    ));
                }
                StepOutcome::Finished(_) => {}
            }
        }

        let (program, args) = toolchain.run.render(&paths);
        let remaining = self.timeout.saturating_sub(started.elapsed());
        let outcome = run_step(
            &program,
            &args,
            scratch.path(),
            request.input.as_deref(),
            remaining,
            self.max_output_bytes,
        )
        .await?;

        let result = match outcome {
            StepOutcome::TimedOut => self.timed_out(language),
            StepOutcome::Finished(out) => {
                let error = if out.success {
                    None
                } else if out.stderr.trim().is_empty() {
                    Some(match out.code {
                        Some(code) => format!("Process exited with code {code}"),
                        None => "Process was terminated by a signal".to_string(),
                    })
                } else {
                    Some(out.stderr)
                };
                ExecuteResult {
                    output: if out.stdout.is_empty() {
                        "No output".to_string()
                    } else {
                        out.stdout
                    },
                    error,
                    execution_time: elapsed_secs(started),
                    language: language.to_string(),
                    success: out.success,
                }
            }
        };

        info!(
            language,
            success = result.success,
            execution_time = result.execution_time,
            "Snippet executed"
        );
        Ok(result)
    }

    fn timed_out(&self, language: &str) -> ExecuteResult {
        let limit = self.timeout.as_secs_f64();
        ExecuteResult::failed(
            language,
            format!("Execution timed out ({limit} seconds limit)"),
            limit,
        )
    }
}

fn elapsed_secs(started: Instant) -> f64 {
    (started.elapsed().as_secs_f64() * 1000.0).round() / 1000.0
}
