//! Resilient external command execution for the `health_check` tool.
//!
//! A probe tries an ordered list of [`ExecutionStrategy`] candidates — direct
//! invocation, the npm package runner, then the platform shell — and stops at
//! the first one that completes cleanly. Every attempt runs under a fixed
//! wall-clock timeout; a timed-out child is killed and reaped before the
//! strategy is marked failed. Non-empty stderr from a successful process is a
//! warning, not a failure.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::{ServerConfig, DEFAULT_GEMINI_PROGRAM};

/// npm package that ships the stock Gemini CLI.
const GEMINI_NPM_PACKAGE: &str = "@google/gemini-cli";

/// One concrete way of invoking the target program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionStrategy {
    pub label: &'static str,
    pub program: String,
    pub args: Vec<String>,
}

impl ExecutionStrategy {
    pub fn new(label: &'static str, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            label,
            program: program.into(),
            args,
        }
    }

    /// Human-readable command line, for diagnostics only.
    fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Why a single strategy attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum ProbeFault {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error while running `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` timed out after {} seconds", .limit.as_secs())]
    Timeout { program: String, limit: Duration },

    #[error("`{program}` exited with code {code}: {detail}")]
    NonZeroExit {
        program: String,
        code: i32,
        detail: String,
    },
}

/// Outcome of a full probe. Exactly one is produced per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    Success { stdout: String, stderr: String },
    Failure { error: String },
}

/// Captured output of one successful strategy attempt.
struct CapturedOutput {
    stdout: String,
    stderr: String,
}

/// Runs the health check probe: an ordered strategy list plus a per-strategy
/// timeout. Holds no mutable state, so concurrent probes are independent.
#[derive(Debug, Clone)]
pub struct Prober {
    strategies: Vec<ExecutionStrategy>,
    timeout: Duration,
}

impl Prober {
    pub fn new(strategies: Vec<ExecutionStrategy>, timeout: Duration) -> Self {
        Self {
            strategies,
            timeout,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(candidates(config), config.probe_timeout)
    }

    /// Try each strategy in declared order and return the first clean result.
    ///
    /// A fault (spawn failure, non-zero exit, timeout) advances to the next
    /// strategy; it is never surfaced to the caller unless every strategy
    /// faults, in which case the failure message preserves the last fault and
    /// names the missing dependency.
    pub async fn probe(&self) -> ProbeResult {
        let mut last_fault: Option<ProbeFault> = None;

        for strategy in &self.strategies {
            eprintln!(
                "health_check: trying strategy '{}': {}",
                strategy.label,
                strategy.command_line()
            );

            match run_strategy(strategy, self.timeout).await {
                Ok(output) => {
                    if !output.stderr.is_empty() {
                        eprintln!(
                            "health_check: strategy '{}' wrote to stderr: {}",
                            strategy.label,
                            output.stderr.trim_end()
                        );
                    }
                    eprintln!("health_check: strategy '{}' succeeded", strategy.label);
                    return ProbeResult::Success {
                        stdout: output.stdout,
                        stderr: output.stderr,
                    };
                }
                Err(fault) => {
                    eprintln!("health_check: strategy '{}' failed: {fault}", strategy.label);
                    last_fault = Some(fault);
                }
            }
        }

        let error = match last_fault {
            Some(fault) => {
                format!("{fault}. Install the Gemini CLI and ensure it is on PATH.")
            }
            None => "no execution strategy is applicable on this platform. \
                     Install the Gemini CLI and ensure it is on PATH."
                .to_string(),
        };
        eprintln!("health_check: all strategies exhausted: {error}");
        ProbeResult::Failure { error }
    }
}

/// Launch one strategy's command line, capture stdout/stderr, and wait for
/// exit — all under `limit`. On timeout the child is killed and reaped.
async fn run_strategy(
    strategy: &ExecutionStrategy,
    limit: Duration,
) -> Result<CapturedOutput, ProbeFault> {
    let mut cmd = Command::new(&strategy.program);
    cmd.args(&strategy.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|source| ProbeFault::Spawn {
        program: strategy.program.clone(),
        source,
    })?;

    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();

    let waited = timeout(limit, async {
        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();

        // Drain both pipes concurrently so neither can fill and stall the child.
        let (stdout_read, stderr_read) = tokio::join!(
            read_pipe(&mut stdout_pipe, &mut stdout_buf),
            read_pipe(&mut stderr_pipe, &mut stderr_buf),
        );
        stdout_read?;
        stderr_read?;

        let status = child.wait().await?;
        Ok::<_, std::io::Error>((status, stdout_buf, stderr_buf))
    })
    .await;

    match waited {
        Ok(Ok((status, stdout_buf, stderr_buf))) => {
            let stdout = String::from_utf8_lossy(&stdout_buf).into_owned();
            let stderr = String::from_utf8_lossy(&stderr_buf).into_owned();

            if status.success() {
                Ok(CapturedOutput { stdout, stderr })
            } else {
                let detail = match stderr.trim() {
                    "" => "(no diagnostic output)".to_string(),
                    s => s.to_string(),
                };
                Err(ProbeFault::NonZeroExit {
                    program: strategy.program.clone(),
                    code: status.code().unwrap_or(-1),
                    detail,
                })
            }
        }
        Ok(Err(source)) => Err(ProbeFault::Io {
            program: strategy.program.clone(),
            source,
        }),
        Err(_elapsed) => {
            // Kill and reap before reporting; a leaked child is a defect.
            if let Err(e) = child.kill().await {
                eprintln!("health_check: failed to kill timed-out process: {e}");
            }
            Err(ProbeFault::Timeout {
                program: strategy.program.clone(),
                limit,
            })
        }
    }
}

async fn read_pipe<R>(pipe: &mut Option<R>, buf: &mut Vec<u8>) -> std::io::Result<()>
where
    R: tokio::io::AsyncRead + Unpin,
{
    if let Some(reader) = pipe.as_mut() {
        reader.read_to_end(buf).await?;
    }
    Ok(())
}

/// Build the ordered strategy list applicable to this configuration and
/// platform: direct invocation, then the npm package runner (stock binary
/// only — the runner only knows the stock package name), then the platform
/// shell.
pub fn candidates(config: &ServerConfig) -> Vec<ExecutionStrategy> {
    let args = config.health_args();

    let mut strategies = vec![ExecutionStrategy::new(
        "direct",
        config.gemini_program.clone(),
        args.clone(),
    )];

    if config.gemini_program == DEFAULT_GEMINI_PROGRAM {
        let mut npx_args = vec!["-y".to_string(), GEMINI_NPM_PACKAGE.to_string()];
        npx_args.extend(args.iter().cloned());
        strategies.push(ExecutionStrategy::new("npx", "npx", npx_args));
    }

    strategies.push(shell_strategy(&config.gemini_program, &args));
    strategies
}

#[cfg(unix)]
fn shell_strategy(program: &str, args: &[String]) -> ExecutionStrategy {
    let mut line = shell_quote(program);
    for arg in args {
        line.push(' ');
        line.push_str(&shell_quote(arg));
    }
    ExecutionStrategy::new("shell", "sh", vec!["-c".to_string(), line])
}

#[cfg(windows)]
fn shell_strategy(program: &str, args: &[String]) -> ExecutionStrategy {
    let mut line = shell_quote(program);
    for arg in args {
        line.push(' ');
        line.push_str(&shell_quote(arg));
    }
    ExecutionStrategy::new("shell", "cmd", vec!["/C".to_string(), line])
}

/// Quote one argument for the POSIX shell. Plain words pass through; anything
/// else is single-quoted with embedded quotes escaped.
#[cfg(unix)]
fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Quote one argument for cmd.exe. Arguments with spaces or quotes are
/// wrapped in double quotes with embedded quotes escaped.
#[cfg(windows)]
fn shell_quote(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains([' ', '\t', '"']) {
        arg.to_string()
    } else {
        format!("\"{}\"", arg.replace('"', "\\\""))
    }
}
