//! Validators: external checks that a rewritten config is acceptable
//!
//! The guard only needs a pass/fail verdict plus diagnostic text. Anything
//! that prevents a verdict (the checker is missing, crashes, or overruns
//! its timeout) is reported as a failure so that it triggers rollback.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Placeholder replaced with the target path in command arguments.
pub const PATH_PLACEHOLDER: &str = "{path}";

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Verdict of a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationOutcome {
    Passed { diagnostics: String },
    Failed { diagnostics: String },
    Skipped,
}

impl ValidationOutcome {
    pub fn passed(diagnostics: impl Into<String>) -> Self {
        Self::Passed {
            diagnostics: diagnostics.into(),
        }
    }

    pub fn failed(diagnostics: impl Into<String>) -> Self {
        Self::Failed {
            diagnostics: diagnostics.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn diagnostics(&self) -> &str {
        match self {
            Self::Passed { diagnostics } | Self::Failed { diagnostics } => diagnostics,
            Self::Skipped => "",
        }
    }
}

/// Checks whether the file at a path is acceptable to its consumer.
pub trait Validator: Send + Sync {
    fn validate(&self, path: &Path) -> ValidationOutcome;

    /// Short human-readable name for logs.
    fn describe(&self) -> String {
        "custom validator".to_string()
    }
}

impl<F> Validator for F
where
    F: Fn(&Path) -> ValidationOutcome + Send + Sync,
{
    fn validate(&self, path: &Path) -> ValidationOutcome {
        self(path)
    }
}

/// Accepts everything without looking; reported as `Skipped`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopValidator;

impl Validator for NoopValidator {
    fn validate(&self, _path: &Path) -> ValidationOutcome {
        ValidationOutcome::Skipped
    }

    fn describe(&self) -> String {
        "none".to_string()
    }
}

/// Runs an external checker such as `sshd -t -f {path}`.
///
/// Exit status zero passes. Combined stdout and stderr become the
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandValidator {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandValidator {
    pub fn new(
        program: impl Into<PathBuf>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: None,
        }
    }

    /// `sshd -t -f {path}`: full daemon config test.
    pub fn sshd(program: impl Into<PathBuf>) -> Self {
        Self::new(program, ["-t", "-f", PATH_PLACEHOLDER])
    }

    /// `ssh -G -F {path} localhost`: parse the client config and dump the
    /// effective settings without connecting.
    pub fn ssh_client(program: impl Into<PathBuf>) -> Self {
        Self::new(program, ["-G", "-F", PATH_PLACEHOLDER, "localhost"])
    }

    /// Kill the checker and fail validation if it runs longer than this.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments with the placeholder substituted.
    pub fn args_for(&self, path: &Path) -> Vec<String> {
        let path = path.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace(PATH_PLACEHOLDER, &path))
            .collect()
    }

    fn run(&self, path: &Path) -> std::io::Result<ValidationOutcome> {
        let mut child = Command::new(&self.program)
            .args(self.args_for(path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain pipes on helper threads so a chatty checker cannot block on
        // a full pipe while we wait for it.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.timeout {
            Some(timeout) => match wait_with_timeout(&mut child, timeout)? {
                Some(status) => status,
                None => {
                    // Grandchildren may still hold the pipes open; the
                    // drain threads are left to finish on their own.
                    drop((stdout, stderr));
                    return Ok(ValidationOutcome::failed(format!(
                        "{} timed out after {}ms",
                        self.describe(),
                        timeout.as_millis()
                    )));
                }
            },
            None => child.wait()?,
        };

        let mut diagnostics = stdout.join().unwrap_or_default();
        let err_text = stderr.join().unwrap_or_default();
        if !err_text.is_empty() {
            if !diagnostics.is_empty() && !diagnostics.ends_with('\n') {
                diagnostics.push('\n');
            }
            diagnostics.push_str(&err_text);
        }
        let diagnostics = diagnostics.trim_end().to_string();

        if status.success() {
            Ok(ValidationOutcome::passed(diagnostics))
        } else {
            let code = status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            Ok(ValidationOutcome::failed(format!(
                "{} exited with {code}: {diagnostics}",
                self.describe()
            )))
        }
    }
}

impl Validator for CommandValidator {
    fn validate(&self, path: &Path) -> ValidationOutcome {
        tracing::debug!(validator = %self.describe(), path = %path.display(), "running validator");
        match self.run(path) {
            Ok(outcome) => outcome,
            Err(e) => ValidationOutcome::failed(format!("failed to run {}: {e}", self.describe())),
        }
    }

    fn describe(&self) -> String {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Poll `child` until it exits or `timeout` elapses; on timeout the child is
/// killed and `None` returned.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
) -> std::io::Result<Option<std::process::ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() > timeout {
            tracing::warn!(
                timeout_ms = timeout.as_millis() as u64,
                "validator timed out, killing process"
            );
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
