use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, instrument};

use crate::config::LegacyConfig;
use crate::error::{MergeError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Converts legacy spreadsheet formats to xlsx by running an office suite in
/// headless mode.
#[derive(Debug, Clone)]
pub struct LegacyConverter {
    program: String,
    timeout: Duration,
}

impl LegacyConverter {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn from_config(config: &LegacyConfig) -> Self {
        Self::new(config.program.clone(), Duration::from_secs(config.timeout_secs))
    }

    /// Converts `input` into `<out_dir>/<stem>.xlsx` and returns that path.
    ///
    /// The converter is killed once the timeout elapses.
    #[instrument(level = "debug", skip(self), fields(program = %self.program))]
    pub fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf> {
        let failure = |reason: String| MergeError::Conversion {
            path: input.to_path_buf(),
            reason,
        };

        let mut child = Command::new(&self.program)
            .args(["--headless", "--convert-to", "xlsx", "--outdir"])
            .arg(out_dir)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| failure(format!("could not start '{}': {err}", self.program)))?;

        let started = Instant::now();
        let status = loop {
            let polled = child
                .try_wait()
                .map_err(|err| failure(format!("could not poll converter: {err}")))?;
            if let Some(status) = polled {
                break status;
            }
            if started.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(failure(format!(
                    "timed out after {}s",
                    self.timeout.as_secs_f64()
                )));
            }
            thread::sleep(POLL_INTERVAL);
        };

        if !status.success() {
            return Err(failure(format!("converter exited with {status}")));
        }

        let stem = input
            .file_stem()
            .ok_or_else(|| failure("input has no file name".to_string()))?;
        let mut converted = out_dir.join(stem);
        converted.set_extension("xlsx");
        if !converted.is_file() {
            return Err(failure(format!(
                "converter produced no output at {}",
                converted.display()
            )));
        }

        debug!(output = %converted.display(), elapsed_ms = started.elapsed().as_millis() as u64, "converted legacy file");
        Ok(converted)
    }
}
