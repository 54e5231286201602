use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fifoprims_element::Stall;
use tracing::debug;

use crate::cmd::PollArgs;
use crate::exit::{CliError, CliResult, INTERNAL, INTERRUPTED, TIMEOUT, USAGE};

/// Paces the retry loop of a transfer command.
///
/// Attempts that made progress are retried immediately; stalled attempts
/// sleep for the poll interval first. The loop ends on Ctrl-C or when the
/// optional deadline passes.
pub struct Poller {
    running: Arc<AtomicBool>,
    interval: Duration,
    timeout: Option<Duration>,
    started: Instant,
    last_stall: Option<Stall>,
}

impl Poller {
    pub fn from_args(args: &PollArgs) -> CliResult<Self> {
        let interval = parse_duration(&args.poll_interval)?;
        let timeout = args.timeout.as_deref().map(parse_duration).transpose()?;

        let running = Arc::new(AtomicBool::new(true));
        install_ctrlc_handler(running.clone())?;

        Ok(Self::new(running, interval, timeout))
    }

    fn new(running: Arc<AtomicBool>, interval: Duration, timeout: Option<Duration>) -> Self {
        Self {
            running,
            interval,
            timeout,
            started: Instant::now(),
            last_stall: None,
        }
    }

    /// Check for interruption or timeout before the next attempt.
    pub fn check(&self) -> CliResult<()> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(CliError::new(INTERRUPTED, "interrupted"));
        }
        if let Some(timeout) = self.timeout {
            if self.started.elapsed() >= timeout {
                return Err(CliError::new(
                    TIMEOUT,
                    format!("timed out after {timeout:?}"),
                ));
            }
        }
        Ok(())
    }

    /// Back off after an attempt that made no progress.
    pub fn stalled(&mut self, stall: Stall) -> CliResult<()> {
        if self.last_stall != Some(stall) {
            debug!(reason = stall.as_str(), "waiting");
            self.last_stall = Some(stall);
        }
        self.check()?;
        std::thread::sleep(self.interval);
        Ok(())
    }

    /// Note an attempt that moved bytes.
    pub fn progressed(&mut self) {
        self.last_stall = None;
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}
