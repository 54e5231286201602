use std::fs;

use fifoprims_element::{Attempt, Channel, Direction};
use tracing::{debug, info};

use crate::cmd::poll::Poller;
use crate::cmd::ProduceArgs;
use crate::exit::{channel_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::hex;

pub fn run(args: ProduceArgs) -> CliResult<i32> {
    let payload = resolve_payload(&args)?;
    let elements = split_elements(&payload, args.size)?;
    let mut poller = Poller::from_args(&args.poll)?;

    let mut channel = Channel::open(&args.path, Direction::Write, args.size)
        .map_err(|err| channel_error("open failed", err))?;

    for (index, element) in elements.iter().enumerate() {
        loop {
            poller.check()?;
            let attempt = channel
                .try_write_raw(element)
                .map_err(|err| channel_error("write failed", err))?;
            match attempt {
                Attempt::Complete(()) => {
                    debug!(index, "element sent");
                    poller.progressed();
                    break;
                }
                Attempt::Partial { .. } => poller.progressed(),
                Attempt::NoProgress(stall) => poller.stalled(stall)?,
            }
        }
    }

    channel
        .close()
        .map_err(|err| channel_error("close failed", err))?;
    info!(path = %args.path.display(), elements = elements.len(), "produced");
    Ok(SUCCESS)
}

fn resolve_payload(args: &ProduceArgs) -> CliResult<Vec<u8>> {
    if let Some(digits) = &args.hex {
        return hex::decode(digits);
    }
    if let Some(text) = &args.text {
        return Ok(text.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Ok(Vec::new())
}

/// Cut the payload into whole elements.
fn split_elements(payload: &[u8], size: usize) -> CliResult<Vec<&[u8]>> {
    if size == 0 {
        return Err(CliError::new(USAGE, "--size must be greater than zero"));
    }
    if payload.is_empty() {
        return Err(CliError::new(DATA_INVALID, "payload is empty"));
    }
    if payload.len() % size != 0 {
        return Err(CliError::new(
            DATA_INVALID,
            format!(
                "payload of {} bytes is not a whole number of {size}-byte elements",
                payload.len()
            ),
        ));
    }
    Ok(payload.chunks(size).collect())
}
