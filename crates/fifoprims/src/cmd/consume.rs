use fifoprims_element::{Attempt, Channel, Direction};
use tracing::info;

use crate::cmd::poll::Poller;
use crate::cmd::ConsumeArgs;
use crate::exit::{channel_error, CliResult, SUCCESS};
use crate::output::{print_element, OutputFormat};

pub fn run(args: ConsumeArgs, format: OutputFormat) -> CliResult<i32> {
    let mut poller = Poller::from_args(&args.poll)?;
    let mut channel = Channel::open(&args.path, Direction::Read, args.size)
        .map_err(|err| channel_error("open failed", err))?;

    let mut received = 0usize;
    while received < args.count {
        poller.check()?;
        let attempt = channel
            .try_read_raw()
            .map_err(|err| channel_error("read failed", err))?;
        match attempt {
            Attempt::Complete(element) => {
                print_element(&args.path, received, &element, format);
                received += 1;
                poller.progressed();
            }
            Attempt::Partial { .. } => poller.progressed(),
            Attempt::NoProgress(stall) => poller.stalled(stall)?,
        }
    }

    channel
        .close()
        .map_err(|err| channel_error("close failed", err))?;
    info!(path = %args.path.display(), elements = received, "consumed");
    Ok(SUCCESS)
}
