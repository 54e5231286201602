use fifoprims_transport::{fifo_status, Direction, NamedFifo};
use tracing::info;

use crate::cmd::UnlinkArgs;
use crate::exit::{transport_error, CliError, CliResult, SUCCESS, TRANSPORT_ERROR, USAGE};

pub fn run(args: UnlinkArgs) -> CliResult<i32> {
    let status = fifo_status(&args.path).map_err(|err| transport_error("stat failed", err))?;
    if !status.exists {
        return Err(CliError::new(
            TRANSPORT_ERROR,
            format!("no such fifo: {}", args.path.display()),
        ));
    }
    if !status.is_fifo {
        return Err(CliError::new(
            USAGE,
            format!("refusing to remove non-fifo: {}", args.path.display()),
        ));
    }

    NamedFifo::new(&args.path, Direction::Read)
        .unlink()
        .map_err(|err| transport_error("unlink failed", err))?;
    info!(path = %args.path.display(), "fifo removed");
    Ok(SUCCESS)
}
