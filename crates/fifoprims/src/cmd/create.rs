use fifoprims_transport::{fifo_status, Direction, NamedFifo};
use tracing::info;

use crate::cmd::CreateArgs;
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_status, OutputFormat};

pub fn run(args: CreateArgs, format: OutputFormat) -> CliResult<i32> {
    let mut fifo = NamedFifo::with_mode(&args.path, Direction::ReadWrite, args.mode);
    fifo.create()
        .map_err(|err| transport_error("create failed", err))?;
    fifo.close()
        .map_err(|err| transport_error("close failed", err))?;
    info!(path = %args.path.display(), mode = %format!("{:o}", args.mode), "fifo ready");

    let status = fifo_status(&args.path).map_err(|err| transport_error("stat failed", err))?;
    print_status(&status, format);
    Ok(SUCCESS)
}
