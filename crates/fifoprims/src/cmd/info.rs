use fifoprims_transport::fifo_status;

use crate::cmd::InfoArgs;
use crate::exit::{transport_error, CliResult, FAILURE, SUCCESS};
use crate::output::{print_status, OutputFormat};

/// Print the path's status. Exits non-zero unless it is a named pipe.
pub fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let status = fifo_status(&args.path).map_err(|err| transport_error("stat failed", err))?;
    print_status(&status, format);
    Ok(if status.is_fifo { SUCCESS } else { FAILURE })
}
