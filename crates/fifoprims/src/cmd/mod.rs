use clap::{ArgGroup, Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod consume;
pub mod create;
pub mod info;
pub mod poll;
pub mod produce;
pub mod unlink;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a named pipe (and any missing parent directories).
    Create(CreateArgs),
    /// Write elements to a pipe, retrying until each is fully sent.
    Produce(ProduceArgs),
    /// Read elements from a pipe and print them.
    Consume(ConsumeArgs),
    /// Show whether a path is a named pipe and its permissions.
    Info(InfoArgs),
    /// Remove a named pipe.
    Unlink(UnlinkArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Create(args) => create::run(args, format),
        Command::Produce(args) => produce::run(args),
        Command::Consume(args) => consume::run(args, format),
        Command::Info(args) => info::run(args, format),
        Command::Unlink(args) => unlink::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Pipe path to create.
    pub path: PathBuf,
    /// Permission bits for the pipe, in octal (subject to umask).
    #[arg(long, default_value = "666", value_parser = parse_mode)]
    pub mode: u32,
}

/// Polling behaviour shared by commands that drive a transfer.
#[derive(Args, Debug)]
pub struct PollArgs {
    /// Delay between attempts that made no progress (e.g. 10ms, 1s).
    #[arg(long, default_value = "10ms")]
    pub poll_interval: String,
    /// Give up after this long (e.g. 5s, 500ms). Default: wait forever.
    #[arg(long)]
    pub timeout: Option<String>,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("payload").required(true)))]
pub struct ProduceArgs {
    /// Pipe path to write to. The pipe must already exist.
    pub path: PathBuf,
    /// Element size in bytes.
    #[arg(long, short = 's')]
    pub size: usize,
    /// Payload as hex digits (whitespace allowed).
    #[arg(long, group = "payload")]
    pub hex: Option<String>,
    /// Payload as UTF-8 text.
    #[arg(long, group = "payload")]
    pub text: Option<String>,
    /// Read payload from file.
    #[arg(long, group = "payload")]
    pub file: Option<PathBuf>,
    #[command(flatten)]
    pub poll: PollArgs,
}

#[derive(Args, Debug)]
pub struct ConsumeArgs {
    /// Pipe path to read from. The pipe must already exist.
    pub path: PathBuf,
    /// Element size in bytes.
    #[arg(long, short = 's')]
    pub size: usize,
    /// Exit after receiving N elements.
    #[arg(long, short = 'n', default_value = "1")]
    pub count: usize,
    #[command(flatten)]
    pub poll: PollArgs,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Path to inspect.
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct UnlinkArgs {
    /// Pipe path to remove.
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn parse_mode(input: &str) -> Result<u32, String> {
    let digits = input.trim_start_matches("0o");
    let mode = u32::from_str_radix(digits, 8).map_err(|_| format!("invalid octal mode: {input}"))?;
    if mode > 0o7777 {
        return Err(format!("mode out of range: {input}"));
    }
    Ok(mode)
}
