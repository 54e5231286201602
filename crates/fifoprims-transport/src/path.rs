use std::io::ErrorKind;
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, TransportError};

/// Execute bits added to every directory created on the way to a pipe.
const SEARCH_BITS: u32 = 0o111;

/// Ensure `path` and all of its missing ancestors exist as directories.
///
/// Each directory created gets `mode | 0o111`. An existing directory is
/// success, so the call is idempotent. An existing non-directory anywhere on
/// the path is an error, as is any mkdir failure other than losing a
/// creation race.
///
/// Recursion only climbs while components are missing, then creates them
/// root-first on the way back down, so a directory is never created before
/// its parent.
pub fn ensure_dir_path(path: impl AsRef<Path>, mode: u32) -> Result<()> {
    let path = path.as_ref();

    // `Path::parent` yields "" for single-component relative paths.
    if path.as_os_str().is_empty() {
        return Ok(());
    }

    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => return Ok(()),
        Ok(_) => {
            return Err(TransportError::NotADirectory {
                path: path.to_path_buf(),
            })
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) if err.raw_os_error() == Some(libc::ENOTDIR) => {
            return Err(TransportError::NotADirectory {
                path: path.to_path_buf(),
            })
        }
        Err(err) => {
            return Err(TransportError::Provision {
                path: path.to_path_buf(),
                source: err,
            })
        }
    }

    let mode = mode | SEARCH_BITS;
    if let Some(parent) = path.parent() {
        ensure_dir_path(parent, mode)?;
    }

    match std::fs::DirBuilder::new().mode(mode).create(path) {
        Ok(()) => {
            debug!(?path, mode = format_args!("{mode:o}"), "created directory");
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(err) => Err(TransportError::Provision {
            path: path.to_path_buf(),
            source: err,
        }),
    }
}
