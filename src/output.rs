//! Artifact persistence.
//!
//! The artifact is written to a temporary file next to its destination and
//! renamed into place, so a concurrent reader sees either the previous
//! complete document or the new one.
//!
//! `Last-Modified` only has whole-second resolution, so every write stamps
//! the artifact with a whole second after the one it replaces. Two builds in
//! the same second still produce different headers.

use crate::error::Error;
use std::{
    fs,
    io::Write,
    path::Path,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tempfile::NamedTempFile;

/// Mode of a freshly created artifact.
#[cfg(unix)]
const ARTIFACT_MODE: u32 = 0o644;

/// Write `contents` to `path`, creating the parent directory if needed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), Error> {
    let write_err = |cause| Error::Write {
        path: path.to_path_buf(),
        cause,
    };

    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(write_err)?;

    let previous = fs::metadata(path).ok();

    let mut file = NamedTempFile::new_in(dir).map_err(write_err)?;
    file.write_all(contents).map_err(write_err)?;
    file.as_file().sync_data().map_err(write_err)?;

    let modified = previous.as_ref().and_then(|meta| meta.modified().ok());
    file.as_file()
        .set_modified(next_mtime(SystemTime::now(), modified))
        .map_err(write_err)?;
    set_permissions(file.as_file(), previous.as_ref()).map_err(write_err)?;

    file.persist(path).map_err(|err| write_err(err.error))?;

    Ok(())
}

/// Whole-second mtime for a new artifact: not before `now`, and strictly
/// after the second of the artifact it replaces.
fn next_mtime(now: SystemTime, previous: Option<SystemTime>) -> SystemTime {
    let since_epoch = |time: SystemTime| time.duration_since(UNIX_EPOCH).unwrap_or_default();

    let now = since_epoch(now);
    let mut secs = now.as_secs() + u64::from(now.subsec_nanos() > 0);
    if let Some(previous) = previous {
        secs = secs.max(since_epoch(previous).as_secs() + 1);
    }
    UNIX_EPOCH + Duration::from_secs(secs)
}

/// Keep the replaced artifact's permissions, or use the usual file mode.
#[cfg(unix)]
fn set_permissions(file: &fs::File, previous: Option<&fs::Metadata>) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let permissions = previous.map_or_else(
        || fs::Permissions::from_mode(ARTIFACT_MODE),
        fs::Metadata::permissions,
    );
    file.set_permissions(permissions)
}

#[cfg(not(unix))]
fn set_permissions(_: &fs::File, _: Option<&fs::Metadata>) -> std::io::Result<()> {
    Ok(())
}
