//! Writing a freshly generated key to disk

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::error::{CrypterError, CrypterResult};

/// Write an encoded key to `path`, followed by a newline.
///
/// Fails with `KeyFileExists` rather than replace an existing file unless
/// `force` is set. On unix the file is created with mode 0600.
pub fn write_key_file(path: &Path, encoded_key: &str, force: bool) -> CrypterResult<()> {
    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::AlreadyExists {
            CrypterError::KeyFileExists(path.display().to_string())
        } else {
            CrypterError::Io(e)
        }
    })?;

    file.write_all(encoded_key.as_bytes())?;
    file.write_all(b"\n")?;
    file.sync_all()?;
    Ok(())
}
