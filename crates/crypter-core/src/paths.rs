//! Default output naming for `encrypt` and `decrypt`
//!
//! `notes.txt` encrypts to `notes.txt.enc`, which decrypts to
//! `notes.txt.dec`. An input without the encrypted suffix decrypts to
//! `<input>.dec`, so the default output never overwrites the input.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::OutputConfig;
use crate::error::{CrypterError, CrypterResult};

/// `<input><encrypted_suffix>`
pub fn default_encrypt_output(input: &Path, output: &OutputConfig) -> CrypterResult<PathBuf> {
    let name = file_name(input)?;
    let mut out = OsString::from(name);
    out.push(&output.encrypted_suffix);
    Ok(input.with_file_name(out))
}

/// Swap the encrypted suffix for the decrypted one, or append the decrypted
/// suffix when the input does not carry the encrypted suffix.
pub fn default_decrypt_output(input: &Path, output: &OutputConfig) -> CrypterResult<PathBuf> {
    let name = file_name(input)?;

    let stem = name
        .to_str()
        .and_then(|n| n.strip_suffix(output.encrypted_suffix.as_str()))
        .filter(|stem| !stem.is_empty());

    let mut out = match stem {
        Some(stem) => OsString::from(stem),
        None => name.to_os_string(),
    };
    out.push(&output.decrypted_suffix);
    Ok(input.with_file_name(out))
}

/// Resolve the output path: explicit `--output` wins, otherwise derive one.
pub fn resolve_output(
    explicit: Option<&Path>,
    input: &Path,
    derive: impl FnOnce(&Path) -> CrypterResult<PathBuf>,
) -> CrypterResult<PathBuf> {
    match explicit {
        Some(p) => Ok(p.to_path_buf()),
        None => derive(input),
    }
}

fn file_name(input: &Path) -> CrypterResult<&std::ffi::OsStr> {
    input
        .file_name()
        .ok_or_else(|| CrypterError::Path(format!("not a file path: {}", input.display())))
}
