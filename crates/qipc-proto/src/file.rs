//! Value persistence.
//!
//! A file holds `0xFF 0x01` followed by one raw payload encoding (no
//! frame header, no length prefix: files already have a size). Writing
//! goes through a sibling temporary path with an atomic rename, so a
//! crash mid-write never leaves a corrupt file at the destination.

use std::ffi::OsString;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::codec::{read_value, write_value};
use crate::context::SymbolContext;
use crate::errors::CodecError;
use crate::value::K;

/// Leading magic bytes of a value file.
pub const FILE_MAGIC: [u8; 2] = [0xff, 0x01];

/// Errors raised by value file I/O.
#[derive(Debug, Error)]
pub enum FileError {
    /// Underlying filesystem failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not start with the value magic.
    #[error("bad magic bytes, not a value file")]
    BadMagic,

    /// The payload failed to decode.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Write a value to `path`.
///
/// # Errors
///
/// [`FileError::Io`] on filesystem failures, [`FileError::Codec`] when
/// the value cannot be encoded (foreign symbol index).
pub fn write_file(path: &Path, k: &K, ctx: &SymbolContext) -> Result<(), FileError> {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(&FILE_MAGIC);
    write_value(&mut buf, k, ctx)?;

    let name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    let mut tmp_name: OsString = name.to_owned();
    tmp_name.push("$");
    let tmp = path.with_file_name(tmp_name);
    fs::write(&tmp, &buf)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Read a value from `path`.
///
/// # Errors
///
/// [`FileError::BadMagic`] when the file does not start with
/// [`FILE_MAGIC`], [`FileError::Codec`] when the payload is malformed or
/// has trailing bytes.
pub fn read_file(path: &Path, ctx: &SymbolContext) -> Result<K, FileError> {
    let bytes = fs::read(path)?;
    if bytes.len() < FILE_MAGIC.len() || bytes[..2] != FILE_MAGIC {
        return Err(FileError::BadMagic);
    }
    let (k, end) = read_value(&bytes, FILE_MAGIC.len(), ctx)?;
    if end != bytes.len() {
        return Err(FileError::Codec(CodecError::Framing(format!(
            "file payload consumed {end} of {} bytes",
            bytes.len()
        ))));
    }
    Ok(k)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.qdb");
        let ctx = SymbolContext::new();
        let k = K::list(vec![K::long(5), K::sym(&ctx, "hello")]);

        write_file(&path, &k, &ctx).unwrap();
        let back = read_file(&path, &ctx).unwrap();
        assert_eq!(back.items().unwrap()[0].as_long(), Ok(5));
        assert_eq!(back.items().unwrap()[1].sym_str(&ctx), Ok("hello".to_owned()));
        assert_eq!(back, k);
    }

    #[test]
    fn magic_is_checked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.qdb");
        std::fs::write(&path, [0x00, 0x01, 0x02]).unwrap();
        assert!(matches!(read_file(&path, &SymbolContext::new()), Err(FileError::BadMagic)));
    }

    #[test]
    fn no_temporary_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("value.qdb");
        let ctx = SymbolContext::new();
        write_file(&path, &K::long(1), &ctx).unwrap();
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["value.qdb".to_owned()]);
    }
}
