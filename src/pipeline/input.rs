//! Input validation: check a user-supplied path before pdfium sees it.
//!
//! pdfium reports a missing file, an unreadable file and a non-PDF file with
//! the same opaque load error. Checking existence, read permission and the
//! `%PDF` magic bytes up front gives callers a precise [`OutlineError`].

use crate::error::OutlineError;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate a local PDF path and return it as an owned path.
pub fn validate_pdf_path(path: impl AsRef<Path>) -> Result<PathBuf, OutlineError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(OutlineError::FileNotFound { path });
    }

    let mut file = match File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            return Err(OutlineError::PermissionDenied { path });
        }
        Err(_) => return Err(OutlineError::FileNotFound { path }),
    };

    let mut magic = [0u8; 4];
    let read = read_prefix(&mut file, &mut magic);
    if read < magic.len() || !has_pdf_magic(&magic) {
        return Err(OutlineError::NotAPdf { path, magic });
    }

    debug!("Validated PDF input: {}", path.display());
    Ok(path)
}

/// True when the first bytes of `bytes` are the PDF magic.
pub fn has_pdf_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
}

fn read_prefix(file: &mut File, buf: &mut [u8]) -> usize {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file() {
        let err = validate_pdf_path("/definitely/not/here.pdf").unwrap_err();
        assert!(matches!(err, OutlineError::FileNotFound { .. }));
    }

    #[test]
    fn wrong_magic() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"PK\x03\x04zipdata").unwrap();
        match validate_pdf_path(f.path()).unwrap_err() {
            OutlineError::NotAPdf { magic, .. } => assert_eq!(&magic, b"PK\x03\x04"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_and_empty_files_are_not_pdfs() {
        let f = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            validate_pdf_path(f.path()).unwrap_err(),
            OutlineError::NotAPdf { .. }
        ));
    }

    #[test]
    fn pdf_magic_accepted() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n").unwrap();
        assert_eq!(validate_pdf_path(f.path()).unwrap(), f.path());
        assert!(has_pdf_magic(b"%PDF-1.4"));
        assert!(!has_pdf_magic(b"%PD"));
    }
}
