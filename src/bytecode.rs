// src/bytecode.rs

//! Class file version inference
//!
//! Reads just enough of the entry class's header to learn which Java release
//! compiled it: the `CAFEBABE` magic, a skipped minor version, and the
//! big-endian major version.

use crate::error::{Error, Result};
use crate::manifest::ManifestFile;
use std::io::{self, Read, Seek};
use zip::ZipArchive;
use zip::result::ZipError;

/// Canonical spelling of the entry class manifest key
pub const MAIN_CLASS_KEY: &str = "Main-Class";

/// Class file magic number
pub const CLASS_MAGIC: [u8; 4] = [0xCA, 0xFE, 0xBA, 0xBE];

/// Major version N corresponds to Java N - 44
pub const MAJOR_VERSION_OFFSET: u16 = 44;

/// Oldest supported class file major version (Java 5)
pub const MIN_MAJOR_VERSION: u16 = 49;

/// Find the entry class in `manifest`.
///
/// An exact-case key wins immediately. Otherwise the first key that matches
/// case-insensitively is used.
pub fn resolve_entry_class(manifest: &ManifestFile) -> Option<&str> {
    let mut fallback = None;
    for (key, value) in manifest.iter() {
        if key == MAIN_CLASS_KEY {
            return Some(value);
        }
        if fallback.is_none() && key.eq_ignore_ascii_case(MAIN_CLASS_KEY) {
            fallback = Some(value);
        }
    }
    fallback
}

/// `com.example.Main` becomes `com/example/Main.class`
pub fn entry_class_path(class_name: &str) -> String {
    let mut path = String::with_capacity(class_name.len() + 6);
    path.extend(class_name.chars().map(|c| if c == '.' { '/' } else { c }));
    path.push_str(".class");
    path
}

/// Read the class file major version from a class file header
pub fn read_major_version<R: Read>(class_name: &str, reader: &mut R) -> Result<u16> {
    let mut header = [0u8; 8];
    let mut filled = 0;
    while filled < header.len() {
        match reader.read(&mut header[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(Error::io(
                    format!("Failed to read main class of JAR ({})", class_name),
                    e,
                ));
            }
        }
    }

    if filled < CLASS_MAGIC.len() || header[..4] != CLASS_MAGIC {
        return Err(Error::failed(format!(
            "Main class of JAR ({}) has corrupted header",
            class_name
        )));
    }
    if filled < header.len() {
        return Err(Error::failed(format!(
            "Main class of JAR ({}) has been truncated",
            class_name
        )));
    }

    Ok(u16::from_be_bytes([header[6], header[7]]))
}

/// Locate `class_name` in `archive` and read its major version
pub fn read_class_major<R: Read + Seek>(archive: &mut ZipArchive<R>, class_name: &str) -> Result<u16> {
    let path = entry_class_path(class_name);
    let mut entry = match archive.by_name(&path) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => {
            return Err(Error::failed(format!(
                "Main class of JAR ({}) is not contained in the file",
                class_name
            )));
        }
        Err(e) => return Err(Error::archive(format!("Failed to open {}", path), e)),
    };
    read_major_version(class_name, &mut entry)
}

/// Map a class file major version to the Java release that introduced it.
///
/// Versions older than Java 5 are rejected.
pub fn min_runtime_version(major: u16) -> Result<u32> {
    if major < MIN_MAJOR_VERSION {
        return Err(Error::failed(format!(
            "Main class of JAR has unsupported class file major version {}",
            major
        )));
    }
    Ok(u32::from(major - MAJOR_VERSION_OFFSET))
}

/// Decide the minimum Java version after inspecting the archive.
///
/// Returns `Some(required)` when the configured minimum must be raised and
/// `None` when it already covers `required`. The minimum is never lowered.
/// A requirement above the preferred version is an error.
pub fn raise_minimum(required: u32, current_min: u32, preferred: u32) -> Result<Option<u32>> {
    if required <= current_min {
        return Ok(None);
    }
    if required > preferred {
        return Err(Error::failed(format!(
            "Main class of JAR file was compiled against Java {}, but preferred Java version is {}",
            required, preferred
        )));
    }
    Ok(Some(required))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header(major: u16) -> Vec<u8> {
        let mut bytes = CLASS_MAGIC.to_vec();
        bytes.extend_from_slice(&[0, 0]);
        bytes.extend_from_slice(&major.to_be_bytes());
        bytes.extend_from_slice(&[0, 0x10]);
        bytes
    }

    #[test]
    fn test_entry_class_path() {
        assert_eq!(entry_class_path("com.example.Main"), "com/example/Main.class");
        assert_eq!(entry_class_path("Main"), "Main.class");
    }

    #[test]
    fn test_resolve_entry_class_prefers_exact_case() {
        let mut mf = ManifestFile::new();
        mf.put("MAIN-CLASS", "loose.First");
        mf.put("main-class", "loose.Second");
        assert_eq!(resolve_entry_class(&mf), Some("loose.First"));

        mf.put("Main-Class", "exact.Main");
        assert_eq!(resolve_entry_class(&mf), Some("exact.Main"));

        assert_eq!(resolve_entry_class(&ManifestFile::new()), None);
    }

    #[test]
    fn test_read_major_version() {
        let major = read_major_version("a.B", &mut Cursor::new(header(52))).unwrap();
        assert_eq!(major, 52);
    }

    #[test]
    fn test_read_major_version_bad_magic() {
        let mut bytes = header(52);
        bytes[0] = 0xCB;
        let err = read_major_version("a.B", &mut Cursor::new(bytes)).unwrap_err();
        assert!(err.to_string().contains("corrupted header"));

        let err = read_major_version("a.B", &mut Cursor::new(vec![0xCA, 0xFE])).unwrap_err();
        assert!(err.to_string().contains("corrupted header"));
    }

    #[test]
    fn test_read_major_version_truncated() {
        let bytes = header(52)[..7].to_vec();
        let err = read_major_version("a.B", &mut Cursor::new(bytes)).unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_min_runtime_version_boundaries() {
        assert!(min_runtime_version(44).is_err());
        assert!(min_runtime_version(48).is_err());
        assert_eq!(min_runtime_version(49).unwrap(), 5);
        assert_eq!(min_runtime_version(52).unwrap(), 8);
        assert_eq!(min_runtime_version(65).unwrap(), 21);
    }

    #[test]
    fn test_raise_minimum() {
        assert_eq!(raise_minimum(8, 8, 21).unwrap(), None);
        assert_eq!(raise_minimum(5, 8, 21).unwrap(), None);
        assert_eq!(raise_minimum(17, 8, 21).unwrap(), Some(17));

        let err = raise_minimum(21, 8, 17).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Main class of JAR file was compiled against Java 21, but preferred Java version is 17"
        );
    }
}
