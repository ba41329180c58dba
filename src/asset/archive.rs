// src/asset/archive.rs

//! Asset source backed by a ZIP archive
//!
//! Directories are emulated with a name prefix: a source scoped to `tool/`
//! sees every entry whose name starts with `tool/`, and lists exactly the
//! entries one segment below it.

use super::{AssetEntity, AssetPath, AssetSource, AssetStream};
use crate::stream::CloseListener;
use flate2::read::DeflateDecoder;
use regex::Regex;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::result::ZipError;
use zip::{CompressionMethod, ZipArchive};

/// Serves assets from entries of a ZIP archive
#[derive(Debug, Clone)]
pub struct ArchiveAssetSource {
    file: PathBuf,
    root: String,
}

impl ArchiveAssetSource {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self::with_root(file, "")
    }

    fn with_root(file: impl Into<PathBuf>, root: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            root: root.into(),
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// The entry name prefix this source is scoped to
    pub fn root(&self) -> &str {
        &self.root
    }

    fn open(&self) -> io::Result<ZipArchive<File>> {
        let file = File::open(&self.file)?;
        ZipArchive::new(file).map_err(io::Error::from)
    }
}

impl AssetSource for ArchiveAssetSource {
    fn sub(&self, path: &AssetPath) -> Box<dyn AssetSource> {
        Box::new(Self::with_root(
            self.file.clone(),
            format!("{}{}/", self.root, path),
        ))
    }

    fn list(&self) -> io::Result<Vec<AssetEntity>> {
        let pattern = Regex::new(&format!("^{}([^/]+)(/?)$", regex::escape(&self.root)))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let archive = self.open()?;
        let mut entities = Vec::new();
        for name in archive.file_names() {
            let Some(caps) = pattern.captures(name) else {
                continue;
            };
            let segment = caps[1].to_string();
            if caps[2].is_empty() {
                entities.push(AssetEntity::File(segment));
            } else {
                entities.push(AssetEntity::Directory(segment));
            }
        }
        Ok(entities)
    }

    fn read(&self, path: &AssetPath) -> io::Result<AssetStream> {
        let name = format!("{}{}", self.root, path);
        let mut archive = self.open()?;

        let (method, data_start, compressed_size, size, crc32) = {
            let entry = archive.by_name(&name).map_err(|e| match e {
                ZipError::FileNotFound => io::Error::new(
                    io::ErrorKind::NotFound,
                    format!(
                        "Path \"{}\" does not exist in archive ({})",
                        name,
                        self.file.display()
                    ),
                ),
                other => io::Error::from(other),
            })?;
            (
                entry.compression(),
                entry.data_start(),
                entry.compressed_size(),
                entry.size(),
                entry.crc32(),
            )
        };

        let body: Box<dyn Read + Send> = match method {
            CompressionMethod::Stored | CompressionMethod::Deflated => {
                // Stream from the archive's own handle; it closes with the stream
                let mut handle = archive.into_inner();
                handle.seek(SeekFrom::Start(data_start))?;
                let raw = handle.take(compressed_size);
                let decoded: Box<dyn Read + Send> = if method == CompressionMethod::Stored {
                    Box::new(raw)
                } else {
                    Box::new(DeflateDecoder::new(raw))
                };
                Box::new(ChecksumReader::new(decoded, name.clone(), size, crc32))
            }
            _ => {
                // The zip reader checks the CRC itself
                let mut buf = Vec::new();
                archive
                    .by_name(&name)
                    .map_err(io::Error::from)?
                    .read_to_end(&mut buf)?;
                Box::new(Cursor::new(buf))
            }
        };

        let file = self.file.clone();
        Ok(Box::new(CloseListener::new(body, move || {
            debug!("Closed {} ({})", name, file.display());
        })))
    }
}

/// Verifies an entry's length and CRC-32 once its data is exhausted
struct ChecksumReader<R> {
    inner: R,
    name: String,
    hasher: crc32fast::Hasher,
    expected_size: u64,
    expected_crc: u32,
    read: u64,
    verified: bool,
}

impl<R: Read> ChecksumReader<R> {
    fn new(inner: R, name: String, expected_size: u64, expected_crc: u32) -> Self {
        Self {
            inner,
            name,
            hasher: crc32fast::Hasher::new(),
            expected_size,
            expected_crc,
            read: 0,
            verified: false,
        }
    }

    fn verify(&mut self) -> io::Result<()> {
        self.verified = true;
        if self.read != self.expected_size {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "Entry \"{}\" is {} bytes, expected {}",
                    self.name, self.read, self.expected_size
                ),
            ));
        }
        if self.hasher.clone().finalize() != self.expected_crc {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid checksum for entry \"{}\"", self.name),
            ));
        }
        Ok(())
    }
}

impl<R: Read> Read for ChecksumReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
            self.read += n as u64;
        } else if !buf.is_empty() && !self.verified {
            self.verify()?;
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_archive(path: &Path) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        zip.add_directory("tool/", stored).unwrap();
        zip.start_file("tool/main.c", deflated).unwrap();
        zip.write_all(b"// CONFIG START\n// CONFIG END\n").unwrap();
        zip.add_directory("tool/src/", stored).unwrap();
        zip.start_file("tool/src/util.h", stored).unwrap();
        zip.write_all(b"#pragma once\n").unwrap();
        zip.start_file("tool/src/deep/x.c", stored).unwrap();
        zip.write_all(b"x").unwrap();
        zip.start_file("other.txt", stored).unwrap();
        zip.write_all(b"other").unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn test_list_one_level() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("assets.zip");
        build_archive(&path);

        let root = ArchiveAssetSource::new(&path);
        let mut top = root.list().unwrap();
        top.sort();
        assert_eq!(
            top,
            vec![AssetEntity::file("other.txt"), AssetEntity::directory("tool")]
        );

        let tool = root.sub_str("tool");
        let mut listed = tool.list().unwrap();
        listed.sort();
        assert_eq!(
            listed,
            vec![AssetEntity::file("main.c"), AssetEntity::directory("src")]
        );

        // "deep/" has no directory entry of its own, so it is not listed
        let mut src = tool.sub_str("src").list().unwrap();
        src.sort();
        assert_eq!(src, vec![AssetEntity::file("util.h")]);
    }

    #[test]
    fn test_read_stored_and_deflated() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("assets.zip");
        build_archive(&path);

        let tool = ArchiveAssetSource::new(&path).sub_str("tool");

        let mut main = String::new();
        tool.read_str("main.c").unwrap().read_to_string(&mut main).unwrap();
        assert_eq!(main, "// CONFIG START\n// CONFIG END\n");

        let mut util = String::new();
        tool.read_str("src/util.h")
            .unwrap()
            .read_to_string(&mut util)
            .unwrap();
        assert_eq!(util, "#pragma once\n");
    }

    #[test]
    fn test_read_corrupted_entry_fails() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("assets.zip");
        {
            let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
            let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
            zip.start_file("tool/hello.txt", stored).unwrap();
            zip.write_all(b"HELLOWORLD").unwrap();
            zip.finish().unwrap();
        }

        let mut bytes = std::fs::read(&path).unwrap();
        let at = bytes
            .windows(10)
            .position(|w| w == b"HELLOWORLD")
            .unwrap();
        bytes[at] = b'J';
        std::fs::write(&path, bytes).unwrap();

        let mut out = String::new();
        let err = ArchiveAssetSource::new(&path)
            .read_str("tool/hello.txt")
            .unwrap()
            .read_to_string(&mut out)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("tool/hello.txt"));
    }

    #[test]
    fn test_read_missing_entry() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("assets.zip");
        build_archive(&path);

        let err = ArchiveAssetSource::new(&path)
            .read_str("tool/nope.c")
            .err()
            .unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("tool/nope.c"));
    }

    #[test]
    fn test_root_prefix_is_escaped() {
        let source = ArchiveAssetSource::new("unused.zip").sub_str("a.b");
        let pattern = Regex::new(&format!("^{}([^/]+)(/?)$", regex::escape("a.b/"))).unwrap();
        assert!(pattern.is_match("a.b/c"));
        assert!(!pattern.is_match("axb/c"));
        assert!(format!("{:?}", source).contains("a.b/"));
    }
}
