// src/manifest/mod.rs

//! JAR manifest model
//!
//! A deliberately small reading of the manifest format: one `key: value`
//! pair per line, no sections and no continuation lines. Entries are kept
//! sorted so that both the serialised form and the fingerprint are
//! independent of insertion order. Keys sort by UTF-16 code unit, the order
//! JVM tooling uses, which differs from byte order for keys mixing
//! supplementary characters with U+E000..U+FFFF.

mod mutator;

pub use mutator::{ManifestMutator, ManifestOperation};

use crate::error::ManifestError;
use md5::{Digest, Md5};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::io::{self, BufReader, Read, Write};

/// Entry path of the manifest inside an archive
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// Parent directory entry of [`MANIFEST_PATH`]
pub const META_INF_DIR: &str = "META-INF/";

/// Size of a manifest fingerprint in bytes
pub const FINGERPRINT_LEN: usize = 16;

/// A manifest fingerprint
pub type Fingerprint = [u8; FINGERPRINT_LEN];

/// A manifest key, ordered by UTF-16 code units
#[derive(Debug, Clone, PartialEq, Eq)]
struct ManifestKey(String);

impl Ord for ManifestKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.encode_utf16().cmp(other.0.encode_utf16())
    }
}

impl PartialOrd for ManifestKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordered key/value store read from and written to `META-INF/MANIFEST.MF`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestFile {
    entries: BTreeMap<ManifestKey, String>,
}

impl ManifestFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a manifest from `reader`
    pub fn parse<R: Read>(reader: R) -> Result<Self, ManifestError> {
        let mut manifest = Self::new();
        manifest.read(reader)?;
        Ok(manifest)
    }

    /// Look up `key`, falling back to a case-insensitive match
    pub fn get(&self, key: &str) -> Option<&str> {
        if let Some(value) = self.entries.get(&ManifestKey(key.to_string())) {
            return Some(value);
        }
        let folded = key.to_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| k.0.to_lowercase() == folded)
            .map(|(_, v)| v.as_str())
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(ManifestKey(key.into()), value.into());
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.remove(&ManifestKey(key.to_string()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.0.as_str(), v.as_str()))
    }

    /// Read entries from `reader` into this manifest.
    ///
    /// Each line is split at its first `:`; leading whitespace of the value
    /// is skipped. Empty lines are ignored, any other line without a `:` is
    /// an error. A repeated key keeps the last value.
    pub fn read<R: Read>(&mut self, reader: R) -> Result<(), ManifestError> {
        let mut reader = BufReader::with_capacity(256, reader);
        let mut text = String::new();
        reader.read_to_string(&mut text)?;

        for (index, line) in lines(&text).enumerate() {
            if line.is_empty() {
                continue;
            }
            let Some(sep) = line.find(':') else {
                return Err(ManifestError::InvalidEntry { line: index + 1 });
            };
            let value = line[sep + 1..].trim_start_matches(char::is_whitespace);
            self.entries
                .insert(ManifestKey(line[..sep].to_string()), value.to_string());
        }
        Ok(())
    }

    /// Write entries as `key: value\n` lines in key order, then flush
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut buffered = io::BufWriter::new(&mut *writer);
        for (key, value) in &self.entries {
            buffered.write_all(key.0.as_bytes())?;
            buffered.write_all(b": ")?;
            buffered.write_all(value.as_bytes())?;
            buffered.write_all(b"\n")?;
        }
        buffered.flush()?;
        drop(buffered);
        writer.flush()
    }

    /// Serialised form as bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write(&mut out);
        out
    }

    /// MD5 over the entries in key order.
    ///
    /// Every character is hashed as a little-endian UTF-16 code unit; keys
    /// and values are separated by `:` and entries terminated by a tab. An
    /// empty manifest fingerprints to all zeroes without touching the digest.
    pub fn fingerprint(&self) -> Fingerprint {
        if self.entries.is_empty() {
            return [0u8; FINGERPRINT_LEN];
        }

        let mut hasher = Md5::new();
        for (key, value) in &self.entries {
            hash_utf16(&mut hasher, &key.0);
            hasher.update(b":");
            hash_utf16(&mut hasher, value);
            hasher.update(b"\t");
        }
        hasher.finalize().into()
    }
}

fn hash_utf16(hasher: &mut Md5, s: &str) {
    for unit in s.encode_utf16() {
        hasher.update(unit.to_le_bytes());
    }
}

/// Split on `\n`, `\r\n` or a lone `\r`, without a trailing empty line
fn lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        match rest.find(['\r', '\n']) {
            Some(end) => {
                let line = &rest[..end];
                let skip = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[end + skip..];
                Some(line)
            }
            None => {
                let line = rest;
                rest = "";
                Some(line)
            }
        }
    })
}
