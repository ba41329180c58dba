// src/archive.rs

//! JAR manifest rewriting
//!
//! Only `META-INF/MANIFEST.MF` is ever replaced or added; every other entry
//! is copied raw so its compression method and bytes are preserved.
//!
//! Two write paths exist:
//! - The archive has no manifest: the entry is appended in place.
//! - The archive has a manifest: a new archive is streamed to a `.tmp`
//!   sibling and renamed over the original. On failure the sibling is
//!   removed and the original is left untouched.
//!
//! [`ManifestEdit`] gates both on a fingerprint comparison so an archive
//! whose manifest is unchanged is never rewritten.

use crate::error::{Error, Result};
use crate::manifest::{Fingerprint, MANIFEST_PATH, META_INF_DIR, ManifestFile, ManifestMutator};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::result::{ZipError, ZipResult};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Open an archive for reading
pub fn open(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path)
        .map_err(|e| Error::io(format!("Failed to open {}", path.display()), e))?;
    ZipArchive::new(file)
        .map_err(|e| Error::archive(format!("Failed to read archive {}", path.display()), e))
}

/// Read the manifest of an open archive, if it has one
pub fn read_manifest<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Option<ManifestFile>> {
    let entry = match archive.by_name(MANIFEST_PATH) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(Error::archive("Failed to read JAR manifest", e)),
    };
    Ok(Some(ManifestFile::parse(entry)?))
}

/// Append a manifest to an archive that has none.
///
/// A symlinked archive is first replaced by a private copy of its target so
/// the file the link points at is never written.
pub fn add_manifest(path: &Path, manifest: &ManifestFile) -> Result<()> {
    materialize(path)?;

    let has_meta_dir = open(path)?.index_for_name(META_INF_DIR).is_some();
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|e| Error::io(format!("Failed to open {} for writing", path.display()), e))?;

    append_manifest(file, manifest, has_meta_dir)
        .map_err(|e| Error::archive("Failed to write new manifest to JAR", e))?;
    debug!("Added manifest to {}", path.display());
    Ok(())
}

fn append_manifest(file: File, manifest: &ManifestFile, has_meta_dir: bool) -> ZipResult<()> {
    let mut zip = ZipWriter::new_append(file)?;
    if !has_meta_dir {
        zip.add_directory(META_INF_DIR, stored())?;
    }
    zip.start_file(MANIFEST_PATH, SimpleFileOptions::default())?;
    manifest.write(&mut zip)?;
    zip.finish()?;
    Ok(())
}

/// Replace the manifest of an archive that already has one
pub fn rewrite_manifest(path: &Path, manifest: &ManifestFile) -> Result<()> {
    let temp = temp_sibling(path);

    if let Err(e) = stream_rewrite(path, &temp, manifest) {
        if let Err(cleanup) = fs::remove_file(&temp) {
            warn!("Failed to remove {}: {}", temp.display(), cleanup);
        }
        return Err(Error::archive("Failed to update JAR manifest", e));
    }

    fs::rename(&temp, path).map_err(|e| {
        Error::io(
            format!("Failed to replace {} with {}", path.display(), temp.display()),
            e,
        )
    })?;
    debug!("Rewrote manifest of {}", path.display());
    Ok(())
}

fn stream_rewrite(path: &Path, temp: &Path, manifest: &ManifestFile) -> ZipResult<()> {
    let mut src = ZipArchive::new(File::open(path)?)?;
    let mut dest = ZipWriter::new(File::create(temp)?);
    let mut has_meta_dir = false;

    for i in 0..src.len() {
        let entry = src.by_index_raw(i)?;
        match entry.name() {
            MANIFEST_PATH => continue,
            META_INF_DIR => has_meta_dir = true,
            _ => {}
        }
        dest.raw_copy_file(entry)?;
    }

    if !has_meta_dir {
        dest.add_directory(META_INF_DIR, stored())?;
    }
    dest.start_file(MANIFEST_PATH, SimpleFileOptions::default())?;
    manifest.write(&mut dest)?;
    dest.finish()?;
    Ok(())
}

/// `archive.jar` becomes `archive.jar.tmp`
fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace a symlink at `path` with a regular copy of its target
fn materialize(path: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(path)
        .map_err(|e| Error::io(format!("Failed to stat {}", path.display()), e))?;
    if !meta.file_type().is_symlink() {
        return Ok(());
    }

    let temp = temp_sibling(path);
    fs::copy(path, &temp)
        .and_then(|_| fs::rename(&temp, path))
        .map_err(|e| {
            let _ = fs::remove_file(&temp);
            Error::io(format!("Failed to copy linked archive {}", path.display()), e)
        })?;
    debug!("Replaced symlink {} with a private copy", path.display());
    Ok(())
}

fn stored() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
}

/// A manifest read from an archive, edited, and written back only if it changed
#[derive(Debug)]
pub struct ManifestEdit {
    manifest: ManifestFile,
    existed: bool,
    original: Fingerprint,
}

impl ManifestEdit {
    /// Read the manifest of the archive at `path`, starting empty if it has none
    pub fn load(path: &Path) -> Result<Self> {
        let mut archive = open(path)?;
        let (manifest, existed) = match read_manifest(&mut archive)? {
            Some(manifest) => (manifest, true),
            None => (ManifestFile::new(), false),
        };
        let original = manifest.fingerprint();
        Ok(Self {
            manifest,
            existed,
            original,
        })
    }

    pub fn manifest(&self) -> &ManifestFile {
        &self.manifest
    }

    /// Whether the archive already carried a manifest
    pub fn existed(&self) -> bool {
        self.existed
    }

    pub fn apply(&mut self, mutator: &ManifestMutator) {
        mutator.apply(&mut self.manifest);
    }

    pub fn is_modified(&self) -> bool {
        self.manifest.fingerprint() != self.original
    }

    /// Write the manifest back to `path` if it changed.
    ///
    /// Returns whether the archive was written.
    pub fn commit(self, path: &Path) -> Result<bool> {
        if !self.is_modified() {
            debug!("Manifest of {} unchanged", path.display());
            return Ok(false);
        }
        if self.existed {
            rewrite_manifest(path, &self.manifest)?;
        } else {
            add_manifest(path, &self.manifest)?;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn deflated() -> SimpleFileOptions {
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
    }

    fn write_jar(path: &Path, manifest: Option<&str>, meta_dir: bool) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        if meta_dir {
            zip.add_directory(META_INF_DIR, stored()).unwrap();
        }
        if let Some(text) = manifest {
            zip.start_file(MANIFEST_PATH, deflated()).unwrap();
            zip.write_all(text.as_bytes()).unwrap();
        }
        zip.start_file("app/Main.class", stored()).unwrap();
        zip.write_all(&[0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52]).unwrap();
        zip.start_file("app/data.txt", deflated()).unwrap();
        zip.write_all(&b"payload ".repeat(64)).unwrap();
        zip.finish().unwrap();
    }

    fn names(path: &Path) -> Vec<String> {
        let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    #[test]
    fn test_unmodified_manifest_is_not_rewritten() {
        let temp = tempfile::tempdir().unwrap();
        let jar = temp.path().join("archive.jar");
        write_jar(&jar, Some("Main-Class: app.Main\n"), true);
        let before = fs::read(&jar).unwrap();

        let mut edit = ManifestEdit::load(&jar).unwrap();
        let mut mutator = ManifestMutator::new();
        mutator.put("Main-Class", "app.Main");
        edit.apply(&mutator);

        assert!(!edit.is_modified());
        assert!(!edit.commit(&jar).unwrap());
        assert_eq!(fs::read(&jar).unwrap(), before);
        assert!(!temp.path().join("archive.jar.tmp").exists());
    }

    #[test]
    fn test_rewrite_replaces_manifest_and_keeps_entries() {
        let temp = tempfile::tempdir().unwrap();
        let jar = temp.path().join("archive.jar");
        write_jar(&jar, Some("Main-Class: app.Main\n"), true);

        let mut edit = ManifestEdit::load(&jar).unwrap();
        assert!(edit.existed());
        let mut mutator = ManifestMutator::new();
        mutator.put("Launcher", "jarnative");
        edit.apply(&mutator);
        assert!(edit.commit(&jar).unwrap());

        let mut archive = open(&jar).unwrap();
        let manifest = read_manifest(&mut archive).unwrap().unwrap();
        assert_eq!(manifest.get("Launcher"), Some("jarnative"));
        assert_eq!(manifest.get("Main-Class"), Some("app.Main"));

        let data = archive.by_name("app/data.txt").unwrap();
        assert_eq!(data.compression(), CompressionMethod::Deflated);
        drop(data);
        let class = archive.by_name("app/Main.class").unwrap();
        assert_eq!(class.compression(), CompressionMethod::Stored);
        drop(class);

        let listed = names(&jar);
        assert_eq!(listed.iter().filter(|n| *n == MANIFEST_PATH).count(), 1);
        assert_eq!(listed.iter().filter(|n| *n == META_INF_DIR).count(), 1);
        assert!(!temp.path().join("archive.jar.tmp").exists());
    }

    #[test]
    fn test_rewrite_synthesizes_meta_dir() {
        let temp = tempfile::tempdir().unwrap();
        let jar = temp.path().join("archive.jar");
        write_jar(&jar, Some("Main-Class: app.Main\n"), false);

        let mut manifest = ManifestFile::new();
        manifest.put("Main-Class", "app.Other");
        rewrite_manifest(&jar, &manifest).unwrap();

        let mut archive = open(&jar).unwrap();
        let dir = archive.by_name(META_INF_DIR).unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir.size(), 0);
        assert_eq!(dir.compression(), CompressionMethod::Stored);
        drop(dir);

        let listed = names(&jar);
        let dir_pos = listed.iter().position(|n| n == META_INF_DIR).unwrap();
        let mf_pos = listed.iter().position(|n| n == MANIFEST_PATH).unwrap();
        assert!(dir_pos < mf_pos);
    }

    #[test]
    fn test_add_manifest_in_place() {
        let temp = tempfile::tempdir().unwrap();
        let jar = temp.path().join("archive.jar");
        write_jar(&jar, None, false);

        let mut edit = ManifestEdit::load(&jar).unwrap();
        assert!(!edit.existed());
        assert!(edit.manifest().is_empty());
        let mut mutator = ManifestMutator::new();
        mutator.put("Main-Class", "app.Main");
        edit.apply(&mutator);
        assert!(edit.commit(&jar).unwrap());

        let mut archive = open(&jar).unwrap();
        let manifest = read_manifest(&mut archive).unwrap().unwrap();
        assert_eq!(manifest.get("Main-Class"), Some("app.Main"));
        assert!(names(&jar).iter().any(|n| n == "app/data.txt"));
        assert!(names(&jar).iter().any(|n| n == META_INF_DIR));
    }

    #[cfg(unix)]
    #[test]
    fn test_add_manifest_does_not_touch_link_target() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("source.jar");
        write_jar(&source, None, false);
        let original = fs::read(&source).unwrap();

        let jar = temp.path().join("archive.jar");
        std::os::unix::fs::symlink(&source, &jar).unwrap();

        let mut manifest = ManifestFile::new();
        manifest.put("Main-Class", "app.Main");
        add_manifest(&jar, &manifest).unwrap();

        assert_eq!(fs::read(&source).unwrap(), original);
        assert!(!fs::symlink_metadata(&jar).unwrap().file_type().is_symlink());
        let mut archive = open(&jar).unwrap();
        assert!(read_manifest(&mut archive).unwrap().is_some());
    }

    #[test]
    fn test_failed_rewrite_keeps_original() {
        let temp = tempfile::tempdir().unwrap();
        let jar = temp.path().join("archive.jar");
        fs::write(&jar, b"not a zip").unwrap();

        let manifest = ManifestFile::new();
        assert!(rewrite_manifest(&jar, &manifest).is_err());
        assert_eq!(fs::read(&jar).unwrap(), b"not a zip");
        assert!(!temp.path().join("archive.jar.tmp").exists());
    }

    #[test]
    fn test_temp_sibling_name() {
        assert_eq!(
            temp_sibling(Path::new("/w/archive/archive.jar")),
            PathBuf::from("/w/archive/archive.jar.tmp")
        );
    }
}
