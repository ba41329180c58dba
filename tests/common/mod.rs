// tests/common/mod.rs

//! Shared helpers for integration tests: JAR and class file builders.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jarnative::Packager;
use jarnative::asset::DirectoryAssetSource;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Minimal class file header for `major`: magic, minor 0, then the major
pub fn class_bytes(major: u16) -> Vec<u8> {
    let mut bytes = vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00];
    bytes.extend_from_slice(&major.to_be_bytes());
    bytes.extend_from_slice(&[0u8; 24]);
    bytes
}

/// Write a JAR at `path`.
///
/// `manifest` is written verbatim as `META-INF/MANIFEST.MF` when given.
/// Each class is stored as `<name with dots as slashes>.class`.
pub fn write_jar(path: &Path, manifest: Option<&str>, classes: &[(&str, u16)]) {
    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    if let Some(manifest) = manifest {
        zip.add_directory("META-INF/", SimpleFileOptions::default())
            .unwrap();
        zip.start_file("META-INF/MANIFEST.MF", deflated).unwrap();
        zip.write_all(manifest.as_bytes()).unwrap();
    }
    for (name, major) in classes {
        zip.start_file(format!("{}.class", name.replace('.', "/")), deflated)
            .unwrap();
        zip.write_all(&class_bytes(*major)).unwrap();
    }
    zip.finish().unwrap();
}

/// Read an entry of the JAR at `path` as UTF-8
pub fn read_entry(path: &Path, name: &str) -> Option<String> {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entry = archive.by_name(name).ok()?;
    let mut out = String::new();
    std::io::Read::read_to_string(&mut entry, &mut out).unwrap();
    Some(out)
}

/// A packager in `<root>/work` that takes its template tree from this crate
pub fn packager(root: &Path) -> Packager {
    let packager = Packager::new(root.join("work"));
    packager.set_assets(Some(Arc::new(DirectoryAssetSource::new(env!(
        "CARGO_MANIFEST_DIR"
    )))));
    packager.set_output_dir(Some(root.join("out")));
    packager
}

/// `<workdir>/archive/archive.jar`
pub fn working_archive(packager: &Packager) -> PathBuf {
    packager.work_dir().join("archive").join("archive.jar")
}
