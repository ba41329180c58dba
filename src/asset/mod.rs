// src/asset/mod.rs

//! Bundled asset access
//!
//! The native launcher template ships as a tree of files. Depending on how
//! jarnative is installed that tree is either a plain directory or a ZIP
//! archive; [`AssetSource`] hides the difference behind three operations:
//! narrow to a sub-path, list immediate children, and read a file.

mod archive;
mod entity;
mod filesystem;
mod path;

pub use archive::ArchiveAssetSource;
pub use entity::AssetEntity;
pub use filesystem::DirectoryAssetSource;
pub use path::AssetPath;

use std::fmt;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::debug;

/// Environment variable naming an asset root (directory or archive)
pub const ASSETS_ENV: &str = "JARNATIVE_ASSETS";

/// Byte stream returned by [`AssetSource::read`]
pub type AssetStream = Box<dyn Read + Send>;

/// A scoped root of readable assets
pub trait AssetSource: Send + Sync + fmt::Debug {
    /// A new source rooted at `path` below this one
    fn sub(&self, path: &AssetPath) -> Box<dyn AssetSource>;

    /// The immediate children of this source's root
    fn list(&self) -> io::Result<Vec<AssetEntity>>;

    /// Open the file at `path` below this source's root
    fn read(&self, path: &AssetPath) -> io::Result<AssetStream>;

    fn sub_str(&self, path: &str) -> Box<dyn AssetSource> {
        self.sub(&AssetPath::parse(path))
    }

    fn read_str(&self, path: &str) -> io::Result<AssetStream> {
        self.read(&AssetPath::parse(path))
    }
}

/// Open an asset root, picking the variant from what `path` is on disk
pub fn open(path: impl Into<PathBuf>) -> io::Result<Box<dyn AssetSource>> {
    let path = path.into();
    if path.is_dir() {
        Ok(Box::new(DirectoryAssetSource::new(path)))
    } else if path.is_file() {
        Ok(Box::new(ArchiveAssetSource::new(path)))
    } else {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Asset root \"{}\" is not a regular file or directory", path.display()),
        ))
    }
}

/// Locate the bundled assets.
///
/// Checked in order: `$JARNATIVE_ASSETS`, `<exe>/../share/jarnative`,
/// `<exe>/assets.zip`, then the crate source directory for development
/// builds. The launcher template lives under `tool/` in whichever root wins.
pub fn resources() -> io::Result<Box<dyn AssetSource>> {
    if let Ok(path) = std::env::var(ASSETS_ENV) {
        debug!("Using assets from ${}: {}", ASSETS_ENV, path);
        return open(path);
    }

    let mut candidates = Vec::new();
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    {
        candidates.push(exe_dir.join("../share/jarnative"));
        candidates.push(exe_dir.join("assets.zip"));
    }
    candidates.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")));

    for candidate in candidates {
        if candidate.join("tool").is_dir() || candidate.is_file() {
            debug!("Using assets from {}", candidate.display());
            return open(candidate);
        }
    }

    Err(io::Error::new(
        io::ErrorKind::NotFound,
        format!("Bundled assets not found (set ${} to override)", ASSETS_ENV),
    ))
}
