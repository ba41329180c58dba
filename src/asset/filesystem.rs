// src/asset/filesystem.rs

//! Asset source backed by a directory tree

use super::{AssetEntity, AssetPath, AssetSource, AssetStream};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// Serves assets from a directory on disk
#[derive(Debug, Clone)]
pub struct DirectoryAssetSource {
    root: PathBuf,
}

impl DirectoryAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &AssetPath) -> PathBuf {
        let mut resolved = self.root.clone();
        for part in path.parts() {
            resolved.push(part);
        }
        resolved
    }
}

impl AssetSource for DirectoryAssetSource {
    fn sub(&self, path: &AssetPath) -> Box<dyn AssetSource> {
        Box::new(Self::new(self.resolve(path)))
    }

    fn list(&self) -> io::Result<Vec<AssetEntity>> {
        if !self.root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("Path \"{}\" is not a directory", self.root.display()),
            ));
        }

        let mut entities = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            if path.is_dir() {
                entities.push(AssetEntity::Directory(name));
            } else if path.is_file() {
                entities.push(AssetEntity::File(name));
            }
        }
        Ok(entities)
    }

    fn read(&self, path: &AssetPath) -> io::Result<AssetStream> {
        let file = File::open(self.resolve(path))?;
        Ok(Box::new(file))
    }
}
