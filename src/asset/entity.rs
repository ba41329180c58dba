// src/asset/entity.rs

//! Named entries returned when listing an asset source

/// A file or directory inside an asset source.
///
/// Entities carry identity only; contents are read through the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetEntity {
    File(String),
    Directory(String),
}

impl AssetEntity {
    pub fn file(name: impl Into<String>) -> Self {
        Self::File(name.into())
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self::Directory(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            Self::File(name) | Self::Directory(name) => name,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory(_))
    }
}
