// src/lib.rs

//! JARNative
//!
//! Wraps a runnable JAR into a native executable. The executable carries the
//! JAR, looks for a suitable Java installation when launched, offers to
//! install one if none is found, and then runs the application.
//!
//! # Pipeline
//!
//! A [`Packager`] runs a fixed sequence of stages:
//!
//! - `init`: extract the C launcher template into a private working directory
//! - `inject`: link or copy the source JAR into the working directory
//! - `manifest`: apply manifest edits, infer the minimum Java version
//! - `vars`: write the configuration block of `main.c`
//! - `mingw` (Windows only): locate or install a MinGW toolchain
//! - `cmake` / `make`: build the launcher
//! - `export`: copy the launcher to the output file

pub mod archive;
pub mod asset;
pub mod bytecode;
mod error;
pub mod manifest;
pub mod optimus;
pub mod packager;
pub mod stream;
pub mod template;

pub use error::{ConfigError, Error, ManifestError, Result};
pub use manifest::{ManifestFile, ManifestMutator, ManifestOperation};
pub use optimus::Optimus;
pub use packager::{Packager, PackagerArch, PackagerConfig, PackagerStage, PackagerState};

use std::path::PathBuf;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU32, Ordering};

/// Name of the per-user data directory
pub const DATA_DIR_NAME: &str = "jarnative";

/// Scrambles instance numbers into working directory names
static OPTIMUS: LazyLock<Optimus> = LazyLock::new(Optimus::generate);

/// Next instance number; starts at 1 for each process
static INSTANCE_COUNTER: AtomicU32 = AtomicU32::new(1);

/// Root of all packager working directories
///
/// `<local data dir>/jarnative`, or the system temp directory when the
/// platform has no local data directory.
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(DATA_DIR_NAME)
}

/// Working directory name for instance `id`: `I` and 8 lowercase hex digits
pub fn instance_dir_name(id: u32) -> String {
    format!("I{:08x}", id)
}

/// A fresh working directory path under [`data_dir`]
pub fn next_instance_dir() -> PathBuf {
    let id = INSTANCE_COUNTER.fetch_add(1, Ordering::Relaxed);
    data_dir().join(instance_dir_name(OPTIMUS.encode(id)))
}

/// Create a packager with its own working directory.
///
/// The directory is created by the first stage and deleted by
/// [`Packager::close`].
pub fn create_packager() -> Packager {
    Packager::new(next_instance_dir())
}
