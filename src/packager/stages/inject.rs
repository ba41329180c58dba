// src/packager/stages/inject.rs

//! `inject`: place the source archive in the working directory

use super::{PackagerStage, working_archive};
use crate::error::{Error, Result};
use crate::packager::{Packager, PackagerState};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct InjectStage;

impl PackagerStage for InjectStage {
    fn id(&self) -> &'static str {
        "inject"
    }

    fn execute(&self, packager: &Packager, _state: &mut PackagerState) -> Result<()> {
        let dest = working_archive(packager);
        let src = packager.source();

        if fs::symlink_metadata(&dest).is_ok() {
            fs::remove_file(&dest).map_err(|e| {
                Error::io("Failed to delete existing source in working directory", e)
            })?;
        }

        if !src.is_file() {
            return Err(Error::failed(format!(
                "Bad configuration (source \"{}\" is not a file)",
                src.display()
            )));
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::io(format!("Failed to create {}", parent.display()), e)
            })?;
        }

        match link(&src, &dest) {
            Ok(()) => debug!("Linked {} -> {}", dest.display(), src.display()),
            Err(e) => {
                debug!("Symlink failed: {}", e);
                info!("[inject] failed to create symlink, making full copy");
                fs::copy(&src, &dest).map_err(|e| {
                    Error::io(format!("Failed to copy file @ \"{}\"", src.display()), e)
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(unix)]
fn link(src: &Path, dest: &Path) -> io::Result<()> {
    // A relative target would resolve against the link's own directory
    let target = std::path::absolute(src)?;
    std::os::unix::fs::symlink(target, dest)
}

#[cfg(windows)]
fn link(src: &Path, dest: &Path) -> io::Result<()> {
    let target = std::path::absolute(src)?;
    std::os::windows::fs::symlink_file(target, dest)
}

#[cfg(not(any(unix, windows)))]
fn link(_src: &Path, _dest: &Path) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "symlinks unsupported"))
}
