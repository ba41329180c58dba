// src/packager/stages/mingw.rs

//! `mingw`: locate or install a MinGW toolchain (Windows hosts)
//!
//! The toolchain is a winlibs ZIP release, extracted next to the packager
//! working directories so later packagers reuse it.

use super::PackagerStage;
use crate::error::{Error, Result};
use crate::packager::process;
use crate::packager::{Packager, PackagerArch, PackagerState};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::ZipArchive;

const URL_64: &str = "https://github.com/brechtsanders/winlibs_mingw/releases/download/14.2.0posix-19.1.1-12.0.0-ucrt-r2/winlibs-x86_64-posix-seh-gcc-14.2.0-llvm-19.1.1-mingw-w64ucrt-12.0.0-r2.zip";
const URL_32: &str = "https://github.com/brechtsanders/winlibs_mingw/releases/download/14.2.0posix-19.1.1-12.0.0-ucrt-r2/winlibs-i686-posix-dwarf-gcc-14.2.0-llvm-19.1.1-mingw-w64ucrt-12.0.0-r2.zip";

const MAKE_EXE: &str = "mingw32-make.exe";

#[derive(Debug, Clone, Copy, Default)]
pub struct MingwStage;

impl PackagerStage for MingwStage {
    fn id(&self) -> &'static str {
        "mingw"
    }

    fn execute(&self, packager: &Packager, state: &mut PackagerState) -> Result<()> {
        let arch = packager.arch();
        let gcc = match which::which(gcc_name(arch)) {
            Ok(path) => path,
            Err(_) if !packager.is_auto_install() => {
                return Err(Error::failed("MinGW GCC not found on PATH"));
            }
            Err(_) => {
                info!(
                    "[mingw] installing ({}-bit)...",
                    if arch.is_64bit() { 64 } else { 32 }
                );
                let gcc = install(packager.work_dir(), arch)?;
                info!("[mingw] installed @ {}", gcc.display());
                gcc
            }
        };

        let make = gcc
            .parent()
            .map(|dir| dir.join(MAKE_EXE))
            .filter(|path| path.is_file())
            .ok_or_else(|| {
                Error::failed(format!("MinGW Make not found (found {})", gcc.display()))
            })?;

        debug!("Using {} and {}", gcc.display(), make.display());
        state.c_compiler = Some(gcc);
        state.make_program = Some(make);
        Ok(())
    }
}

fn gcc_name(arch: PackagerArch) -> String {
    format!("{}-w64-mingw32-gcc.exe", arch.mingw_prefix())
}

/// Path of the compiler inside an extracted toolchain rooted at `root`
fn installed_gcc(root: &Path, arch: PackagerArch) -> PathBuf {
    let top = if arch.is_64bit() { "mingw64" } else { "mingw32" };
    root.join(top).join("bin").join(gcc_name(arch))
}

fn install(work_dir: &Path, arch: PackagerArch) -> Result<PathBuf> {
    let root = work_dir
        .parent()
        .map(|p| p.join("mingw"))
        .ok_or_else(|| Error::failed("Working directory has no parent"))?;
    let compiler = installed_gcc(&root, arch);
    if compiler.exists() {
        debug!("Reusing toolchain at {}", root.display());
        return Ok(compiler);
    }

    fs::create_dir_all(&root)
        .map_err(|e| Error::io(format!("Failed to create directory \"{}\"", root.display()), e))?;

    let temp = tempfile::tempdir()
        .map_err(|e| Error::io("Failed to create download directory", e))?;
    let archive_path = temp.path().join("mingw.zip");
    let url = if arch.is_64bit() { URL_64 } else { URL_32 };
    process::download(url, &archive_path)?;

    let file = File::open(&archive_path)
        .map_err(|e| Error::io(format!("Failed to open {}", archive_path.display()), e))?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| Error::archive("Failed to read MinGW archive", e))?;
    archive
        .extract(&root)
        .map_err(|e| Error::archive("Failed to automatically install MinGW", e))?;

    if !compiler.is_file() {
        return Err(Error::failed(format!(
            "MinGW archive did not contain {}",
            compiler.display()
        )));
    }
    Ok(compiler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gcc_names() {
        assert_eq!(gcc_name(PackagerArch::X86_64), "x86_64-w64-mingw32-gcc.exe");
        assert_eq!(gcc_name(PackagerArch::X86), "i686-w64-mingw32-gcc.exe");
    }

    #[test]
    fn test_installed_gcc_layout() {
        let root = Path::new("/data/mingw");
        assert_eq!(
            installed_gcc(root, PackagerArch::X86),
            root.join("mingw32/bin/i686-w64-mingw32-gcc.exe")
        );
    }

    #[test]
    fn test_install_reuses_existing_extraction() {
        let temp = tempfile::tempdir().unwrap();
        let work = temp.path().join("I0000abcd");
        let gcc = installed_gcc(&temp.path().join("mingw"), PackagerArch::X86_64);
        fs::create_dir_all(gcc.parent().unwrap()).unwrap();
        fs::write(&gcc, b"").unwrap();

        assert_eq!(install(&work, PackagerArch::X86_64).unwrap(), gcc);
    }

    #[test]
    #[ignore = "downloads a MinGW toolchain"]
    fn test_install_downloads_toolchain() {
        let temp = tempfile::tempdir().unwrap();
        let work = temp.path().join("work");
        let gcc = install(&work, PackagerArch::X86_64).unwrap();
        assert!(gcc.is_file());
    }
}
