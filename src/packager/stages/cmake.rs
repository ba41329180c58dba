// src/packager/stages/cmake.rs

//! `cmake`: configure the native build

use super::PackagerStage;
use crate::error::{Error, Result};
use crate::packager::{Packager, PackagerState, process};
use std::fs;
use std::process::Command;

#[derive(Debug, Clone, Copy, Default)]
pub struct CmakeStage;

impl PackagerStage for CmakeStage {
    fn id(&self) -> &'static str {
        "cmake"
    }

    fn execute(&self, packager: &Packager, state: &mut PackagerState) -> Result<()> {
        let build_dir = packager.work_dir().join("cmake");
        fs::create_dir_all(&build_dir).map_err(|e| {
            Error::io(
                format!(
                    "Path \"{}\" is not a directory and could not be created",
                    build_dir.display()
                ),
                e,
            )
        })?;

        let mut cmd = Command::new("cmake");
        cmd.current_dir(&build_dir)
            .args(cmake_args(packager.is_release(), packager.arch().is_64bit()))
            .args(toolchain_args(state));
        process::run_logged(cmd, "cmake")?;

        state.build_dir = Some(build_dir);
        Ok(())
    }
}

fn generator() -> &'static str {
    if cfg!(windows) { "MinGW Makefiles" } else { "Unix Makefiles" }
}

fn cmake_args(release: bool, is_64bit: bool) -> Vec<String> {
    let build_type = if release { "Release" } else { "Debug" };
    let mut args = vec![
        "-G".to_string(),
        generator().to_string(),
        "..".to_string(),
        format!("-DCMAKE_BUILD_TYPE={}", build_type),
    ];
    if !is_64bit {
        args.push("-DCMAKE_C_FLAGS=-m32".to_string());
    }
    args
}

/// Point CMake at a toolchain that may not be on PATH
fn toolchain_args(state: &PackagerState) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(compiler) = &state.c_compiler {
        args.push(format!("-DCMAKE_C_COMPILER={}", compiler.display()));
    }
    if let Some(make) = &state.make_program {
        args.push(format!("-DCMAKE_MAKE_PROGRAM={}", make.display()));
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmake_args() {
        let args = cmake_args(true, true);
        assert_eq!(args[0], "-G");
        assert_eq!(args[2], "..");
        assert_eq!(args[3], "-DCMAKE_BUILD_TYPE=Release");
        assert_eq!(args.len(), 4);

        let args = cmake_args(false, false);
        assert_eq!(args[3], "-DCMAKE_BUILD_TYPE=Debug");
        assert_eq!(args[4], "-DCMAKE_C_FLAGS=-m32");
    }

    #[test]
    fn test_toolchain_args() {
        assert!(toolchain_args(&PackagerState::default()).is_empty());

        let state = PackagerState {
            c_compiler: Some("C:/mingw/bin/gcc.exe".into()),
            make_program: Some("C:/mingw/bin/mingw32-make.exe".into()),
            ..Default::default()
        };
        assert_eq!(
            toolchain_args(&state),
            vec![
                "-DCMAKE_C_COMPILER=C:/mingw/bin/gcc.exe".to_string(),
                "-DCMAKE_MAKE_PROGRAM=C:/mingw/bin/mingw32-make.exe".to_string(),
            ]
        );
    }
}
