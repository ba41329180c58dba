// src/packager/state.rs

//! Mutable record shared by the stages of one packager

use std::path::PathBuf;

/// Paths resolved by earlier stages for later ones
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackagerState {
    /// CMake build directory, set by the `cmake` stage
    pub build_dir: Option<PathBuf>,

    /// C compiler handed to CMake, set by the `mingw` stage
    pub c_compiler: Option<PathBuf>,

    /// Make program to drive the build, set by the `mingw` stage
    pub make_program: Option<PathBuf>,
}
