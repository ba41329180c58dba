// src/packager/stages/make.rs

//! `make`: build the launcher in the configured build directory

use super::PackagerStage;
use crate::error::{Error, Result};
use crate::packager::{Packager, PackagerState, process};
use std::process::Command;

#[derive(Debug, Clone, Copy, Default)]
pub struct MakeStage;

impl PackagerStage for MakeStage {
    fn id(&self) -> &'static str {
        "make"
    }

    fn execute(&self, _packager: &Packager, state: &mut PackagerState) -> Result<()> {
        let build_dir = state
            .build_dir
            .as_ref()
            .ok_or_else(|| Error::failed("Build directory not configured (cmake has not run)"))?;

        let mut cmd = match &state.make_program {
            Some(program) => Command::new(program),
            None => Command::new("make"),
        };
        cmd.current_dir(build_dir);
        process::run_logged(cmd, "make")
    }
}
