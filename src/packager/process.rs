// src/packager/process.rs

//! External process and network collaborators used by the build stages

use crate::error::{Error, Result};
use reqwest::blocking::Client;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{debug, info};

/// Connect timeout for toolchain downloads
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Overall timeout for toolchain downloads (the archives are large)
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Run `command` to completion, logging its combined output line by line.
///
/// Each line is logged at info level prefixed with `[tag]`. A non-zero exit
/// is a stage failure.
pub fn run_logged(mut command: Command, tag: &str) -> Result<()> {
    let (reader, writer) =
        io::pipe().map_err(|e| Error::io(format!("Failed to create output pipe for {}", tag), e))?;
    let writer_err = writer
        .try_clone()
        .map_err(|e| Error::io(format!("Failed to create output pipe for {}", tag), e))?;

    command
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(writer_err);
    debug!("[{}] running {:?}", tag, command);

    let mut child = command
        .spawn()
        .map_err(|e| Error::process(format!("Failed to run {}", tag), e))?;
    // Drop our copies of the write end so the read loop sees EOF on exit
    drop(command);

    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| Error::process(format!("Failed to read output of {}", tag), e))?;
        if read == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&line);
        info!("[{}] {}", tag, text.trim_end_matches(['\r', '\n']));
    }

    let status = child
        .wait()
        .map_err(|e| Error::process(format!("Failed to wait for {}", tag), e))?;
    if !status.success() {
        return Err(Error::failed(match status.code() {
            Some(code) => format!("{} exited with non-zero exit code: {}", tag, code),
            None => format!("{} was terminated by a signal", tag),
        }));
    }
    Ok(())
}

/// Download `url` to `dest`, failing on any non-success HTTP status
pub fn download(url: &str, dest: &Path) -> Result<u64> {
    info!("Downloading {} to {}", url, dest.display());

    let client = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .map_err(|e| Error::download("Failed to create HTTP client", e))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| Error::download(format!("Failed to fetch {}", url), e))?;
    if !response.status().is_success() {
        return Err(Error::failed(format!(
            "Unexpected HTTP status {} from {}",
            response.status(),
            url
        )));
    }

    let mut file = File::create(dest)
        .map_err(|e| Error::io(format!("Failed to create {}", dest.display()), e))?;
    let copied = io::copy(&mut response, &mut file)
        .map_err(|e| Error::io(format!("Failed to write downloaded data to {}", dest.display()), e))?;
    debug!("Downloaded {} bytes from {}", copied, url);
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_run_logged_success() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo out; echo err 1>&2"]);
        run_logged(cmd, "sh").unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_run_logged_exit_code() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "exit 3"]);
        let err = run_logged(cmd, "sh").unwrap_err();
        assert_eq!(err.to_string(), "sh exited with non-zero exit code: 3");
    }

    #[test]
    fn test_run_logged_missing_program() {
        let cmd = Command::new("jarnative-no-such-program");
        let err = run_logged(cmd, "missing").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
