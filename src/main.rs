// src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use jarnative::packager::parse_manifest_entry;
use jarnative::{Packager, PackagerArch, PackagerConfig};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "jarnative")]
#[command(author, version, about = "Wrap a runnable JAR into a native executable", long_about = None)]
struct Cli {
    /// JAR to package
    source: Option<PathBuf>,

    /// Configuration file (TOML); flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target architecture (x86_64 or x86)
    #[arg(short, long)]
    arch: Option<PackagerArch>,

    /// Build in release mode
    #[arg(long)]
    release: bool,

    /// Application name shown by the launcher
    #[arg(short = 'n', long)]
    app_name: Option<String>,

    /// Minimum Java version (5 - 21)
    #[arg(long)]
    min_java: Option<u32>,

    /// Preferred Java version, offered for download (5 - 21)
    #[arg(long)]
    preferred_java: Option<u32>,

    /// Extra flags passed to java
    #[arg(long)]
    launch_flags: Option<String>,

    /// Prompt shown when Java is missing (may contain one %d)
    #[arg(long)]
    install_prompt: Option<String>,

    /// Directory to write the executable to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Executable name, without extension
    #[arg(long)]
    output_name: Option<String>,

    /// Download a toolchain if none is found (Windows)
    #[arg(long)]
    auto_install: bool,

    /// Hide the attribution banner in the launcher
    #[arg(long)]
    no_attribution: bool,

    /// Set a manifest entry (KEY=VALUE), may be repeated
    #[arg(short, long = "manifest", value_name = "KEY=VALUE")]
    manifest: Vec<String>,

    /// Remove a manifest entry, may be repeated
    #[arg(long = "remove-manifest", value_name = "KEY")]
    remove_manifest: Vec<String>,

    /// Keep the working directory after packaging
    #[arg(long)]
    keep_workdir: bool,

    /// Log debug output
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let packager = jarnative::create_packager();
    configure(&packager, &cli)?;

    info!("Working directory: {}", packager.work_dir().display());
    let result = run(&packager);

    if cli.keep_workdir {
        info!("Kept working directory {}", packager.work_dir().display());
    } else if let Err(e) = packager.close() {
        error!("{}", e);
    }

    result?;
    println!("{}", packager.output_file().display());
    Ok(())
}

fn configure(packager: &Packager, cli: &Cli) -> Result<()> {
    if let Some(path) = &cli.config {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = PackagerConfig::parse(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.apply(packager)?;
    }

    if let Some(source) = &cli.source {
        packager.set_source(Some(source.clone()));
    }
    if let Some(arch) = cli.arch {
        packager.set_arch(arch);
    }
    if cli.release {
        packager.set_release(true);
    }
    if let Some(name) = &cli.app_name {
        packager.set_app_name(Some(name.clone()));
    }
    if let Some(version) = cli.preferred_java {
        packager.set_preferred_java_version(version)?;
    }
    if let Some(version) = cli.min_java {
        packager.set_min_java_version(version)?;
    }
    if let Some(flags) = &cli.launch_flags {
        packager.set_launch_flags(flags.clone());
    }
    if let Some(prompt) = &cli.install_prompt {
        packager.set_install_prompt(Some(prompt))?;
    }
    if let Some(dir) = &cli.output_dir {
        packager.set_output_dir(Some(dir.clone()));
    }
    if let Some(name) = &cli.output_name {
        packager.set_output_name(Some(name.clone()));
    }
    if cli.auto_install {
        packager.set_auto_install(true);
    }
    if cli.no_attribution {
        packager.set_attribution_enabled(false);
    }

    let mut mutator = packager.manifest();
    for entry in &cli.manifest {
        let (key, value) = parse_manifest_entry(entry)?;
        mutator.put(key, value);
    }
    for key in &cli.remove_manifest {
        mutator.remove(key.clone());
    }
    Ok(())
}

fn run(packager: &Packager) -> Result<()> {
    while let Some(stage) = packager.next_stage() {
        info!("Stage: {}", stage);
        packager
            .execute_stage()
            .with_context(|| format!("Stage \"{}\" failed", stage))?;
    }
    Ok(())
}
