use std::fs;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "xtask", about = "typist maintainer tasks")]
struct Cli {
    #[command(subcommand)]
    command: Option<CommandName>,
}

#[derive(Debug, Default, Subcommand)]
enum CommandName {
    /// Update default_config.toml by running `typist config generate`.
    #[default]
    UpdateDefaultConfig,
    /// Fail if default_config.toml is out of date.
    CheckDefaultConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or_default() {
        CommandName::UpdateDefaultConfig => update_default_config(),
        CommandName::CheckDefaultConfig => check_default_config(),
    }
}

fn default_config_path(root: &std::path::Path) -> PathBuf {
    root.join("crates")
        .join("typist-core")
        .join("default_config.toml")
}

fn generate_config(root: &std::path::Path) -> Result<Vec<u8>> {
    let output = Command::new("cargo")
        .current_dir(root)
        .arg("run")
        .arg("-p")
        .arg("typist-cli")
        .arg("--")
        .arg("config")
        .arg("generate")
        .output()
        .context("run `cargo run -p typist-cli -- config generate`")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("config generate failed: {stderr}");
    }
    Ok(output.stdout)
}

fn update_default_config() -> Result<()> {
    let root = project_root()?;
    let dest = default_config_path(&root);
    let generated = generate_config(&root)?;

    fs::write(&dest, &generated)
        .with_context(|| format!("write config to {}", dest.display()))?;

    println!("Updated {}", dest.display());
    Ok(())
}

fn check_default_config() -> Result<()> {
    let root = project_root()?;
    let dest = default_config_path(&root);
    let generated = generate_config(&root)?;
    let current =
        fs::read(&dest).with_context(|| format!("read config from {}", dest.display()))?;

    if current != generated {
        bail!(
            "{} is stale; run `cargo run -p xtask -- update-default-config`",
            dest.display()
        );
    }
    println!("{} is up to date", dest.display());
    Ok(())
}

fn project_root() -> Result<PathBuf> {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    // crates/xtask -> workspace root
    let root = manifest_dir
        .parent()
        .and_then(|crates| crates.parent())
        .context("locate workspace root from CARGO_MANIFEST_DIR")?;
    Ok(root.to_path_buf())
}
