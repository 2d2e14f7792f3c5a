use std::path::PathBuf;

use anyhow::{Context, bail};
use cloudsift_config::{STARTER_CONFIG, STARTER_ENV};

use crate::cli::{InitArgs, InitCommand};

pub fn run(command: InitCommand) -> anyhow::Result<()> {
    let written = match command {
        InitCommand::Config(args) => write_starter(&args, "cloudsift.toml", STARTER_CONFIG)?,
        InitCommand::Env(args) => write_starter(&args, ".env", STARTER_ENV)?,
    };
    println!("Created {}", written.display());
    Ok(())
}

/// Writes `contents` to the requested path, refusing to replace an existing
/// file unless `--force` is set.
fn write_starter(args: &InitArgs, default_name: &str, contents: &str) -> anyhow::Result<PathBuf> {
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_name));

    if path.exists() && !args.force {
        bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    std::fs::write(&path, contents)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(absolute(path))
}

fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(output: PathBuf, force: bool) -> InitArgs {
        InitArgs {
            output: Some(output),
            force,
        }
    }

    #[test]
    fn writes_into_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("conf/cloudsift.toml");

        let written = write_starter(&args(target.clone(), false), "cloudsift.toml", STARTER_CONFIG)
            .unwrap();

        assert!(written.is_absolute());
        assert_eq!(std::fs::read_to_string(&target).unwrap(), STARTER_CONFIG);
    }

    #[test]
    fn existing_file_needs_force() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join(".env");
        std::fs::write(&target, "KEEP=1\n").unwrap();

        let err = write_starter(&args(target.clone(), false), ".env", STARTER_ENV).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "KEEP=1\n");

        write_starter(&args(target.clone(), true), ".env", STARTER_ENV).unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), STARTER_ENV);
    }
}
