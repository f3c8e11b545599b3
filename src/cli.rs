use std::{env, path::PathBuf};

use anyhow::{Result, anyhow};

const DEFAULT_CONFIG_FILE: &str = "lms-launch.jsonc";
const USAGE: &str = "usage: lms-launch [--config <path>]";

pub fn config_path_from_args() -> Result<PathBuf> {
    match parse_config_arg(env::args().skip(1))? {
        Some(path) => Ok(path),
        None => {
            let mut path = env::current_dir()?;
            path.push(DEFAULT_CONFIG_FILE);
            Ok(path)
        }
    }
}

/// Accepts `--config <path>`, `--config=<path>` or a bare `<path>`.
fn parse_config_arg(args: impl IntoIterator<Item = String>) -> Result<Option<PathBuf>> {
    let mut args = args.into_iter();
    let Some(first) = args.next() else {
        return Ok(None);
    };

    let path = if first == "--config" {
        args.next()
            .ok_or_else(|| anyhow!("--config expects a path. {USAGE}"))?
    } else if let Some(path) = first.strip_prefix("--config=") {
        path.to_string()
    } else if first.starts_with('-') {
        return Err(anyhow!("unknown option '{first}'. {USAGE}"));
    } else {
        first
    };

    if args.next().is_some() {
        return Err(anyhow!("expected at most one config path. {USAGE}"));
    }
    if path.trim().is_empty() {
        return Err(anyhow!("config path cannot be empty. {USAGE}"));
    }
    Ok(Some(PathBuf::from(path)))
}
