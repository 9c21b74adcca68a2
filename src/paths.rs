//! Config file location.
//!
//! Resolution order for [`config_dir`]:
//! 1. `HOTFIXER_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/hotfixer` (if set)
//! 3. `~/.config/hotfixer`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "HOTFIXER_CONFIG_DIR";

const CONFIG_FILE: &str = "config.toml";

/// Get the hotfixer config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand_path(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("hotfixer");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("hotfixer"))
}

/// Default config file, `<config_dir>/config.toml`
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Expand `~` and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).map_or_else(|_| shellexpand::tilde(path), |s| s);
    PathBuf::from(expanded.into_owned())
}

/// Expand a path given on the command line or in the config file.
pub fn expand(path: &Path) -> PathBuf {
    path.to_str().map_or_else(|| path.to_path_buf(), expand_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_path("~/.ssh/id_rsa"), home.join(".ssh/id_rsa"));
    }

    #[test]
    fn test_expand_absolute_is_unchanged() {
        assert_eq!(
            expand(Path::new("/home/ops/.ssh/id_rsa")),
            PathBuf::from("/home/ops/.ssh/id_rsa")
        );
    }

    #[test]
    fn test_config_file_name() {
        let file = config_file().unwrap();
        assert_eq!(file.file_name().unwrap(), "config.toml");
    }
}
