//! `arpin config`: show or write the effective configuration

use anyhow::{Context, Result};
use arpin_core::config::{default_config_path, save_config, ArConfig};
use std::path::PathBuf;

/// Print the configuration as TOML, or write it to `write`
pub fn execute(config: &ArConfig, write: Option<PathBuf>) -> Result<()> {
    match write {
        Some(path) => {
            save_config(config, &path).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote configuration to {}", path.display());
        }
        None => {
            let content = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
            if let Some(path) = default_config_path() {
                println!("# user config: {}", path.display());
            }
            print!("{content}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arpin_core::config::load_config;

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arpin.toml");
        let mut config = ArConfig::default();
        config.render.far_clip = 25.0;

        execute(&config, Some(path.clone())).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), config);
    }
}
