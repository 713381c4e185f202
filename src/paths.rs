//! Where MSpace keeps its config and exported renderings.
//!
//! Each directory comes from an `MSPACE_*` override when it is set to an
//! absolute path (after `~` expansion), otherwise from the platform's XDG
//! base directories via `etcetera`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "mspace";

pub const CONFIG_DIR_VAR: &str = "MSPACE_CONFIG_DIR";
pub const DATA_DIR_VAR: &str = "MSPACE_DATA_DIR";
pub const EXPORT_DIR_VAR: &str = "MSPACE_EXPORT_DIR";

#[derive(Debug, Clone)]
pub struct Paths {
    /// Holds config.toml
    pub config_dir: PathBuf,

    pub data_dir: PathBuf,

    /// Default target for exported PNGs; `data_dir/exports` unless overridden
    pub export_dir: PathBuf,
}

impl Paths {
    pub fn resolve() -> Result<Self> {
        Self::resolve_with_env(|key| std::env::var(key))
    }

    /// Resolve against a custom env lookup (tests pass a map).
    pub fn resolve_with_env<F>(env_fn: F) -> Result<Self>
    where
        F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
    {
        use etcetera::BaseStrategy;

        let strategy = etcetera::choose_base_strategy()
            .map_err(|e| anyhow::anyhow!("Failed to determine base directories: {}", e))?;

        let config_dir = dir_override(&env_fn, CONFIG_DIR_VAR)
            .unwrap_or_else(|| strategy.config_dir().join(APP_DIR));
        let data_dir = dir_override(&env_fn, DATA_DIR_VAR)
            .unwrap_or_else(|| strategy.data_dir().join(APP_DIR));
        let export_dir =
            dir_override(&env_fn, EXPORT_DIR_VAR).unwrap_or_else(|| data_dir.join("exports"));

        Ok(Self {
            config_dir,
            data_dir,
            export_dir,
        })
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Create the config and data directories (mode 0700 on unix).
    /// The export directory is created when something is exported.
    pub fn ensure_dirs(&self) -> Result<()> {
        create_private_dir(&self.config_dir)?;
        create_private_dir(&self.data_dir)
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::resolve().unwrap_or_else(|_| {
            let home = etcetera::home_dir().unwrap_or_else(|_| PathBuf::from("."));
            let data_dir = home.join(".local/share").join(APP_DIR);
            Self {
                config_dir: home.join(".config").join(APP_DIR),
                export_dir: data_dir.join("exports"),
                data_dir,
            }
        })
    }
}

/// An absolute directory from `var`; empty and relative values are ignored.
fn dir_override<F>(env_fn: &F, var: &str) -> Option<PathBuf>
where
    F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
{
    let value = env_fn(var).ok()?;
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Some(PathBuf::from(shellexpand::tilde(value).into_owned())).filter(|p| p.is_absolute())
}

fn create_private_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(
        pairs: &[(&'static str, &'static str)],
    ) -> impl Fn(&str) -> std::result::Result<String, std::env::VarError> {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |key: &str| {
            map.get(key)
                .map(|v| v.to_string())
                .ok_or(std::env::VarError::NotPresent)
        }
    }

    #[test]
    fn defaults_live_under_app_dirs() {
        let paths = Paths::resolve_with_env(env_of(&[])).unwrap();

        assert!(paths.config_dir.ends_with(APP_DIR), "{:?}", paths.config_dir);
        assert!(paths.data_dir.ends_with(APP_DIR), "{:?}", paths.data_dir);
        assert_eq!(paths.export_dir, paths.data_dir.join("exports"));
        assert!(paths.config_file().ends_with("mspace/config.toml"));
    }

    #[test]
    fn overrides_replace_config_and_data() {
        let paths = Paths::resolve_with_env(env_of(&[
            (CONFIG_DIR_VAR, "/custom/config"),
            (DATA_DIR_VAR, "/custom/data"),
        ]))
        .unwrap();

        assert_eq!(paths.config_dir, PathBuf::from("/custom/config"));
        assert_eq!(paths.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(paths.export_dir, PathBuf::from("/custom/data/exports"));
    }

    #[test]
    fn relative_and_blank_overrides_are_ignored() {
        let paths = Paths::resolve_with_env(env_of(&[
            (CONFIG_DIR_VAR, "relative/path"),
            (DATA_DIR_VAR, "   "),
        ]))
        .unwrap();

        assert!(paths.config_dir.is_absolute());
        assert!(paths.data_dir.ends_with(APP_DIR));
    }

    #[test]
    fn export_override_is_independent_of_data_dir() {
        let paths =
            Paths::resolve_with_env(env_of(&[(EXPORT_DIR_VAR, "/srv/renders")])).unwrap();

        assert_eq!(paths.export_dir, PathBuf::from("/srv/renders"));
        assert!(paths.data_dir.ends_with(APP_DIR));
    }

    #[test]
    fn ensure_dirs_creates_config_and_data_only() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths {
            config_dir: tmp.path().join("config"),
            data_dir: tmp.path().join("data"),
            export_dir: tmp.path().join("exports"),
        };

        paths.ensure_dirs().unwrap();
        assert!(paths.config_dir.is_dir());
        assert!(paths.data_dir.is_dir());
        assert!(!paths.export_dir.exists());
    }
}
