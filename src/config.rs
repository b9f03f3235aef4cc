use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Engine settings, loadable from a TOML file.
///
/// These are the per-context knobs the pipeline threads explicitly: the
/// deferred-loading policy for lookup references, the context-level
/// version-check override, and the logging section consumed by
/// `utils::logging`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Resolve lookup references on first access (`true`) or eagerly at
    /// materialization time (`false`).
    pub deferred_loading: bool,
    /// Context-level version-check policy. `Some(_)` overrides both the
    /// list-level override and the type-level default.
    pub version_check: Option<bool>,
    pub log: LogSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogSettings {
    pub level: String,
    pub dir: String,
    pub file: String,
    pub max_file_size: u64,
    pub max_files: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            deferred_loading: true,
            version_check: None,
            log: LogSettings::default(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: "logs".to_string(),
            file: "listquery".to_string(),
            max_file_size: 100 * 1024 * 1024, // 100MB
            max_files: 5,
        }
    }
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert!(settings.deferred_loading);
        assert!(settings.version_check.is_none());
        assert_eq!(settings.log.level, "info");
    }

    #[test]
    fn test_settings_roundtrip() {
        let mut settings = Settings::default();
        settings.deferred_loading = false;
        settings.version_check = Some(true);

        let file = NamedTempFile::new().unwrap();
        settings.save(file.path()).unwrap();
        let loaded = Settings::load(file.path()).unwrap();
        assert!(!loaded.deferred_loading);
        assert_eq!(loaded.version_check, Some(true));
    }

    #[test]
    fn test_settings_load_partial_fails() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "deferred_loading = \"maybe\"").unwrap();
        assert!(Settings::load(file.path()).is_err());
    }
}
