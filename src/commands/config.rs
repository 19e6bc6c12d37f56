use std::path::{Path, PathBuf};

use serde::Serialize;

use super::CommandResult;
use crate::Result;
use crate::config::{ConfigEntry, ConfigOverrides, default_config_path, resolve_config};

#[derive(Serialize)]
pub struct ConfigShow {
    pub path: Option<PathBuf>,
    pub exists: bool,
    pub settings: Vec<ConfigEntry>,
}

impl CommandResult for ConfigShow {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        match self.path {
            Some(ref path) if self.exists => lines.push(format!("Config file: {}", path.display())),
            Some(ref path) => lines.push(format!("Config file: {} (not found)", path.display())),
            None => lines.push("Config file: (no config directory)".to_string()),
        }
        lines.push(String::new());

        let width = self.settings.iter().map(|e| e.key.len()).max().unwrap_or(0);
        for entry in &self.settings {
            match (&entry.value, &entry.source) {
                (Some(value), Some(source)) => lines.push(format!(
                    "  {:width$}  {}  ({})",
                    entry.key,
                    value,
                    source,
                    width = width
                )),
                _ => lines.push(format!("  {:width$}  (not set)", entry.key, width = width)),
            }
        }
        lines.join("\n")
    }
}

/// Resolve settings and report each value with its origin.
pub fn config_show(config_path: Option<&Path>) -> Result<ConfigShow> {
    let resolved = resolve_config(config_path, &ConfigOverrides::new())?;
    let path = config_path.map(Path::to_path_buf).or_else(default_config_path);
    Ok(ConfigShow {
        exists: path.as_deref().is_some_and(Path::exists),
        path,
        settings: resolved.entries(),
    })
}

#[derive(Serialize)]
pub struct ConfigPath {
    pub path: Option<PathBuf>,
    pub exists: bool,
}

impl CommandResult for ConfigPath {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
    }

    fn to_human(&self) -> String {
        match self.path {
            Some(ref path) => path.display().to_string(),
            None => "(no config directory)".to_string(),
        }
    }
}

pub fn config_path(config_path: Option<&Path>) -> ConfigPath {
    let path = config_path.map(Path::to_path_buf).or_else(default_config_path);
    ConfigPath {
        exists: path.as_deref().is_some_and(Path::exists),
        path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_path_reports_existence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.kdl");
        assert!(!config_path(Some(&path)).exists);

        std::fs::write(&path, "").unwrap();
        let result = config_path(Some(&path));
        assert!(result.exists);
        assert_eq!(result.to_human(), path.display().to_string());
    }

    #[test]
    #[serial_test::serial]
    fn test_config_show_lists_file_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.kdl");
        std::fs::write(&path, "folder \"projects\"\ntree-depth 2\n").unwrap();

        let result = config_show(Some(&path)).unwrap();
        assert!(result.exists);
        let folder = result.settings.iter().find(|e| e.key == "folder").unwrap();
        assert_eq!(folder.value.as_deref(), Some("projects"));
        assert_eq!(folder.source.as_deref(), Some("file"));

        let human = result.to_human();
        assert!(human.contains("tree-depth"));
        assert!(human.contains("(file)"));
    }
}
