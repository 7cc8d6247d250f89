//! Configuration for scanning, layout and storage.
//!
//! Read from `<root>/.cartographer/config.toml` by the CLI. Every section and
//! field is optional; missing values fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{CartographerError, Result};

/// Name of the directory Cartographer writes its own artifacts into.
pub const STORAGE_DIR_NAME: &str = ".cartographer";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CartographerConfig {
    pub scanner: ScannerConfig,
    pub layout: LayoutConfig,
    pub storage: StorageConfig,
}

/// What the file discoverer considers a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Source file extension, with or without the leading dot.
    pub extension: String,
    /// Directory names skipped at any depth.
    pub excluded_dirs: Vec<String>,
    /// Bare file names that are never modules (package initializers, entry points).
    pub excluded_files: Vec<String>,
    /// Drop modules with no incoming and no outgoing edges after the build.
    pub prune_orphans: bool,
    /// Honour .gitignore / .git/info/exclude while walking.
    pub respect_gitignore: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        let excluded_dirs = [
            "venv",
            ".venv",
            "env",
            ".env",
            "__pycache__",
            ".git",
            "node_modules",
            ".idea",
            ".vscode",
            "tests",
            "test",
            "docs",
            "build",
            "dist",
            STORAGE_DIR_NAME,
        ];
        Self {
            extension: "py".to_string(),
            excluded_dirs: excluded_dirs.iter().map(|s| s.to_string()).collect(),
            excluded_files: vec!["__init__.py".to_string()],
            prune_orphans: false,
            respect_gitignore: true,
        }
    }
}

impl ScannerConfig {
    /// The extension without its leading dot (`"py"`).
    pub fn bare_extension(&self) -> &str {
        self.extension.trim_start_matches('.')
    }

    /// `__init__.<ext>` files mark packages and are never modules.
    pub fn is_package_initializer(&self, file_name: &str) -> bool {
        file_name
            .strip_prefix("__init__.")
            .is_some_and(|ext| ext == self.bare_extension())
    }

    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.excluded_dirs.iter().any(|d| d == name)
    }

    pub fn is_excluded_file(&self, name: &str) -> bool {
        self.excluded_files.iter().any(|f| f == name)
    }
}

/// Tunables for the hierarchical layout and the node weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Vertical distance between two layers.
    pub row_spacing: f64,
    /// Horizontal distance between two nodes of the same layer.
    pub column_spacing: f64,
    /// `K` in `impact = in_degree_centrality * K + 1`.
    pub impact_scale: f64,
    /// Nodes whose risk exceeds this are drawn with the hot palette.
    pub hot_threshold: f64,
    pub base_node_size: f64,
    /// Optimal distance for the spring-layout fallback.
    pub spring_k: f64,
    pub spring_iterations: usize,
    /// An explicit edge is a "long jump" when it spans more than
    /// `row_spacing * long_jump_factor` vertically.
    pub long_jump_factor: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            row_spacing: 10.0,
            column_spacing: 8.0,
            impact_scale: 10.0,
            hot_threshold: 20.0,
            base_node_size: 14000.0,
            spring_k: 4.0,
            spring_iterations: 50,
            long_jump_factor: 1.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage directory. Relative paths resolve against the project root.
    pub path: Option<PathBuf>,
    /// Risk scores strictly above this are listed in risk reports.
    pub high_risk_threshold: i64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            high_risk_threshold: 5,
        }
    }
}

impl CartographerConfig {
    /// Load config from a TOML file. Missing file means defaults; an unreadable
    /// or malformed file is logged and also yields defaults.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }
        let parsed = std::fs::read_to_string(path)
            .map_err(CartographerError::from)
            .and_then(|text| Self::from_toml_str(&text));
        match parsed {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid config, using defaults");
                Self::default()
            }
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Where graphs, reports and the index live for a project rooted at `root`.
    pub fn resolve_storage_dir(&self, root: &Path) -> PathBuf {
        match &self.storage.path {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => root.join(p),
            None => root.join(STORAGE_DIR_NAME),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_exclude_storage_dir() {
        let config = ScannerConfig::default();
        assert!(config.is_excluded_dir(STORAGE_DIR_NAME));
        assert!(config.is_excluded_dir("node_modules"));
        assert!(config.is_excluded_file("__init__.py"));
        assert_eq!(config.bare_extension(), "py");
    }

    #[test]
    fn test_package_initializer_follows_extension() {
        let config = ScannerConfig {
            extension: ".pyi".to_string(),
            excluded_files: Vec::new(),
            ..ScannerConfig::default()
        };
        assert!(config.is_package_initializer("__init__.pyi"));
        assert!(!config.is_package_initializer("__init__.py"));
        assert!(!config.is_package_initializer("init.pyi"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = CartographerConfig::from_toml_str(
            r#"
[scanner]
extension = ".pyi"
prune_orphans = true

[layout]
row_spacing = 4.0
"#,
        )
        .unwrap();
        assert_eq!(config.scanner.bare_extension(), "pyi");
        assert!(config.scanner.prune_orphans);
        assert!(config.scanner.is_excluded_dir("venv"));
        assert_eq!(config.layout.row_spacing, 4.0);
        assert_eq!(config.layout.column_spacing, 8.0);
        assert_eq!(config.storage.high_risk_threshold, 5);
    }

    #[test]
    fn test_malformed_toml_is_error() {
        assert!(CartographerConfig::from_toml_str("scanner = [").is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = CartographerConfig::load(Path::new("/definitely/not/here.toml"));
        assert_eq!(config.scanner.extension, "py");
    }

    #[test]
    fn test_resolve_storage_dir() {
        let mut config = CartographerConfig::default();
        let root = Path::new("/proj");
        assert_eq!(config.resolve_storage_dir(root), root.join(STORAGE_DIR_NAME));

        config.storage.path = Some(PathBuf::from("out"));
        assert_eq!(config.resolve_storage_dir(root), root.join("out"));

        config.storage.path = Some(PathBuf::from("/var/carto"));
        assert_eq!(config.resolve_storage_dir(root), PathBuf::from("/var/carto"));
    }
}
