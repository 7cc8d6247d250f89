//! File discovery: walks a scan root and names every source module.
//!
//! Uses `ignore::WalkBuilder` so hidden directories (and, optionally,
//! gitignored paths) are skipped the same way the rest of the toolchain does.
//! Entries are sorted by file name, so the output order only depends on the
//! filesystem state.

use ignore::WalkBuilder;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::config::ScannerConfig;

/// One discovered source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredModule {
    pub file_path: PathBuf,
    pub module_id: String,
}

/// Absolute form of `root`. An empty root means the current directory.
pub fn absolute_root(root: &Path) -> PathBuf {
    let root = if root.as_os_str().is_empty() {
        Path::new(".")
    } else {
        root
    };
    root.canonicalize().unwrap_or_else(|_| {
        std::env::current_dir()
            .map(|cwd| cwd.join(root))
            .unwrap_or_else(|_| root.to_path_buf())
    })
}

/// Discover every module under `root`. A missing root yields no modules.
pub fn discover(root: &Path, config: &ScannerConfig) -> Vec<DiscoveredModule> {
    let root = absolute_root(root);
    if !root.is_dir() {
        debug!(root = %root.display(), "scan root is not a directory");
        return Vec::new();
    }

    let excluded = config.excluded_dirs.clone();
    let walker = WalkBuilder::new(&root)
        .hidden(true)
        .git_ignore(config.respect_gitignore)
        .git_global(config.respect_gitignore)
        .git_exclude(config.respect_gitignore)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            if entry.depth() == 0 || !is_dir {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !excluded.iter().any(|d| d.as_str() == name)
        })
        .build();

    let extension = config.bare_extension();
    let mut modules = Vec::new();
    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if config.is_package_initializer(&file_name) || config.is_excluded_file(&file_name) {
            continue;
        }
        if let Some(module_id) = module_id(&root, path) {
            modules.push(DiscoveredModule {
                file_path: path.to_path_buf(),
                module_id,
            });
        }
    }

    debug!(root = %root.display(), count = modules.len(), "discovered modules");
    modules
}

/// Dotted module id of `path` relative to `root`: `pkg/sub/mod.py` -> `pkg.sub.mod`.
pub fn module_id(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let stem = relative.with_extension("");
    let parts: Vec<String> = stem
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("."))
    }
}
