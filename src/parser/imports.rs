//! Import extraction from Python syntax trees.
//!
//! Recognized forms:
//!   import a.b, c as d          -> "a.b", "c"
//!   from a.b import x           -> "a.b"
//!   from .sibling import x      -> "sibling"
//!   __import__("pkg.mod")       -> "pkg.mod"
//!   importlib.import_module("pkg.mod")
//!
//! `from . import x` carries no module name and is skipped.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tree_sitter::{Node, Parser};

use super::python_language;

/// How an import was spelled in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// `import a.b`
    Module,
    /// `from a.b import x` (including relative `from .a import x`).
    From,
    /// `__import__("a.b")`
    Dynamic,
    /// `importlib.import_module("a.b")`
    Loader,
}

/// A raw import token, not yet resolved against the scanned modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImport {
    /// Dotted module name as written (leading dots of relative imports removed).
    pub name: String,
    pub kind: ImportKind,
    /// Line of the statement or call (1-indexed).
    pub line: usize,
}

/// Everything the graph builder needs from one file.
#[derive(Debug, Clone, Default)]
pub struct ExtractedImports {
    pub imports: Vec<RawImport>,
}

impl ExtractedImports {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.imports.iter().map(|i| i.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.imports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }
}

/// Why a file contributed no imports. None of these abort a scan.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("file is empty")]
    Empty,

    #[error("syntax error near line {line}")]
    Syntax { line: usize },

    #[error("parser failure: {0}")]
    Parse(String),
}

/// Read a file and extract its imports.
pub fn extract_file(path: &Path) -> Result<ExtractedImports, ExtractionError> {
    let source = fs::read_to_string(path).map_err(|source| ExtractionError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    extract_imports(&source)
}

/// Extract raw import names from Python source.
///
/// A file that does not parse cleanly yields `ExtractionError::Syntax`, so a
/// half-parsed tree never leaks partial imports into the graph.
pub fn extract_imports(source: &str) -> Result<ExtractedImports, ExtractionError> {
    if source.trim().is_empty() {
        return Err(ExtractionError::Empty);
    }

    let mut parser = Parser::new();
    parser
        .set_language(&python_language())
        .map_err(|e| ExtractionError::Parse(e.to_string()))?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ExtractionError::Parse("parser produced no tree".to_string()))?;

    let root = tree.root_node();
    if root.has_error() {
        let line = first_error_line(&root).unwrap_or(1);
        return Err(ExtractionError::Syntax { line });
    }

    let mut imports = Vec::new();
    collect_imports(&root, source.as_bytes(), &mut imports);
    Ok(ExtractedImports { imports })
}

/// Recursively walk the tree and accumulate imports.
fn collect_imports(node: &Node, source: &[u8], imports: &mut Vec<RawImport>) {
    let line = node.start_position().row + 1;

    match node.kind() {
        "import_statement" => {
            let count = node.named_child_count();
            for i in 0..count {
                let Some(child) = node.named_child(i) else {
                    continue;
                };
                let name_node = match child.kind() {
                    "dotted_name" => Some(child),
                    "aliased_import" => child.child_by_field_name("name"),
                    _ => None,
                };
                if let Some(name) = name_node.and_then(|n| dotted_text(&n, source)) {
                    imports.push(RawImport {
                        name,
                        kind: ImportKind::Module,
                        line,
                    });
                }
            }
            return;
        }
        "import_from_statement" => {
            if let Some(name) = from_module_name(node, source) {
                imports.push(RawImport {
                    name,
                    kind: ImportKind::From,
                    line,
                });
            }
            return;
        }
        // `from __future__ import x` never names a project module.
        "future_import_statement" => return,
        "call" => {
            if let Some((name, kind)) = dynamic_import(node, source) {
                imports.push(RawImport { name, kind, line });
            }
        }
        _ => {}
    }

    let count = node.child_count();
    for i in 0..count {
        if let Some(child) = node.child(i) {
            collect_imports(&child, source, imports);
        }
    }
}

/// The `X` of `from X import ...`. Bare relative imports have none.
fn from_module_name(node: &Node, source: &[u8]) -> Option<String> {
    let module = node.child_by_field_name("module_name")?;
    match module.kind() {
        "dotted_name" => dotted_text(&module, source),
        "relative_import" => {
            let count = module.named_child_count();
            (0..count)
                .filter_map(|i| module.named_child(i))
                .find(|c| c.kind() == "dotted_name")
                .and_then(|c| dotted_text(&c, source))
        }
        _ => None,
    }
}

/// `__import__("x")` or `import_module("x")` with a plain string literal as
/// the first positional argument.
fn dynamic_import(node: &Node, source: &[u8]) -> Option<(String, ImportKind)> {
    let func = node.child_by_field_name("function")?;
    let kind = match func.kind() {
        "identifier" => match func.utf8_text(source).ok()? {
            "__import__" => ImportKind::Dynamic,
            "import_module" => ImportKind::Loader,
            _ => return None,
        },
        "attribute" => {
            let attr = func.child_by_field_name("attribute")?;
            if attr.utf8_text(source).ok()? != "import_module" {
                return None;
            }
            ImportKind::Loader
        }
        _ => return None,
    };

    let args = node.child_by_field_name("arguments")?;
    if args.kind() != "argument_list" {
        return None;
    }
    let first = (0..args.named_child_count())
        .filter_map(|i| args.named_child(i))
        .find(|c| c.kind() != "comment")?;

    string_literal(&first, source).map(|name| (name, kind))
}

/// Value of a constant string literal. f-strings, byte strings and
/// interpolated strings are not constants and yield `None`.
fn string_literal(node: &Node, source: &[u8]) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }

    let mut start = None;
    let mut end = None;
    for i in 0..node.child_count() {
        let Some(child) = node.child(i) else {
            continue;
        };
        match child.kind() {
            "string_start" => start = Some(child),
            "string_end" => end = Some(child),
            "interpolation" => return None,
            _ => {}
        }
    }
    let (start, end) = (start?, end?);

    let prefix = start.utf8_text(source).ok()?;
    if prefix
        .chars()
        .any(|c| matches!(c.to_ascii_lowercase(), 'f' | 'b'))
    {
        return None;
    }

    let value = std::str::from_utf8(source.get(start.end_byte()..end.start_byte())?).ok()?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Text of a dotted name with any interior whitespace removed (`a . b` -> `a.b`).
fn dotted_text(node: &Node, source: &[u8]) -> Option<String> {
    let text = node.utf8_text(source).ok()?;
    let name: String = text.split_whitespace().collect();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

fn first_error_line(node: &Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if child.has_error() {
                if let Some(line) = first_error_line(&child) {
                    return Some(line);
                }
            }
        }
    }
    None
}
