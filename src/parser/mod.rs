//! Python source parsing via tree-sitter.
//!
//! The only thing the graph needs from a file is the list of modules it
//! references, so this module exposes a single extraction entry point.

pub mod imports;

pub use imports::{
    extract_file, extract_imports, ExtractedImports, ExtractionError, ImportKind, RawImport,
};

use tree_sitter::Language;

/// The tree-sitter grammar used for every scanned file.
pub fn python_language() -> Language {
    tree_sitter_python::LANGUAGE.into()
}
