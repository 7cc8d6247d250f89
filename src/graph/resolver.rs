//! Import resolution: maps raw import names onto discovered module ids.
//!
//! Tiers, first hit wins:
//! 1. exact:     `pkg.a` == `pkg.a`
//! 2. suffix:    `a` matches `pkg.a` (ends with `.a`)
//! 3. peel:      `a.b.c` -> try `a.b`, then `a`, each with exact then suffix
//!
//! Anything else is assumed to be a third-party or stdlib import and dropped.

use std::collections::BTreeSet;

use tracing::debug;

/// Resolves raw import names against the module ids of one scan.
#[derive(Debug, Clone, Default)]
pub struct ImportResolver {
    /// Sorted so suffix ties resolve the same way on every run.
    known: BTreeSet<String>,
}

impl ImportResolver {
    pub fn new<I, S>(modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: modules.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    pub fn contains(&self, module: &str) -> bool {
        self.known.contains(module)
    }

    /// Resolve `raw` to a known module id, or `None` if nothing matches.
    pub fn resolve(&self, raw: &str) -> Option<&str> {
        let raw = raw.trim_matches('.');
        if raw.is_empty() {
            return None;
        }

        if let Some(hit) = self.exact(raw).or_else(|| self.suffix(raw)) {
            return Some(hit);
        }

        let parts: Vec<&str> = raw.split('.').collect();
        for end in (1..parts.len()).rev() {
            let candidate = parts[..end].join(".");
            if let Some(hit) = self.exact(&candidate).or_else(|| self.suffix(&candidate)) {
                return Some(hit);
            }
        }
        None
    }

    /// Resolve an import made by `importer`. A module never resolves to itself.
    pub fn resolve_from(&self, importer: &str, raw: &str) -> Option<&str> {
        self.resolve(raw).filter(|target| *target != importer)
    }

    fn exact(&self, name: &str) -> Option<&str> {
        self.known.get(name).map(String::as_str)
    }

    fn suffix(&self, name: &str) -> Option<&str> {
        let dotted = format!(".{}", name);
        let mut matches = self.known.iter().filter(|m| m.ends_with(&dotted));
        let first = matches.next()?;
        let others = matches.count();
        if others > 0 {
            debug!(
                import = name,
                chosen = %first,
                candidates = others + 1,
                "ambiguous suffix match"
            );
        }
        Some(first.as_str())
    }
}
