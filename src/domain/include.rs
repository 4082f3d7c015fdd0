//! Include directive extraction and filtering
//!
//! A directive is recognized only when `#include` opens the line, optionally
//! after spaces or tabs, followed by a `"path"` or `<path>` target. Anything
//! else (`# include`, commented-out directives, macro includes) is ordinary
//! content. The same matcher drives extraction and filtering, so a line is
//! either a dependency edge and removed, or untouched.
//!
//! Classification does not depend on the delimiter: a target is local when
//! it names a file relative to the including fragment's directory and that
//! file lies inside the input set's directory tree. Anything else, including
//! files that exist outside the tree, is external.

use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use super::fragment::{normalize_path, Fragment};
use super::source::FragmentSource;

fn include_regex() -> &'static Regex {
    static INCLUDE_REGEX: OnceLock<Regex> = OnceLock::new();
    INCLUDE_REGEX.get_or_init(|| {
        Regex::new(r#"^[ \t]*#include[ \t]*(?:"([^"\r\n]*)"|<([^>\r\n]*)>)"#)
            .expect("Invalid include regex")
    })
}

/// Quoting style of an include target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `#include "path"`
    Quote,
    /// `#include <path>`
    Angle,
}

/// What an include target resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncludeKind {
    /// Names a file inside the tree, relative to the including fragment
    /// (normalized path)
    Local(PathBuf),
    /// Does not resolve inside the tree, e.g. a standard library header
    External,
}

/// One include directive found in a fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeRef {
    /// Target exactly as written between the delimiters
    pub target: String,

    /// 1-based line number within the fragment
    pub line: usize,

    pub delimiter: Delimiter,

    pub kind: IncludeKind,
}

impl IncludeRef {
    pub fn is_local(&self) -> bool {
        matches!(self.kind, IncludeKind::Local(_))
    }

    /// Resolved path of a local include
    pub fn local_path(&self) -> Option<&Path> {
        match &self.kind {
            IncludeKind::Local(path) => Some(path),
            IncludeKind::External => None,
        }
    }
}

/// Parses one line as an include directive, returning its target
pub fn parse_directive(line: &str) -> Option<(&str, Delimiter)> {
    let captures = include_regex().captures(line)?;

    if let Some(quoted) = captures.get(1) {
        Some((quoted.as_str(), Delimiter::Quote))
    } else {
        captures.get(2).map(|angled| (angled.as_str(), Delimiter::Angle))
    }
}

/// Scans fragments for include directives, classifying each one against a
/// [`FragmentSource`] and the directory tree rooted at `root`
pub struct IncludeScanner<'a> {
    source: &'a dyn FragmentSource,
    root: PathBuf,
}

impl<'a> IncludeScanner<'a> {
    pub fn new(source: &'a dyn FragmentSource, root: impl AsRef<Path>) -> Self {
        Self {
            source,
            root: normalize_path(root.as_ref()),
        }
    }

    /// Root of the tree local includes must resolve in
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Classifies `target` as seen from a fragment living in `dir`
    pub fn classify(&self, dir: &Path, target: &str) -> IncludeKind {
        let candidate = normalize_path(&dir.join(target));
        if self.in_tree(&candidate) && self.source.is_file(&candidate) {
            IncludeKind::Local(candidate)
        } else {
            IncludeKind::External
        }
    }

    /// Normalized paths only carry `..` up front, so anything below the root
    /// starts with a normal component once the root is stripped
    fn in_tree(&self, path: &Path) -> bool {
        match path.strip_prefix(&self.root) {
            Ok(rest) => matches!(rest.components().next(), Some(Component::Normal(_))),
            Err(_) => false,
        }
    }

    /// Returns every include directive in the fragment, in line order.
    /// Repeated includes of the same target each produce their own entry.
    pub fn extract(&self, fragment: &Fragment) -> Vec<IncludeRef> {
        fragment
            .lines()
            .iter()
            .enumerate()
            .filter_map(|(index, line)| {
                let (target, delimiter) = parse_directive(line)?;
                Some(IncludeRef {
                    target: target.to_string(),
                    line: index + 1,
                    delimiter,
                    kind: self.classify(fragment.dir(), target),
                })
            })
            .collect()
    }

    /// Returns the fragment's text with every local include line removed.
    /// All other lines, external includes included, are kept verbatim.
    pub fn filter(&self, fragment: &Fragment) -> String {
        fragment
            .lines()
            .iter()
            .filter(|line| !self.is_local_directive(fragment.dir(), line))
            .map(String::as_str)
            .collect()
    }

    fn is_local_directive(&self, dir: &Path, line: &str) -> bool {
        match parse_directive(line) {
            Some((target, _)) => matches!(self.classify(dir, target), IncludeKind::Local(_)),
            None => false,
        }
    }
}
