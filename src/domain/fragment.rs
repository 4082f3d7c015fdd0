//! Header fragments
//!
//! A fragment is one header file taking part in an amalgamation. It is keyed
//! by its position in the declared list, so every ordering decision made later
//! can fall back on declaration order.

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Identity of a fragment within a single run: its index in the declared list
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FragmentId(usize);

impl FragmentId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position in the declared fragment list
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A header fragment read from its source. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    id: FragmentId,

    /// Path exactly as the caller declared it, used for provenance markers
    declared: String,

    /// Normalized location, used for include resolution
    path: PathBuf,

    /// Raw lines, each keeping its line terminator
    lines: Vec<String>,
}

impl Fragment {
    /// Creates a fragment from its declared path, resolved location and text
    pub fn new(id: FragmentId, declared: impl Into<String>, path: impl AsRef<Path>, text: &str) -> Self {
        Self {
            id,
            declared: declared.into(),
            path: normalize_path(path.as_ref()),
            lines: text.split_inclusive('\n').map(str::to_owned).collect(),
        }
    }

    pub fn id(&self) -> FragmentId {
        self.id
    }

    pub fn declared(&self) -> &str {
        &self.declared
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Directory that relative includes are resolved against
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// Lexically normalizes a path: drops `.` and folds `..` into a preceding
/// normal component. Does not touch the file system, so symlinks are not
/// followed.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }

    normalized
}

/// Deepest directory holding `base_dir` and every fragment. Local includes
/// must resolve below it.
pub fn tree_root(base_dir: &Path, fragments: &[Fragment]) -> PathBuf {
    fragments
        .iter()
        .fold(normalize_path(base_dir), |root, fragment| common_prefix(&root, fragment.dir()))
}

fn common_prefix(a: &Path, b: &Path) -> PathBuf {
    a.components()
        .zip(b.components())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x)
        .collect()
}
