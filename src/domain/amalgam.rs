//! Amalgamation pipeline
//!
//! Reads the declared fragments, orders them by their local includes and
//! renders one self-contained text. Nothing here writes to disk; callers hand
//! the rendered text to [`crate::storage::Artifact`].

use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::fragment::{tree_root, Fragment, FragmentId};
use super::graph::{DependencyGraph, GraphError};
use super::include::{IncludeKind, IncludeScanner};
use super::source::{FragmentSource, SourceError};

/// Prefix of the line that opens each fragment's section
pub const PROVENANCE_PREFIX: &str = "// Content from ";

/// Written after each fragment's content
pub const SECTION_SEPARATOR: &str = "\n\n";

#[derive(Debug, Error)]
pub enum AmalgamError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amalgamation {
    order: Vec<String>,
    text: String,
}

impl Amalgamation {
    /// Declared fragment paths in output order
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// The rendered single-header text
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Include summary for one fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FragmentReport {
    pub fragment: String,

    /// Declared fragments this one includes
    pub dependencies: Vec<String>,

    /// Include targets left for the compiler to resolve
    pub external: Vec<String>,
}

/// Runs amalgamations against a [`FragmentSource`]
pub struct Amalgamator<'a> {
    source: &'a dyn FragmentSource,
}

impl<'a> Amalgamator<'a> {
    pub fn new(source: &'a dyn FragmentSource) -> Self {
        Self { source }
    }

    /// Reads every declared fragment. Declared paths resolve against
    /// `base_dir`; the first unreadable fragment aborts the load.
    pub fn load<P: AsRef<str>>(&self, base_dir: &Path, fragment_paths: &[P]) -> Result<Vec<Fragment>, SourceError> {
        fragment_paths
            .iter()
            .enumerate()
            .map(|(index, declared)| {
                let declared = declared.as_ref();
                let path = base_dir.join(declared);
                debug!(fragment = declared, path = %path.display(), "reading fragment");
                let text = self.source.read_to_string(&path)?;
                Ok(Fragment::new(FragmentId::new(index), declared, &path, &text))
            })
            .collect()
    }

    /// Resolves the output order without rendering
    pub fn order<P: AsRef<str>>(&self, base_dir: &Path, fragment_paths: &[P]) -> Result<Vec<String>, AmalgamError> {
        let (fragments, _, order) = self.sorted(base_dir, fragment_paths)?;
        Ok(declared(&fragments, &order))
    }

    /// Reads, orders and renders the declared fragments
    pub fn run<P: AsRef<str>>(&self, base_dir: &Path, fragment_paths: &[P]) -> Result<Amalgamation, AmalgamError> {
        let (fragments, scanner, order) = self.sorted(base_dir, fragment_paths)?;

        let mut text = String::new();
        for id in &order {
            let fragment = &fragments[id.index()];
            text.push_str(PROVENANCE_PREFIX);
            text.push_str(fragment.declared());
            text.push('\n');
            text.push_str(&scanner.filter(fragment));
            text.push_str(SECTION_SEPARATOR);
        }

        Ok(Amalgamation {
            order: declared(&fragments, &order),
            text,
        })
    }

    /// Lists each fragment's local dependencies and external includes, in
    /// declaration order. Cycles are not an error here.
    pub fn inspect<P: AsRef<str>>(&self, base_dir: &Path, fragment_paths: &[P]) -> Result<Vec<FragmentReport>, AmalgamError> {
        let (fragments, scanner, graph) = self.resolve(base_dir, fragment_paths)?;

        Ok(fragments
            .iter()
            .map(|fragment| FragmentReport {
                fragment: fragment.declared().to_string(),
                dependencies: graph
                    .dependencies(fragment.id())
                    .into_iter()
                    .map(|dep| graph.name(dep).to_string())
                    .collect(),
                external: scanner
                    .extract(fragment)
                    .into_iter()
                    .filter(|include| include.kind == IncludeKind::External)
                    .map(|include| include.target)
                    .collect(),
            })
            .collect())
    }

    /// Loads the fragments and builds their graph, scanning includes against
    /// the tree the fragments live in
    fn resolve<P: AsRef<str>>(
        &self,
        base_dir: &Path,
        fragment_paths: &[P],
    ) -> Result<(Vec<Fragment>, IncludeScanner<'a>, DependencyGraph), AmalgamError> {
        let fragments = self.load(base_dir, fragment_paths)?;
        let scanner = IncludeScanner::new(self.source, tree_root(base_dir, &fragments));
        debug!(root = %scanner.root().display(), "scanning includes");
        let graph = DependencyGraph::build(&fragments, &scanner)?;

        Ok((fragments, scanner, graph))
    }

    /// [`Self::resolve`] followed by the topological sort
    fn sorted<P: AsRef<str>>(
        &self,
        base_dir: &Path,
        fragment_paths: &[P],
    ) -> Result<(Vec<Fragment>, IncludeScanner<'a>, Vec<FragmentId>), AmalgamError> {
        let (fragments, scanner, graph) = self.resolve(base_dir, fragment_paths)?;
        let order = graph.topological_order()?;

        info!(
            fragments = fragments.len(),
            edges = graph.edge_count(),
            "resolved fragment order"
        );

        Ok((fragments, scanner, order))
    }
}

fn declared(fragments: &[Fragment], order: &[FragmentId]) -> Vec<String> {
    order
        .iter()
        .map(|id| fragments[id.index()].declared().to_string())
        .collect()
}
