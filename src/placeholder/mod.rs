//! Placeholder discovery, navigation and filling.
//!
//! Placeholders are the engine's empty slots: intentionally blank positions
//! a user tabs between and fills one at a time. Nodes carry no identity of
//! their own, so a placeholder is addressed by its [`Path`] from the root,
//! the child-index chain in reading order. Paths are transient; any
//! structural edit invalidates previously computed ones, and callers
//! re-enumerate after each change.

use crate::parser::ExprNode;
use crate::types::{FillError, Settings};

/// A chain of child indices addressing one node from the root.
///
/// Ordering is lexicographic, which for paths of one tree coincides with
/// depth-first reading order: a parent sorts before its children, and
/// earlier siblings (with their whole subtrees) sort before later ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Path(Vec<usize>);

impl Path {
    /// A path addressing the root node itself.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Builds a path from its child-index segments.
    #[must_use]
    pub fn new(segments: Vec<usize>) -> Self {
        Self(segments)
    }

    /// The child-index segments, outermost first.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for Path {
    fn from(segments: Vec<usize>) -> Self {
        Self(segments)
    }
}

/// Enumerates the paths of every placeholder in the tree, in reading order.
#[must_use]
pub fn enumerate(root: &ExprNode) -> Vec<Path> {
    let mut out = Vec::new();
    let mut prefix = Vec::new();
    collect(root, &mut prefix, &mut out);
    out
}

fn collect(node: &ExprNode, prefix: &mut Vec<usize>, out: &mut Vec<Path>) {
    if *node == ExprNode::Placeholder {
        out.push(Path(prefix.clone()));
        return;
    }
    for (index, child) in node.children().into_iter().enumerate() {
        prefix.push(index);
        collect(child, prefix, out);
        prefix.pop();
    }
}

/// The placeholder set of one tree snapshot, supporting circular forward
/// and backward navigation from any cursor position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholders {
    paths: Vec<Path>,
}

impl Placeholders {
    /// Enumerates the placeholders of a tree.
    #[must_use]
    pub fn from_tree(root: &ExprNode) -> Self {
        Self {
            paths: enumerate(root),
        }
    }

    /// The placeholder paths in reading order.
    #[must_use]
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    /// The number of placeholders in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the tree has no placeholders at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// The first placeholder in reading order, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Path> {
        self.paths.first()
    }

    /// The next placeholder strictly after `current` in reading order,
    /// wrapping around to the first. `None` only when no placeholder exists.
    #[must_use]
    pub fn next_after(&self, current: &Path) -> Option<&Path> {
        if self.paths.is_empty() {
            return None;
        }
        let index = self.paths.partition_point(|path| path <= current);
        Some(&self.paths[index % self.paths.len()])
    }

    /// The nearest placeholder strictly before `current` in reading order,
    /// wrapping around to the last. `None` only when no placeholder exists.
    #[must_use]
    pub fn previous_before(&self, current: &Path) -> Option<&Path> {
        if self.paths.is_empty() {
            return None;
        }
        let index = self.paths.partition_point(|path| path < current);
        let index = index.checked_sub(1).unwrap_or(self.paths.len() - 1);
        Some(&self.paths[index])
    }
}

/// Replaces the placeholder at `path` with `replacement`.
///
/// The nesting ceiling is checked before anything is mutated; on any error
/// the tree is left exactly as it was. The path must address a placeholder
/// in the current tree, not just any node.
pub fn fill(
    root: &mut ExprNode,
    path: &Path,
    replacement: ExprNode,
    settings: &Settings,
) -> Result<(), FillError> {
    // walk immutably first: verify the target and measure the structural
    // depth the tree would reach
    let mut node: &ExprNode = root;
    let mut ancestors = usize::from(node.kind().is_structural());
    for &index in path.as_slice() {
        node = node
            .children()
            .get(index)
            .copied()
            .ok_or(FillError::InvalidPath)?;
        ancestors += usize::from(node.kind().is_structural());
    }
    if *node != ExprNode::Placeholder {
        return Err(FillError::InvalidPath);
    }

    let depth = (ancestors + replacement.depth()).max(root.depth());
    if depth > settings.max_nesting_depth {
        return Err(FillError::TooDeep {
            depth,
            limit: settings.max_nesting_depth,
        });
    }

    let mut slot: &mut ExprNode = root;
    for &index in path.as_slice() {
        slot = slot.child_mut(index).ok_or(FillError::InvalidPath)?;
    }
    *slot = replacement;
    Ok(())
}
