//! The state tree: an index arena of vertices with LCA and path queries.
//!
//! Construction happens in two steps. A [`StateTreeBuilder`] accepts
//! vertices in any order, materializing parents on first reference. Calling
//! [`StateTreeBuilder::finalize`] consumes the builder, assigns depths with a
//! single depth-first traversal and records the Euler tour used to answer
//! [`StateTree::lca`] queries in constant time.

use super::error::{ConfigError, PathError};
use std::collections::HashMap;
use std::fmt;

/// Name of the structural root every chart hangs off.
pub const ROOT: &str = "ROOT";

/// Index of a vertex inside the tree that created it.
///
/// Ids are only meaningful for the tree (or builder) that handed them out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(usize);

impl VertexId {
    /// Position of the vertex in its tree's arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single state in a finalized tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vertex {
    id: VertexId,
    name: String,
    parent: Option<VertexId>,
    children: Vec<VertexId>,
    depth: usize,
    default_child: Option<VertexId>,
}

impl Vertex {
    pub fn id(&self) -> VertexId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enclosing vertex, `None` only for the root.
    pub fn parent(&self) -> Option<VertexId> {
        self.parent
    }

    /// Children in declaration order.
    pub fn children(&self) -> &[VertexId] {
        &self.children
    }

    /// Distance from the root; the root itself has depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn default_child(&self) -> Option<VertexId> {
        self.default_child
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_composite(&self) -> bool {
        !self.children.is_empty()
    }
}

#[derive(Debug)]
struct PendingVertex {
    name: String,
    parent: Option<VertexId>,
    children: Vec<VertexId>,
    default_child: Option<VertexId>,
    declared: bool,
}

impl PendingVertex {
    fn placeholder(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            default_child: None,
            declared: false,
        }
    }
}

/// Accumulates vertices before the tree is finalized.
///
/// Vertices may be added in any order: referencing a parent that has not
/// been declared yet creates a placeholder which is filled in once its own
/// declaration arrives.
#[derive(Debug)]
pub struct StateTreeBuilder {
    vertices: Vec<PendingVertex>,
    index: HashMap<String, VertexId>,
}

impl StateTreeBuilder {
    /// Create a builder holding only the root.
    pub fn new() -> Self {
        let mut root = PendingVertex::placeholder(ROOT);
        root.declared = true;

        let mut index = HashMap::new();
        index.insert(ROOT.to_string(), VertexId(0));

        Self {
            vertices: vec![root],
            index,
        }
    }

    pub fn root(&self) -> VertexId {
        VertexId(0)
    }

    /// Get-or-create a vertex by name without declaring it.
    pub fn vertex(&mut self, name: &str) -> VertexId {
        if let Some(id) = self.index.get(name) {
            return *id;
        }
        let id = VertexId(self.vertices.len());
        self.vertices.push(PendingVertex::placeholder(name));
        self.index.insert(name.to_string(), id);
        id
    }

    /// Declare `name` as a child of `parent_name`.
    ///
    /// Both vertices are created on demand. When `is_default` is set the new
    /// vertex becomes the parent's default child, which fails if the parent
    /// already has one. Nothing is modified when an error is returned.
    pub fn add_vertex(
        &mut self,
        name: &str,
        parent_name: &str,
        is_default: bool,
    ) -> Result<VertexId, ConfigError> {
        if name == ROOT {
            return Err(ConfigError::ReservedName {
                name: name.to_string(),
            });
        }
        if name == parent_name {
            return Err(ConfigError::Cycle {
                name: name.to_string(),
            });
        }
        if let Some(existing) = self.index.get(name) {
            if self.vertices[existing.0].declared {
                return Err(ConfigError::DuplicateState {
                    name: name.to_string(),
                });
            }
        }
        if is_default {
            let current_default = self
                .index
                .get(parent_name)
                .and_then(|parent| self.vertices[parent.0].default_child);
            if let Some(existing) = current_default {
                return Err(ConfigError::DuplicateDefault {
                    parent: parent_name.to_string(),
                    existing: self.vertices[existing.0].name.clone(),
                    candidate: name.to_string(),
                });
            }
        }

        let id = self.vertex(name);
        let parent = self.vertex(parent_name);

        let vertex = &mut self.vertices[id.0];
        vertex.declared = true;
        vertex.parent = Some(parent);

        let parent_vertex = &mut self.vertices[parent.0];
        parent_vertex.children.push(id);
        if is_default {
            parent_vertex.default_child = Some(id);
        }

        Ok(id)
    }

    /// Vertices that were referenced but never declared, as errors naming
    /// one of the referencing children.
    pub fn unresolved(&self) -> Vec<ConfigError> {
        self.vertices
            .iter()
            .filter(|v| !v.declared)
            .map(|v| {
                let referenced_by = v
                    .children
                    .first()
                    .map(|child| self.vertices[child.0].name.clone())
                    .unwrap_or_default();
                ConfigError::UnknownState {
                    name: v.name.clone(),
                    referenced_by,
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Assign depths, record the Euler tour and freeze the tree.
    pub fn finalize(self) -> Result<StateTree, ConfigError> {
        if let Some(error) = self.unresolved().into_iter().next() {
            return Err(error);
        }

        let count = self.vertices.len();
        let mut depth = vec![0usize; count];
        let mut first = vec![usize::MAX; count];
        let mut tour = Vec::with_capacity(2 * count);

        // Iterative DFS: every vertex is appended on arrival and its parent
        // is appended again after each child subtree.
        let root = VertexId(0);
        first[0] = 0;
        tour.push(root);
        let mut stack: Vec<(VertexId, usize)> = vec![(root, 0)];
        while let Some(top) = stack.last_mut() {
            let (vertex, next_child) = *top;
            match self.vertices[vertex.0].children.get(next_child) {
                Some(&child) => {
                    top.1 += 1;
                    depth[child.0] = depth[vertex.0] + 1;
                    first[child.0] = tour.len();
                    tour.push(child);
                    stack.push((child, 0));
                }
                None => {
                    stack.pop();
                    if let Some(&(parent, _)) = stack.last() {
                        tour.push(parent);
                    }
                }
            }
        }

        if let Some(orphan) = first.iter().position(|&pos| pos == usize::MAX) {
            return Err(ConfigError::Cycle {
                name: self.vertices[orphan].name.clone(),
            });
        }

        let vertices: Vec<Vertex> = self
            .vertices
            .into_iter()
            .enumerate()
            .map(|(i, pending)| Vertex {
                id: VertexId(i),
                name: pending.name,
                parent: pending.parent,
                children: pending.children,
                depth: depth[i],
                default_child: pending.default_child,
            })
            .collect();

        let sparse = build_sparse_table(&tour, &depth);

        Ok(StateTree {
            vertices,
            index: self.index,
            tour,
            first,
            sparse,
        })
    }
}

impl Default for StateTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `levels[k][i]` holds the shallowest vertex of `tour[i..i + 2^k]`.
fn build_sparse_table(tour: &[VertexId], depth: &[usize]) -> Vec<Vec<VertexId>> {
    let shallower = |a: VertexId, b: VertexId| if depth[b.0] < depth[a.0] { b } else { a };

    let mut levels = vec![tour.to_vec()];
    let mut width = 1;
    while width * 2 <= tour.len() {
        let prev = &levels[levels.len() - 1];
        let next: Vec<VertexId> = (0..=tour.len() - width * 2)
            .map(|i| shallower(prev[i], prev[i + width]))
            .collect();
        levels.push(next);
        width *= 2;
    }
    levels
}

/// Immutable, finalized state tree.
#[derive(Clone, Debug)]
pub struct StateTree {
    vertices: Vec<Vertex>,
    index: HashMap<String, VertexId>,
    tour: Vec<VertexId>,
    first: Vec<usize>,
    sparse: Vec<Vec<VertexId>>,
}

impl StateTree {
    pub fn root(&self) -> VertexId {
        VertexId(0)
    }

    /// Look up a vertex by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree.
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.0]
    }

    pub fn find(&self, name: &str) -> Option<VertexId> {
        self.index.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&Vertex> {
        self.find(name).map(|id| self.vertex(id))
    }

    pub fn name(&self, id: VertexId) -> &str {
        self.vertex(id).name()
    }

    pub fn depth(&self, id: VertexId) -> usize {
        self.vertex(id).depth
    }

    pub fn parent(&self, id: VertexId) -> Option<VertexId> {
        self.vertex(id).parent
    }

    pub fn default_child(&self, id: VertexId) -> Option<VertexId> {
        self.vertex(id).default_child
    }

    /// Number of vertices, the root included.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter()
    }

    /// The Euler tour recorded by `finalize`, starting at the root.
    pub fn euler_tour(&self) -> &[VertexId] {
        &self.tour
    }

    /// Walk from `id` up to the root, `id` first.
    pub fn ancestors(&self, id: VertexId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: Some(id),
        }
    }

    /// Whether `ancestor` lies on the parent chain of `id` (inclusive).
    pub fn is_ancestor(&self, ancestor: VertexId, id: VertexId) -> bool {
        self.ancestors(id).any(|v| v == ancestor)
    }

    /// Least common ancestor of `u` and `v`.
    ///
    /// The shallowest vertex visited between the first tour positions of
    /// `u` and `v` is the deepest vertex above both of them.
    pub fn lca(&self, u: VertexId, v: VertexId) -> VertexId {
        let (mut lo, mut hi) = (self.first[u.0], self.first[v.0]);
        if lo > hi {
            std::mem::swap(&mut lo, &mut hi);
        }
        let span = hi - lo + 1;
        let level = (usize::BITS - 1 - span.leading_zeros()) as usize;
        let left = self.sparse[level][lo];
        let right = self.sparse[level][hi + 1 - (1 << level)];
        if self.depth(right) < self.depth(left) {
            right
        } else {
            left
        }
    }

    /// Vertices from `u` to `v`, both inclusive.
    ///
    /// One of the two must be an ancestor of the other.
    pub fn path(&self, u: VertexId, v: VertexId) -> Result<Vec<VertexId>, PathError> {
        let upward = self.depth(u) >= self.depth(v);
        let (deep, shallow) = if upward { (u, v) } else { (v, u) };

        let mut path = Vec::with_capacity(self.depth(deep) - self.depth(shallow) + 1);
        let mut cursor = deep;
        while self.depth(cursor) > self.depth(shallow) {
            path.push(cursor);
            cursor = match self.parent(cursor) {
                Some(parent) => parent,
                None => break,
            };
        }
        if cursor != shallow {
            return Err(PathError::Unrelated {
                from: self.name(u).to_string(),
                to: self.name(v).to_string(),
            });
        }
        path.push(shallow);

        if !upward {
            path.reverse();
        }
        Ok(path)
    }
}

/// Iterator over a vertex and its ancestors, innermost first.
pub struct Ancestors<'a> {
    tree: &'a StateTree,
    next: Option<VertexId>,
}

impl Iterator for Ancestors<'_> {
    type Item = VertexId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}
