use std::fmt;
use std::sync::Arc;

use generational_arena::{Arena, Index};
use rust_decimal::Decimal;
use termtree::Tree;
use tracing::instrument;

use crate::domain::entities::{Entity, EntityId};
use crate::domain::percentage::Percentage;

/// Who a node stands for: the synthetic root organisation or a stored entity.
#[derive(Debug, Clone)]
pub enum Holder {
    Root { name: String },
    Entity(Arc<Entity>),
}

impl Holder {
    pub fn id(&self) -> EntityId {
        match self {
            Holder::Root { .. } => EntityId::root(),
            Holder::Entity(entity) => entity.id.clone(),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Holder::Root { name } => name.clone(),
            Holder::Entity(entity) => entity.display_name(),
        }
    }
}

/// Payload of one position in the ownership tree.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub holder: Holder,
    /// Percentage of the parent's equity, as entered
    pub shareholding: Option<Percentage>,
    /// Percentage of the root's equity through this path
    pub effective_shareholding: Option<Decimal>,
    /// 0 for the root, 1 for direct shareholders
    pub depth: usize,
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.holder.name())?;
        if self.depth == 0 {
            return Ok(());
        }
        match self.shareholding {
            Some(pct) => write!(f, " [{pct}]")?,
            None => write!(f, " [n/a]")?,
        }
        if self.depth > 1 {
            if let Some(effective) = self.effective_shareholding {
                write!(f, " (effective {effective:.2}%)")?;
            }
        }
        Ok(())
    }
}

/// Tree node in the arena-based ownership structure.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of owners of this node, in insertion order
    pub children: Vec<Index>,
}

/// Flattened, render-ready view of one non-root node.
#[derive(Debug, Clone)]
pub struct OwnershipNode {
    pub entity: Arc<Entity>,
    pub shareholding: Option<Percentage>,
    pub effective_shareholding: Option<Decimal>,
    pub depth: usize,
    /// Entity whose equity this node holds (root sentinel for depth 1)
    pub parent: EntityId,
}

/// Arena-based ownership tree rooted at the synthetic organisation.
///
/// Uses a generational arena for memory-safe node references. An entity that
/// owns stakes in several parents occupies one node per parent.
#[derive(Debug)]
pub struct OwnershipTree {
    arena: Arena<TreeNode>,
    root: Option<Index>,
}

impl Default for OwnershipTree {
    fn default() -> Self {
        Self::new()
    }
}

impl OwnershipTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    #[instrument(level = "trace", skip(self, data), fields(holder = %data.holder.id()))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let node = TreeNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Number of levels, counting the root as one.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.iter().map(|(_, node)| node.data.depth + 1).max().unwrap_or(0)
    }

    /// Names of holders that nobody else owns a stake in (ultimate owners).
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<String> {
        self.iter()
            .filter(|(idx, node)| node.children.is_empty() && Some(*idx) != self.root)
            .map(|(_, node)| node.data.holder.name())
            .collect()
    }

    /// Pre-order list of every node below the root.
    pub fn flatten(&self) -> Vec<OwnershipNode> {
        self.iter()
            .filter_map(|(_, node)| {
                let Holder::Entity(entity) = &node.data.holder else {
                    return None;
                };
                let parent = node
                    .parent
                    .and_then(|p| self.get_node(p))
                    .map(|p| p.data.holder.id())
                    .unwrap_or_else(EntityId::root);
                Some(OwnershipNode {
                    entity: Arc::clone(entity),
                    shareholding: node.data.shareholding,
                    effective_shareholding: node.data.effective_shareholding,
                    depth: node.data.depth,
                    parent,
                })
            })
            .collect()
    }

    /// Render with box-drawing connectors for terminal output.
    pub fn to_tree_string(&self) -> Tree<String> {
        fn build(tree: &OwnershipTree, node_idx: Index, parent_tree: &mut Tree<String>) {
            if let Some(node) = tree.get_node(node_idx) {
                for &child_idx in &node.children {
                    if let Some(child) = tree.get_node(child_idx) {
                        let mut child_tree = Tree::new(child.data.to_string());
                        build(tree, child_idx, &mut child_tree);
                        parent_tree.push(child_tree);
                    }
                }
            }
        }

        match self.root.and_then(|idx| self.get_node(idx).map(|n| (idx, n))) {
            Some((root_idx, root)) => {
                let mut tree = Tree::new(root.data.to_string());
                build(self, root_idx, &mut tree);
                tree
            }
            None => Tree::new("Empty tree".to_string()),
        }
    }
}

pub struct TreeIterator<'a> {
    tree: &'a OwnershipTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a OwnershipTree) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = tree.root() {
            stack.push(root);
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let current_idx = self.stack.pop()?;
        let node = self.tree.get_node(current_idx)?;
        // Push children in reverse order for left-to-right traversal
        for &child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some((current_idx, node))
    }
}

pub struct PostOrderIterator<'a> {
    tree: &'a OwnershipTree,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(tree: &'a OwnershipTree) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = tree.root() {
            stack.push((root, false));
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}
