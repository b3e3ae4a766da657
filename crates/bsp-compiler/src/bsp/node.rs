//! BSP tree node implementation.

/// Position of a node in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Returns the arena position of the node.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Which child slot of a parent a subtree hangs from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildSlot {
    /// Subtree of faces in front of the parent's plane.
    Front,
    /// Subtree of faces behind the parent's plane.
    Back,
}

/// A node in the BSP tree.
///
/// Each node is split by the plane of one face (its splitter) and holds the
/// canonical indices of every face coplanar with that plane. Faces in front
/// of or behind the plane live in the child subtrees, referenced by
/// [`NodeId`] into the owning tree's arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BspNode {
    /// Canonical index of the face whose plane splits this node.
    splitter: usize,

    /// Canonical indices of the faces on the splitting plane.
    /// The splitter itself is always the first entry.
    coplanar: Vec<usize>,

    /// Subtree containing faces in FRONT of the splitting plane.
    front: Option<NodeId>,

    /// Subtree containing faces BEHIND the splitting plane.
    back: Option<NodeId>,
}

impl BspNode {
    /// Creates a childless node split by `splitter`.
    ///
    /// `others` are the remaining coplanar faces; the splitter is put first.
    pub fn new(splitter: usize, others: impl IntoIterator<Item = usize>) -> Self {
        let mut coplanar = vec![splitter];
        coplanar.extend(others);
        Self {
            splitter,
            coplanar,
            front: None,
            back: None,
        }
    }

    /// Returns the canonical index of the splitting face.
    #[inline]
    pub fn splitter(&self) -> usize {
        self.splitter
    }

    /// Returns the canonical indices of the faces on the splitting plane.
    #[inline]
    pub fn coplanar(&self) -> &[usize] {
        &self.coplanar
    }

    /// Returns the number of faces on the splitting plane.
    #[inline]
    pub fn coplanar_count(&self) -> usize {
        self.coplanar.len()
    }

    /// Returns the front child, if any.
    #[inline]
    pub fn front(&self) -> Option<NodeId> {
        self.front
    }

    /// Returns the back child, if any.
    #[inline]
    pub fn back(&self) -> Option<NodeId> {
        self.back
    }

    /// Returns the child in the given slot.
    #[inline]
    pub fn child(&self, slot: ChildSlot) -> Option<NodeId> {
        match slot {
            ChildSlot::Front => self.front,
            ChildSlot::Back => self.back,
        }
    }

    /// Sets the child in the given slot.
    #[inline]
    pub(crate) fn set_child(&mut self, slot: ChildSlot, child: Option<NodeId>) {
        match slot {
            ChildSlot::Front => self.front = child,
            ChildSlot::Back => self.back = child,
        }
    }

    /// Iterates over the present children, front first.
    pub fn children(&self) -> impl Iterator<Item = NodeId> {
        self.front.into_iter().chain(self.back)
    }

    /// Checks if this node has any children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.front.is_none() && self.back.is_none()
    }
}
