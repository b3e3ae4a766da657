//! Binary Space Partitioning over mesh faces.
//!
//! This module builds a BSP tree whose splitting planes come from the
//! faces of a [`Mesh`](crate::Mesh) and converts it into the flat arrays
//! stored in a BSP asset:
//!
//! - Every node is split by the plane of the first face of its partition
//! - Faces spanning a plane are kept whole and sent to the front side
//! - Construction and every walk over the tree use explicit work-lists, so
//!   degenerate meshes producing trees as deep as their face count are fine
//!
//! # Example
//!
//! ```ignore
//! use bsp_compiler::{BspTree, FlatBsp, Mesh};
//! use bsp_compiler::bsp::CollectingVisitor;
//!
//! let mesh: Mesh = /* load a mesh */;
//! let tree = BspTree::from_mesh(&mesh)?;
//! let flat = FlatBsp::from_tree(&tree, mesh.face_count())?;
//!
//! // Painter's order for a viewer at `eye`
//! let mut visitor = CollectingVisitor::new();
//! flat.traverse_back_to_front(eye, &planes, &mut visitor);
//! ```
//!
//! # Architecture
//!
//! - [`BspTree`]: arena of linked [`BspNode`]s built from a mesh
//! - [`FlatBsp`]: node array plus shared coplanar table, as written to disk
//! - [`BspVisitor`]: visitor trait for painter's-order traversal

mod flat;
mod node;
mod tree;
mod visitor;

pub use flat::{FlatBsp, FlatNode, MAX_FACES, MAX_NODES, NO_CHILD, UNRESOLVED_FACE};
pub use node::{BspNode, ChildSlot, NodeId};
pub use tree::BspTree;
pub use visitor::{BspVisitor, CollectingVisitor, FnVisitor};
