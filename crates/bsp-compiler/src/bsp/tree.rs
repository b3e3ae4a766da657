//! BSP tree container and construction.

use std::collections::VecDeque;

use log::{debug, trace};

use crate::error::Result;
use crate::mesh::Mesh;
use crate::plane::{compute_plane, Classification, Plane, PLANE_EPSILON};

use super::node::{BspNode, ChildSlot, NodeId};

/// How often construction progress is traced, in nodes.
const PROGRESS_INTERVAL: usize = 1024;

/// A Binary Space Partitioning tree over the faces of a [`Mesh`].
///
/// Nodes live in an arena and refer to their children by [`NodeId`]. The
/// tree is built breadth-first from an explicit work-list, so arena order is
/// the breadth-first discovery order with the root at position 0, and no
/// operation on the tree recurses on the call stack.
///
/// # Construction
///
/// ```ignore
/// use bsp_compiler::{BspTree, Mesh, PLANE_EPSILON};
///
/// let mesh: Mesh = /* ... */;
/// let tree = BspTree::build(&mesh, PLANE_EPSILON)?;
/// ```
///
/// The splitter of every partition is its first face. Spanning faces are
/// never cut: they are placed whole into the front partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BspTree {
    nodes: Vec<BspNode>,
    root: Option<NodeId>,
}

/// A partition still waiting for its node.
struct Task {
    parent: Option<(NodeId, ChildSlot)>,
    faces: Vec<usize>,
}

impl BspTree {
    /// Creates an empty BSP tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a BSP tree over all faces of `mesh`.
    ///
    /// Returns an empty tree if the mesh has no faces.
    ///
    /// # Errors
    /// Fails if a face's plane cannot be computed (see
    /// [`compute_plane`](crate::compute_plane)).
    pub fn build(mesh: &Mesh, epsilon: f32) -> Result<Self> {
        let vertices = mesh.vertices();
        let faces = mesh.faces();
        if faces.is_empty() {
            return Ok(Self::new());
        }

        let planes = faces
            .iter()
            .enumerate()
            .map(|(index, face)| compute_plane(index, face, vertices))
            .collect::<Result<Vec<Plane>>>()?;

        let mut nodes: Vec<BspNode> = Vec::new();
        let mut pending = VecDeque::from([Task {
            parent: None,
            faces: (0..faces.len()).collect(),
        }]);

        while let Some(Task {
            parent,
            faces: partition,
        }) = pending.pop_front()
        {
            let Some((&splitter, rest)) = partition.split_first() else {
                continue;
            };
            let plane = &planes[splitter];

            let mut coplanar = Vec::new();
            let mut front_list = Vec::new();
            let mut back_list = Vec::new();

            for &index in rest {
                match faces[index].classify(plane, vertices, epsilon) {
                    Classification::Coplanar => coplanar.push(index),
                    Classification::Front | Classification::Spanning => front_list.push(index),
                    Classification::Back => back_list.push(index),
                }
            }

            let id = NodeId(nodes.len());
            nodes.push(BspNode::new(splitter, coplanar));
            if let Some((parent, slot)) = parent {
                nodes[parent.index()].set_child(slot, Some(id));
            }

            if !front_list.is_empty() {
                pending.push_back(Task {
                    parent: Some((id, ChildSlot::Front)),
                    faces: front_list,
                });
            }
            if !back_list.is_empty() {
                pending.push_back(Task {
                    parent: Some((id, ChildSlot::Back)),
                    faces: back_list,
                });
            }

            if nodes.len() % PROGRESS_INTERVAL == 0 {
                trace!("{} nodes built, {} partitions pending", nodes.len(), pending.len());
            }
        }

        let tree = Self {
            nodes,
            root: Some(NodeId(0)),
        };
        debug!(
            "built BSP tree: {} faces, {} nodes, depth {}",
            faces.len(),
            tree.len(),
            tree.depth()
        );
        Ok(tree)
    }

    /// Builds a BSP tree using the default `PLANE_EPSILON`.
    pub fn from_mesh(mesh: &Mesh) -> Result<Self> {
        Self::build(mesh, PLANE_EPSILON)
    }

    /// Returns `true` if the tree contains no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the root node id, if any.
    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns the node with the given id.
    ///
    /// # Panics
    /// Panics if `id` does not belong to this tree.
    #[inline]
    pub fn node(&self, id: NodeId) -> &BspNode {
        &self.nodes[id.index()]
    }

    /// Returns the node with the given id, or `None` if it is not in this tree.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&BspNode> {
        self.nodes.get(id.index())
    }

    /// Returns all nodes in arena (breadth-first) order.
    #[inline]
    pub fn nodes(&self) -> &[BspNode] {
        &self.nodes
    }

    /// Returns the total number of faces stored across all nodes.
    pub fn face_count(&self) -> usize {
        self.nodes.iter().map(BspNode::coplanar_count).sum()
    }

    /// Returns the maximum depth of the tree (0 for an empty tree).
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack: Vec<(NodeId, usize)> = self.root.map(|root| (root, 1)).into_iter().collect();
        while let Some((id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            stack.extend(self.node(id).children().map(|child| (child, depth + 1)));
        }
        max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::Face;
    use nalgebra::Point3;

    /// Builds a mesh where every face is a separate triangle.
    fn triangles(tris: &[[[f32; 3]; 3]]) -> Mesh {
        let mut vertices = Vec::new();
        let mut faces = Vec::new();
        for tri in tris {
            let base = vertices.len();
            vertices.extend(tri.iter().map(|p| Point3::new(p[0], p[1], p[2])));
            faces.push(Face::from([base, base + 1, base + 2]));
        }
        Mesh::new(vertices, faces).unwrap()
    }

    fn z_triangle(z: f32) -> [[f32; 3]; 3] {
        [[0.0, 0.0, z], [1.0, 0.0, z], [0.0, 1.0, z]]
    }

    #[test]
    fn empty_tree() {
        let tree = BspTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.face_count(), 0);
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn build_empty() {
        let tree = BspTree::from_mesh(&Mesh::default()).unwrap();
        assert!(tree.is_empty());
        assert!(tree.root().is_none());
    }

    #[test]
    fn build_single_face() {
        let tree = BspTree::from_mesh(&triangles(&[z_triangle(0.0)])).unwrap();

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.depth(), 1);
        let root = tree.node(tree.root().unwrap());
        assert_eq!(root.splitter(), 0);
        assert_eq!(root.coplanar(), &[0]);
        assert!(root.is_leaf());
    }

    #[test]
    fn build_coplanar_faces_share_a_node() {
        let mesh = triangles(&[
            z_triangle(0.0),
            [[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
            // Opposite winding, same plane
            [[5.0, 5.0, 0.0], [5.0, 6.0, 0.0], [6.0, 5.0, 0.0]],
        ]);
        let tree = BspTree::from_mesh(&mesh).unwrap();

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.node(NodeId(0)).coplanar(), &[0, 1, 2]);
    }

    #[test]
    fn front_and_back_children() {
        // Splitter at z=0 facing +Z, one face above, one below.
        let mesh = triangles(&[z_triangle(0.0), z_triangle(1.0), z_triangle(-1.0)]);
        let tree = BspTree::from_mesh(&mesh).unwrap();

        assert_eq!(tree.len(), 3);
        let root = tree.node(NodeId(0));
        let front = tree.node(root.front().unwrap());
        let back = tree.node(root.back().unwrap());
        assert_eq!(front.coplanar(), &[1]);
        assert_eq!(back.coplanar(), &[2]);
        // Breadth-first arena order, front before back
        assert_eq!(root.front(), Some(NodeId(1)));
        assert_eq!(root.back(), Some(NodeId(2)));
    }

    #[test]
    fn spanning_face_goes_to_front_unsplit() {
        // Splitter on Y=0 facing -Y; the second triangle crosses Y=0.
        let mesh = triangles(&[
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
            [[-0.5, -1.0, 0.5], [0.5, 1.0, 0.5], [0.5, -1.0, 0.5]],
        ]);
        let tree = BspTree::from_mesh(&mesh).unwrap();

        // No splitting: still two faces in total
        assert_eq!(tree.face_count(), 2);
        let root = tree.node(NodeId(0));
        assert!(root.back().is_none());
        assert_eq!(tree.node(root.front().unwrap()).coplanar(), &[1]);
    }

    #[test]
    fn collinear_splitter_uses_default_normal() {
        // Face 0 is degenerate (collinear along X at z=0); its plane is z=0 facing +Z.
        let mesh = triangles(&[
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            z_triangle(3.0),
            z_triangle(-3.0),
        ]);
        let tree = BspTree::from_mesh(&mesh).unwrap();

        let root = tree.node(NodeId(0));
        assert_eq!(root.coplanar(), &[0]);
        assert_eq!(tree.node(root.front().unwrap()).coplanar(), &[1]);
        assert_eq!(tree.node(root.back().unwrap()).coplanar(), &[2]);
    }

    #[test]
    fn nested_partitions() {
        // Stacked slabs produce a front chain.
        let mesh = triangles(&[z_triangle(0.0), z_triangle(1.0), z_triangle(2.0), z_triangle(3.0)]);
        let tree = BspTree::from_mesh(&mesh).unwrap();

        assert_eq!(tree.len(), 4);
        assert_eq!(tree.depth(), 4);
        assert_eq!(tree.face_count(), 4);
    }

    #[test]
    fn rebuild_is_identical() {
        let mesh = triangles(&[
            z_triangle(0.0),
            [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            z_triangle(2.0),
            [[3.0, -1.0, -1.0], [3.0, 1.0, -1.0], [3.0, 0.0, 1.0]],
            z_triangle(-2.0),
        ]);
        let a = BspTree::from_mesh(&mesh).unwrap();
        let b = BspTree::from_mesh(&mesh).unwrap();
        assert_eq!(a, b);
    }
}
