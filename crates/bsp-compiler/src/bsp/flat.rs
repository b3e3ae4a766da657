//! Flat, index-addressed form of a BSP tree.
//!
//! The linked [`BspTree`] is converted into two dense arrays: one
//! [`FlatNode`] per tree node, and a single coplanar-face table shared by
//! all nodes. Each node addresses its run of that table by `(start, count)`
//! and its children by position in the node array, with [`NO_CHILD`]
//! standing in for an absent child.

use std::collections::VecDeque;

use crate::error::{BspError, Result};

use super::node::NodeId;
use super::tree::BspTree;

/// Child index meaning "no such node".
pub const NO_CHILD: i16 = -1;

/// Plane-face value reserved for a failed face lookup. Never written by
/// this crate; the decoder rejects it.
pub const UNRESOLVED_FACE: u16 = 0xFFFF;

/// Largest number of nodes addressable by a signed 16-bit child index.
pub const MAX_NODES: usize = i16::MAX as usize + 1;

/// Largest number of faces whose indices stay clear of [`UNRESOLVED_FACE`].
pub const MAX_FACES: usize = UNRESOLVED_FACE as usize;

/// A BSP node in array form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlatNode {
    /// Canonical index of the splitting face.
    pub plane_face: u16,
    /// Number of entries in this node's coplanar run.
    pub coplanar_count: u16,
    /// Offset of the run in the shared coplanar table.
    pub coplanar_start: u16,
    /// Position of the front child, or [`NO_CHILD`].
    pub front: i16,
    /// Position of the back child, or [`NO_CHILD`].
    pub back: i16,
}

impl FlatNode {
    /// Returns the front child position, if any.
    #[inline]
    pub fn front_child(&self) -> Option<usize> {
        child_position(self.front)
    }

    /// Returns the back child position, if any.
    #[inline]
    pub fn back_child(&self) -> Option<usize> {
        child_position(self.back)
    }

    /// Returns the range of this node's run in the coplanar table.
    #[inline]
    pub fn coplanar_range(&self) -> std::ops::Range<usize> {
        let start = usize::from(self.coplanar_start);
        start..start + usize::from(self.coplanar_count)
    }

    /// Checks if this node has any children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.front == NO_CHILD && self.back == NO_CHILD
    }
}

fn child_position(index: i16) -> Option<usize> {
    usize::try_from(index).ok()
}

/// A flattened BSP tree: node array plus shared coplanar table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatBsp {
    nodes: Vec<FlatNode>,
    coplanar: Vec<u16>,
    root: i16,
}

impl Default for FlatBsp {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            coplanar: Vec::new(),
            root: NO_CHILD,
        }
    }
}

impl FlatBsp {
    /// Flattens a linked tree built over `face_count` canonical faces.
    ///
    /// Node positions are assigned breadth-first with the root at 0. Nodes
    /// are then filled depth-first, front subtree before back subtree, and
    /// each appends its coplanar faces to the shared table as it is filled.
    ///
    /// # Errors
    /// - [`BspError::IndexResolutionFailure`] if a node references a face
    ///   index outside `0..face_count`.
    /// - [`BspError::UnindexedNode`] if a child is unreachable from the root.
    /// - [`BspError::CountOverflow`] if the node count or face count does
    ///   not fit the 16-bit fields.
    pub fn from_tree(tree: &BspTree, face_count: usize) -> Result<Self> {
        let Some(root) = tree.root() else {
            return Ok(Self::default());
        };
        if face_count > MAX_FACES {
            return Err(BspError::CountOverflow {
                what: "face count",
                value: face_count,
                max: MAX_FACES,
            });
        }
        if tree.len() > MAX_NODES {
            return Err(BspError::CountOverflow {
                what: "node count",
                value: tree.len(),
                max: MAX_NODES,
            });
        }

        // Indexing pass: breadth-first positions, root first.
        let mut positions: Vec<Option<usize>> = vec![None; tree.len()];
        let mut discovered = 0;
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            let slot = &mut positions[id.index()];
            if slot.is_some() {
                continue;
            }
            *slot = Some(discovered);
            discovered += 1;
            queue.extend(tree.node(id).children());
        }

        // Fill pass: depth-first, front before back.
        let mut nodes = vec![FlatNode::default(); discovered];
        let mut filled = vec![false; discovered];
        let mut coplanar: Vec<u16> = Vec::with_capacity(tree.face_count());
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let position = resolve_node(&positions, id)?;
            if filled[position] {
                continue;
            }
            let node = tree.node(id);

            let coplanar_start = table_offset(coplanar.len())?;
            for &face in node.coplanar() {
                coplanar.push(resolve_face(position, face, face_count)?);
            }

            nodes[position] = FlatNode {
                plane_face: resolve_face(position, node.splitter(), face_count)?,
                coplanar_count: table_offset(node.coplanar_count())?,
                coplanar_start,
                front: child_index(&positions, node.front())?,
                back: child_index(&positions, node.back())?,
            };
            filled[position] = true;

            stack.extend(node.back());
            stack.extend(node.front());
        }

        Ok(Self {
            nodes,
            coplanar,
            root: 0,
        })
    }

    /// Assembles a flat tree from raw arrays, validating every reference.
    ///
    /// # Errors
    /// Returns [`BspError::InvalidFormat`] (with `offset` 0) describing the
    /// first inconsistency found.
    pub fn from_parts(nodes: Vec<FlatNode>, coplanar: Vec<u16>, face_count: usize) -> Result<Self> {
        let flat = Self {
            root: if nodes.is_empty() { NO_CHILD } else { 0 },
            nodes,
            coplanar,
        };
        flat.validate(face_count)
            .map_err(|message| BspError::invalid_format(0, message))?;
        Ok(flat)
    }

    /// Checks every cross reference against the node array, the coplanar
    /// table and `face_count`. Returns a description of the first problem.
    pub(crate) fn validate(&self, face_count: usize) -> std::result::Result<(), String> {
        let node_count = self.nodes.len();
        if node_count > MAX_NODES {
            return Err(format!("{node_count} nodes exceed the limit of {MAX_NODES}"));
        }
        for (position, node) in self.nodes.iter().enumerate() {
            if node.plane_face == UNRESOLVED_FACE {
                return Err(format!("node {position} has an unresolved plane face"));
            }
            if usize::from(node.plane_face) >= face_count {
                return Err(format!(
                    "node {position} splits on face {} but there are {face_count} faces",
                    node.plane_face
                ));
            }
            for child in [node.front, node.back] {
                if child < NO_CHILD || child_position(child).is_some_and(|c| c >= node_count) {
                    return Err(format!("node {position} has child index {child} out of range"));
                }
            }
            if node.coplanar_range().end > self.coplanar.len() {
                return Err(format!(
                    "node {position} coplanar run {:?} exceeds table of {}",
                    node.coplanar_range(),
                    self.coplanar.len()
                ));
            }
        }
        if let Some(face) = self.coplanar.iter().find(|&&f| usize::from(f) >= face_count) {
            return Err(format!(
                "coplanar table references face {face} but there are {face_count} faces"
            ));
        }
        Ok(())
    }

    /// Returns the node array.
    #[inline]
    pub fn nodes(&self) -> &[FlatNode] {
        &self.nodes
    }

    /// Returns the node at `position`, if any.
    #[inline]
    pub fn node(&self, position: usize) -> Option<&FlatNode> {
        self.nodes.get(position)
    }

    /// Returns the shared coplanar-face table.
    #[inline]
    pub fn coplanar_table(&self) -> &[u16] {
        &self.coplanar
    }

    /// Returns the coplanar run of the node at `position`.
    pub fn coplanar_faces(&self, position: usize) -> &[u16] {
        self.nodes
            .get(position)
            .and_then(|node| self.coplanar.get(node.coplanar_range()))
            .unwrap_or(&[])
    }

    /// Returns the root position, or [`NO_CHILD`] for an empty tree.
    #[inline]
    pub fn root(&self) -> i16 {
        self.root
    }

    /// Returns the number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree has no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the maximum depth of the tree (0 for an empty tree).
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack: Vec<(usize, usize)> =
            child_position(self.root).map(|root| (root, 1)).into_iter().collect();
        let mut visited = vec![false; self.nodes.len()];
        while let Some((position, depth)) = stack.pop() {
            let Some(node) = self.nodes.get(position) else {
                continue;
            };
            if std::mem::replace(&mut visited[position], true) {
                continue;
            }
            max_depth = max_depth.max(depth);
            stack.extend(
                node.front_child()
                    .into_iter()
                    .chain(node.back_child())
                    .map(|child| (child, depth + 1)),
            );
        }
        max_depth
    }
}

fn resolve_node(positions: &[Option<usize>], id: NodeId) -> Result<usize> {
    positions
        .get(id.index())
        .copied()
        .flatten()
        .ok_or(BspError::UnindexedNode { node: id.index() })
}

fn resolve_face(node: usize, face: usize, face_count: usize) -> Result<u16> {
    if face >= face_count {
        return Err(BspError::IndexResolutionFailure { node, face });
    }
    u16::try_from(face).map_err(|_| BspError::CountOverflow {
        what: "face index",
        value: face,
        max: MAX_FACES - 1,
    })
}

fn table_offset(value: usize) -> Result<u16> {
    u16::try_from(value).map_err(|_| BspError::CountOverflow {
        what: "coplanar table offset",
        value,
        max: u16::MAX as usize,
    })
}

fn child_index(positions: &[Option<usize>], child: Option<NodeId>) -> Result<i16> {
    let Some(child) = child else {
        return Ok(NO_CHILD);
    };
    let position = resolve_node(positions, child)?;
    i16::try_from(position).map_err(|_| BspError::CountOverflow {
        what: "node index",
        value: position,
        max: i16::MAX as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::Face;
    use crate::mesh::Mesh;
    use nalgebra::Point3;

    fn stacked(zs: &[f32]) -> Mesh {
        let mut vertices = Vec::new();
        let mut faces = Vec::new();
        for &z in zs {
            let base = vertices.len();
            vertices.push(Point3::new(0.0, 0.0, z));
            vertices.push(Point3::new(1.0, 0.0, z));
            vertices.push(Point3::new(0.0, 1.0, z));
            faces.push(Face::from([base, base + 1, base + 2]));
        }
        Mesh::new(vertices, faces).unwrap()
    }

    fn flatten(mesh: &Mesh) -> FlatBsp {
        let tree = BspTree::from_mesh(mesh).unwrap();
        FlatBsp::from_tree(&tree, mesh.face_count()).unwrap()
    }

    #[test]
    fn empty_tree_flattens_to_sentinel_root() {
        let flat = FlatBsp::from_tree(&BspTree::new(), 0).unwrap();
        assert!(flat.is_empty());
        assert!(flat.coplanar_table().is_empty());
        assert_eq!(flat.root(), NO_CHILD);
        assert_eq!(flat.depth(), 0);
    }

    #[test]
    fn single_face() {
        let flat = flatten(&stacked(&[0.0]));
        assert_eq!(flat.len(), 1);
        assert_eq!(flat.root(), 0);
        assert_eq!(
            flat.nodes()[0],
            FlatNode {
                plane_face: 0,
                coplanar_count: 1,
                coplanar_start: 0,
                front: NO_CHILD,
                back: NO_CHILD,
            }
        );
        assert_eq!(flat.coplanar_table(), &[0]);
    }

    #[test]
    fn positions_are_breadth_first_and_table_is_depth_first() {
        // z=0 splits; z=1,2 in front (chain), z=-1 behind.
        //        0
        //      /   \
        //  (1)z=1  (2)z=-1
        //     |
        //  (3)z=2
        let flat = flatten(&stacked(&[0.0, 1.0, -1.0, 2.0]));

        assert_eq!(flat.len(), 4);
        let root = flat.nodes()[0];
        assert_eq!(root.front, 1);
        assert_eq!(root.back, 2);
        assert_eq!(flat.nodes()[1].front, 3);
        assert!(flat.nodes()[2].is_leaf());
        assert!(flat.nodes()[3].is_leaf());

        // Fill order: 0, 1, 3, 2
        assert_eq!(flat.coplanar_table(), &[0, 1, 3, 2]);
        assert_eq!(flat.nodes()[3].coplanar_start, 2);
        assert_eq!(flat.nodes()[2].coplanar_start, 3);
        assert_eq!(flat.coplanar_faces(2), &[2]);
        assert_eq!(flat.depth(), 3);
    }

    #[test]
    fn every_face_appears_exactly_once() {
        let mesh = stacked(&[0.0, 3.0, -2.0, 1.0, -5.0, 0.0, 4.0, -1.0]);
        let flat = flatten(&mesh);

        assert!(flat.len() <= mesh.face_count());
        let mut seen = vec![0; mesh.face_count()];
        for position in 0..flat.len() {
            for &face in flat.coplanar_faces(position) {
                seen[usize::from(face)] += 1;
            }
        }
        assert!(seen.iter().all(|&count| count == 1), "seen = {seen:?}");
    }

    #[test]
    fn face_outside_canonical_array_fails_fast() {
        let tree = BspTree::from_mesh(&stacked(&[0.0, 1.0])).unwrap();
        let err = FlatBsp::from_tree(&tree, 1).unwrap_err();
        assert!(matches!(
            err,
            BspError::IndexResolutionFailure { node: 1, face: 1 }
        ));
    }

    #[test]
    fn unindexed_child_names_its_node() {
        let err = resolve_node(&[Some(0), None], NodeId(1)).unwrap_err();
        assert!(matches!(err, BspError::UnindexedNode { node: 1 }));
        assert_eq!(resolve_node(&[Some(0), None], NodeId(0)).unwrap(), 0);
    }

    #[test]
    fn from_parts_rejects_bad_child() {
        let node = FlatNode {
            plane_face: 0,
            coplanar_count: 1,
            coplanar_start: 0,
            front: 3,
            back: NO_CHILD,
        };
        let err = FlatBsp::from_parts(vec![node], vec![0], 1).unwrap_err();
        assert!(matches!(err, BspError::InvalidFormat { .. }));
    }

    #[test]
    fn from_parts_rejects_sentinel_plane_face() {
        let node = FlatNode {
            plane_face: UNRESOLVED_FACE,
            coplanar_count: 0,
            coplanar_start: 0,
            front: NO_CHILD,
            back: NO_CHILD,
        };
        assert!(FlatBsp::from_parts(vec![node], vec![], 4).is_err());
    }

    #[test]
    fn from_parts_round_trips_flattened_tree() {
        let flat = flatten(&stacked(&[0.0, 1.0, -1.0]));
        let rebuilt =
            FlatBsp::from_parts(flat.nodes().to_vec(), flat.coplanar_table().to_vec(), 3).unwrap();
        assert_eq!(rebuilt, flat);
    }
}
