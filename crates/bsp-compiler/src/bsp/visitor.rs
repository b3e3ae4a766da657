//! Visitor pattern for painter's-order traversal of a flat BSP tree.
//!
//! This is the walk the consuming renderer performs: at every node the eye
//! is tested against the plane of the node's splitting face, and the far
//! subtree, the node's coplanar faces and the near subtree are visited in
//! that order (or the reverse for front-to-back).

use nalgebra::Point3;

use crate::plane::{Plane, PlaneSide};

use super::flat::FlatBsp;

/// Receives the coplanar face runs of a flat tree in traversal order.
///
/// A renderer drawing with the painter's algorithm implements this to emit
/// each run as it arrives during a back-to-front walk.
pub trait BspVisitor {
    /// Called for each node's run of coplanar faces during traversal.
    ///
    /// The slice holds canonical face indices, all on the same plane.
    fn visit(&mut self, faces: &[u16]);
}

/// Gathers canonical face indices in the order a traversal emits them.
///
/// After a back-to-front walk this is the draw order.
#[derive(Debug, Default)]
pub struct CollectingVisitor {
    collected: Vec<u16>,
}

impl CollectingVisitor {
    /// Creates a visitor with no faces gathered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the visitor, returning the gathered face indices.
    pub fn into_faces(self) -> Vec<u16> {
        self.collected
    }

    /// Face indices gathered so far.
    pub fn faces(&self) -> &[u16] {
        &self.collected
    }
}

impl BspVisitor for CollectingVisitor {
    fn visit(&mut self, faces: &[u16]) {
        self.collected.extend_from_slice(faces);
    }
}

/// Hands each node's coplanar face run to a closure.
pub struct FnVisitor<F>
where
    F: FnMut(&[u16]),
{
    func: F,
}

impl<F> FnVisitor<F>
where
    F: FnMut(&[u16]),
{
    /// Wraps `func`, which sees one run of face indices per visited node.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> BspVisitor for FnVisitor<F>
where
    F: FnMut(&[u16]),
{
    fn visit(&mut self, faces: &[u16]) {
        (self.func)(faces);
    }
}

#[derive(Clone, Copy)]
enum Step {
    Enter(usize),
    Emit(usize),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Order {
    BackToFront,
    FrontToBack,
}

impl FlatBsp {
    /// Traverses the whole tree back-to-front relative to `eye`.
    ///
    /// `planes` holds the plane of every canonical face, indexed by face.
    /// Farthest faces are visited first, as the painter's algorithm needs.
    pub fn traverse_back_to_front<V: BspVisitor>(
        &self,
        eye: Point3<f32>,
        planes: &[Plane],
        visitor: &mut V,
    ) {
        if let Ok(root) = usize::try_from(self.root()) {
            self.traverse_from(root, eye, planes, visitor, Order::BackToFront);
        }
    }

    /// Traverses the whole tree front-to-back relative to `eye`.
    pub fn traverse_front_to_back<V: BspVisitor>(
        &self,
        eye: Point3<f32>,
        planes: &[Plane],
        visitor: &mut V,
    ) {
        if let Ok(root) = usize::try_from(self.root()) {
            self.traverse_from(root, eye, planes, visitor, Order::FrontToBack);
        }
    }

    /// Traverses the subtree rooted at `position` back-to-front.
    pub fn traverse_subtree_back_to_front<V: BspVisitor>(
        &self,
        position: usize,
        eye: Point3<f32>,
        planes: &[Plane],
        visitor: &mut V,
    ) {
        self.traverse_from(position, eye, planes, visitor, Order::BackToFront);
    }

    fn traverse_from<V: BspVisitor>(
        &self,
        start: usize,
        eye: Point3<f32>,
        planes: &[Plane],
        visitor: &mut V,
        order: Order,
    ) {
        let mut stack = vec![Step::Enter(start)];
        // Decoded node arrays may contain cycles; enter each node once.
        let mut entered = vec![false; self.len()];
        while let Some(step) = stack.pop() {
            let position = match step {
                Step::Emit(position) => {
                    let faces = self.coplanar_faces(position);
                    if !faces.is_empty() {
                        visitor.visit(faces);
                    }
                    continue;
                }
                Step::Enter(position) => position,
            };
            let Some(node) = self.node(position) else {
                continue;
            };
            if std::mem::replace(&mut entered[position], true) {
                continue;
            }

            let side = planes
                .get(usize::from(node.plane_face))
                .map_or(PlaneSide::OnPlane, |plane| plane.classify_point(eye));
            let (near, far) = match side {
                PlaneSide::Front | PlaneSide::OnPlane => (node.front_child(), node.back_child()),
                PlaneSide::Back => (node.back_child(), node.front_child()),
            };
            let (first, last) = match order {
                Order::BackToFront => (far, near),
                Order::FrontToBack => (near, far),
            };

            // Pushed in reverse so `first` is popped first.
            stack.extend(last.map(Step::Enter));
            stack.push(Step::Emit(position));
            stack.extend(first.map(Step::Enter));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::BspTree;
    use crate::face::Face;
    use crate::mesh::Mesh;
    use crate::plane::compute_plane;

    fn stacked(zs: &[f32]) -> (Mesh, FlatBsp, Vec<Plane>) {
        let mut vertices = Vec::new();
        let mut faces = Vec::new();
        for &z in zs {
            let base = vertices.len();
            vertices.push(Point3::new(0.0, 0.0, z));
            vertices.push(Point3::new(1.0, 0.0, z));
            vertices.push(Point3::new(0.0, 1.0, z));
            faces.push(Face::from([base, base + 1, base + 2]));
        }
        let mesh = Mesh::new(vertices, faces).unwrap();
        let tree = BspTree::from_mesh(&mesh).unwrap();
        let flat = FlatBsp::from_tree(&tree, mesh.face_count()).unwrap();
        let planes = mesh
            .faces()
            .iter()
            .enumerate()
            .map(|(i, f)| compute_plane(i, f, mesh.vertices()).unwrap())
            .collect();
        (mesh, flat, planes)
    }

    #[test]
    fn collecting_visitor_collects() {
        let mut visitor = CollectingVisitor::new();
        visitor.visit(&[1, 2]);
        visitor.visit(&[7]);
        assert_eq!(visitor.faces(), &[1, 2, 7]);
        assert_eq!(visitor.into_faces(), vec![1, 2, 7]);
    }

    #[test]
    fn fn_visitor_calls_closure() {
        let mut count = 0;
        {
            let mut visitor = FnVisitor::new(|faces: &[u16]| count += faces.len());
            visitor.visit(&[0, 1, 2]);
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn fn_visitor_sees_each_coplanar_run_whole() {
        // The first two faces share the z=0 plane and form the root's run.
        let (_, flat, planes) = stacked(&[0.0, 0.0, 1.0]);
        let mut runs = Vec::new();
        let mut visitor = FnVisitor::new(|faces: &[u16]| runs.push(faces.to_vec()));
        flat.traverse_back_to_front(Point3::new(0.2, 0.2, 10.0), &planes, &mut visitor);
        assert_eq!(runs, vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn back_to_front_from_above() {
        // Faces at z = 0, 1, -1, 2; eye far above: farthest (lowest z) first.
        let (_, flat, planes) = stacked(&[0.0, 1.0, -1.0, 2.0]);
        let mut visitor = CollectingVisitor::new();
        flat.traverse_back_to_front(Point3::new(0.2, 0.2, 10.0), &planes, &mut visitor);
        assert_eq!(visitor.into_faces(), vec![2, 0, 1, 3]);
    }

    #[test]
    fn back_to_front_from_below() {
        let (_, flat, planes) = stacked(&[0.0, 1.0, -1.0, 2.0]);
        let mut visitor = CollectingVisitor::new();
        flat.traverse_back_to_front(Point3::new(0.2, 0.2, -10.0), &planes, &mut visitor);
        assert_eq!(visitor.into_faces(), vec![3, 1, 0, 2]);
    }

    #[test]
    fn front_to_back_is_reverse_of_back_to_front() {
        let (_, flat, planes) = stacked(&[0.0, 1.0, -1.0, 2.0, -3.0, 0.5]);
        let eye = Point3::new(0.3, 0.1, 0.75);

        let mut back_to_front = CollectingVisitor::new();
        flat.traverse_back_to_front(eye, &planes, &mut back_to_front);
        let mut front_to_back = CollectingVisitor::new();
        flat.traverse_front_to_back(eye, &planes, &mut front_to_back);

        let mut reversed = back_to_front.into_faces();
        reversed.reverse();
        assert_eq!(front_to_back.into_faces(), reversed);
    }

    #[test]
    fn subtree_traversal_stays_in_subtree() {
        let (_, flat, planes) = stacked(&[0.0, 1.0, -1.0, 2.0]);
        let mut visitor = CollectingVisitor::new();
        // Node 1 is the z=1 face with z=2 in front of it.
        flat.traverse_subtree_back_to_front(1, Point3::new(0.0, 0.0, 10.0), &planes, &mut visitor);
        assert_eq!(visitor.into_faces(), vec![1, 3]);
    }

    #[test]
    fn empty_tree_visits_nothing() {
        let flat = FlatBsp::default();
        let mut visitor = CollectingVisitor::new();
        flat.traverse_back_to_front(Point3::origin(), &[], &mut visitor);
        assert!(visitor.faces().is_empty());
    }
}
