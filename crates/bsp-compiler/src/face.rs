//! Index-based polygon representation.

use nalgebra::Point3;

use crate::plane::{Classification, Plane, PlaneSide};

/// A polygon given as an ordered list of indices into a vertex array.
///
/// Vertices should be coplanar and wound counter-clockwise when viewed
/// from the front. A face's identity is its position in the mesh's face
/// array (its canonical index), not its content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Face {
    indices: Vec<usize>,
}

impl Face {
    /// Creates a face from vertex indices.
    ///
    /// No validation happens here; [`Mesh::new`](crate::Mesh::new) checks
    /// faces against their vertex array.
    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    /// Returns the vertex indices of the face.
    #[inline]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if the face has no vertices (never true for a validated face).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterates over the face's vertex positions.
    ///
    /// Indices that do not address a vertex are skipped.
    pub fn points<'a>(
        &'a self,
        vertices: &'a [Point3<f32>],
    ) -> impl Iterator<Item = Point3<f32>> + 'a {
        self.indices.iter().filter_map(|&i| vertices.get(i).copied())
    }

    /// Classifies this face relative to a plane.
    ///
    /// Each vertex at signed distance `d` counts as front when `d > epsilon`
    /// and as back when `d < -epsilon`. Returns:
    /// - `Front` if only front vertices were seen
    /// - `Back` if only back vertices were seen
    /// - `Coplanar` if neither were seen
    /// - `Spanning` if both were seen (stops at the first such vertex)
    pub fn classify(
        &self,
        plane: &Plane,
        vertices: &[Point3<f32>],
        epsilon: f32,
    ) -> Classification {
        let mut front = false;
        let mut back = false;

        for point in self.points(vertices) {
            match plane.classify_point_with_epsilon(point, epsilon) {
                PlaneSide::Front => front = true,
                PlaneSide::Back => back = true,
                PlaneSide::OnPlane => {}
            }
            if front && back {
                return Classification::Spanning;
            }
        }

        match (front, back) {
            (true, false) => Classification::Front,
            (false, true) => Classification::Back,
            (false, false) => Classification::Coplanar,
            (true, true) => Classification::Spanning,
        }
    }
}

impl From<Vec<usize>> for Face {
    fn from(indices: Vec<usize>) -> Self {
        Self::new(indices)
    }
}

impl<const N: usize> From<[usize; N]> for Face {
    fn from(indices: [usize; N]) -> Self {
        Self::new(indices.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plane::PLANE_EPSILON;
    use nalgebra::Vector3;

    fn ground() -> Plane {
        Plane::from_point_and_normal(Point3::origin(), Vector3::new(0.0, 0.0, 1.0))
    }

    fn vertices() -> Vec<Point3<f32>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),  // 0: on
            Point3::new(1.0, 0.0, 0.0),  // 1: on
            Point3::new(0.0, 1.0, 0.0),  // 2: on
            Point3::new(0.0, 0.0, 1.0),  // 3: front
            Point3::new(1.0, 0.0, 1.0),  // 4: front
            Point3::new(0.0, 0.0, -1.0), // 5: back
            Point3::new(1.0, 0.0, -1.0), // 6: back
        ]
    }

    #[test]
    fn coplanar_face() {
        let face = Face::from([0, 1, 2]);
        assert_eq!(
            face.classify(&ground(), &vertices(), PLANE_EPSILON),
            Classification::Coplanar
        );
    }

    #[test]
    fn front_face_touching_plane() {
        let face = Face::from([0, 3, 4]);
        assert_eq!(
            face.classify(&ground(), &vertices(), PLANE_EPSILON),
            Classification::Front
        );
    }

    #[test]
    fn back_face() {
        let face = Face::from([5, 6, 1]);
        assert_eq!(
            face.classify(&ground(), &vertices(), PLANE_EPSILON),
            Classification::Back
        );
    }

    #[test]
    fn spanning_face() {
        let face = Face::from([3, 5, 6]);
        assert_eq!(
            face.classify(&ground(), &vertices(), PLANE_EPSILON),
            Classification::Spanning
        );
    }

    #[test]
    fn wide_epsilon_makes_everything_coplanar() {
        let face = Face::from([3, 5, 6]);
        assert_eq!(
            face.classify(&ground(), &vertices(), 2.0),
            Classification::Coplanar
        );
    }

    #[test]
    fn len_and_indices() {
        let face = Face::from(vec![4, 2, 0, 1]);
        assert_eq!(face.len(), 4);
        assert!(!face.is_empty());
        assert_eq!(face.indices(), &[4, 2, 0, 1]);
    }
}
