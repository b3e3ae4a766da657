//! Canonical vertex and face arrays.

use nalgebra::Point3;

use crate::error::{BspError, Result};
use crate::face::Face;

/// A polygon mesh: the canonical vertex array and the canonical face array.
///
/// Every face has at least three vertices and only references vertices
/// that exist; [`Mesh::new`] enforces both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<Point3<f32>>,
    faces: Vec<Face>,
}

impl Mesh {
    /// Creates a mesh after validating every face against the vertex array.
    ///
    /// # Errors
    /// - [`BspError::InvalidFace`] for a face with fewer than three vertices.
    /// - [`BspError::VertexOutOfRange`] for an index past the vertex array.
    pub fn new(vertices: Vec<Point3<f32>>, faces: Vec<Face>) -> Result<Self> {
        for (index, face) in faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(BspError::InvalidFace {
                    face: index,
                    vertex_count: face.len(),
                });
            }
            if let Some(&vertex) = face.indices().iter().find(|&&v| v >= vertices.len()) {
                return Err(BspError::VertexOutOfRange {
                    face: index,
                    vertex,
                    vertex_count: vertices.len(),
                });
            }
        }
        Ok(Self { vertices, faces })
    }

    /// Returns the vertex array.
    #[inline]
    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    /// Returns the vertex array for in-place coordinate transforms.
    ///
    /// Face indices stay valid because the array cannot change length.
    #[inline]
    pub fn vertices_mut(&mut self) -> &mut [Point3<f32>] {
        &mut self.vertices
    }

    /// Returns the face array.
    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Returns the face at a canonical index.
    #[inline]
    pub fn face(&self, index: usize) -> Option<&Face> {
        self.faces.get(index)
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of faces.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns true if the mesh has no faces.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point3<f32>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn valid_mesh() {
        let mesh = Mesh::new(square(), vec![Face::from([0, 1, 2]), Face::from([0, 2, 3])]).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.face(1), Some(&Face::from([0, 2, 3])));
        assert!(mesh.face(2).is_none());
    }

    #[test]
    fn empty_mesh_is_valid() {
        let mesh = Mesh::new(vec![], vec![]).unwrap();
        assert!(mesh.is_empty());
    }

    #[test]
    fn rejects_short_face() {
        let err = Mesh::new(square(), vec![Face::from([0, 1, 2]), Face::from([0, 1])]).unwrap_err();
        assert!(matches!(
            err,
            BspError::InvalidFace {
                face: 1,
                vertex_count: 2
            }
        ));
    }

    #[test]
    fn rejects_dangling_index() {
        let err = Mesh::new(square(), vec![Face::from([0, 1, 4])]).unwrap_err();
        assert!(matches!(
            err,
            BspError::VertexOutOfRange {
                face: 0,
                vertex: 4,
                vertex_count: 4
            }
        ));
    }
}
