//! Splitting planes and point/face classification against them.

use log::debug;
use nalgebra::{Point3, Vector3};

use crate::error::{BspError, Result};
use crate::face::Face;

/// Default epsilon for plane classification.
/// Points within this distance of the plane are considered "on" the plane.
pub const PLANE_EPSILON: f32 = 1e-5;

/// Normal used when a face's first three vertices are collinear.
#[inline]
pub fn default_normal() -> Vector3<f32> {
    Vector3::z()
}

/// Which side of a plane a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    /// Point is in front of the plane (positive side of normal)
    Front,
    /// Point is behind the plane (negative side of normal)
    Back,
    /// Point lies on the plane (within epsilon tolerance)
    OnPlane,
}

/// Classification of a face relative to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Some vertices are in front of the plane, none behind
    Front,
    /// Some vertices are behind the plane, none in front
    Back,
    /// Every vertex is within epsilon of the plane
    Coplanar,
    /// Vertices are on both sides (spans the plane)
    Spanning,
}

/// A plane in 3D space, stored as a reference point and a unit normal.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    point: Point3<f32>,
    normal: Vector3<f32>,
}

impl Plane {
    /// Creates a plane from a point on the plane and a normal vector.
    ///
    /// The normal is normalized; a zero or non-finite normal is replaced
    /// by [`default_normal`].
    pub fn from_point_and_normal(point: Point3<f32>, normal: Vector3<f32>) -> Self {
        let normal = unit_or_default(normal).unwrap_or_else(default_normal);
        Self { point, normal }
    }

    /// Returns the reference point of the plane.
    #[inline]
    pub fn point(&self) -> Point3<f32> {
        self.point
    }

    /// Returns the unit normal vector of the plane.
    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    /// Computes the signed distance from a point to the plane.
    /// - Positive: point is in front (same side as normal)
    /// - Negative: point is behind (opposite side from normal)
    /// - Zero: point is on the plane
    #[inline]
    pub fn signed_distance(&self, point: Point3<f32>) -> f32 {
        (point - self.point).dot(&self.normal)
    }

    /// Classifies which side of the plane a point lies on.
    /// Uses the default `PLANE_EPSILON` tolerance.
    #[inline]
    pub fn classify_point(&self, point: Point3<f32>) -> PlaneSide {
        self.classify_point_with_epsilon(point, PLANE_EPSILON)
    }

    /// Classifies which side of the plane a point lies on, with a custom epsilon.
    pub fn classify_point_with_epsilon(&self, point: Point3<f32>, epsilon: f32) -> PlaneSide {
        let dist = self.signed_distance(point);
        if dist > epsilon {
            PlaneSide::Front
        } else if dist < -epsilon {
            PlaneSide::Back
        } else {
            PlaneSide::OnPlane
        }
    }
}

fn unit_or_default(normal: Vector3<f32>) -> Option<Vector3<f32>> {
    let norm = normal.norm();
    (norm > 0.0 && norm.is_finite()).then(|| normal / norm)
}

/// Computes the splitting plane of a face.
///
/// Uses the first three vertices: `u = v1 - v0`, `v = v2 - v0` and the
/// normal `normalize(u × v)`, anchored at `v0`. When the three vertices are
/// collinear the normal falls back to (0, 0, 1) instead of failing.
///
/// `index` is the face's canonical index and is only used to tag errors.
///
/// # Errors
/// - [`BspError::InvalidFace`] if the face has fewer than three vertices.
/// - [`BspError::VertexOutOfRange`] if one of its first three indices does
///   not address a vertex.
pub fn compute_plane(index: usize, face: &Face, vertices: &[Point3<f32>]) -> Result<Plane> {
    let [i0, i1, i2] = match face.indices() {
        [a, b, c, ..] => [*a, *b, *c],
        short => {
            return Err(BspError::InvalidFace {
                face: index,
                vertex_count: short.len(),
            });
        }
    };

    let vertex = |i: usize| {
        vertices.get(i).copied().ok_or(BspError::VertexOutOfRange {
            face: index,
            vertex: i,
            vertex_count: vertices.len(),
        })
    };
    let (v0, v1, v2) = (vertex(i0)?, vertex(i1)?, vertex(i2)?);

    let cross = (v1 - v0).cross(&(v2 - v0));
    let normal = match unit_or_default(cross) {
        Some(normal) => normal,
        None => {
            debug!("face {index} is degenerate, using the default plane normal");
            default_normal()
        }
    };

    Ok(Plane { point: v0, normal })
}
