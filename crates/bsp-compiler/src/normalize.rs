//! Centering, uniform scaling and fixed-point range validation.
//!
//! The target renderer stores coordinates as 16.16 fixed point, so every
//! component must lie in `[-32768, 32767]` once the model is scaled.

use nalgebra::{Point3, Vector3};

/// Positive limit of a 16.16 fixed-point coordinate.
pub const FIXED32_LIMIT: f32 = 32767.0;

/// Default size of the largest model extent after scaling.
pub const DEFAULT_TARGET_SIZE: f32 = 60.0;

/// Moves the vertex centroid to the origin and scales uniformly so the
/// largest axis-aligned extent equals `target_size`.
///
/// Returns the scale factor applied. A model with zero extent (no vertices,
/// or all vertices identical) is only centered and the scale is 1.
pub fn center_and_scale(vertices: &mut [Point3<f32>], target_size: f32) -> f32 {
    if vertices.is_empty() {
        return 1.0;
    }

    let count = vertices.len() as f64;
    let sum: Vector3<f64> = vertices.iter().map(|p| p.coords.map(f64::from)).sum();
    let center: Vector3<f32> = sum.map(|c| (c / count) as f32);

    let mut min = Vector3::repeat(f32::INFINITY);
    let mut max = Vector3::repeat(f32::NEG_INFINITY);
    for vertex in vertices.iter_mut() {
        *vertex -= center;
        min = min.inf(&vertex.coords);
        max = max.sup(&vertex.coords);
    }

    let largest = (max - min).max();
    let scale = if largest > 0.0 { target_size / largest } else { 1.0 };
    for vertex in vertices.iter_mut() {
        vertex.coords *= scale;
    }
    scale
}

/// Summary of the coordinate components of a vertex set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateRange {
    /// Smallest component (0 for an empty set).
    pub min: f32,
    /// Largest component (0 for an empty set).
    pub max: f32,
    /// Number of components outside `[-limit - 1, limit]`.
    pub out_of_range: usize,
}

impl CoordinateRange {
    /// Returns true if every component is within the limit.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.out_of_range == 0
    }
}

/// Checks every coordinate component against `[-limit - 1, limit]`.
///
/// Non-finite components count as out of range.
pub fn check_coordinate_range(vertices: &[Point3<f32>], limit: f32) -> CoordinateRange {
    let mut components = vertices.iter().flat_map(|p| p.coords.iter().copied()).peekable();
    if components.peek().is_none() {
        return CoordinateRange {
            min: 0.0,
            max: 0.0,
            out_of_range: 0,
        };
    }

    let low = -limit - 1.0;
    components.fold(
        CoordinateRange {
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
            out_of_range: 0,
        },
        |acc, c| CoordinateRange {
            min: acc.min.min(c),
            max: acc.max.max(c),
            out_of_range: acc.out_of_range + usize::from(!(low..=limit).contains(&c)),
        },
    )
}
