//! Conversion configuration.

use crate::error::{BspError, Result};
use crate::normalize::{DEFAULT_TARGET_SIZE, FIXED32_LIMIT};
use crate::plane::PLANE_EPSILON;

/// What to do when scaled coordinates exceed the fixed-point limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangePolicy {
    /// Log a warning and keep going.
    #[default]
    Warn,
    /// Abort the conversion with [`BspError::CoordinateRange`].
    Abort,
}

/// Parameters of a mesh-to-asset conversion.
///
/// ```ignore
/// let config = ConvertConfig::default()
///     .with_target_size(30.0)
///     .with_range_policy(RangePolicy::Abort);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertConfig {
    /// Size of the largest model extent after scaling.
    pub target_size: f32,
    /// Plane classification tolerance.
    pub epsilon: f32,
    /// Center and scale the vertices before building.
    pub normalize: bool,
    /// Reaction to coordinates outside the fixed-point limit.
    pub range_policy: RangePolicy,
    /// Positive fixed-point limit; the valid range is `[-limit - 1, limit]`.
    pub coordinate_limit: f32,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            epsilon: PLANE_EPSILON,
            normalize: true,
            range_policy: RangePolicy::Warn,
            coordinate_limit: FIXED32_LIMIT,
        }
    }
}

impl ConvertConfig {
    /// Sets the target size of the scaled model.
    pub fn with_target_size(mut self, target_size: f32) -> Self {
        self.target_size = target_size;
        self
    }

    /// Sets the plane classification tolerance.
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Enables or disables centering and scaling.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Sets the coordinate range policy.
    pub fn with_range_policy(mut self, range_policy: RangePolicy) -> Self {
        self.range_policy = range_policy;
        self
    }

    /// Sets the fixed-point coordinate limit.
    pub fn with_coordinate_limit(mut self, coordinate_limit: f32) -> Self {
        self.coordinate_limit = coordinate_limit;
        self
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    /// Returns [`BspError::InvalidConfig`] naming the first bad value.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(BspError::InvalidConfig { message });
        if !(self.target_size.is_finite() && self.target_size > 0.0) {
            return invalid(format!(
                "target size must be positive and finite, got {}",
                self.target_size
            ));
        }
        if !(self.epsilon.is_finite() && self.epsilon >= 0.0) {
            return invalid(format!(
                "epsilon must be non-negative and finite, got {}",
                self.epsilon
            ));
        }
        if !(self.coordinate_limit.is_finite() && self.coordinate_limit > 0.0) {
            return invalid(format!(
                "coordinate limit must be positive and finite, got {}",
                self.coordinate_limit
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConvertConfig::default();
        assert_eq!(config.target_size, 60.0);
        assert_eq!(config.epsilon, 1e-5);
        assert!(config.normalize);
        assert_eq!(config.range_policy, RangePolicy::Warn);
        assert_eq!(config.coordinate_limit, 32767.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_methods() {
        let config = ConvertConfig::default()
            .with_target_size(10.0)
            .with_epsilon(0.01)
            .with_normalize(false)
            .with_range_policy(RangePolicy::Abort)
            .with_coordinate_limit(127.0);
        assert_eq!(config.target_size, 10.0);
        assert_eq!(config.epsilon, 0.01);
        assert!(!config.normalize);
        assert_eq!(config.range_policy, RangePolicy::Abort);
        assert_eq!(config.coordinate_limit, 127.0);
    }

    #[test]
    fn rejects_bad_values() {
        for config in [
            ConvertConfig::default().with_target_size(0.0),
            ConvertConfig::default().with_target_size(f32::NAN),
            ConvertConfig::default().with_epsilon(-1.0),
            ConvertConfig::default().with_coordinate_limit(f32::INFINITY),
        ] {
            assert!(matches!(
                config.validate(),
                Err(BspError::InvalidConfig { .. })
            ));
        }
    }
}
