//! Data models for the trailer layout.
//!
//! This module defines the fundamental records shared by the layout core:
//! - `ValidationError`: the error taxonomy of the core operations
//! - `UnitId`: stable identity of a cargo unit
//! - `Container`: the trailer floor units are packed onto
//!
//! The cargo unit entity itself lives in [`crate::unit`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::{Footprint, validation::is_valid_dimension};

/// Validation error for layout inputs.
///
/// Every operation that can fail validates before mutating, so after an error the
/// fleet is still in its last valid configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {field} must be positive and finite, got: {value}")]
    InvalidDimension { field: &'static str, value: f64 },
    #[error("Unknown unit: {0}")]
    UnknownUnit(UnitId),
    #[error("No unit is selected")]
    NothingSelected,
    #[error("Invalid color: '{0}' is not a #rrggbb value")]
    InvalidColor(String),
}

/// Helper function to validate a single dimension.
pub(crate) fn validate_dimension(value: f64, field: &'static str) -> Result<(), ValidationError> {
    if !is_valid_dimension(value) {
        return Err(ValidationError::InvalidDimension { field, value });
    }
    Ok(())
}

/// Stable identity of a unit within its fleet.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct UnitId(pub u64);

impl UnitId {
    /// Display name used by the presentation layer, e.g. `pallet_1`.
    pub fn label(&self) -> String {
        format!("pallet_{}", self.0 + 1)
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The trailer floor units are arranged on.
///
/// # Fields
/// * `width` - extent across the trailer
/// * `length` - extent along the trailer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Container {
    width: f64,
    length: f64,
}

impl Container {
    pub const DEFAULT_WIDTH: f64 = 2.5;
    pub const DEFAULT_LENGTH: f64 = 13.6;

    /// Creates a new container with validation.
    ///
    /// # Examples
    /// ```
    /// use pallet_layout::model::Container;
    ///
    /// assert!(Container::new(2.5, 13.6).is_ok());
    /// assert!(Container::new(0.0, 13.6).is_err());
    /// ```
    pub fn new(width: f64, length: f64) -> Result<Self, ValidationError> {
        validate_dimension(width, "Container width")?;
        validate_dimension(length, "Container length")?;
        Ok(Self { width, length })
    }

    /// Checks the invariants again; used by the packing engine on entry.
    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        validate_dimension(self.width, "Container width")?;
        validate_dimension(self.length, "Container length")
    }

    #[cfg(test)]
    pub(crate) fn unchecked(width: f64, length: f64) -> Self {
        Self { width, length }
    }

    /// Geometric center of the floor as `(across, along)`.
    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.length / 2.0)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            length: Self::DEFAULT_LENGTH,
        }
    }
}

impl Footprint for Container {
    fn width(&self) -> f64 {
        self.width
    }

    fn length(&self) -> f64 {
        self.length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_rejects_non_positive_extents() {
        assert!(matches!(
            Container::new(-1.0, 13.6),
            Err(ValidationError::InvalidDimension {
                field: "Container width",
                ..
            })
        ));
        assert!(matches!(
            Container::new(2.5, f64::NAN),
            Err(ValidationError::InvalidDimension {
                field: "Container length",
                ..
            })
        ));
    }

    #[test]
    fn default_container_is_a_standard_trailer() {
        let container = Container::default();
        assert_eq!(container.width(), 2.5);
        assert_eq!(container.length(), 13.6);
        assert!((container.area() - 34.0).abs() < 1e-9);
        assert_eq!(container.center(), (1.25, 6.8));
    }

    #[test]
    fn error_messages_name_the_offending_field() {
        let err = Container::new(2.5, 0.0).unwrap_err();
        assert!(err.to_string().contains("Container length"));
        assert_eq!(
            ValidationError::UnknownUnit(UnitId(7)).to_string(),
            "Unknown unit: #7"
        );
        assert_eq!(UnitId(0).label(), "pallet_1");
    }
}
