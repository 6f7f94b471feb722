//! Configuration surface driven by the GUI panel.
//!
//! Option changes are clamped to the ranges the panel advertises before they reach
//! the fleet, so out-of-range slider values never turn into layout errors.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::fleet::{DimensionField, Fleet};
use crate::model::ValidationError;

/// Range and step of a numeric control.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct ControlRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ControlRange {
    pub const UNIT_COUNT: ControlRange = ControlRange::new(1.0, 100.0, 1.0);
    pub const UNIT_WIDTH: ControlRange = ControlRange::new(0.4, 2.5, 0.1);
    pub const UNIT_LENGTH: ControlRange = ControlRange::new(0.4, 2.5, 0.1);
    pub const UNIT_HEIGHT: ControlRange = ControlRange::new(0.2, 2.0, 0.1);

    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// Snaps `value` to the nearest step and into `[min, max]`.
    ///
    /// # Examples
    /// ```
    /// use pallet_layout::controls::ControlRange;
    ///
    /// let range = ControlRange::new(0.4, 2.5, 0.1);
    /// assert!((range.snap(0.83) - 0.8).abs() < 1e-9);
    /// assert_eq!(range.snap(9.0), 2.5);
    /// ```
    pub fn snap(&self, value: f64) -> f64 {
        let steps = ((value - self.min) / self.step).round();
        // rounding back through the step count keeps values like 0.8 exact-looking
        let snapped = self.min + steps * self.step;
        let snapped = (snapped * 1e9).round() / 1e9;
        snapped.clamp(self.min, self.max)
    }
}

/// One change coming from the configuration panel.
#[derive(Clone, Debug, PartialEq, Deserialize, ToSchema)]
#[serde(tag = "option", content = "value", rename_all = "snake_case")]
pub enum ControlChange {
    UnitCount(f64),
    UnitWidth(f64),
    UnitLength(f64),
    UnitHeight(f64),
    ToggleWireframe,
    ToggleVisible,
}

impl ControlChange {
    /// Returns the change with its value clamped to the advertised range.
    ///
    /// Non-finite values cannot be clamped and are rejected.
    pub fn clamped(&self) -> Result<Self, ValidationError> {
        let clamp = |value: f64, range: ControlRange, field: &'static str| {
            if value.is_finite() {
                Ok(range.snap(value))
            } else {
                Err(ValidationError::InvalidDimension { field, value })
            }
        };
        Ok(match *self {
            ControlChange::UnitCount(v) => {
                ControlChange::UnitCount(clamp(v, ControlRange::UNIT_COUNT, "Unit count")?)
            }
            ControlChange::UnitWidth(v) => {
                ControlChange::UnitWidth(clamp(v, ControlRange::UNIT_WIDTH, "Unit width")?)
            }
            ControlChange::UnitLength(v) => {
                ControlChange::UnitLength(clamp(v, ControlRange::UNIT_LENGTH, "Unit length")?)
            }
            ControlChange::UnitHeight(v) => {
                ControlChange::UnitHeight(clamp(v, ControlRange::UNIT_HEIGHT, "Unit height")?)
            }
            ControlChange::ToggleWireframe => ControlChange::ToggleWireframe,
            ControlChange::ToggleVisible => ControlChange::ToggleVisible,
        })
    }

    /// Clamps and dispatches the change to the matching fleet operation.
    pub fn apply(&self, fleet: &mut Fleet) -> Result<(), ValidationError> {
        let change = self.clamped()?;
        tracing::debug!(?change, "applying control change");
        match change {
            ControlChange::UnitCount(count) => fleet.resize(count as usize),
            ControlChange::UnitWidth(v) => fleet.set_default_dimension(DimensionField::Width, v),
            ControlChange::UnitLength(v) => fleet.set_default_dimension(DimensionField::Length, v),
            ControlChange::UnitHeight(v) => fleet.set_default_dimension(DimensionField::Height, v),
            ControlChange::ToggleWireframe => {
                fleet.toggle_wireframe();
                Ok(())
            }
            ControlChange::ToggleVisible => {
                fleet.toggle_visible();
                Ok(())
            }
        }
    }
}

/// Current values of the panel, as shown to the user.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct ControlPanel {
    pub unit_count: usize,
    pub unit_width: f64,
    pub unit_length: f64,
    pub unit_height: f64,
    pub count_range: ControlRange,
    pub width_range: ControlRange,
    pub length_range: ControlRange,
    pub height_range: ControlRange,
}

impl ControlPanel {
    pub fn from_fleet(fleet: &Fleet) -> Self {
        let defaults = fleet.defaults();
        Self {
            unit_count: fleet.len(),
            unit_width: defaults.width,
            unit_length: defaults.length,
            unit_height: defaults.height,
            count_range: ControlRange::UNIT_COUNT,
            width_range: ControlRange::UNIT_WIDTH,
            length_range: ControlRange::UNIT_LENGTH,
            height_range: ControlRange::UNIT_HEIGHT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::LayoutConfig;
    use crate::types::Footprint;

    #[test]
    fn values_are_clamped_into_range() {
        assert_eq!(
            ControlChange::UnitCount(0.0).clamped().unwrap(),
            ControlChange::UnitCount(1.0)
        );
        assert_eq!(
            ControlChange::UnitCount(250.0).clamped().unwrap(),
            ControlChange::UnitCount(100.0)
        );
        assert_eq!(
            ControlChange::UnitWidth(-3.0).clamped().unwrap(),
            ControlChange::UnitWidth(0.4)
        );
        assert_eq!(
            ControlChange::UnitHeight(1.26).clamped().unwrap(),
            ControlChange::UnitHeight(1.3)
        );
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert!(matches!(
            ControlChange::UnitLength(f64::NAN).clamped(),
            Err(ValidationError::InvalidDimension {
                field: "Unit length",
                ..
            })
        ));
    }

    #[test]
    fn changes_dispatch_to_the_fleet() {
        let mut fleet = Fleet::new(LayoutConfig::default()).unwrap();

        ControlChange::UnitCount(6.4).apply(&mut fleet).unwrap();
        assert_eq!(fleet.len(), 6);

        ControlChange::UnitWidth(1.2).apply(&mut fleet).unwrap();
        assert!(fleet.units().iter().all(|u| (u.width() - 1.2).abs() < 1e-9));

        ControlChange::UnitHeight(5.0).apply(&mut fleet).unwrap();
        assert!(fleet.units().iter().all(|u| u.height() == 2.0));

        ControlChange::ToggleWireframe.apply(&mut fleet).unwrap();
        assert!(fleet.units().iter().all(|u| u.is_wireframe()));

        let panel = ControlPanel::from_fleet(&fleet);
        assert_eq!(panel.unit_count, 6);
        assert_eq!(panel.unit_height, 2.0);
    }

    #[test]
    fn changes_parse_from_panel_json() {
        let change: ControlChange =
            serde_json::from_str(r#"{"option": "unit_width", "value": 1.0}"#).unwrap();
        assert_eq!(change, ControlChange::UnitWidth(1.0));

        let toggle: ControlChange = serde_json::from_str(r#"{"option": "toggle_visible"}"#).unwrap();
        assert_eq!(toggle, ControlChange::ToggleVisible);
    }
}
