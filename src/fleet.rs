//! Fleet manager: owns the ordered unit collection and keeps the placed set current.
//!
//! Every structural change (count, dimensions) is followed by a packing pass, so the
//! placed set handed to the presentation layer always matches the current fleet order.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::model::{Container, UnitId, ValidationError, validate_dimension};
use crate::packing::{PackingConfig, PackingResult, arrange_with_config};
use crate::types::{Color, Footprint};
use crate::unit::{SmoothingConfig, Unit, palette_color, validate_unit_dims};

/// Dimension that can be edited uniformly across the fleet.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DimensionField {
    Width,
    Length,
    Height,
}

impl DimensionField {
    fn label(&self) -> &'static str {
        match self {
            DimensionField::Width => "Unit width",
            DimensionField::Length => "Unit length",
            DimensionField::Height => "Unit height",
        }
    }
}

/// Dimensions given to newly created units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UnitDefaults {
    pub width: f64,
    pub length: f64,
    pub height: f64,
}

impl UnitDefaults {
    pub const DEFAULT_WIDTH: f64 = 0.8;
    pub const DEFAULT_LENGTH: f64 = 1.2;
    pub const DEFAULT_HEIGHT: f64 = 1.2;

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_unit_dims(self.width, self.length, self.height)
    }

    fn get(&self, field: DimensionField) -> f64 {
        match field {
            DimensionField::Width => self.width,
            DimensionField::Length => self.length,
            DimensionField::Height => self.height,
        }
    }

    fn set(&mut self, field: DimensionField, value: f64) {
        match field {
            DimensionField::Width => self.width = value,
            DimensionField::Length => self.length = value,
            DimensionField::Height => self.height = value,
        }
    }
}

impl Default for UnitDefaults {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            length: Self::DEFAULT_LENGTH,
            height: Self::DEFAULT_HEIGHT,
        }
    }
}

/// Everything needed to build a fleet.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LayoutConfig {
    pub container: Container,
    pub defaults: UnitDefaults,
    pub initial_count: usize,
    pub packing: PackingConfig,
    pub smoothing: SmoothingConfig,
}

impl LayoutConfig {
    pub const DEFAULT_INITIAL_COUNT: usize = 2;
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            container: Container::default(),
            defaults: UnitDefaults::default(),
            initial_count: Self::DEFAULT_INITIAL_COUNT,
            packing: PackingConfig::default(),
            smoothing: SmoothingConfig::default(),
        }
    }
}

/// Per-unit edit; absent fields stay unchanged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnitEdit {
    pub width: Option<f64>,
    pub length: Option<f64>,
    pub color: Option<Color>,
}

/// Owner of the unit collection.
#[derive(Clone, Debug)]
pub struct Fleet {
    container: Container,
    defaults: UnitDefaults,
    packing: PackingConfig,
    smoothing: SmoothingConfig,
    units: Vec<Unit>,
    next_id: u64,
    last_result: PackingResult,
}

impl Fleet {
    /// Builds a fleet with `initial_count` default units and packs it.
    ///
    /// # Examples
    /// ```
    /// use pallet_layout::fleet::{Fleet, LayoutConfig};
    ///
    /// let mut fleet = Fleet::new(LayoutConfig::default()).unwrap();
    /// fleet.resize(4).unwrap();
    /// assert_eq!(fleet.len(), 4);
    /// assert_eq!(fleet.placed().count(), 4);
    /// ```
    pub fn new(config: LayoutConfig) -> Result<Self, ValidationError> {
        config.container.validate()?;
        config.defaults.validate()?;

        let mut fleet = Self {
            container: config.container,
            defaults: config.defaults,
            packing: config.packing,
            smoothing: config.smoothing,
            units: Vec::with_capacity(config.initial_count),
            next_id: 0,
            last_result: arrange_with_config(&config.container, &mut [], config.packing)?,
        };
        fleet.grow_to(config.initial_count)?;
        fleet.repack()?;
        Ok(fleet)
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn defaults(&self) -> &UnitDefaults {
        &self.defaults
    }

    pub fn smoothing(&self) -> &SmoothingConfig {
        &self.smoothing
    }

    /// All units in packing priority order, placed or not.
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id() == id)
    }

    pub(crate) fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|unit| unit.id() == id)
    }

    pub(crate) fn units_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.iter_mut()
    }

    /// Result of the latest packing pass.
    pub fn last_result(&self) -> &PackingResult {
        &self.last_result
    }

    pub fn is_placed(&self, id: UnitId) -> bool {
        self.last_result.placed.contains(&id)
    }

    /// The placed set, in fleet order.
    pub fn placed(&self) -> impl Iterator<Item = &Unit> + '_ {
        // placed ids keep fleet order, so a single merge pass suffices
        let mut ids = self.last_result.placed.iter().peekable();
        self.units.iter().filter(move |unit| {
            if ids.peek().is_some_and(|id| **id == unit.id()) {
                ids.next();
                true
            } else {
                false
            }
        })
    }

    /// Grows or truncates the fleet to `target` units, then repacks.
    ///
    /// Truncation drops the most recently added units; survivors keep their
    /// dimensions, colors and flags. New units use the current defaults.
    pub fn resize(&mut self, target: usize) -> Result<(), ValidationError> {
        let previous = self.units.len();
        if target == previous {
            return Ok(());
        }
        if target < previous {
            self.units.truncate(target);
        } else {
            self.grow_to(target)?;
        }
        self.repack()?;
        tracing::info!(
            "📦 Fleet resized: {} -> {} units, {} placed",
            previous,
            target,
            self.last_result.placed_count()
        );
        Ok(())
    }

    /// Sets the default for `field` and applies it to every existing unit.
    pub fn set_default_dimension(
        &mut self,
        field: DimensionField,
        value: f64,
    ) -> Result<(), ValidationError> {
        validate_dimension(value, field.label())?;
        if self.defaults.get(field) == value
            && self.units.iter().all(|unit| unit_dimension(unit, field) == value)
        {
            return Ok(());
        }

        self.defaults.set(field, value);
        for unit in &mut self.units {
            let (mut width, mut length, mut height) = (unit.width(), unit.length(), unit.height());
            match field {
                DimensionField::Width => width = value,
                DimensionField::Length => length = value,
                DimensionField::Height => height = value,
            }
            unit.set_dimensions(width, length, height)?;
        }
        self.repack()?;
        tracing::info!(
            "📐 {} set to {} for {} units, {} placed",
            field.label(),
            value,
            self.units.len(),
            self.last_result.placed_count()
        );
        Ok(())
    }

    /// Edits a single unit and repacks.
    pub fn edit_unit(&mut self, id: UnitId, edit: &UnitEdit) -> Result<(), ValidationError> {
        let unit = self.unit_mut(id).ok_or(ValidationError::UnknownUnit(id))?;
        let width = edit.width.unwrap_or(unit.width());
        let length = edit.length.unwrap_or(unit.length());
        let height = unit.height();
        unit.set_dimensions(width, length, height)?;
        if let Some(color) = edit.color {
            unit.set_base_color(color);
        }
        self.repack()?;
        tracing::debug!(%id, width, length, "unit edited");
        Ok(())
    }

    /// Flips visibility of every unit.
    pub fn toggle_visible(&mut self) {
        self.units.iter_mut().for_each(Unit::toggle_visible);
    }

    /// Flips wireframe rendering of every unit.
    pub fn toggle_wireframe(&mut self) {
        self.units.iter_mut().for_each(Unit::toggle_wireframe);
    }

    /// Per-frame smoothing for every unit.
    pub fn update(&mut self, dt: f64) {
        let smoothing = self.smoothing;
        for unit in &mut self.units {
            unit.update(dt, &smoothing);
        }
    }

    fn grow_to(&mut self, target: usize) -> Result<(), ValidationError> {
        while self.units.len() < target {
            let id = self.next_id;
            let unit = Unit::new(
                UnitId(id),
                self.defaults.width,
                self.defaults.length,
                self.defaults.height,
                palette_color(id),
            )?;
            self.units.push(unit);
            self.next_id += 1;
        }
        Ok(())
    }

    fn repack(&mut self) -> Result<(), ValidationError> {
        self.last_result = arrange_with_config(&self.container, &mut self.units, self.packing)?;
        Ok(())
    }
}

fn unit_dimension(unit: &Unit, field: DimensionField) -> f64 {
    match field {
        DimensionField::Width => unit.width(),
        DimensionField::Length => unit.length(),
        DimensionField::Height => unit.height(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packing::arrange;

    fn fleet_of(count: usize) -> Fleet {
        Fleet::new(LayoutConfig {
            initial_count: count,
            ..LayoutConfig::default()
        })
        .unwrap()
    }

    /// The stored placed set must equal a fresh packing pass over the fleet.
    fn assert_consistent(fleet: &Fleet) {
        let mut copy = fleet.units().to_vec();
        let fresh = arrange(fleet.container(), &mut copy).unwrap();
        assert_eq!(fresh.placed, fleet.last_result().placed);
        for (unit, fresh_unit) in fleet.units().iter().zip(&copy) {
            if fleet.is_placed(unit.id()) {
                assert_eq!(unit.position(), fresh_unit.position());
            }
        }
    }

    #[test]
    fn new_fleet_is_packed() {
        let fleet = fleet_of(2);
        assert_eq!(fleet.len(), 2);
        assert_eq!(fleet.placed().count(), 2);
        assert_consistent(&fleet);
    }

    #[test]
    fn shrinking_keeps_the_first_units_untouched() {
        let mut fleet = fleet_of(5);
        fleet
            .edit_unit(
                UnitId(1),
                &UnitEdit {
                    width: Some(1.0),
                    color: Color::from_hex("#123456"),
                    ..UnitEdit::default()
                },
            )
            .unwrap();
        let before: Vec<Unit> = fleet.units()[..3].to_vec();

        fleet.resize(3).unwrap();

        assert_eq!(fleet.len(), 3);
        let ids: Vec<UnitId> = fleet.units().iter().map(Unit::id).collect();
        assert_eq!(ids, vec![UnitId(0), UnitId(1), UnitId(2)]);
        for (kept, old) in fleet.units().iter().zip(&before) {
            assert_eq!(kept.width(), old.width());
            assert_eq!(kept.length(), old.length());
            assert_eq!(kept.base_color(), old.base_color());
        }
        assert_consistent(&fleet);
    }

    #[test]
    fn growing_appends_units_with_current_defaults() {
        let mut fleet = fleet_of(1);
        fleet.set_default_dimension(DimensionField::Length, 1.0).unwrap();
        fleet.resize(4).unwrap();

        assert_eq!(fleet.len(), 4);
        for unit in fleet.units() {
            assert_eq!(unit.width(), UnitDefaults::DEFAULT_WIDTH);
            assert_eq!(unit.length(), 1.0);
        }
        // ids are never reused
        fleet.resize(2).unwrap();
        fleet.resize(3).unwrap();
        assert_eq!(fleet.units()[2].id(), UnitId(4));
        assert_consistent(&fleet);
    }

    #[test]
    fn resize_to_same_count_is_a_noop() {
        let mut fleet = fleet_of(3);
        let before = fleet.units().to_vec();
        fleet.resize(3).unwrap();
        assert_eq!(fleet.units(), before.as_slice());
    }

    #[test]
    fn uniform_edit_applies_to_every_unit() {
        let mut fleet = fleet_of(4);
        fleet
            .edit_unit(UnitId(2), &UnitEdit { width: Some(0.5), ..UnitEdit::default() })
            .unwrap();

        fleet.set_default_dimension(DimensionField::Width, 1.2).unwrap();

        assert_eq!(fleet.defaults().width, 1.2);
        assert!(fleet.units().iter().all(|u| u.width() == 1.2));
        // two per shelf now
        assert_eq!(fleet.last_result().shelves.len(), 2);
        assert_consistent(&fleet);
    }

    #[test]
    fn invalid_uniform_edit_changes_nothing() {
        let mut fleet = fleet_of(3);
        let before = fleet.units().to_vec();
        let defaults = *fleet.defaults();

        let err = fleet
            .set_default_dimension(DimensionField::Height, 0.0)
            .unwrap_err();

        assert!(matches!(
            err,
            ValidationError::InvalidDimension {
                field: "Unit height",
                ..
            }
        ));
        assert_eq!(fleet.units(), before.as_slice());
        assert_eq!(*fleet.defaults(), defaults);
    }

    #[test]
    fn units_beyond_capacity_stay_in_the_fleet() {
        // 11 shelves of 3 pallets fit into 13.6
        let mut fleet = fleet_of(40);
        assert_eq!(fleet.len(), 40);
        assert_eq!(fleet.placed().count(), 33);
        assert_eq!(fleet.last_result().unplaced_count(), 7);
        assert!(!fleet.is_placed(UnitId(33)));

        fleet.resize(30).unwrap();
        assert_eq!(fleet.placed().count(), 30);
        assert_consistent(&fleet);
    }

    #[test]
    fn edit_of_unknown_unit_fails() {
        let mut fleet = fleet_of(1);
        assert_eq!(
            fleet.edit_unit(UnitId(99), &UnitEdit::default()),
            Err(ValidationError::UnknownUnit(UnitId(99)))
        );
    }

    #[test]
    fn over_wide_edit_drops_unit_from_the_placed_set() {
        let mut fleet = fleet_of(3);
        fleet
            .edit_unit(UnitId(1), &UnitEdit { width: Some(3.0), ..UnitEdit::default() })
            .unwrap();

        let placed: Vec<UnitId> = fleet.placed().map(Unit::id).collect();
        assert_eq!(placed, vec![UnitId(0), UnitId(2)]);
        assert_eq!(fleet.len(), 3);
    }

    #[test]
    fn bulk_toggles_and_update_reach_every_unit() {
        let mut fleet = fleet_of(3);
        fleet.toggle_wireframe();
        fleet.toggle_visible();
        assert!(fleet.units().iter().all(|u| u.is_wireframe() && !u.is_visible()));

        fleet.unit_mut(UnitId(0)).unwrap().set_hovered(true);
        fleet.update(1.0);
        assert!((fleet.units()[0].lift() - 0.25).abs() < 1e-12);
        assert!((fleet.units()[1].lift() - 0.124).abs() < 1e-12);
    }
}
