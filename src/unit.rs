//! Cargo unit entity and its per-frame visual smoothing.
//!
//! A [`Unit`] is a plain data record. Rendering handles are kept by the presentation
//! layer and looked up by [`UnitId`].

use crate::model::{UnitId, ValidationError, validate_dimension};
use crate::types::{Color, Footprint, Vec3};

/// Base colors handed out to new units, cycling by creation index.
pub const PALETTE: [Color; 10] = [
    Color::new(250.0 / 255.0, 95.0 / 255.0, 95.0 / 255.0),
    Color::new(250.0 / 255.0, 193.0 / 255.0, 95.0 / 255.0),
    Color::new(237.0 / 255.0, 250.0 / 255.0, 95.0 / 255.0),
    Color::new(136.0 / 255.0, 250.0 / 255.0, 95.0 / 255.0),
    Color::new(95.0 / 255.0, 250.0 / 255.0, 204.0 / 255.0),
    Color::new(95.0 / 255.0, 209.0 / 255.0, 250.0 / 255.0),
    Color::new(95.0 / 255.0, 129.0 / 255.0, 250.0 / 255.0),
    Color::new(183.0 / 255.0, 95.0 / 255.0, 250.0 / 255.0),
    Color::new(250.0 / 255.0, 95.0 / 255.0, 235.0 / 255.0),
    Color::new(250.0 / 255.0, 95.0 / 255.0, 141.0 / 255.0),
];

/// Returns the palette color for the n-th created unit.
pub fn palette_color(index: u64) -> Color {
    PALETTE[(index % PALETTE.len() as u64) as usize]
}

/// Rates and targets of the per-frame smoothing.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SmoothingConfig {
    /// Convergence rate of the display color (per second).
    pub color_rate: f64,
    /// Convergence rate of the vertical lift (per second).
    pub lift_rate: f64,
    /// Brighten factor applied to the base color while hovered.
    pub highlight_factor: f64,
    /// Lift while hovered.
    pub hover_lift: f64,
    /// Lift while idle.
    pub idle_lift: f64,
}

impl SmoothingConfig {
    pub const DEFAULT_RATE: f64 = 10.0;
    pub const DEFAULT_HIGHLIGHT_FACTOR: f64 = 2.0;
    pub const DEFAULT_HOVER_LIFT: f64 = 0.25;
    pub const DEFAULT_IDLE_LIFT: f64 = 0.124;
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            color_rate: Self::DEFAULT_RATE,
            lift_rate: Self::DEFAULT_RATE,
            highlight_factor: Self::DEFAULT_HIGHLIGHT_FACTOR,
            hover_lift: Self::DEFAULT_HOVER_LIFT,
            idle_lift: Self::DEFAULT_IDLE_LIFT,
        }
    }
}

/// Interaction state derived from the hover/select flags.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    Hovered,
    /// Selection wins over hover and freezes the smoothing targets.
    Selected,
}

/// One cargo unit (pallet).
///
/// # Fields
/// * `id` - stable identity within the fleet
/// * `width`/`length`/`height` - extents across, along and vertically
/// * `base_color` - color chosen by the user or the palette
/// * `display_color` - smoothed color the presentation layer draws
/// * `position` - footprint center assigned by the packing engine
/// * `lift` - smoothed vertical display offset
#[derive(Clone, Debug, PartialEq)]
pub struct Unit {
    id: UnitId,
    width: f64,
    length: f64,
    height: f64,
    base_color: Color,
    display_color: Color,
    pub(crate) position: Vec3,
    lift: f64,
    visible: bool,
    wireframe: bool,
    hovered: bool,
    selected: bool,
}

impl Unit {
    /// Creates a new unit after validating its dimensions.
    ///
    /// # Examples
    /// ```
    /// use pallet_layout::model::UnitId;
    /// use pallet_layout::unit::{Unit, palette_color};
    ///
    /// let unit = Unit::new(UnitId(1), 0.8, 1.2, 1.2, palette_color(0));
    /// assert!(unit.is_ok());
    /// assert!(Unit::new(UnitId(2), 0.8, -1.2, 1.2, palette_color(1)).is_err());
    /// ```
    pub fn new(
        id: UnitId,
        width: f64,
        length: f64,
        height: f64,
        base_color: Color,
    ) -> Result<Self, ValidationError> {
        validate_unit_dims(width, length, height)?;
        Ok(Self {
            id,
            width,
            length,
            height,
            base_color,
            display_color: base_color,
            position: Vec3::zero(),
            lift: SmoothingConfig::DEFAULT_IDLE_LIFT,
            visible: true,
            wireframe: false,
            hovered: false,
            selected: false,
        })
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn base_color(&self) -> Color {
        self.base_color
    }

    pub fn display_color(&self) -> Color {
        self.display_color
    }

    /// Footprint center as assigned by the last packing pass.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn lift(&self) -> f64 {
        self.lift
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_wireframe(&self) -> bool {
        self.wireframe
    }

    /// Wireframe units neither cast nor receive shadows.
    pub fn casts_shadow(&self) -> bool {
        !self.wireframe
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn state(&self) -> InteractionState {
        match (self.hovered, self.selected) {
            (_, true) => InteractionState::Selected,
            (true, false) => InteractionState::Hovered,
            (false, false) => InteractionState::Idle,
        }
    }

    /// Changes the extents. Does not reposition; the fleet repacks afterwards.
    pub fn set_dimensions(
        &mut self,
        width: f64,
        length: f64,
        height: f64,
    ) -> Result<(), ValidationError> {
        validate_unit_dims(width, length, height)?;
        self.width = width;
        self.length = length;
        self.height = height;
        Ok(())
    }

    pub fn set_base_color(&mut self, color: Color) {
        self.base_color = color;
    }

    pub fn toggle_visible(&mut self) {
        self.visible = !self.visible;
    }

    pub fn toggle_wireframe(&mut self) {
        self.wireframe = !self.wireframe;
    }

    pub(crate) fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Advances display color and lift towards their state-dependent targets.
    ///
    /// Uses `value += (target - value) * min(dt * rate, 1)`. A selected unit keeps
    /// its lift where it is.
    pub fn update(&mut self, dt: f64, smoothing: &SmoothingConfig) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let highlighted = self.hovered && !self.selected;

        let color_target = if highlighted {
            self.base_color
                .brighten(smoothing.highlight_factor, Color::BRIGHTEN_OFFSET)
        } else {
            self.base_color
        };
        self.display_color = self
            .display_color
            .lerp(&color_target, smoothing_step(dt, smoothing.color_rate));

        let lift_target = match self.state() {
            InteractionState::Hovered => Some(smoothing.hover_lift),
            InteractionState::Idle => Some(smoothing.idle_lift),
            InteractionState::Selected => None,
        };
        if let Some(target) = lift_target {
            self.lift += (target - self.lift) * smoothing_step(dt, smoothing.lift_rate);
        }
    }
}

impl Footprint for Unit {
    fn width(&self) -> f64 {
        self.width
    }

    fn length(&self) -> f64 {
        self.length
    }
}

fn smoothing_step(dt: f64, rate: f64) -> f64 {
    (dt * rate).clamp(0.0, 1.0)
}

pub(crate) fn validate_unit_dims(
    width: f64,
    length: f64,
    height: f64,
) -> Result<(), ValidationError> {
    validate_dimension(width, "Unit width")?;
    validate_dimension(length, "Unit length")?;
    validate_dimension(height, "Unit height")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pallet() -> Unit {
        Unit::new(UnitId(1), 0.8, 1.2, 1.2, Color::new(0.2, 0.4, 0.6)).unwrap()
    }

    #[test]
    fn new_unit_starts_idle_with_base_color() {
        let unit = pallet();
        assert_eq!(unit.state(), InteractionState::Idle);
        assert_eq!(unit.display_color(), unit.base_color());
        assert!((unit.lift() - SmoothingConfig::DEFAULT_IDLE_LIFT).abs() < 1e-12);
        assert!(unit.is_visible());
        assert!(unit.casts_shadow());
    }

    #[test]
    fn set_dimensions_is_all_or_nothing() {
        let mut unit = pallet();
        let err = unit.set_dimensions(1.0, 0.0, 1.0).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidDimension {
                field: "Unit length",
                ..
            }
        ));
        assert_eq!(unit.width(), 0.8);

        unit.set_dimensions(1.0, 1.0, 0.5).unwrap();
        assert_eq!((unit.width(), unit.length(), unit.height()), (1.0, 1.0, 0.5));
    }

    #[test]
    fn hovered_unit_converges_to_highlight() {
        let smoothing = SmoothingConfig::default();
        let mut unit = pallet();
        unit.set_hovered(true);

        // dt * rate >= 1 jumps straight to the target
        unit.update(0.5, &smoothing);

        let expected = unit.base_color().brighten(2.0, 0.1);
        assert!(unit.display_color().max_channel_delta(&expected) < 1e-12);
        assert!((unit.lift() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn smoothing_moves_a_fraction_per_frame() {
        let smoothing = SmoothingConfig::default();
        let mut unit = pallet();
        unit.set_hovered(true);

        unit.update(0.05, &smoothing);

        // half way from 0.124 to 0.25
        assert!((unit.lift() - 0.187).abs() < 1e-9);
    }

    #[test]
    fn selection_freezes_lift_and_restores_base_color() {
        let smoothing = SmoothingConfig::default();
        let mut unit = pallet();
        unit.set_hovered(true);
        unit.update(0.05, &smoothing);
        let lift_when_selected = unit.lift();

        unit.set_selected(true);
        for _ in 0..10 {
            unit.update(0.1, &smoothing);
        }

        assert_eq!(unit.state(), InteractionState::Selected);
        assert!((unit.lift() - lift_when_selected).abs() < 1e-12);
        assert!(unit.display_color().max_channel_delta(&unit.base_color()) < 1e-12);
    }

    #[test]
    fn invalid_delta_time_is_ignored() {
        let smoothing = SmoothingConfig::default();
        let mut unit = pallet();
        unit.set_hovered(true);
        let before = unit.clone();

        unit.update(f64::NAN, &smoothing);
        unit.update(-1.0, &smoothing);

        assert_eq!(unit, before);
    }

    #[test]
    fn toggles_flip_flags() {
        let mut unit = pallet();
        unit.toggle_wireframe();
        unit.toggle_visible();
        assert!(unit.is_wireframe());
        assert!(!unit.casts_shadow());
        assert!(!unit.is_visible());
        unit.toggle_visible();
        assert!(unit.is_visible());
    }

    #[test]
    fn palette_cycles() {
        assert_eq!(palette_color(0), palette_color(10));
        assert_eq!(palette_color(3).to_hex(), "#88fa5f");
    }
}
