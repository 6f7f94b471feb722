//! Pointer-driven hover/select state machine.
//!
//! The controller never builds UI. It toggles unit flags and tells the presentation
//! layer when to open, keep or close the edit surface for the selected unit.
//!
//! At most one unit is hovered and at most one is selected once an event has been
//! processed.

use serde::Serialize;
use utoipa::ToSchema;

use crate::controls::ControlRange;
use crate::fleet::{Fleet, UnitEdit};
use crate::model::{UnitId, ValidationError};
use crate::types::Footprint;
use crate::unit::Unit;

/// Smallest width/length offered on the edit surface.
pub const EDIT_MIN_EXTENT: f64 = 0.4;
/// Slider step of the edit surface.
pub const EDIT_STEP: f64 = 0.1;

/// Data the presentation layer needs to render the edit surface.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct EditSurface {
    pub unit: UnitId,
    pub label: String,
    pub width: f64,
    pub length: f64,
    pub width_range: ControlRange,
    pub length_range: ControlRange,
    /// `#rrggbb`
    pub color: String,
}

impl EditSurface {
    fn for_unit(unit: &Unit, container_width: f64) -> Self {
        let range = edit_range(container_width);
        Self {
            unit: unit.id(),
            label: unit.id().label(),
            width: unit.width(),
            length: unit.length(),
            width_range: range,
            length_range: range,
            color: unit.base_color().to_hex(),
        }
    }
}

fn edit_range(container_width: f64) -> ControlRange {
    ControlRange::new(EDIT_MIN_EXTENT, container_width.max(EDIT_MIN_EXTENT), EDIT_STEP)
}

/// What the presentation layer should do with the edit surface.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(tag = "action", content = "surface", rename_all = "snake_case")]
pub enum EditSurfaceRequest {
    Open(EditSurface),
    Keep,
    Close,
}

/// Hover/select state for one fleet.
#[derive(Clone, Debug, Default)]
pub struct InteractionController {
    hovered: Option<UnitId>,
    selected: Option<UnitId>,
    surface: Option<EditSurface>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<UnitId> {
        self.hovered
    }

    pub fn selected(&self) -> Option<UnitId> {
        self.selected
    }

    /// The currently open edit surface, if any.
    pub fn edit_surface(&self) -> Option<&EditSurface> {
        self.surface.as_ref()
    }

    /// Hovers the hit unit and clears hover everywhere else.
    pub fn pointer_move(&mut self, fleet: &mut Fleet, hit: Option<UnitId>) -> Option<UnitId> {
        let hit = hit.filter(|id| is_interactive(fleet, *id));
        for unit in fleet.units_mut() {
            unit.set_hovered(Some(unit.id()) == hit);
        }
        if hit != self.hovered {
            tracing::trace!(?hit, "hover changed");
        }
        self.hovered = hit;
        hit
    }

    /// Selects the hit unit, or clears the selection on a click into empty space.
    ///
    /// A click without hit inside the open edit surface keeps everything as is.
    pub fn pointer_down(
        &mut self,
        fleet: &mut Fleet,
        hit: Option<UnitId>,
        inside_edit_surface: bool,
    ) -> EditSurfaceRequest {
        let hit = hit.filter(|id| is_interactive(fleet, *id));
        match hit {
            Some(id) => {
                for unit in fleet.units_mut() {
                    unit.set_selected(unit.id() == id);
                }
                self.selected = Some(id);
                let surface = fleet
                    .unit(id)
                    .map(|unit| EditSurface::for_unit(unit, fleet.container().width()));
                self.surface = surface.clone();
                tracing::debug!(%id, "unit selected");
                match surface {
                    Some(surface) => EditSurfaceRequest::Open(surface),
                    None => EditSurfaceRequest::Close,
                }
            }
            None if inside_edit_surface && self.surface.is_some() => EditSurfaceRequest::Keep,
            None => {
                self.clear_selection(fleet);
                EditSurfaceRequest::Close
            }
        }
    }

    /// Applies an edit from the surface to the selected unit and repacks.
    ///
    /// Width and length are clamped to the surface's slider range first.
    pub fn edit_selected(
        &mut self,
        fleet: &mut Fleet,
        edit: &UnitEdit,
    ) -> Result<EditSurfaceRequest, ValidationError> {
        let id = self.selected.ok_or(ValidationError::NothingSelected)?;
        let range = edit_range(fleet.container().width());
        let clamp = |value: Option<f64>, field: &'static str| match value {
            Some(v) if !v.is_finite() => Err(ValidationError::InvalidDimension { field, value: v }),
            Some(v) => Ok(Some(range.snap(v))),
            None => Ok(None),
        };
        let clamped = UnitEdit {
            width: clamp(edit.width, "Unit width")?,
            length: clamp(edit.length, "Unit length")?,
            color: edit.color,
        };

        fleet.edit_unit(id, &clamped)?;

        if let Some(request) = self.reconcile(fleet) {
            return Ok(request);
        }
        let surface = fleet
            .unit(id)
            .map(|unit| EditSurface::for_unit(unit, fleet.container().width()))
            .ok_or(ValidationError::UnknownUnit(id))?;
        self.surface = Some(surface.clone());
        Ok(EditSurfaceRequest::Open(surface))
    }

    /// Drops hover/selection of units that left the fleet or the placed set.
    ///
    /// Returns `Some(Close)` when the edit surface had to be closed.
    pub fn reconcile(&mut self, fleet: &mut Fleet) -> Option<EditSurfaceRequest> {
        if self.hovered.is_some_and(|id| !is_interactive(fleet, id)) {
            self.hovered = None;
        }
        let selection_lost = self.selected.is_some_and(|id| !is_interactive(fleet, id));
        if selection_lost {
            self.selected = None;
            self.surface = None;
        }

        let (hovered, selected) = (self.hovered, self.selected);
        for unit in fleet.units_mut() {
            unit.set_hovered(Some(unit.id()) == hovered);
            unit.set_selected(Some(unit.id()) == selected);
        }

        selection_lost.then_some(EditSurfaceRequest::Close)
    }

    fn clear_selection(&mut self, fleet: &mut Fleet) {
        for unit in fleet.units_mut() {
            unit.set_selected(false);
        }
        if let Some(id) = self.selected.take() {
            tracing::debug!(%id, "selection cleared");
        }
        self.surface = None;
    }
}

/// Only visible units on the floor can be hovered or selected.
fn is_interactive(fleet: &Fleet, id: UnitId) -> bool {
    fleet.is_placed(id) && fleet.unit(id).is_some_and(Unit::is_visible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::LayoutConfig;
    use crate::types::Color;

    fn setup(count: usize) -> (Fleet, InteractionController) {
        let fleet = Fleet::new(LayoutConfig {
            initial_count: count,
            ..LayoutConfig::default()
        })
        .unwrap();
        (fleet, InteractionController::new())
    }

    fn hovered_count(fleet: &Fleet) -> usize {
        fleet.units().iter().filter(|u| u.is_hovered()).count()
    }

    fn selected_count(fleet: &Fleet) -> usize {
        fleet.units().iter().filter(|u| u.is_selected()).count()
    }

    #[test]
    fn hover_follows_the_pointer() {
        let (mut fleet, mut ctl) = setup(3);

        ctl.pointer_move(&mut fleet, Some(UnitId(0)));
        ctl.pointer_move(&mut fleet, Some(UnitId(2)));
        assert_eq!(ctl.hovered(), Some(UnitId(2)));
        assert!(fleet.unit(UnitId(2)).unwrap().is_hovered());
        assert_eq!(hovered_count(&fleet), 1);

        ctl.pointer_move(&mut fleet, None);
        assert_eq!(ctl.hovered(), None);
        assert_eq!(hovered_count(&fleet), 0);
    }

    #[test]
    fn unplaced_or_hidden_hits_count_as_misses() {
        let (mut fleet, mut ctl) = setup(40);
        assert_eq!(ctl.pointer_move(&mut fleet, Some(UnitId(39))), None);
        assert_eq!(ctl.pointer_move(&mut fleet, Some(UnitId(1000))), None);

        fleet.toggle_visible();
        let request = ctl.pointer_down(&mut fleet, Some(UnitId(0)), false);
        assert_eq!(request, EditSurfaceRequest::Close);
        assert_eq!(selected_count(&fleet), 0);
    }

    #[test]
    fn click_selects_and_opens_the_edit_surface() {
        let (mut fleet, mut ctl) = setup(3);
        ctl.pointer_down(&mut fleet, Some(UnitId(0)), false);

        let request = ctl.pointer_down(&mut fleet, Some(UnitId(1)), false);

        let EditSurfaceRequest::Open(surface) = request else {
            panic!("expected the edit surface to open");
        };
        assert_eq!(surface.unit, UnitId(1));
        assert_eq!(surface.label, "pallet_2");
        assert_eq!(surface.width_range, ControlRange::new(0.4, 2.5, 0.1));
        assert_eq!(surface.length_range, surface.width_range);
        assert_eq!(surface.color, fleet.unit(UnitId(1)).unwrap().base_color().to_hex());
        assert_eq!(ctl.selected(), Some(UnitId(1)));
        assert_eq!(selected_count(&fleet), 1);
    }

    #[test]
    fn click_into_empty_space_closes_but_click_inside_surface_keeps() {
        let (mut fleet, mut ctl) = setup(2);
        ctl.pointer_down(&mut fleet, Some(UnitId(0)), false);

        assert_eq!(
            ctl.pointer_down(&mut fleet, None, true),
            EditSurfaceRequest::Keep
        );
        assert_eq!(ctl.selected(), Some(UnitId(0)));

        assert_eq!(
            ctl.pointer_down(&mut fleet, None, false),
            EditSurfaceRequest::Close
        );
        assert_eq!(ctl.selected(), None);
        assert!(ctl.edit_surface().is_none());
        assert_eq!(selected_count(&fleet), 0);
    }

    #[test]
    fn edits_are_clamped_and_repack_the_fleet() {
        let (mut fleet, mut ctl) = setup(3);
        ctl.pointer_down(&mut fleet, Some(UnitId(0)), false);

        let request = ctl
            .edit_selected(
                &mut fleet,
                &UnitEdit {
                    width: Some(9.0),
                    length: Some(0.1),
                    color: Color::from_hex("#00ff00"),
                },
            )
            .unwrap();

        let EditSurfaceRequest::Open(surface) = request else {
            panic!("surface should stay open");
        };
        assert_eq!(surface.width, 2.5);
        assert!((surface.length - 0.4).abs() < 1e-9);
        assert_eq!(surface.color, "#00ff00");
        // the widened first unit now fills its own shelf
        assert_eq!(fleet.last_result().shelves.len(), 2);
        assert!((fleet.unit(UnitId(1)).unwrap().position().z - 1.0).abs() < 1e-9);
    }

    #[test]
    fn edit_without_selection_fails() {
        let (mut fleet, mut ctl) = setup(1);
        assert_eq!(
            ctl.edit_selected(&mut fleet, &UnitEdit::default()),
            Err(ValidationError::NothingSelected)
        );
    }

    #[test]
    fn shrinking_away_the_selection_closes_the_surface() {
        let (mut fleet, mut ctl) = setup(4);
        ctl.pointer_move(&mut fleet, Some(UnitId(3)));
        ctl.pointer_down(&mut fleet, Some(UnitId(3)), false);

        fleet.resize(2).unwrap();
        assert_eq!(ctl.reconcile(&mut fleet), Some(EditSurfaceRequest::Close));
        assert_eq!(ctl.selected(), None);
        assert_eq!(ctl.hovered(), None);
        assert!(ctl.edit_surface().is_none());

        assert_eq!(ctl.reconcile(&mut fleet), None);
    }

    #[test]
    fn arbitrary_event_sequences_keep_single_hover_and_selection() {
        let (mut fleet, mut ctl) = setup(8);
        let hits = [
            Some(UnitId(0)),
            Some(UnitId(5)),
            None,
            Some(UnitId(7)),
            Some(UnitId(42)),
            Some(UnitId(3)),
        ];
        for (step, hit) in hits.iter().cycle().take(60).enumerate() {
            if step % 3 == 0 {
                ctl.pointer_down(&mut fleet, *hit, step % 2 == 0);
            } else {
                ctl.pointer_move(&mut fleet, *hit);
            }
            if step % 11 == 0 {
                fleet.resize(3 + step % 6).unwrap();
                ctl.reconcile(&mut fleet);
            }
            assert!(hovered_count(&fleet) <= 1);
            assert!(selected_count(&fleet) <= 1);
        }
    }
}
