//! Render view of the fleet handed to the presentation layer.

use serde::Serialize;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::controls::ControlPanel;
use crate::fleet::Fleet;
use crate::interaction::{EditSurface, InteractionController};
use crate::model::UnitId;
use crate::types::Footprint;
use crate::unit::Unit;

/// Everything needed to redraw the scene after a change or a frame tick.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct LayoutSnapshot {
    #[schema(value_type = [f64; 2], example = json!([2.5, 13.6]))]
    pub container: (f64, f64),
    pub unit_count: usize,
    pub placed_count: usize,
    pub floor_utilization: f64,
    pub used_length: f64,
    pub placed: Vec<RenderedUnit>,
    pub hovered: Option<UnitId>,
    pub selected: Option<UnitId>,
    pub edit_surface: Option<EditSurface>,
    pub controls: ControlPanel,
}

/// One placed unit as drawn.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct RenderedUnit {
    pub id: UnitId,
    pub label: String,
    /// Footprint center with the smoothed lift on the vertical axis.
    #[schema(value_type = [f64; 3], example = json!([0.4, 0.124, 0.6]))]
    pub pos: (f64, f64, f64),
    #[schema(value_type = [f64; 3], example = json!([0.8, 1.2, 1.2]))]
    pub dims: (f64, f64, f64),
    /// `#rrggbb`
    pub color: String,
    pub visible: bool,
    pub wireframe: bool,
    pub casts_shadow: bool,
    pub hovered: bool,
    pub selected: bool,
}

impl RenderedUnit {
    fn from_unit(unit: &Unit) -> Self {
        let position = unit.position();
        Self {
            id: unit.id(),
            label: unit.id().label(),
            pos: (position.x, position.y + unit.lift(), position.z),
            dims: (unit.width(), unit.length(), unit.height()),
            color: unit.display_color().to_hex(),
            visible: unit.is_visible(),
            wireframe: unit.is_wireframe(),
            casts_shadow: unit.casts_shadow(),
            hovered: unit.is_hovered(),
            selected: unit.is_selected(),
        }
    }
}

impl LayoutSnapshot {
    pub fn capture(fleet: &Fleet, interaction: &InteractionController) -> Self {
        let container = fleet.container();
        let result = fleet.last_result();
        Self {
            container: (container.width(), container.length()),
            unit_count: fleet.len(),
            placed_count: result.placed_count(),
            floor_utilization: result.floor_utilization(),
            used_length: result.used_length(),
            placed: fleet.placed().map(RenderedUnit::from_unit).collect(),
            hovered: interaction.hovered(),
            selected: interaction.selected(),
            edit_surface: interaction.edit_surface().cloned(),
            controls: ControlPanel::from_fleet(fleet),
        }
    }
}
