//! Greedy shelf packing of units onto the trailer floor.
//!
//! Units are placed in fleet order, left to right across the trailer. When the next
//! unit no longer fits across, a new shelf starts behind the deepest unit of the
//! current one. The first unit that does not fit along the trailer ends the pass:
//! it and every later unit stay off the floor, so the trailer fills front to back.
//!
//! This is a single-pass heuristic, not an optimizer.

use serde::Serialize;

use crate::model::{Container, UnitId, ValidationError};
use crate::types::{EPSILON_GENERAL, Footprint, Vec3};
use crate::unit::{Unit, validate_unit_dims};

/// Configuration for the packing pass.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PackingConfig {
    /// Numerical tolerance when comparing accumulated extents with the container.
    pub general_epsilon: f64,
}

impl PackingConfig {
    pub const DEFAULT_GENERAL_EPSILON: f64 = EPSILON_GENERAL;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            general_epsilon: Self::DEFAULT_GENERAL_EPSILON,
        }
    }
}

/// Builder for [`PackingConfig`].
#[derive(Clone, Debug, Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    /// Sets the comparison tolerance.
    pub fn general_epsilon(mut self, epsilon: f64) -> Self {
        self.config.general_epsilon = epsilon;
        self
    }

    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// A row of units sharing the same starting along-offset.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Shelf {
    pub index: usize,
    /// Along-offset of the shelf's front edge.
    pub along: f64,
    /// Deepest unit length on the shelf.
    pub depth: f64,
    /// Across extent used so far.
    pub used_width: f64,
    pub unit_count: usize,
}

/// Why a unit is not on the floor. Not an error: the unit stays in the fleet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnplacedReason {
    /// The unit is wider than the trailer and can never be placed.
    WiderThanContainer,
    /// The trailer filled up before this unit's turn.
    ContainerFull,
}

impl UnplacedReason {
    pub fn code(&self) -> &'static str {
        match self {
            UnplacedReason::WiderThanContainer => "wider_than_container",
            UnplacedReason::ContainerFull => "container_full",
        }
    }
}

impl std::fmt::Display for UnplacedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnplacedReason::WiderThanContainer => {
                write!(f, "Unit is wider than the trailer")
            }
            UnplacedReason::ContainerFull => {
                write!(f, "No room left along the trailer")
            }
        }
    }
}

/// Unit that could not be placed.
#[derive(Clone, Debug, PartialEq)]
pub struct UnplacedUnit {
    pub id: UnitId,
    pub reason: UnplacedReason,
}

/// Result of one packing pass.
#[derive(Clone, Debug, PartialEq)]
pub struct PackingResult {
    /// Placed units in input order.
    pub placed: Vec<UnitId>,
    pub unplaced: Vec<UnplacedUnit>,
    pub shelves: Vec<Shelf>,
    placed_area: f64,
    container_area: f64,
}

impl PackingResult {
    fn empty(container: &Container) -> Self {
        Self {
            placed: Vec::new(),
            unplaced: Vec::new(),
            shelves: Vec::new(),
            placed_area: 0.0,
            container_area: container.area(),
        }
    }

    /// Indicates whether every unit made it onto the floor.
    pub fn is_complete(&self) -> bool {
        self.unplaced.is_empty()
    }

    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }

    pub fn unplaced_count(&self) -> usize {
        self.unplaced.len()
    }

    /// Along-extent of the floor covered by shelves.
    pub fn used_length(&self) -> f64 {
        self.shelves
            .last()
            .map(|shelf| shelf.along + shelf.depth)
            .unwrap_or(0.0)
    }

    /// Share of the floor area covered by placed footprints, in percent.
    pub fn floor_utilization(&self) -> f64 {
        if self.container_area <= 0.0 {
            return 0.0;
        }
        (self.placed_area / self.container_area) * 100.0
    }
}

/// Events emitted during a packing pass, e.g. for live visualization.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum PackEvent {
    /// A new shelf was opened.
    ShelfStarted { index: usize, along: f64 },
    /// A unit received its position.
    UnitPlaced {
        id: UnitId,
        shelf: usize,
        pos: (f64, f64, f64),
    },
    /// A unit stays off the floor.
    UnitRejected {
        id: UnitId,
        reason_code: String,
        reason_text: String,
    },
    /// Pass finished.
    Finished { placed: usize, unplaced: usize },
}

/// Arranges units with the default configuration.
///
/// # Examples
/// ```
/// use pallet_layout::model::{Container, UnitId};
/// use pallet_layout::packing::arrange;
/// use pallet_layout::unit::{Unit, palette_color};
///
/// let container = Container::new(2.5, 13.6).unwrap();
/// let mut units: Vec<Unit> = (0..3)
///     .map(|i| Unit::new(UnitId(i), 0.8, 1.2, 1.2, palette_color(i)).unwrap())
///     .collect();
///
/// let result = arrange(&container, &mut units).unwrap();
/// assert_eq!(result.placed_count(), 3);
/// assert!((units[2].position().x - 2.0).abs() < 1e-9);
/// ```
pub fn arrange(
    container: &Container,
    units: &mut [Unit],
) -> Result<PackingResult, ValidationError> {
    arrange_with_config(container, units, PackingConfig::default())
}

/// Like [`arrange`], with a custom configuration.
pub fn arrange_with_config(
    container: &Container,
    units: &mut [Unit],
    config: PackingConfig,
) -> Result<PackingResult, ValidationError> {
    arrange_with_progress(container, units, config, |_| {})
}

/// Arranges units and reports every step to `on_event`.
///
/// Only `position` of placed units is written. On invalid input nothing is written
/// and no event is emitted.
pub fn arrange_with_progress(
    container: &Container,
    units: &mut [Unit],
    config: PackingConfig,
    mut on_event: impl FnMut(&PackEvent),
) -> Result<PackingResult, ValidationError> {
    container.validate()?;
    for unit in units.iter() {
        validate_unit_dims(unit.width(), unit.length(), unit.height())?;
    }

    let eps = config.general_epsilon;
    let mut result = PackingResult::empty(container);
    let mut across = 0.0_f64;
    let mut along = 0.0_f64;
    let mut shelf_depth = 0.0_f64;
    let mut shelf_open = false;
    let mut halted = false;

    for unit in units.iter_mut() {
        let (width, length) = (unit.width(), unit.length());

        if halted {
            reject(
                &mut result,
                &mut on_event,
                unit.id(),
                UnplacedReason::ContainerFull,
            );
            continue;
        }

        // An over-wide unit never fits any shelf; skipping it keeps the cursor intact.
        if width > container.width() + eps {
            reject(
                &mut result,
                &mut on_event,
                unit.id(),
                UnplacedReason::WiderThanContainer,
            );
            continue;
        }

        if across + width > container.width() + eps {
            across = 0.0;
            along += shelf_depth;
            shelf_depth = 0.0;
            shelf_open = false;
        }

        if along + length > container.length() + eps {
            halted = true;
            reject(
                &mut result,
                &mut on_event,
                unit.id(),
                UnplacedReason::ContainerFull,
            );
            continue;
        }

        if !shelf_open {
            shelf_open = true;
            let index = result.shelves.len();
            result.shelves.push(Shelf {
                index,
                along,
                depth: 0.0,
                used_width: 0.0,
                unit_count: 0,
            });
            tracing::trace!(index, along, "shelf started");
            on_event(&PackEvent::ShelfStarted { index, along });
        }

        unit.position = Vec3::new(across + width / 2.0, 0.0, along + length / 2.0);
        across += width;
        shelf_depth = shelf_depth.max(length);

        let shelf_index = result.shelves.len() - 1;
        if let Some(shelf) = result.shelves.last_mut() {
            shelf.depth = shelf_depth;
            shelf.used_width = across;
            shelf.unit_count += 1;
        }
        result.placed.push(unit.id());
        result.placed_area += unit.area();
        on_event(&PackEvent::UnitPlaced {
            id: unit.id(),
            shelf: shelf_index,
            pos: unit.position.as_tuple(),
        });
    }

    on_event(&PackEvent::Finished {
        placed: result.placed_count(),
        unplaced: result.unplaced_count(),
    });
    Ok(result)
}

fn reject(
    result: &mut PackingResult,
    on_event: &mut impl FnMut(&PackEvent),
    id: UnitId,
    reason: UnplacedReason,
) {
    on_event(&PackEvent::UnitRejected {
        id,
        reason_code: reason.code().to_string(),
        reason_text: reason.to_string(),
    });
    result.unplaced.push(UnplacedUnit { id, reason });
}
