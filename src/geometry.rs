//! Geometric helpers for placed units.
//!
//! Footprint overlap checks for the floor plan and a ray cast for presentation layers
//! that hand the core a pointer ray instead of an already resolved hit.

use serde::Deserialize;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::model::UnitId;
use crate::types::{Footprint, Vec3};
use crate::unit::Unit;

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

/// Pointer ray in trailer space.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, ToSchema)]
pub struct Ray {
    #[schema(value_type = [f64; 3], example = json!([-5.0, 5.0, 6.8]))]
    #[serde(with = "vec3_array")]
    pub origin: Vec3,
    #[schema(value_type = [f64; 3], example = json!([0.7, -0.7, 0.0]))]
    #[serde(with = "vec3_array")]
    pub direction: Vec3,
}

/// Calculates the overlap of two intervals in one dimension.
///
/// # Returns
/// Length of the overlap, at least 0.0
pub fn overlap_1d(a1: f64, a2: f64, b1: f64, b2: f64) -> f64 {
    (a2.min(b2) - a1.max(b1)).max(0.0)
}

/// Checks whether two placed units cover a common floor area.
///
/// Touching edges do not count as overlap.
pub fn footprints_overlap(a: &Unit, b: &Unit) -> bool {
    let (pa, pb) = (a.position(), b.position());
    let across = overlap_1d(
        pa.x - a.width() / 2.0,
        pa.x + a.width() / 2.0,
        pb.x - b.width() / 2.0,
        pb.x + b.width() / 2.0,
    );
    let along = overlap_1d(
        pa.z - a.length() / 2.0,
        pa.z + a.length() / 2.0,
        pb.z - b.length() / 2.0,
        pb.z + b.length() / 2.0,
    );
    // shelf sums carry rounding noise
    across > 1e-9 && along > 1e-9
}

/// Bounding box of a unit as drawn, raised by its current lift.
pub fn unit_bounds(unit: &Unit) -> Aabb {
    let center = unit.position();
    let half_w = unit.width() / 2.0;
    let half_l = unit.length() / 2.0;
    Aabb {
        min: Vec3::new(center.x - half_w, unit.lift(), center.z - half_l),
        max: Vec3::new(
            center.x + half_w,
            unit.lift() + unit.height(),
            center.z + half_l,
        ),
    }
}

/// Distance along the ray to the box entry point, using the slab method.
pub fn ray_hits_box(ray: &Ray, bounds: &Aabb) -> Option<f64> {
    let direction = ray.direction.normalized()?;
    let mut t_min = 0.0_f64;
    let mut t_max = f64::INFINITY;

    let axes = [
        (ray.origin.x, direction.x, bounds.min.x, bounds.max.x),
        (ray.origin.y, direction.y, bounds.min.y, bounds.max.y),
        (ray.origin.z, direction.z, bounds.min.z, bounds.max.z),
    ];
    for (origin, dir, min, max) in axes {
        if dir.abs() < f64::EPSILON {
            if origin < min || origin > max {
                return None;
            }
            continue;
        }
        let inv = 1.0 / dir;
        let (t0, t1) = {
            let a = (min - origin) * inv;
            let b = (max - origin) * inv;
            if a <= b { (a, b) } else { (b, a) }
        };
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }
    Some(t_min)
}

/// Finds the nearest visible unit hit by the ray.
pub fn ray_cast<'a>(units: impl IntoIterator<Item = &'a Unit>, ray: &Ray) -> Option<UnitId> {
    if !ray.origin.is_finite() || !ray.direction.is_finite() {
        return None;
    }
    units
        .into_iter()
        .filter(|unit| unit.is_visible())
        .filter_map(|unit| ray_hits_box(ray, &unit_bounds(unit)).map(|t| (t, unit.id())))
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, id)| id)
}

mod vec3_array {
    use serde::{Deserialize, Deserializer};

    use crate::types::Vec3;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec3, D::Error>
    where
        D: Deserializer<'de>,
    {
        let [x, y, z] = <[f64; 3]>::deserialize(deserializer)?;
        Ok(Vec3::new(x, y, z))
    }
}
