//! Table geometry: cushions and pockets
//!
//! Cushion lines are the locus of ball centres at contact. Collision detection
//! treats each cushion as the infinite line through its endpoints, which is
//! only sound while the cushions form a closed convex boundary meeting at
//! shared corners; [`Table::rectangle`] builds such a boundary.
//!
//! Containment is not enforced after the fact. A second contact with the same
//! cushion inside the repeat-collision tolerance (see
//! [`crate::consts::REPEAT_COLLISION_TOLERANCE`]) is not detected, so with a
//! very low ball-cushion restitution a ball whose spin carries it back into
//! the cushion right after a bounce can come to rest a little past the line.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::UP;
use crate::error::ConfigError;

/// A straight cushion from `p1` to `p2`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cushion {
    pub p1: DVec3,
    pub p2: DVec3,
}

impl Cushion {
    pub fn new(p1: DVec3, p2: DVec3) -> Self {
        Self { p1, p2 }
    }

    /// Unit normal `(p2 - p1) x up`; points off the table for counter-clockwise boundaries
    pub fn normal(&self) -> DVec3 {
        (self.p2 - self.p1).cross(UP).normalize_or_zero()
    }

    /// Unit tangent completing the in-plane basis with [`Cushion::normal`]
    pub fn tangent(&self) -> DVec3 {
        self.normal().cross(UP)
    }

    pub fn length(&self) -> f64 {
        (self.p2 - self.p1).length()
    }

    /// Signed distance of a point from the cushion line along its normal
    pub fn signed_distance(&self, point: DVec3) -> f64 {
        (point - self.p1).dot(self.normal())
    }
}

/// A pocket: any ball centre within `radius` of `position` drops
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pocket {
    pub position: DVec3,
    pub radius: f64,
}

impl Pocket {
    pub fn new(position: DVec3, radius: f64) -> Self {
        Self { position, radius }
    }

    pub fn captures(&self, point: DVec3) -> bool {
        crate::planar(point - self.position).length() < self.radius
    }
}

/// Immutable boundary and pockets for a shot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableParts")]
pub struct Table {
    cushions: Vec<Cushion>,
    pockets: Vec<Pocket>,
}

#[derive(Deserialize)]
struct TableParts {
    cushions: Vec<Cushion>,
    pockets: Vec<Pocket>,
}

impl TryFrom<TableParts> for Table {
    type Error = ConfigError;

    fn try_from(parts: TableParts) -> Result<Self, Self::Error> {
        Table::new(parts.cushions, parts.pockets)
    }
}

impl Table {
    pub fn new(cushions: Vec<Cushion>, pockets: Vec<Pocket>) -> Result<Self, ConfigError> {
        for (index, cushion) in cushions.iter().enumerate() {
            if !(cushion.length() > 0.0) || !cushion.p1.is_finite() || !cushion.p2.is_finite() {
                return Err(ConfigError::DegenerateCushion { index });
            }
        }
        for (index, pocket) in pockets.iter().enumerate() {
            if !pocket.position.is_finite() {
                return Err(ConfigError::PocketPosition { index });
            }
            if !(pocket.radius > 0.0) || !pocket.radius.is_finite() {
                return Err(ConfigError::PocketRadius {
                    index,
                    value: pocket.radius,
                });
            }
        }
        Ok(Self { cushions, pockets })
    }

    /// Open plane with no boundary and no pockets
    pub fn empty() -> Self {
        Self::default()
    }

    /// Axis-aligned `width x length` table from the origin, corner pockets only
    ///
    /// Cushions run counter-clockwise so every normal points off the table.
    pub fn rectangle(width: f64, length: f64, pocket_radius: f64) -> Result<Self, ConfigError> {
        if !(width > 0.0 && length > 0.0) || !width.is_finite() || !length.is_finite() {
            return Err(ConfigError::TableSize { width, length });
        }
        let corners = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(width, 0.0, 0.0),
            DVec3::new(width, length, 0.0),
            DVec3::new(0.0, length, 0.0),
        ];
        let cushions = (0..4)
            .map(|i| Cushion::new(corners[i], corners[(i + 1) % 4]))
            .collect();
        let pockets = corners
            .iter()
            .map(|&c| Pocket::new(c, pocket_radius))
            .collect();
        Self::new(cushions, pockets)
    }

    /// The reference 2 x 4 table with 0.15 capture radius corner pockets
    pub fn standard() -> Self {
        Self::rectangle(2.0, 4.0, 0.15).unwrap_or_default()
    }

    pub fn cushions(&self) -> &[Cushion] {
        &self.cushions
    }

    pub fn pockets(&self) -> &[Pocket] {
        &self.pockets
    }

    /// Axis-aligned bounds of the cushion corners, if there are any cushions
    pub fn bounds(&self) -> Option<(DVec3, DVec3)> {
        let mut points = self.cushions.iter().flat_map(|c| [c.p1, c.p2]);
        let first = points.next()?;
        Some(points.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    /// Whether a point lies on the inner side of every cushion line
    pub fn contains(&self, point: DVec3) -> bool {
        self.cushions.iter().all(|c| c.signed_distance(point) <= 0.0)
    }
}
