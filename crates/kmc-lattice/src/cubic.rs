//! Cubic-lattice geometry helper.
//!
//! Maps integer `(x, y, z)` positions to flat site indices and back, with
//! per-axis boundary handling, so applications can describe transport on a
//! regular LxWxH grid and hand the engine nothing but site ids.
//!
//! Index layout is x-major: `index = z + y·H + x·W·H`.

use kmc_core::SiteId;

use crate::{LatticeError, LatticeResult};

/// How an axis treats coordinates beyond its extent.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum BoundarySetting {
    /// Out-of-range coordinates are an error.
    #[default]
    Fixed,
    /// Coordinates wrap around the axis.
    Periodic,
}

/// An LxWxH cubic lattice with uniform inter-site spacing.
#[derive(Clone, Debug)]
pub struct Cubic {
    length: i32,
    width: i32,
    height: i32,
    total: i32,
    /// Distance between nearest-neighbor sites, in nanometers.
    inter_site_distance: f64,
    x_bound: BoundarySetting,
    y_bound: BoundarySetting,
    z_bound: BoundarySetting,
}

impl Cubic {
    /// A lattice with unit spacing and fixed boundaries.
    pub fn new(length: i32, width: i32, height: i32) -> LatticeResult<Self> {
        Self::with_boundaries(
            length,
            width,
            height,
            1.0,
            BoundarySetting::Fixed,
            BoundarySetting::Fixed,
            BoundarySetting::Fixed,
        )
    }

    pub fn with_spacing(
        length: i32,
        width: i32,
        height: i32,
        inter_site_distance: f64,
    ) -> LatticeResult<Self> {
        Self::with_boundaries(
            length,
            width,
            height,
            inter_site_distance,
            BoundarySetting::Fixed,
            BoundarySetting::Fixed,
            BoundarySetting::Fixed,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_boundaries(
        length: i32,
        width: i32,
        height: i32,
        inter_site_distance: f64,
        x_bound: BoundarySetting,
        y_bound: BoundarySetting,
        z_bound: BoundarySetting,
    ) -> LatticeResult<Self> {
        if length <= 0 || width <= 0 || height <= 0 {
            return Err(LatticeError::BadDimensions {
                length,
                width,
                height,
            });
        }
        if !(inter_site_distance.is_finite() && inter_site_distance > 0.0) {
            return Err(LatticeError::NonPositiveParameter {
                name: "inter-site distance",
                value: inter_site_distance,
            });
        }
        Ok(Self {
            length,
            width,
            height,
            total: length * width * height,
            inter_site_distance,
            x_bound,
            y_bound,
            z_bound,
        })
    }

    pub fn length(&self) -> i32 {
        self.length
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn site_count(&self) -> i32 {
        self.total
    }

    /// Flat index of the site at `(x, y, z)`, honoring the boundary settings.
    pub fn index(&self, x: i32, y: i32, z: i32) -> LatticeResult<SiteId> {
        let x = fold(x, self.length, self.x_bound)
            .ok_or(LatticeError::OutOfBounds { x, y, z })?;
        let y = fold(y, self.width, self.y_bound)
            .ok_or(LatticeError::OutOfBounds { x, y, z })?;
        let z = fold(z, self.height, self.z_bound)
            .ok_or(LatticeError::OutOfBounds { x, y, z })?;
        Ok(SiteId(self.flat(x, y, z) as u32))
    }

    /// Position of a flat site index.
    pub fn position(&self, site: SiteId) -> LatticeResult<(i32, i32, i32)> {
        let index = site.0 as i32;
        if index < 0 || index >= self.total {
            return Err(LatticeError::BadIndex(index));
        }
        let x = index / (self.width * self.height);
        let remainder = index % (self.width * self.height);
        let y = remainder / self.height;
        let z = remainder % self.height;
        Ok((x, y, z))
    }

    /// Every site within `cutoff` (same distance units as the spacing) of
    /// `site`, excluding `site` itself, ascending by id.
    pub fn neighbors(&self, site: SiteId, cutoff: f64) -> LatticeResult<Vec<SiteId>> {
        let (x, y, z) = self.position(site)?;
        let reach = (cutoff / self.inter_site_distance).floor() as i32;

        let mut found = Vec::new();
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                for dz in -reach..=reach {
                    if dx == 0 && dy == 0 && dz == 0 {
                        continue;
                    }
                    let separation = self.inter_site_distance
                        * f64::from(dx * dx + dy * dy + dz * dz).sqrt();
                    if separation > cutoff {
                        continue;
                    }
                    if let Ok(neighbor) = self.index(x + dx, y + dy, z + dz) {
                        found.push(neighbor);
                    }
                }
            }
        }
        found.sort_unstable();
        found.dedup();
        Ok(found)
    }

    /// Euclidean distance between two sites, in the spacing's units.
    ///
    /// Measured on the unfolded grid; periodic images are not considered.
    pub fn distance(&self, a: SiteId, b: SiteId) -> LatticeResult<f64> {
        let (x1, y1, z1) = self.position(a)?;
        let (x2, y2, z2) = self.position(b)?;
        let dx = f64::from(x2 - x1);
        let dy = f64::from(y2 - y1);
        let dz = f64::from(z2 - z1);
        Ok(self.inter_site_distance * (dx * dx + dy * dy + dz * dz).sqrt())
    }

    fn flat(&self, x: i32, y: i32, z: i32) -> i32 {
        z + y * self.height + x * self.width * self.height
    }
}

/// Fold a coordinate into `[0, extent)` per the boundary setting, or `None`
/// when a fixed axis is exceeded.
fn fold(coordinate: i32, extent: i32, bound: BoundarySetting) -> Option<i32> {
    match bound {
        BoundarySetting::Fixed if (0..extent).contains(&coordinate) => Some(coordinate),
        BoundarySetting::Fixed => None,
        BoundarySetting::Periodic => Some(coordinate.rem_euclid(extent)),
    }
}
