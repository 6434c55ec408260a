//! Selection policies and boolean mask construction.

use serde::{Deserialize, Serialize};

use crate::snap::{snap_to_axis, unique_coordinates};
use crate::{PerturbationError, Result};

/// Valid latitude envelope.
pub const LAT_MIN_LIM: f64 = -90.0;
/// Valid latitude envelope.
pub const LAT_MAX_LIM: f64 = 90.0;
/// Valid longitude envelope.
pub const LON_MIN_LIM: f64 = -180.0;
/// Valid longitude envelope.
pub const LON_MAX_LIM: f64 = 180.0;

/// A latitude/longitude rectangle, south/north and west/east bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLonBox {
    pub lat_s: f64,
    pub lat_n: f64,
    pub lon_w: f64,
    pub lon_e: f64,
}

impl LatLonBox {
    pub fn new(lat_s: f64, lat_n: f64, lon_w: f64, lon_e: f64) -> Self {
        Self {
            lat_s,
            lat_n,
            lon_w,
            lon_e,
        }
    }

    /// The whole globe; perturbing with these bounds touches every point.
    pub fn global() -> Self {
        Self::new(LAT_MIN_LIM, LAT_MAX_LIM, LON_MIN_LIM, LON_MAX_LIM)
    }

    /// Whether these are exactly the global default bounds.
    pub fn is_global(&self) -> bool {
        *self == Self::global()
    }

    /// A request is rejected only when all four bounds are
    /// simultaneously outside the valid envelope.
    pub fn is_out_of_range(&self) -> bool {
        self.lat_s < LAT_MIN_LIM
            && self.lat_n > LAT_MAX_LIM
            && self.lon_w < LON_MIN_LIM
            && self.lon_e > LON_MAX_LIM
    }
}

/// One rectangle of a polygon list, with its own affine factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolygonFactor {
    pub bounds: LatLonBox,
    pub zmul: f64,
    pub zadd: f64,
}

/// Spatial selection policy. Closed set: the mask builder matches
/// exhaustively, with no default fallthrough.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// A single grid point.
    Point { lat: f64, lon: f64 },
    /// All points inside a rectangle (global when bounds are defaults).
    Rectangle(LatLonBox),
    /// Rectangles applied sequentially, each with its own factors.
    Polygons(Vec<PolygonFactor>),
}

impl Selection {
    /// Reject selections lying entirely outside the valid envelope,
    /// before any I/O happens.
    pub fn check_in_range(&self) -> Result<()> {
        let rejected = match self {
            Selection::Point { lat, lon } => {
                (*lat < LAT_MIN_LIM || *lat > LAT_MAX_LIM)
                    && (*lon < LON_MIN_LIM || *lon > LON_MAX_LIM)
            }
            Selection::Rectangle(bounds) => bounds.is_out_of_range(),
            Selection::Polygons(_) => false,
        };

        if rejected {
            Err(PerturbationError::OutOfRangeSelection {
                lat_min: LAT_MIN_LIM,
                lat_max: LAT_MAX_LIM,
                lon_min: LON_MIN_LIM,
                lon_max: LON_MAX_LIM,
            })
        } else {
            Ok(())
        }
    }
}

/// Mask for a single point: exact equality against the snapped
/// coordinates. Viable only because snapping is expected to land on a
/// true grid value.
pub fn point_mask(lats: &[f64], lons: &[f64], lat: f64, lon: f64) -> Vec<bool> {
    let snapped_lat = snap_to_axis(lat, &unique_coordinates(lats));
    let snapped_lon = snap_to_axis(lon, &unique_coordinates(lons));

    lats.iter()
        .zip(lons)
        .map(|(&la, &lo)| la == snapped_lat && lo == snapped_lon)
        .collect()
}

/// Mask for a rectangle: inclusive bounds, each bound snapped
/// independently against the message's coordinate set.
pub fn rectangle_mask(lats: &[f64], lons: &[f64], bounds: &LatLonBox) -> Vec<bool> {
    let unique_lats = unique_coordinates(lats);
    let unique_lons = unique_coordinates(lons);

    let lat_s = snap_to_axis(bounds.lat_s, &unique_lats);
    let lat_n = snap_to_axis(bounds.lat_n, &unique_lats);
    let lon_w = snap_to_axis(bounds.lon_w, &unique_lons);
    let lon_e = snap_to_axis(bounds.lon_e, &unique_lons);

    lats.iter()
        .zip(lons)
        .map(|(&la, &lo)| la >= lat_s && la <= lat_n && lo >= lon_w && lo <= lon_e)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // 3x3 grid: lats 50,45,40 (rows), lons -10,-5,0 (columns)
    fn grid() -> (Vec<f64>, Vec<f64>) {
        let lats = vec![50.0, 50.0, 50.0, 45.0, 45.0, 45.0, 40.0, 40.0, 40.0];
        let lons = vec![-10.0, -5.0, 0.0, -10.0, -5.0, 0.0, -10.0, -5.0, 0.0];
        (lats, lons)
    }

    #[test]
    fn point_mask_selects_one_point() {
        let (lats, lons) = grid();
        // 44 snaps up to 45, -6 snaps up to -5
        let mask = point_mask(&lats, &lons, 44.0, -6.0);

        let selected: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &m)| m.then_some(i))
            .collect();
        assert_eq!(selected, vec![4]);
    }

    #[test]
    fn point_mask_can_miss_due_to_snap_quirk() {
        let (lats, lons) = grid();
        // 46 snaps to 47 which is not a grid latitude
        let mask = point_mask(&lats, &lons, 46.0, -5.0);
        assert!(mask.iter().all(|&m| !m));
    }

    #[test]
    fn rectangle_mask_is_inclusive() {
        let (lats, lons) = grid();
        let mask = rectangle_mask(&lats, &lons, &LatLonBox::new(40.0, 45.0, -10.0, -5.0));

        let selected: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &m)| m.then_some(i))
            .collect();
        assert_eq!(selected, vec![3, 4, 6, 7]);
    }

    #[test]
    fn global_rectangle_selects_everything() {
        let (lats, lons) = grid();
        let mask = rectangle_mask(&lats, &lons, &LatLonBox::global());
        assert!(mask.iter().all(|&m| m));
    }

    #[test]
    fn out_of_range_needs_all_bounds_out() {
        assert!(LatLonBox::new(-91.0, 91.0, -181.0, 181.0).is_out_of_range());
        // One bound inside the envelope keeps the request acceptable
        assert!(!LatLonBox::new(-91.0, 91.0, -181.0, 10.0).is_out_of_range());
        assert!(!LatLonBox::new(40.0, 45.0, -10.0, -5.0).is_out_of_range());
    }

    #[test]
    fn point_out_of_range_requires_both_axes_out() {
        assert!(Selection::Point { lat: 95.0, lon: 200.0 }.check_in_range().is_err());
        assert!(Selection::Point { lat: 95.0, lon: 10.0 }.check_in_range().is_ok());
        assert!(Selection::Point { lat: 45.0, lon: -5.0 }.check_in_range().is_ok());
    }

    #[test]
    fn polygons_are_never_range_checked() {
        let selection = Selection::Polygons(vec![PolygonFactor {
            bounds: LatLonBox::new(-999.0, 999.0, -999.0, 999.0),
            zmul: 1.1,
            zadd: 0.0,
        }]);
        assert!(selection.check_in_range().is_ok());
    }
}
