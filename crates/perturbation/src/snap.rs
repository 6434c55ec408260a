//! Coordinate snapping onto a message's actual grid.

/// Snap a requested coordinate onto the axis values present in a grid.
///
/// This intentionally reproduces the reference behavior
/// `requested + min(|axis - requested|)`: the requested value is shifted
/// *upward* by the smallest absolute distance to any axis value, which
/// only lands on a real grid coordinate when the nearest axis value lies
/// above the request. It is not a true nearest-neighbor lookup.
/// Existing fixtures and downstream outputs encode this behavior, so it
/// is kept verbatim and isolated here; swap in [`snap_nearest`] if
/// compatibility ever stops mattering.
pub fn snap_to_axis(requested: f64, axis: &[f64]) -> f64 {
    let min_distance = axis
        .iter()
        .map(|&a| (a - requested).abs())
        .fold(f64::INFINITY, f64::min);

    if min_distance.is_finite() {
        requested + min_distance
    } else {
        requested
    }
}

/// True nearest-neighbor snap. Not used by the operations; kept as the
/// corrected replacement for [`snap_to_axis`].
pub fn snap_nearest(requested: f64, axis: &[f64]) -> f64 {
    axis.iter()
        .copied()
        .min_by(|a, b| {
            (a - requested)
                .abs()
                .total_cmp(&(b - requested).abs())
        })
        .unwrap_or(requested)
}

/// The distinct coordinate values of an axis, sorted ascending.
///
/// Deduplication uses exact float equality: coordinates come straight
/// from the grid definition, so equal points are exactly equal.
pub fn unique_coordinates(coordinates: &[f64]) -> Vec<f64> {
    let mut unique: Vec<f64> = coordinates.to_vec();
    unique.sort_unstable_by(f64::total_cmp);
    unique.dedup();
    unique
}
