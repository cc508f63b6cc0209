//! Filling in sparse GPS tracks.

use crate::{math::linspace_interior, TrackPoint};
use itertools::Itertools;
use log::debug;

/// Number of points, end points included, a gap of `dt` seconds is
/// divided into.
///
/// Slightly more than one per second, so the spacing of the filled in
/// gap stays under a second.
pub fn interpolation_steps(dt: f64) -> usize {
    let steps = (1.1 * dt).ceil();
    if steps.is_finite() && steps > 0.0 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let steps = steps as usize;
        steps
    } else {
        0
    }
}

/// Returns `points` with interpolated points inserted between each
/// consecutive pair, ordered by elapsed time.
///
/// A gap split into `steps` (see [`interpolation_steps`]) receives
/// `steps - 2` new points evenly spaced strictly between its ends.
/// Gaps with `steps <= 2` are left alone. The original points are
/// never modified.
pub fn densify(points: &[TrackPoint]) -> Vec<TrackPoint> {
    let mut dense: Vec<TrackPoint> = points.to_vec();
    for (p, q) in points.iter().tuple_windows() {
        let steps = interpolation_steps(q.elapsed_s - p.elapsed_s);
        dense.extend(linspace_interior(0.0, 1.0, steps).map(|f| p.lerp(q, f)));
    }
    dense.sort_by(|a, b| a.elapsed_s.total_cmp(&b.elapsed_s));
    debug!("densified {} points to {}", points.len(), dense.len());
    dense
}
