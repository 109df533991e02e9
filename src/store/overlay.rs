//! Projection of the anomalous buckets of a series.

use super::SeriesState;
use crate::models::SeriesPoint;

/// Yields `(key, count)` for every anomalous row of `state`, in ascending key
/// order.
pub fn project_anomalies(state: &SeriesState) -> impl Iterator<Item = SeriesPoint> + '_ {
    state.rows().filter(|row| row.is_anomaly).map(|row| row.point())
}
