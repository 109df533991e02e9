//! Read-only views handed to renderers.
//!
//! Both views pin one published [`SeriesState`] and project it lazily, so
//! holding a view never blocks a merge and a merge never changes a view that
//! is already held.

use std::sync::Arc;

use serde::{Serialize, Serializer};

use super::{SeriesState, overlay::project_anomalies};
use crate::models::SeriesPoint;

/// Every retained bucket as `(key, count)`, ascending by key.
#[derive(Debug, Clone)]
pub struct CountSeriesView {
    state: Arc<SeriesState>,
}

impl CountSeriesView {
    pub(super) fn new(state: Arc<SeriesState>) -> Self {
        Self { state }
    }

    /// Iterates the points in key order.
    pub fn iter(&self) -> impl Iterator<Item = SeriesPoint> + '_ {
        self.state.rows().map(|row| row.point())
    }

    /// Number of points in the view.
    pub fn len(&self) -> usize {
        self.state.len()
    }

    /// Returns `true` if the view has no points.
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Collects the view.
    pub fn to_vec(&self) -> Vec<SeriesPoint> {
        self.iter().collect()
    }
}

impl Serialize for CountSeriesView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// The anomalous buckets as `(key, count)`, ascending by key.
#[derive(Debug, Clone)]
pub struct AnomalyOverlayView {
    state: Arc<SeriesState>,
}

impl AnomalyOverlayView {
    pub(super) fn new(state: Arc<SeriesState>) -> Self {
        Self { state }
    }

    /// Iterates the anomalous points in key order.
    pub fn iter(&self) -> impl Iterator<Item = SeriesPoint> + '_ {
        project_anomalies(&self.state)
    }

    /// Number of anomalous points. Walks the pinned state.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns `true` if no bucket is flagged.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Collects the view.
    pub fn to_vec(&self) -> Vec<SeriesPoint> {
        self.iter().collect()
    }
}

impl Serialize for AnomalyOverlayView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}
