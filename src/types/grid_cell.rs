//! A single cell of a source grid, indexable by the `rstar` R-tree.

use rstar::{PointDistance, RTreeObject, AABB};

/// One pixel (swath) or grid point (reanalysis) with its position in the
/// normalized `(row, col)` layout of a [`crate::Grid`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    pub latitude: f64,
    pub longitude: f64,
}

impl GridCell {
    /// Row-major flat index, used as the deterministic tie-breaker between
    /// equidistant cells.
    pub fn flat_index(&self, cols: usize) -> usize {
        self.row * cols + self.col
    }
}

impl RTreeObject for GridCell {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.latitude, self.longitude])
    }
}

impl PointDistance for GridCell {
    /// Squared planar distance in degrees. No geodesic correction is applied:
    /// cells are small relative to the regional extent of a site list.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let d_lat = self.latitude - point[0];
        let d_lon = self.longitude - point[1];
        d_lat * d_lat + d_lon * d_lon
    }
}
