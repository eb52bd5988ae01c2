use crate::grid::coordinates::Grid;
use crate::grid::error::GridError;
use crate::sites::site_list::SiteList;
use crate::types::grid_cell::GridCell;
use haversine::{distance, Location as HaversineLocation, Units};
use log::debug;
use ordered_float::OrderedFloat;
use rstar::RTree;

/// The grid cell chosen for a site.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCell {
    pub site: String,
    pub row: usize,
    pub col: usize,
    pub cell_latitude: f64,
    pub cell_longitude: f64,
    /// Planar distance in degrees, the quantity that was minimized.
    pub distance_deg: f64,
    /// Great-circle distance, for diagnostics only.
    pub distance_km: f64,
}

/// Nearest-cell lookup over a normalized [`Grid`].
#[derive(Debug, Clone)]
pub struct GridLocator {
    rtree: RTree<GridCell>,
    cols: usize,
}

impl GridLocator {
    /// Indexes every cell with valid coordinates.
    ///
    /// # Errors
    ///
    /// [`GridError::Empty`] when no cell has usable coordinates.
    pub fn new(grid: &Grid) -> Result<Self, GridError> {
        let cells: Vec<GridCell> = grid.cells().collect();
        if cells.is_empty() {
            return Err(GridError::Empty);
        }
        Ok(GridLocator {
            rtree: RTree::bulk_load(cells),
            cols: grid.shape().cols,
        })
    }

    /// Number of indexed cells.
    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    /// Nearest cell by squared planar degree distance, returned with that squared distance.
    ///
    /// Equidistant cells resolve to the smallest row-major flat index.
    pub fn nearest(&self, latitude: f64, longitude: f64) -> Option<(GridCell, f64)> {
        let query = [latitude, longitude];
        let mut candidates = self.rtree.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best) = candidates.next()?;
        let cols = self.cols;

        std::iter::once((first, best))
            .chain(candidates.take_while(|(_, d2)| *d2 <= best))
            .min_by_key(|(cell, d2)| (OrderedFloat(*d2), cell.flat_index(cols)))
            .map(|(cell, d2)| (*cell, d2))
    }

    /// Resolves every site to its nearest cell, in site-list order.
    pub fn resolve(&self, sites: &SiteList) -> Vec<ResolvedCell> {
        sites
            .iter()
            .filter_map(|site| {
                let (cell, d2) = self.nearest(site.latitude, site.longitude)?;
                let distance_km = distance(
                    HaversineLocation {
                        latitude: site.latitude,
                        longitude: site.longitude,
                    },
                    HaversineLocation {
                        latitude: cell.latitude,
                        longitude: cell.longitude,
                    },
                    Units::Kilometers,
                );
                debug!(
                    "{}: ({}, {}) -> cell [{}, {}] at ({:.4}, {:.4}), {:.2} km",
                    site.name,
                    site.latitude,
                    site.longitude,
                    cell.row,
                    cell.col,
                    cell.latitude,
                    cell.longitude,
                    distance_km
                );
                Some(ResolvedCell {
                    site: site.name.clone(),
                    row: cell.row,
                    col: cell.col,
                    cell_latitude: cell.latitude,
                    cell_longitude: cell.longitude,
                    distance_deg: d2.sqrt(),
                    distance_km,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::coordinates::CoordinateArray;
    use crate::reader::Dimension;
    use crate::sites::site_list::Site;

    fn regular_grid(lats: Vec<f64>, lons: Vec<f64>) -> Grid {
        let lat_dim = vec![Dimension::new("lat", lats.len())];
        let lon_dim = vec![Dimension::new("lon", lons.len())];
        Grid::from_coordinates(
            CoordinateArray::new(lats, lat_dim),
            CoordinateArray::new(lons, lon_dim),
        )
        .unwrap()
    }

    #[test]
    fn test_nearest_on_regular_grid() {
        let grid = regular_grid(vec![10.0, 10.5, 11.0], vec![80.0, 80.625, 81.25]);
        let locator = GridLocator::new(&grid).unwrap();
        assert_eq!(locator.len(), 9);

        let (cell, d2) = locator.nearest(10.6, 80.7).unwrap();
        assert_eq!((cell.row, cell.col), (1, 1));
        assert!((d2 - (0.1f64.powi(2) + 0.075f64.powi(2))).abs() < 1e-12);
    }

    #[test]
    fn test_ties_resolve_to_smallest_flat_index() {
        let grid = regular_grid(vec![0.0, 1.0], vec![0.0, 1.0]);
        let locator = GridLocator::new(&grid).unwrap();

        // Equidistant from all four cells.
        let (cell, _) = locator.nearest(0.5, 0.5).unwrap();
        assert_eq!((cell.row, cell.col), (0, 0));

        // Equidistant from (0, 1) and (1, 1).
        let (cell, _) = locator.nearest(0.5, 1.2).unwrap();
        assert_eq!((cell.row, cell.col), (0, 1));
    }

    #[test]
    fn test_same_input_same_cell() {
        let grid = regular_grid(
            (0..50).map(|i| i as f64 * 0.5).collect(),
            (0..50).map(|i| 60.0 + i as f64 * 0.625).collect(),
        );
        let locator = GridLocator::new(&grid).unwrap();
        let first = locator.nearest(13.1278, 80.2642);
        for _ in 0..10 {
            assert_eq!(locator.nearest(13.1278, 80.2642), first);
        }
    }

    #[test]
    fn test_fill_cells_are_never_selected() {
        let dims = vec![Dimension::new("y", 2), Dimension::new("x", 2)];
        let grid = Grid::from_coordinates(
            CoordinateArray::new(vec![f64::NAN, 5.0, 5.0, 5.0], dims.clone()),
            CoordinateArray::new(vec![f64::NAN, 5.0, 6.0, 7.0], dims),
        )
        .unwrap();
        let locator = GridLocator::new(&grid).unwrap();
        assert_eq!(locator.len(), 3);
        let (cell, _) = locator.nearest(0.0, 0.0).unwrap();
        assert_eq!((cell.row, cell.col), (0, 1));
    }

    #[test]
    fn test_all_invalid_grid_is_empty() {
        let dims = vec![Dimension::new("y", 1), Dimension::new("x", 2)];
        let grid = Grid::from_coordinates(
            CoordinateArray::new(vec![-999.0, -999.0], dims.clone()),
            CoordinateArray::new(vec![-999.0, -999.0], dims),
        )
        .unwrap();
        assert!(matches!(GridLocator::new(&grid), Err(GridError::Empty)));
    }

    #[test]
    fn test_resolve_sites() {
        let grid = regular_grid(vec![13.0, 13.5], vec![80.0, 80.625]);
        let locator = GridLocator::new(&grid).unwrap();
        let sites = SiteList::from_sites(vec![
            Site::new("Chennai", 13.1278, 80.2642),
            Site::new("North", 13.49, 80.6),
        ])
        .unwrap();

        let resolved = locator.resolve(&sites);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].site, "Chennai");
        assert_eq!((resolved[0].row, resolved[0].col), (0, 0));
        assert!(resolved[0].distance_km > 20.0 && resolved[0].distance_km < 40.0);
        assert_eq!((resolved[1].row, resolved[1].col), (1, 1));
        assert!(resolved[1].distance_deg < 0.05);
    }
}
