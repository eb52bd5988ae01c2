//! Normalizes the many ways latitude/longitude arrays are stored into one
//! row-major `(row, col)` grid.
//!
//! Reanalysis products ship a regular axis pair (1D `lat`, 1D `lon`) that is
//! meshed here; satellite swaths ship per-pixel 2D arrays, occasionally with the
//! two arrays stored in different orientations or with one of them collapsed to
//! a single axis.

use crate::grid::error::GridError;
use crate::reader::Dimension;
use crate::types::grid_cell::GridCell;

/// Raw values of a coordinate variable together with its dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateArray {
    pub values: Vec<f64>,
    pub dimensions: Vec<Dimension>,
}

impl CoordinateArray {
    pub fn new(values: Vec<f64>, dimensions: Vec<Dimension>) -> Self {
        Self { values, dimensions }
    }

    /// Drops singleton dimensions while the rank exceeds two, e.g. `(1, ny, nx)` → `(ny, nx)`.
    fn squeezed_dimensions(&self) -> Vec<Dimension> {
        squeeze(&self.dimensions)
    }
}

fn squeeze(dimensions: &[Dimension]) -> Vec<Dimension> {
    let mut dims = dimensions.to_vec();
    while dims.len() > 2 {
        match dims.iter().position(|d| d.len == 1) {
            Some(i) => {
                dims.remove(i);
            }
            None => break,
        }
    }
    dims
}

fn lens(dimensions: &[Dimension]) -> Vec<usize> {
    dimensions.iter().map(|d| d.len).collect()
}

/// Size and, where known, dimension names of a normalized grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridShape {
    pub rows: usize,
    pub cols: usize,
    pub row_dim: Option<String>,
    pub col_dim: Option<String>,
}

impl GridShape {
    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Shape the coordinate variables would produce, without reading their values.
    pub fn from_dimensions(lat: &[Dimension], lon: &[Dimension]) -> Result<Self, GridError> {
        arrange(&squeeze(lat), &squeeze(lon)).map(|(shape, _)| shape)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arrangement {
    /// 1D latitude along rows, 1D longitude along columns.
    Mesh,
    /// Both 2D; longitude possibly stored transposed.
    Full { lon_transposed: bool },
    /// 2D latitude, 1D longitude broadcast along one axis.
    LatFull { lon_along_cols: bool },
    /// 2D longitude, 1D latitude broadcast along one axis.
    LonFull { lat_along_cols: bool },
}

fn arrange(lat: &[Dimension], lon: &[Dimension]) -> Result<(GridShape, Arrangement), GridError> {
    let unsupported = || GridError::UnsupportedShape {
        lat: lens(lat),
        lon: lens(lon),
    };
    let named = |rows: &Dimension, cols: &Dimension| GridShape {
        rows: rows.len,
        cols: cols.len,
        row_dim: Some(rows.name.clone()),
        col_dim: Some(cols.name.clone()),
    };

    match (lat, lon) {
        // A shared axis is a flat list of pixels, not a pair of grid axes.
        ([lat_axis], [lon_axis]) if lat_axis.name == lon_axis.name => Err(unsupported()),
        ([lat_axis], [lon_axis]) => Ok((named(lat_axis, lon_axis), Arrangement::Mesh)),
        ([r, c], [lr, lc]) => {
            let by_name = if r.name == c.name {
                None
            } else if lr.name == r.name && lc.name == c.name {
                Some(false)
            } else if lr.name == c.name && lc.name == r.name {
                Some(true)
            } else {
                None
            };
            let lon_transposed = match by_name {
                Some(transposed) => transposed,
                None if r.len == lr.len && c.len == lc.len => false,
                None if r.len == lc.len && c.len == lr.len => true,
                None => return Err(unsupported()),
            };
            let (lon_rows, lon_cols) = if lon_transposed { (lc, lr) } else { (lr, lc) };
            if lon_rows.len != r.len || lon_cols.len != c.len {
                return Err(unsupported());
            }
            Ok((named(r, c), Arrangement::Full { lon_transposed }))
        }
        ([r, c], [lon_axis]) => {
            if lon_axis.len == c.len {
                Ok((named(r, c), Arrangement::LatFull { lon_along_cols: true }))
            } else if lon_axis.len == r.len {
                Ok((named(r, c), Arrangement::LatFull { lon_along_cols: false }))
            } else {
                Err(unsupported())
            }
        }
        ([lat_axis], [r, c]) => {
            if lat_axis.len == r.len {
                Ok((named(r, c), Arrangement::LonFull { lat_along_cols: false }))
            } else if lat_axis.len == c.len {
                Ok((named(r, c), Arrangement::LonFull { lat_along_cols: true }))
            } else {
                Err(unsupported())
            }
        }
        _ => Err(unsupported()),
    }
}

/// A source grid with one latitude/longitude pair per cell, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    shape: GridShape,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
}

impl Grid {
    /// Builds the normalized grid from latitude and longitude arrays.
    ///
    /// # Errors
    ///
    /// * [`GridError::UnsupportedShape`] if the two arrays cannot describe the same 2D grid.
    /// * [`GridError::LengthMismatch`] if an array's length disagrees with its dimensions.
    /// * [`GridError::Empty`] if the grid has no cells.
    pub fn from_coordinates(lat: CoordinateArray, lon: CoordinateArray) -> Result<Self, GridError> {
        let lat_dims = lat.squeezed_dimensions();
        let lon_dims = lon.squeezed_dimensions();
        let (shape, arrangement) = arrange(&lat_dims, &lon_dims)?;

        for (array, dims) in [(&lat, &lat_dims), (&lon, &lon_dims)] {
            let expected: usize = dims.iter().map(|d| d.len).product();
            if array.values.len() != expected {
                return Err(GridError::LengthMismatch {
                    dims: lens(dims),
                    expected,
                    found: array.values.len(),
                });
            }
        }
        if shape.rows == 0 || shape.cols == 0 {
            return Err(GridError::Empty);
        }

        let (rows, cols) = shape.dims();
        let lat_v = &lat.values;
        let lon_v = &lon.values;
        let mut latitudes = Vec::with_capacity(rows * cols);
        let mut longitudes = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                let flat = r * cols + c;
                let (la, lo) = match arrangement {
                    Arrangement::Mesh => (lat_v[r], lon_v[c]),
                    Arrangement::Full { lon_transposed: false } => (lat_v[flat], lon_v[flat]),
                    Arrangement::Full { lon_transposed: true } => {
                        (lat_v[flat], lon_v[c * rows + r])
                    }
                    Arrangement::LatFull { lon_along_cols } => {
                        (lat_v[flat], if lon_along_cols { lon_v[c] } else { lon_v[r] })
                    }
                    Arrangement::LonFull { lat_along_cols } => {
                        (if lat_along_cols { lat_v[c] } else { lat_v[r] }, lon_v[flat])
                    }
                };
                latitudes.push(la);
                longitudes.push(lo);
            }
        }

        Ok(Self {
            shape,
            latitudes,
            longitudes,
        })
    }

    pub fn shape(&self) -> &GridShape {
        &self.shape
    }

    /// Coordinates of a cell, `None` when out of range.
    pub fn cell(&self, row: usize, col: usize) -> Option<(f64, f64)> {
        if row >= self.shape.rows || col >= self.shape.cols {
            return None;
        }
        let flat = row * self.shape.cols + col;
        Some((self.latitudes[flat], self.longitudes[flat]))
    }

    /// Cells with usable coordinates. Fill values (non-finite, or outside ±90 / ±360)
    /// are left out so they can never be picked as nearest.
    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        let cols = self.shape.cols;
        self.latitudes
            .iter()
            .zip(&self.longitudes)
            .enumerate()
            .filter(|(_, (lat, lon))| is_valid_coordinate(**lat, **lon))
            .map(move |(flat, (lat, lon))| GridCell {
                row: flat / cols,
                col: flat % cols,
                latitude: *lat,
                longitude: *lon,
            })
    }
}

fn is_valid_coordinate(lat: f64, lon: f64) -> bool {
    lat.is_finite() && lon.is_finite() && lat.abs() <= 90.0 && lon.abs() <= 360.0
}
