use crate::grid::coordinates::GridShape;
use crate::grid::error::GridError;
use crate::reader::{Dimension, Hyperslab};

/// How the two spatial axes of a value array relate to the grid's `(row, col)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Row axis precedes the column axis in storage order.
    Normal,
    /// Column axis precedes the row axis.
    Transposed,
}

/// Where the grid axes (and optionally a time axis) sit in a value variable,
/// so a single cell can be read without loading the whole array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueLayout {
    lens: Vec<usize>,
    row_axis: usize,
    col_axis: usize,
    time_axis: Option<usize>,
    orientation: Orientation,
}

impl ValueLayout {
    /// Matches the dimensions of a value variable against the grid.
    ///
    /// Dimension names shared with the coordinate arrays decide first. Otherwise
    /// the two non-time, non-singleton axes are matched by length; a square grid
    /// is taken as stored in the normal orientation.
    pub fn detect(
        dimensions: &[Dimension],
        grid: &GridShape,
        time_dim: Option<&str>,
    ) -> Result<Self, GridError> {
        let lens: Vec<usize> = dimensions.iter().map(|d| d.len).collect();
        let mismatch = || GridError::ValueShape {
            value: lens.clone(),
            grid: grid.dims(),
        };

        let time_axis = time_dim.and_then(|t| {
            dimensions
                .iter()
                .position(|d| d.name.eq_ignore_ascii_case(t))
        });
        let is_grid_dim = |d: &Dimension| {
            [&grid.row_dim, &grid.col_dim]
                .into_iter()
                .flatten()
                .any(|name| *name == d.name)
        };
        let spatial: Vec<usize> = (0..dimensions.len())
            .filter(|&i| Some(i) != time_axis)
            .filter(|&i| dimensions[i].len != 1 || is_grid_dim(&dimensions[i]))
            .collect();
        if spatial.len() != 2 {
            return Err(mismatch());
        }
        let (a, b) = (spatial[0], spatial[1]);

        let build = |row_axis: usize, col_axis: usize| {
            if lens[row_axis] != grid.rows || lens[col_axis] != grid.cols {
                return Err(mismatch());
            }
            Ok(Self {
                lens: lens.clone(),
                row_axis,
                col_axis,
                time_axis,
                orientation: if row_axis < col_axis {
                    Orientation::Normal
                } else {
                    Orientation::Transposed
                },
            })
        };

        if let (Some(row_name), Some(col_name)) = (&grid.row_dim, &grid.col_dim) {
            if row_name != col_name {
                let find = |name: &str| {
                    spatial
                        .iter()
                        .copied()
                        .find(|&i| dimensions[i].name == name)
                };
                if let (Some(r), Some(c)) = (find(row_name), find(col_name)) {
                    return build(r, c);
                }
            }
        }

        if lens[a] == grid.rows && lens[b] == grid.cols {
            build(a, b)
        } else if lens[a] == grid.cols && lens[b] == grid.rows {
            build(b, a)
        } else {
            Err(mismatch())
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn time_axis(&self) -> Option<usize> {
        self.time_axis
    }

    pub fn time_len(&self) -> Option<usize> {
        self.time_axis.map(|t| self.lens[t])
    }

    /// Selection covering one grid cell and, when present, the full time axis.
    pub fn cell_slab(&self, row: usize, col: usize) -> Hyperslab {
        let mut start = vec![0; self.lens.len()];
        let mut count = vec![1; self.lens.len()];
        start[self.row_axis] = row;
        start[self.col_axis] = col;
        if let Some(t) = self.time_axis {
            count[t] = self.lens[t];
        }
        Hyperslab::new(start, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(named: &[(&str, usize)]) -> Vec<Dimension> {
        named.iter().map(|(n, l)| Dimension::new(*n, *l)).collect()
    }

    fn shape(rows: usize, cols: usize, names: Option<(&str, &str)>) -> GridShape {
        GridShape {
            rows,
            cols,
            row_dim: names.map(|(r, _)| r.to_string()),
            col_dim: names.map(|(_, c)| c.to_string()),
        }
    }

    #[test]
    fn test_reanalysis_cube() -> Result<(), GridError> {
        let grid = shape(361, 576, Some(("lat", "lon")));
        let cube = dims(&[("time", 24), ("lat", 361), ("lon", 576)]);
        let layout = ValueLayout::detect(&cube, &grid, Some("time"))?;
        assert_eq!(layout.orientation(), Orientation::Normal);
        assert_eq!(layout.time_len(), Some(24));
        assert_eq!(layout.cell_slab(10, 20), Hyperslab::new(vec![0, 10, 20], vec![24, 1, 1]));
        Ok(())
    }

    #[test]
    fn test_named_dimensions_detect_transpose() -> Result<(), GridError> {
        // Square grid: only names can tell the orientation.
        let grid = shape(4, 4, Some(("y", "x")));
        let layout = ValueLayout::detect(&dims(&[("x", 4), ("y", 4)]), &grid, None)?;
        assert_eq!(layout.orientation(), Orientation::Transposed);
        assert_eq!(layout.cell_slab(1, 3), Hyperslab::new(vec![3, 1], vec![1, 1]));
        Ok(())
    }

    #[test]
    fn test_length_fallback_and_singletons() -> Result<(), GridError> {
        let grid = shape(3, 5, Some(("lat", "lon")));
        let layout = ValueLayout::detect(&dims(&[("band", 1), ("d0", 5), ("d1", 3)]), &grid, None)?;
        assert_eq!(layout.orientation(), Orientation::Transposed);
        assert_eq!(layout.time_len(), None);
        assert_eq!(layout.cell_slab(2, 4), Hyperslab::new(vec![0, 4, 2], vec![1, 1, 1]));

        let square = shape(2, 2, None);
        let layout = ValueLayout::detect(&dims(&[("a", 2), ("b", 2)]), &square, None)?;
        assert_eq!(layout.orientation(), Orientation::Normal);
        Ok(())
    }

    #[test]
    fn test_incompatible_values() {
        let grid = shape(3, 5, Some(("lat", "lon")));
        assert!(matches!(
            ValueLayout::detect(&dims(&[("time", 2), ("lat", 4), ("lon", 5)]), &grid, Some("time")),
            Err(GridError::ValueShape { .. })
        ));
        assert!(matches!(
            ValueLayout::detect(&dims(&[("n", 15)]), &grid, None),
            Err(GridError::ValueShape { .. })
        ));
    }
}
