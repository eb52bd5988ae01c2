use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("Unsupported latitude/longitude shapes: lat{lat:?} lon{lon:?}")]
    UnsupportedShape { lat: Vec<usize>, lon: Vec<usize> },

    #[error("Coordinate array holds {found} values but its dimensions {dims:?} require {expected}")]
    LengthMismatch {
        dims: Vec<usize>,
        expected: usize,
        found: usize,
    },

    #[error("Grid has no cells with valid coordinates")]
    Empty,

    #[error("Value array shape {value:?} is not compatible with grid shape {grid:?}")]
    ValueShape { value: Vec<usize>, grid: (usize, usize) },

    #[error("Grid shape {found:?} differs from the reference grid {expected:?}")]
    ShapeChanged {
        expected: (usize, usize),
        found: (usize, usize),
    },
}
