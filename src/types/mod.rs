pub mod grid_cell;
pub mod observation;
pub mod source;
