pub mod coordinates;
pub mod error;
pub mod layout;
pub mod locate_cell;
