pub mod error;
pub mod site_list;
