pub mod filters;
pub mod pagination;
pub mod weather;
