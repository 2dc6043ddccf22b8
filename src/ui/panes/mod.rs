pub mod grid;
pub mod selectors;
