pub mod catalog;
pub mod container;
pub mod estimate;
pub mod index;
pub mod region;
