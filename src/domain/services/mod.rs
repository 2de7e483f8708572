pub mod fallback;
pub mod fuel_model;
pub mod modifiers;
pub mod rate_engine;
pub mod region_resolver;
pub mod reliability;
pub mod source_registry;
pub mod statistics;
