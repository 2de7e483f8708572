pub mod history_recorder;
pub mod index_source;
pub mod route_data;
