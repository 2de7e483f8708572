pub mod http_index_source;
pub mod index_source_factory;
pub mod timeout_source;
