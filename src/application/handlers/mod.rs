pub mod estimate_handler;
