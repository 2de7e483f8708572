//! Freight Rates Library
//!
//! Container freight rate estimation from published freight indices, with
//! seasonality, fuel surcharge, reliability scoring and a deterministic
//! fallback when no index is available.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod persistence;
