// Moonwatch: memecoin trend detection from celebrity social feeds.
//
// This is the library root. Each module corresponds to a major subsystem
// of the fetch-and-analyze pipeline.

pub mod analyze;
pub mod config;
pub mod fetch;
pub mod output;
pub mod store;
pub mod web;
pub mod wishlist;
