//! Community hub core for a tactical shooter: board posts with threaded
//! comments, weapon mod sharing, map markers and profiles, persisted as JSON
//! collections in a key/value store.

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
