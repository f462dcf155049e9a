pub mod artifacts;
pub mod config;
pub mod config_processors;
pub mod endpoints;
pub mod error;
pub mod io;
pub mod matrix;
pub mod recommend;
