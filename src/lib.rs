pub mod commands;
pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod model;
pub mod output;
pub mod propagate;
pub mod store;
