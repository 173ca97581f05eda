pub mod constants;
pub mod data;
pub mod error;
pub mod export;
pub mod games;
pub mod logging;
pub mod metrics;
pub mod phase;
pub mod rng;
pub mod runner;
pub mod schedule;
pub mod server_protocol;
pub mod server_utils;
pub mod types;
