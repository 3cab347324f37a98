pub mod apis;
pub mod calendar;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod registry;
pub mod types;
