pub mod aggregate;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod fetch;
pub mod identity;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod types;
pub mod venues;
