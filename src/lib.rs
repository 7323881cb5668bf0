pub mod calendar;
pub mod config;
pub mod days_grouping;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod query;
pub mod records;
pub mod report;
pub mod resolver;
pub mod utils;

#[cfg(test)]
mod fixtures;
