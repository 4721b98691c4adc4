#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod crawl;
pub mod csv_store;
pub mod extract;
pub mod fetch;
pub mod formats;
pub mod labels;
pub mod listing;
pub mod logging;
