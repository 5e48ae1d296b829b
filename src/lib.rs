pub mod config;
pub mod draws;
pub mod error;
pub mod features;
pub mod fetch;
pub mod model;
pub mod stats;
pub mod storage;
