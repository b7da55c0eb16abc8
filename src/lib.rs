pub mod aggregate;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod daily;
pub mod dates;
pub mod fetch;
pub mod infra;
pub mod merge;
pub mod observation;
pub mod output;
pub mod pipeline;
pub mod regions;
pub mod select;
pub mod services;
pub mod slices;
pub mod station;
