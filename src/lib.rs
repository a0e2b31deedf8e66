pub mod catalog;
pub mod config;
pub mod generate;
pub mod output;
pub mod schedule;
pub mod scoring;
pub mod warning;
