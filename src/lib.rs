pub mod build;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod output;
