pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod db;
pub mod engine;
pub mod errors;
