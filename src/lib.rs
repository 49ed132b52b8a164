pub mod commands;
pub mod config;
pub mod fs;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod process;
pub mod workflow;
