pub mod autolabel;
pub mod classes;
pub mod common;
pub mod completions;
pub mod download;
pub mod init;
pub mod label;
pub mod partition;
pub mod predict;
pub mod settings;
pub mod status;
pub mod three_step;
pub mod train;
