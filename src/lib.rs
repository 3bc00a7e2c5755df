pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod format_csv;
pub mod forms;
pub mod logging;
pub mod lookup;
pub mod masking;
pub mod model;
pub mod render;
pub mod server;
pub mod session;
pub mod validation;
