pub mod cache;
pub mod config_cmd;
pub mod context;
pub mod tools;
