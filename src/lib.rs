pub mod config;
pub mod core;
pub mod data;
pub mod render;
pub mod textfit;
pub mod types;
pub mod ui;
