pub mod app;
pub mod config;
pub mod render;
pub mod views;
