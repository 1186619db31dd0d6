pub mod buffer;
pub mod config;
pub mod engine;
pub mod gameplay;
pub mod image;
pub mod messages;
pub mod render;
