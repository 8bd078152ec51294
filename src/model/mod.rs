pub mod config;
pub mod document;
pub mod geometry;
pub mod gesture;
pub mod layout;
pub mod position;
pub mod words;
