pub mod attachment;
pub mod config;
pub mod geometry;
pub mod input;
pub mod io;
pub mod render;
pub mod session;
pub mod tracking;
pub mod viz;
