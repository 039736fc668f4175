//! Stable Horde: a crowd-sourced image generator with an async job API.

pub mod client;
pub mod image;
pub mod types;

pub use image::StableHordeImageClient;
