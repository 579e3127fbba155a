//! Rotatable globe renderer for terminal frontends.
//!
//! The core is GUI-free: [`render::GlobeRenderer`] paints one frame into a
//! [`canvas::Canvas`] given an [`rotation::Orientation`] and a radius in
//! pixels. Raster themes come from a tile pyramid with ancestor fallback,
//! vector layers are great-circle polylines clipped against the horizon
//! and the viewport, and an optional graticule draws on top. The binary in
//! `main.rs` wraps all of it in a ratatui event loop.

pub mod canvas;
pub mod data;
pub mod geo;
pub mod geometry;
pub mod graticule;
pub mod hash;
pub mod render;
pub mod rotation;
pub mod texture;
pub mod theme;
pub mod tile;
pub mod vector;
