//! wgpu render backend for the `actorstage` resource engine.
//!
//! The engine core never touches the GPU; this crate supplies the
//! [`actorstage::RenderBackend`] implementation plus a PNG decoder built on
//! the `image` crate.

#![forbid(unsafe_code)]

mod backend;
mod decoder;
mod renderer;

pub use backend::*;
pub use decoder::*;
pub use renderer::*;
