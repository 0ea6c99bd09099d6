//! Rendering resource engine for skeletal-animation character scenes.
//!
//! This crate is renderer-agnostic: the GPU sits behind [`RenderBackend`]
//! and byte fetching behind [`AssetSource`], so the whole engine runs
//! headless in tests. A wgpu integration lives in `actorstage-wgpu`.

#![forbid(unsafe_code)]

mod actor;
mod assets;
mod atlas;
mod backend;
mod context;
mod decode;
mod error;
mod events;
mod pipeline;
mod recovery;
mod resolve;
mod runtime;
mod schedule;
mod skeleton;
mod source;
mod stage;

pub use actor::*;
pub use assets::*;
pub use atlas::*;
pub use backend::*;
pub use context::*;
pub use decode::*;
pub use error::*;
pub use events::*;
pub use pipeline::*;
pub use recovery::*;
pub use resolve::*;
pub use runtime::*;
pub use schedule::*;
pub use skeleton::*;
pub use source::*;
pub use stage::*;

#[cfg(test)]
mod testutil;







#[cfg(test)]
mod stage_tests;
