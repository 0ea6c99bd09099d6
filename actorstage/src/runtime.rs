//! Per-actor animation state.

use crate::atlas::AtlasSummary;
use crate::context::Generation;
use crate::skeleton::SkeletonDoc;

/// World-space placement of an actor on the stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
        }
    }
}

/// Tracks which clip is playing and how far into it the actor is. Clip
/// duration lives with the authoring data; the player only keeps the clock.
#[derive(Clone, Debug)]
pub struct AnimationPlayer {
    pub clip: Option<String>,
    pub time: f32,
    pub looping: bool,
}

impl AnimationPlayer {
    /// Starts the default clip: the first animation in export order, looping.
    /// A skeleton with no animations plays nothing.
    pub fn with_default_clip(doc: &SkeletonDoc) -> Self {
        Self {
            clip: doc.animations.first().cloned(),
            time: 0.0,
            looping: true,
        }
    }

    pub fn set_clip(&mut self, name: impl Into<String>, looping: bool) {
        self.clip = Some(name.into());
        self.time = 0.0;
        self.looping = looping;
    }

    pub fn advance(&mut self, delta: f32) {
        if self.clip.is_some() && delta > 0.0 {
            self.time += delta;
        }
    }
}

/// Everything an actor needs to animate and draw, built once per successful
/// load and rebuilt wholesale by recovery.
#[derive(Clone, Debug)]
pub struct SkeletonRuntime {
    pub asset_id: String,
    pub doc: SkeletonDoc,
    pub atlas: AtlasSummary,
    pub player: AnimationPlayer,
    pub transform: Transform,
    /// Context generation whose GPU resources this runtime's textures belong
    /// to. A runtime with a stale generation is skipped by the frame loop.
    pub generation: Generation,
}

impl SkeletonRuntime {
    pub fn new(
        asset_id: impl Into<String>,
        doc: SkeletonDoc,
        atlas: AtlasSummary,
        generation: Generation,
    ) -> Self {
        let player = AnimationPlayer::with_default_clip(&doc);
        Self {
            asset_id: asset_id.into(),
            doc,
            atlas,
            player,
            transform: Transform::default(),
            generation,
        }
    }
}
