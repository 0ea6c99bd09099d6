//! Render context lifecycle: initialization, loss, restoration, disposal.

use crate::Error;

/// Creation options for the render surface. Fixed for the lifetime of the
/// context; restoration reuses the same options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContextOptions {
    /// Keep the last presented frame readable (screenshots, compositing).
    pub preserve_drawing_buffer: bool,
    /// Surface carries an alpha channel and composites over the host.
    pub alpha: bool,
    /// Texture color is premultiplied by alpha.
    pub premultiplied_alpha: bool,
    pub antialias: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            preserve_drawing_buffer: true,
            alpha: true,
            premultiplied_alpha: true,
            antialias: false,
        }
    }
}

/// Monotonic counter bumped each time the context is restored. GPU resources
/// are tagged with the generation they were created under; a mismatch means
/// the resource died with the old context.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(pub u32);

impl Generation {
    pub fn bump(&mut self) {
        self.0 += 1;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextState {
    Uninitialized,
    Active,
    Lost,
    Disposed,
}

/// Physical surface size, frozen at first initialization so later DPR or
/// layout changes cannot stretch the render target under a live context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

/// Tracks the context state machine. The actual GPU work lives behind
/// `RenderBackend`; this type only decides what is legal when.
#[derive(Debug)]
pub struct ContextManager {
    state: ContextState,
    options: ContextOptions,
    generation: Generation,
    frozen_size: Option<SurfaceSize>,
}

impl ContextManager {
    pub fn new(options: ContextOptions) -> Self {
        Self {
            state: ContextState::Uninitialized,
            options,
            generation: Generation::default(),
            frozen_size: None,
        }
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_active(&self) -> bool {
        self.state == ContextState::Active
    }

    pub fn initialize(&mut self) -> Result<(), Error> {
        match self.state {
            ContextState::Disposed => Err(Error::Disposed),
            _ => {
                self.state = ContextState::Active;
                Ok(())
            }
        }
    }

    /// Records the physical surface size once. The first call wins; later
    /// calls are ignored. Physical size is the rounded product of logical
    /// size and device pixel ratio, never below 1x1.
    pub fn freeze_surface_size(&mut self, logical_width: f32, logical_height: f32, dpr: f32) -> SurfaceSize {
        if let Some(size) = self.frozen_size {
            return size;
        }
        let size = SurfaceSize {
            width: ((logical_width * dpr).round() as u32).max(1),
            height: ((logical_height * dpr).round() as u32).max(1),
        };
        self.frozen_size = Some(size);
        size
    }

    pub fn frozen_size(&self) -> Option<SurfaceSize> {
        self.frozen_size
    }

    /// Loss notification. Idempotent; a disposed context stays disposed.
    pub fn notify_lost(&mut self) {
        if self.state == ContextState::Active {
            self.state = ContextState::Lost;
        }
    }

    /// Restoration after loss. Bumps the generation so every resource created
    /// before the loss reads as stale.
    pub fn restore(&mut self) -> Result<Generation, Error> {
        match self.state {
            ContextState::Disposed => Err(Error::Disposed),
            ContextState::Lost => {
                self.generation.bump();
                self.state = ContextState::Active;
                Ok(self.generation)
            }
            _ => Ok(self.generation),
        }
    }

    pub fn dispose(&mut self) {
        self.state = ContextState::Disposed;
    }
}
