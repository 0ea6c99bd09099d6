//! The GPU seam: everything the stage asks of a concrete renderer.

use crate::actor::{Actor, ActorId};
use crate::context::{ContextOptions, Generation, SurfaceSize};
use crate::runtime::SkeletonRuntime;
use crate::source::DecodedImage;
use crate::Error;

/// Concrete GPU renderer behind the stage. The wgpu implementation lives in
/// a companion crate; tests drive the stage with a recording fake.
pub trait RenderBackend {
    fn initialize(&mut self, options: &ContextOptions) -> Result<(), Error>;

    fn set_surface_size(&mut self, size: SurfaceSize);

    /// Clears the frame before actors are drawn.
    fn clear(&mut self);

    /// Creates (or replaces) GPU textures for one actor from decoded pixels.
    /// Resources are tagged with `generation`; after a context restore the
    /// stage re-uploads under the new generation.
    fn upload_actor_textures(
        &mut self,
        actor: ActorId,
        generation: Generation,
        images: &[(String, DecodedImage)],
    ) -> Result<(), Error>;

    fn draw_actor(&mut self, actor: &Actor, runtime: &SkeletonRuntime) -> Result<(), Error>;

    /// Releases the actor's GPU resources. Unknown ids are a no-op.
    fn drop_actor_resources(&mut self, actor: ActorId);
}
