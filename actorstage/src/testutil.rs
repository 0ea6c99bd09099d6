//! Shared fakes for driving the stage headless.

use crate::actor::{Actor, ActorId};
use crate::backend::RenderBackend;
use crate::context::{ContextOptions, Generation, SurfaceSize};
use crate::runtime::SkeletonRuntime;
use crate::source::{AssetSource, DecodedImage, ImageDecoder};
use crate::Error;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub const ATLAS_TEXT: &str = "\
hero.png
size: 64, 64
head
  xy: 0, 0
";

pub const SKELETON_JSON: &str = r#"{
    "bones": [ { "name": "root" } ],
    "slots": [ { "name": "head", "bone": "root", "attachment": "head" } ],
    "animations": { "idle": {}, "walk": {} }
}"#;

/// In-memory byte store that logs every fetch.
#[derive(Default)]
pub struct SourceState {
    pub files: HashMap<String, Vec<u8>>,
    pub fetch_log: Vec<String>,
}

impl SourceState {
    pub fn fetches_of(&self, url: &str) -> usize {
        self.fetch_log.iter().filter(|u| *u == url).count()
    }
}

pub struct MemorySource(pub Rc<RefCell<SourceState>>);

impl AssetSource for MemorySource {
    fn fetch_bytes(&mut self, url: &str) -> Result<Vec<u8>, Error> {
        let mut state = self.0.borrow_mut();
        state.fetch_log.push(url.to_string());
        state.files.get(url).cloned().ok_or_else(|| Error::Fetch {
            url: url.to_string(),
            message: "not found".to_string(),
        })
    }
}

/// Decodes any bytes into a 1x1 image, except the literal bytes `corrupt`.
pub struct StubDecoder;

impl ImageDecoder for StubDecoder {
    fn decode(&mut self, url: &str, bytes: &[u8]) -> Result<DecodedImage, Error> {
        if bytes == b"corrupt" {
            return Err(Error::Decode {
                asset: String::new(),
                url: url.to_string(),
                message: "corrupt image data".to_string(),
            });
        }
        Ok(DecodedImage {
            width: 1,
            height: 1,
            pixels: vec![0, 0, 0, 255],
        })
    }
}

/// Everything the backend was asked to do, in call order where it matters.
#[derive(Default)]
pub struct BackendLog {
    pub init_count: usize,
    pub surface_sizes: Vec<SurfaceSize>,
    pub clear_count: usize,
    pub uploads: Vec<(ActorId, Generation, usize)>,
    pub draws: Vec<(ActorId, String, Generation)>,
    pub drops: Vec<ActorId>,
    /// Actor ids whose draw calls should fail.
    pub fail_draw_for: Vec<ActorId>,
}

pub struct RecordingBackend(pub Rc<RefCell<BackendLog>>);

impl RenderBackend for RecordingBackend {
    fn initialize(&mut self, _options: &ContextOptions) -> Result<(), Error> {
        self.0.borrow_mut().init_count += 1;
        Ok(())
    }

    fn set_surface_size(&mut self, size: SurfaceSize) {
        self.0.borrow_mut().surface_sizes.push(size);
    }

    fn clear(&mut self) {
        self.0.borrow_mut().clear_count += 1;
    }

    fn upload_actor_textures(
        &mut self,
        actor: ActorId,
        generation: Generation,
        images: &[(String, DecodedImage)],
    ) -> Result<(), Error> {
        self.0.borrow_mut().uploads.push((actor, generation, images.len()));
        Ok(())
    }

    fn draw_actor(&mut self, actor: &Actor, runtime: &SkeletonRuntime) -> Result<(), Error> {
        let mut log = self.0.borrow_mut();
        if log.fail_draw_for.contains(&actor.id) {
            return Err(Error::Draw {
                message: format!("injected failure for {}", actor.id),
            });
        }
        log.draws
            .push((actor.id, runtime.asset_id.clone(), runtime.generation));
        Ok(())
    }

    fn drop_actor_resources(&mut self, actor: ActorId) {
        self.0.borrow_mut().drops.push(actor);
    }
}
