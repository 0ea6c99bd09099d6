//! The stage: one handle over assets, actors, the render context, and the
//! frame loop.
//!
//! Loading is deferred: `attach_actor` returns an id immediately and queues
//! the load, and the host drains the queue with `process_pending_loads`
//! between ticks. `tick` itself never fetches or decodes anything.

use crate::actor::{Actor, ActorId, ActorOptions, ActorRegistry};
use crate::assets::{AssetRegistry, RawDescriptor};
use crate::atlas::AtlasSummary;
use crate::backend::RenderBackend;
use crate::context::{ContextManager, ContextOptions, ContextState, Generation, SurfaceSize};
use crate::decode::DecodeWaiter;
use crate::events::{Observers, StageEvent, SubscriptionId};
use crate::pipeline::load_actor_assets;
use crate::recovery::{RecoveryMap, RecoveryRecord};
use crate::resolve::UrlResolver;
use crate::runtime::{SkeletonRuntime, Transform};
use crate::schedule::FrameClock;
use crate::skeleton::SkeletonDoc;
use crate::source::{AssetSource, DecodedImage, ImageDecoder};
use crate::Error;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Clone, Debug)]
pub struct StageConfig {
    /// Serving origin that project-relative asset paths resolve against.
    pub origin: String,
    pub options: ContextOptions,
}

/// A queued actor load, waiting for the context to come up and for
/// `process_pending_loads` to run.
#[derive(Debug)]
struct PendingLoad {
    actor: ActorId,
    asset_id: String,
    transform: Transform,
}

/// Point-in-time counters for diagnostics overlays and tests.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StageDebugSnapshot {
    pub actor_count: usize,
    pub loaded_actor_count: usize,
    pub asset_cache_size: usize,
    pub pending_loads: usize,
    pub running: bool,
    pub generation: u32,
    pub recovery_entries: usize,
}

pub struct Stage {
    resolver: UrlResolver,
    assets: AssetRegistry,
    decode: DecodeWaiter,
    actors: ActorRegistry,
    context: ContextManager,
    clock: FrameClock,
    recovery: RecoveryMap,
    observers: Observers,
    pending: Vec<PendingLoad>,
    backend: Box<dyn RenderBackend>,
    source: Box<dyn AssetSource>,
    decoder: Box<dyn ImageDecoder>,
}

impl Stage {
    pub fn new(
        config: StageConfig,
        backend: Box<dyn RenderBackend>,
        source: Box<dyn AssetSource>,
        decoder: Box<dyn ImageDecoder>,
    ) -> Self {
        Self {
            resolver: UrlResolver::new(config.origin),
            assets: AssetRegistry::new(),
            decode: DecodeWaiter::new(),
            actors: ActorRegistry::new(),
            context: ContextManager::new(config.options),
            clock: FrameClock::new(),
            recovery: RecoveryMap::new(),
            observers: Observers::new(),
            pending: Vec::new(),
            backend,
            source,
            decoder,
        }
    }

    // ---- context lifecycle ----

    pub fn initialize_context(&mut self) -> Result<(), Error> {
        self.context.initialize()?;
        self.backend.initialize(self.context.options())?;
        if let Some(size) = self.context.frozen_size() {
            self.backend.set_surface_size(size);
        }
        Ok(())
    }

    /// Freezes the physical surface size from logical dimensions and device
    /// pixel ratio. Only the first call has any effect.
    pub fn freeze_surface_size(&mut self, logical_width: f32, logical_height: f32, dpr: f32) -> SurfaceSize {
        if let Some(size) = self.context.frozen_size() {
            return size;
        }
        let size = self.context.freeze_surface_size(logical_width, logical_height, dpr);
        if self.context.is_active() {
            self.backend.set_surface_size(size);
        }
        size
    }

    /// True once the context can accept uploads and draws. Attach is legal
    /// before this; the queued loads simply wait.
    pub fn is_ready_for_actors(&self) -> bool {
        self.context.is_active()
    }

    pub fn generation(&self) -> Generation {
        self.context.generation()
    }

    pub fn dispose(&mut self) {
        for id in self.actors.clear() {
            self.backend.drop_actor_resources(id);
        }
        self.pending.clear();
        self.recovery.clear();
        self.clock.stop();
        self.context.dispose();
    }

    // ---- assets ----

    pub fn register_asset(&mut self, asset_id: &str, raw: RawDescriptor) {
        if self.assets.has(asset_id) {
            log::debug!("asset '{asset_id}' already registered, keeping existing descriptor");
            return;
        }
        self.assets.register(
            asset_id,
            raw,
            &self.resolver,
            &mut self.decode,
            self.source.as_mut(),
            self.decoder.as_mut(),
        );
    }

    pub fn is_asset_ready(&self, asset_id: &str) -> bool {
        self.assets.has(asset_id) && self.decode.is_ready(asset_id)
    }

    // ---- actors ----

    /// Creates the actor and queues its load. The id is usable right away
    /// (reorder, detach); drawing starts once the load completes.
    pub fn attach_actor(&mut self, asset_id: &str, options: &ActorOptions) -> Result<ActorId, Error> {
        if self.context.state() == ContextState::Disposed {
            return Err(Error::Disposed);
        }
        let id = self.actors.attach_entry(asset_id, options, self.clock.now());
        self.pending.push(PendingLoad {
            actor: id,
            asset_id: asset_id.to_string(),
            transform: Transform {
                x: options.x,
                y: options.y,
                scale: options.scale.unwrap_or(1.0),
            },
        });
        Ok(id)
    }

    /// Returns false when the actor was already gone.
    pub fn detach_actor(&mut self, id: ActorId) -> bool {
        if !self.actors.detach(id) {
            return false;
        }
        self.backend.drop_actor_resources(id);
        self.recovery.remove(id);
        true
    }

    pub fn clear_actors(&mut self) {
        for id in self.actors.clear() {
            self.backend.drop_actor_resources(id);
        }
        self.pending.clear();
        self.recovery.clear();
    }

    pub fn move_actor_to_front(&mut self, id: ActorId) -> bool {
        self.actors.move_to_front(id)
    }

    pub fn move_actor_to_back(&mut self, id: ActorId) -> bool {
        self.actors.move_to_back(id)
    }

    /// Snapshot in draw order (index 0 is the back).
    pub fn actors(&self) -> Vec<Actor> {
        self.actors.all()
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id)
    }

    pub fn set_actor_position(&mut self, id: ActorId, x: f32, y: f32) -> bool {
        match self.actors.get_mut(id).and_then(|a| a.runtime.as_mut()) {
            Some(runtime) => {
                runtime.transform.x = x;
                runtime.transform.y = y;
                true
            }
            None => false,
        }
    }

    pub fn set_actor_visible(&mut self, id: ActorId, visible: bool) -> bool {
        match self.actors.get_mut(id) {
            Some(actor) => {
                actor.visible = visible;
                true
            }
            None => false,
        }
    }

    /// Switches the actor's clip. Returns false for unknown actors, unloaded
    /// actors, and clip names the skeleton does not define.
    pub fn set_actor_animation(&mut self, id: ActorId, name: &str, looping: bool) -> bool {
        match self.actors.get_mut(id).and_then(|a| a.runtime.as_mut()) {
            Some(runtime) if runtime.doc.has_animation(name) => {
                runtime.player.set_clip(name, looping);
                true
            }
            _ => false,
        }
    }

    // ---- loading ----

    /// Drains the pending load queue. Returns the number of loads that
    /// completed successfully. Jobs stay queued until the context is up;
    /// jobs whose actor was detached in the meantime are discarded.
    pub fn process_pending_loads(&mut self) -> usize {
        if !self.context.is_active() {
            return 0;
        }
        let jobs = std::mem::take(&mut self.pending);
        let mut completed = 0;
        for job in jobs {
            if !self.actors.contains(job.actor) {
                log::debug!("discarding load for detached {}", job.actor);
                continue;
            }
            let generation = self.context.generation();
            let loaded = load_actor_assets(
                &job.asset_id,
                generation,
                &mut self.assets,
                &self.resolver,
                &mut self.decode,
                self.source.as_mut(),
                self.decoder.as_mut(),
            );
            match loaded {
                Ok(loaded) => {
                    if let Err(e) =
                        self.backend
                            .upload_actor_textures(job.actor, generation, &loaded.images)
                    {
                        log::error!("texture upload failed for {}: {e}", job.actor);
                        self.fail_attach(job.actor, job.asset_id, e);
                        continue;
                    }
                    if let Some(actor) = self.actors.get_mut(job.actor) {
                        let mut runtime = loaded.runtime;
                        runtime.transform = job.transform;
                        actor.runtime = Some(runtime);
                    }
                    self.recovery.insert(job.actor, loaded.record);
                    self.observers.emit(&StageEvent::ActorLoaded {
                        actor: job.actor,
                        asset_id: job.asset_id,
                    });
                    completed += 1;
                }
                Err(e) => {
                    log::error!("load failed for {} ('{}'): {e}", job.actor, job.asset_id);
                    self.fail_attach(job.actor, job.asset_id, e);
                }
            }
        }
        completed
    }

    /// A failed attach leaves no half-initialized actor behind: the entry is
    /// removed and the failure reported through the event stream.
    fn fail_attach(&mut self, actor: ActorId, asset_id: String, error: Error) {
        self.actors.detach(actor);
        self.backend.drop_actor_resources(actor);
        self.observers.emit(&StageEvent::ActorLoadFailed {
            actor,
            asset_id,
            message: error.to_string(),
        });
    }

    // ---- frame loop ----

    pub fn start(&mut self) {
        self.clock.start();
    }

    pub fn stop(&mut self) {
        self.clock.stop();
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Advances and draws one frame. A stopped clock or a lost context makes
    /// this a no-op. One actor failing to draw is logged and skipped; the
    /// rest of the frame still renders.
    pub fn tick(&mut self, delta: f32) {
        if !self.clock.is_running() || !self.context.is_active() {
            return;
        }
        self.clock.advance(delta as f64);
        self.backend.clear();

        let generation = self.context.generation();
        for id in self.actors.ids() {
            let Some(actor) = self.actors.get_mut(id) else {
                continue;
            };
            if !actor.visible {
                continue;
            }
            let Some(runtime) = actor.runtime.as_mut() else {
                continue;
            };
            // Stale textures from before a context loss; recovery will
            // replace this runtime.
            if runtime.generation != generation {
                continue;
            }
            runtime.player.advance(delta);
            let actor: &Actor = actor;
            if let Some(runtime) = &actor.runtime {
                if let Err(e) = self.backend.draw_actor(actor, runtime) {
                    log::error!("draw failed for {}: {e}", actor.id);
                }
            }
        }
    }

    // ---- context loss and recovery ----

    /// Host signal that the render context died. Halts the loop and waits
    /// for `notify_context_restored`.
    pub fn notify_context_lost(&mut self) {
        if !self.context.is_active() {
            return;
        }
        log::warn!("render context lost");
        self.context.notify_lost();
        self.clock.halt_for_loss();
        self.observers.emit(&StageEvent::ContextLost);
    }

    /// Host signal that a fresh context is available. Re-initializes the
    /// backend, re-fetches and re-decodes every recorded asset, and rebuilds
    /// each surviving actor's runtime in place under the new generation. An
    /// actor that fails to rebuild is skipped; its recovery record stays so
    /// a later restore can retry it.
    pub fn notify_context_restored(&mut self) -> Result<(), Error> {
        let generation = self.context.restore()?;
        self.backend.initialize(self.context.options())?;
        if let Some(size) = self.context.frozen_size() {
            self.backend.set_surface_size(size);
        }

        let entries = self.recovery.entries();

        // One re-decode per asset, no matter how many actors share it.
        let mut requeued: HashSet<String> = HashSet::new();
        for (_, record) in &entries {
            if requeued.insert(record.asset_id.clone()) {
                self.decode.invalidate(&record.asset_id);
                self.decode.queue(
                    &record.asset_id,
                    &record.texture_urls,
                    self.source.as_mut(),
                    self.decoder.as_mut(),
                );
            }
        }

        for (actor_id, record) in entries {
            if !self.actors.contains(actor_id) {
                self.recovery.remove(actor_id);
                continue;
            }
            let rebuilt = rebuild_runtime(
                &record,
                generation,
                &mut self.decode,
                self.source.as_mut(),
            )
            .and_then(|(runtime, images)| {
                self.backend
                    .upload_actor_textures(actor_id, generation, &images)?;
                Ok(runtime)
            });
            match rebuilt {
                Ok(mut runtime) => {
                    if let Some(actor) = self.actors.get_mut(actor_id) {
                        if let Some(previous) = &actor.runtime {
                            runtime.transform = previous.transform;
                        }
                        actor.runtime = Some(runtime);
                    }
                    self.observers.emit(&StageEvent::ActorRecovered { actor: actor_id });
                }
                Err(e) => {
                    log::error!("recovery failed for {}: {e}", actor_id);
                    self.observers.emit(&StageEvent::ActorRecoveryFailed {
                        actor: actor_id,
                        message: e.to_string(),
                    });
                }
            }
        }

        self.observers.emit(&StageEvent::ContextRestored { generation });
        self.clock.resume_after_restore();
        Ok(())
    }

    // ---- observation ----

    pub fn subscribe(&mut self, observer: impl FnMut(&StageEvent) + 'static) -> SubscriptionId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn debug_snapshot(&self) -> StageDebugSnapshot {
        StageDebugSnapshot {
            actor_count: self.actors.len(),
            loaded_actor_count: self.actors.all().iter().filter(|a| a.is_loaded()).count(),
            asset_cache_size: self.assets.len(),
            pending_loads: self.pending.len(),
            running: self.clock.is_running(),
            generation: self.context.generation().0,
            recovery_entries: self.recovery.len(),
        }
    }
}

/// Rebuilds one actor's runtime from its recovery record, after the decode
/// waiter has been re-queued for the record's asset. Every recorded URL is
/// fetched and validated again; an atlas or skeleton that went bad since the
/// original load fails the rebuild the same way it would fail an attach.
fn rebuild_runtime(
    record: &RecoveryRecord,
    generation: Generation,
    decode: &mut DecodeWaiter,
    source: &mut dyn AssetSource,
) -> Result<(SkeletonRuntime, Vec<(String, DecodedImage)>), Error> {
    let atlas_text = source.fetch_text(&record.atlas_url)?;
    let skeleton_text = source.fetch_text(&record.skeleton_url)?;
    decode.await_ready(&record.asset_id)?;
    let images = decode.images_for(&record.asset_id);
    let atlas = AtlasSummary::parse(&record.asset_id, &atlas_text)?;
    let doc = SkeletonDoc::from_json_str(&record.asset_id, &skeleton_text)?;
    Ok((
        SkeletonRuntime::new(&record.asset_id, doc, atlas, generation),
        images,
    ))
}
