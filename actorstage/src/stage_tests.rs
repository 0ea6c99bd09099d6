use crate::actor::ActorOptions;
use crate::assets::RawDescriptor;
use crate::context::ContextOptions;
use crate::events::StageEvent;
use crate::stage::{Stage, StageConfig};
use crate::testutil::{
    BackendLog, MemorySource, RecordingBackend, SourceState, StubDecoder, ATLAS_TEXT, SKELETON_JSON,
};
use std::cell::RefCell;
use std::rc::Rc;

const ORIGIN: &str = "https://studio.example";

fn hero_url(ext: &str) -> String {
    format!("{ORIGIN}/assets/characters/hero/hero.{ext}")
}

fn asset_url(id: &str, ext: &str) -> String {
    format!("{ORIGIN}/assets/characters/{id}/{id}.{ext}")
}

struct Fixture {
    stage: Stage,
    source: Rc<RefCell<SourceState>>,
    backend: Rc<RefCell<BackendLog>>,
    events: Rc<RefCell<Vec<StageEvent>>>,
}

/// Stage wired to an in-memory source seeded with conventional-path files
/// for the given asset ids.
fn fixture(asset_ids: &[&str]) -> Fixture {
    let source_state = Rc::new(RefCell::new(SourceState::default()));
    for id in asset_ids {
        let mut state = source_state.borrow_mut();
        state.files.insert(asset_url(id, "atlas"), ATLAS_TEXT.into());
        state.files.insert(asset_url(id, "json"), SKELETON_JSON.into());
        state.files.insert(asset_url(id, "png"), b"png".to_vec());
    }
    let backend_log = Rc::new(RefCell::new(BackendLog::default()));

    let mut stage = Stage::new(
        StageConfig {
            origin: ORIGIN.to_string(),
            options: ContextOptions::default(),
        },
        Box::new(RecordingBackend(Rc::clone(&backend_log))),
        Box::new(MemorySource(Rc::clone(&source_state))),
        Box::new(StubDecoder),
    );

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    stage.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    Fixture {
        stage,
        source: source_state,
        backend: backend_log,
        events,
    }
}

fn ready_fixture(asset_ids: &[&str]) -> Fixture {
    let mut f = fixture(asset_ids);
    f.stage.initialize_context().unwrap();
    f
}

#[test]
fn loads_wait_until_context_is_up() {
    let mut f = fixture(&["hero"]);

    let id = f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    assert!(!f.stage.is_ready_for_actors());
    assert_eq!(f.stage.process_pending_loads(), 0);
    assert_eq!(f.stage.debug_snapshot().pending_loads, 1);
    assert!(f.source.borrow().fetch_log.is_empty());

    f.stage.initialize_context().unwrap();
    assert_eq!(f.stage.process_pending_loads(), 1);

    let actor = f.stage.actor(id).unwrap();
    assert!(actor.is_loaded());
    assert_eq!(f.backend.borrow().uploads.len(), 1);
    assert!(f.events.borrow().iter().any(|e| matches!(
        e,
        StageEvent::ActorLoaded { actor, asset_id } if *actor == id && asset_id == "hero"
    )));
}

#[test]
fn two_actors_share_one_asset_fetch() {
    let mut f = ready_fixture(&["hero"]);
    f.stage.register_asset(
        "hero",
        RawDescriptor {
            atlas: "assets/characters/hero/hero.atlas".into(),
            skeleton: "assets/characters/hero/hero.json".into(),
            textures: vec!["assets/characters/hero/hero.png".into()],
        },
    );

    let a = f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    let b = f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    assert_ne!(a, b);
    assert_eq!(f.stage.process_pending_loads(), 2);

    // Texture bytes are fetched once at registration, not per actor.
    assert_eq!(f.source.borrow().fetches_of(&hero_url("png")), 1);
    assert_eq!(f.backend.borrow().uploads.len(), 2);
    assert_eq!(f.stage.debug_snapshot().asset_cache_size, 1);
}

#[test]
fn re_registering_an_asset_keeps_the_existing_descriptor() {
    let mut f = ready_fixture(&["hero"]);
    let raw = RawDescriptor::conventional("hero");
    f.stage.register_asset("hero", raw.clone());
    f.stage.register_asset("hero", raw);

    assert_eq!(f.source.borrow().fetches_of(&hero_url("png")), 1);
}

#[test]
fn unregistered_asset_falls_back_to_conventional_paths() {
    let mut f = ready_fixture(&["hero"]);

    let id = f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    assert_eq!(f.stage.process_pending_loads(), 1);

    assert!(f.stage.actor(id).unwrap().is_loaded());
    assert_eq!(f.source.borrow().fetches_of(&hero_url("atlas")), 1);
    assert_eq!(f.source.borrow().fetches_of(&hero_url("json")), 1);
    assert!(f.stage.is_asset_ready("hero"));
}

#[test]
fn attach_options_set_the_initial_transform() {
    let mut f = ready_fixture(&["hero"]);

    let id = f
        .stage
        .attach_actor(
            "hero",
            &ActorOptions {
                x: 120.0,
                y: -40.0,
                scale: Some(0.5),
                z: None,
            },
        )
        .unwrap();
    f.stage.process_pending_loads();

    let actor = f.stage.actor(id).unwrap();
    let transform = actor.runtime.as_ref().unwrap().transform;
    assert_eq!((transform.x, transform.y, transform.scale), (120.0, -40.0, 0.5));
}

#[test]
fn failed_load_detaches_the_actor_cleanly() {
    let mut f = ready_fixture(&["hero"]);
    f.source.borrow_mut().files.remove(&hero_url("json"));

    let id = f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    assert_eq!(f.stage.process_pending_loads(), 0);

    // No half-initialized actor survives a failed attach.
    assert!(f.stage.actor(id).is_none());
    assert_eq!(f.stage.debug_snapshot().actor_count, 0);
    assert!(f.events.borrow().iter().any(|e| matches!(
        e,
        StageEvent::ActorLoadFailed { actor, .. } if *actor == id
    )));

    f.stage.start();
    f.stage.tick(0.016);
    assert!(f.backend.borrow().draws.is_empty());
}

#[test]
fn load_for_a_detached_actor_is_discarded() {
    let mut f = ready_fixture(&["hero"]);

    let id = f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    assert!(f.stage.detach_actor(id));
    assert_eq!(f.stage.process_pending_loads(), 0);

    assert!(f.backend.borrow().uploads.is_empty());
    assert_eq!(f.backend.borrow().drops, vec![id]);
    assert!(f.events.borrow().is_empty());
}

#[test]
fn detach_is_idempotent_and_drops_gpu_resources() {
    let mut f = ready_fixture(&["hero"]);
    let id = f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    f.stage.process_pending_loads();

    assert!(f.stage.detach_actor(id));
    assert!(!f.stage.detach_actor(id));
    assert_eq!(f.backend.borrow().drops, vec![id]);
    assert_eq!(f.stage.debug_snapshot().recovery_entries, 0);
}

#[test]
fn tick_draws_loaded_actors_in_order() {
    let mut f = ready_fixture(&["hero", "villain"]);
    let hero = f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    let villain = f.stage.attach_actor("villain", &ActorOptions::default()).unwrap();
    f.stage.process_pending_loads();

    f.stage.start();
    f.stage.tick(0.016);

    let log = f.backend.borrow();
    assert_eq!(log.clear_count, 1);
    let drawn: Vec<_> = log.draws.iter().map(|(id, _, _)| *id).collect();
    assert_eq!(drawn, vec![hero, villain]);
}

#[test]
fn move_to_front_changes_draw_order() {
    let mut f = ready_fixture(&["hero", "villain"]);
    let hero = f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    let villain = f.stage.attach_actor("villain", &ActorOptions::default()).unwrap();
    f.stage.process_pending_loads();

    assert!(f.stage.move_actor_to_front(hero));
    f.stage.start();
    f.stage.tick(0.016);

    let drawn: Vec<_> = f.backend.borrow().draws.iter().map(|(id, _, _)| *id).collect();
    assert_eq!(drawn, vec![villain, hero]);
}

#[test]
fn hidden_actors_are_skipped() {
    let mut f = ready_fixture(&["hero"]);
    let id = f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    f.stage.process_pending_loads();

    assert!(f.stage.set_actor_visible(id, false));
    f.stage.start();
    f.stage.tick(0.016);

    assert!(f.backend.borrow().draws.is_empty());
}

#[test]
fn one_failing_draw_does_not_stop_the_frame() {
    let mut f = ready_fixture(&["hero", "villain"]);
    let hero = f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    let villain = f.stage.attach_actor("villain", &ActorOptions::default()).unwrap();
    f.stage.process_pending_loads();

    f.backend.borrow_mut().fail_draw_for.push(hero);
    f.stage.start();
    f.stage.tick(0.016);

    let drawn: Vec<_> = f.backend.borrow().draws.iter().map(|(id, _, _)| *id).collect();
    assert_eq!(drawn, vec![villain]);
}

#[test]
fn tick_without_start_is_a_noop() {
    let mut f = ready_fixture(&["hero"]);
    f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    f.stage.process_pending_loads();

    f.stage.tick(0.016);
    assert_eq!(f.backend.borrow().clear_count, 0);

    f.stage.start();
    f.stage.start();
    assert!(f.stage.is_running());
    f.stage.stop();
    f.stage.stop();
    assert!(!f.stage.is_running());
}

#[test]
fn animation_clip_switch_requires_a_known_clip() {
    let mut f = ready_fixture(&["hero"]);
    let id = f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    f.stage.process_pending_loads();

    // Default clip is the first animation in export order.
    let clip = f.stage.actor(id).unwrap().runtime.as_ref().unwrap().player.clip.clone();
    assert_eq!(clip.as_deref(), Some("idle"));

    assert!(f.stage.set_actor_animation(id, "walk", false));
    assert!(!f.stage.set_actor_animation(id, "fly", true));
}

#[test]
fn frozen_surface_size_rounds_and_keeps_the_first_value() {
    let mut f = ready_fixture(&["hero"]);

    let size = f.stage.freeze_surface_size(300.0, 150.5, 2.0);
    assert_eq!((size.width, size.height), (600, 301));

    let again = f.stage.freeze_surface_size(9999.0, 9999.0, 3.0);
    assert_eq!(again, size);
    assert_eq!(f.backend.borrow().surface_sizes, vec![size]);
}

#[test]
fn surface_size_never_collapses_to_zero() {
    let mut f = ready_fixture(&["hero"]);
    let size = f.stage.freeze_surface_size(0.0, 0.1, 1.0);
    assert_eq!((size.width, size.height), (1, 1));
}

#[test]
fn lost_context_halts_ticks_until_restored() {
    let mut f = ready_fixture(&["hero"]);
    let id = f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    f.stage.process_pending_loads();
    f.stage.start();

    f.stage.notify_context_lost();
    assert!(!f.stage.is_running());
    f.stage.tick(0.016);
    assert_eq!(f.backend.borrow().clear_count, 0);

    f.stage.notify_context_restored().unwrap();
    assert!(f.stage.is_running());
    f.stage.tick(0.016);

    assert_eq!(f.backend.borrow().clear_count, 1);
    let drawn: Vec<_> = f.backend.borrow().draws.iter().map(|(a, _, g)| (*a, *g)).collect();
    assert_eq!(drawn, vec![(id, f.stage.generation())]);
}

#[test]
fn restore_rebuilds_actors_under_a_new_generation() {
    let mut f = ready_fixture(&["hero"]);
    let id = f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    f.stage.process_pending_loads();
    assert!(f.stage.set_actor_position(id, 42.0, 7.0));
    let old_generation = f.stage.generation();

    f.stage.notify_context_lost();
    f.stage.notify_context_restored().unwrap();

    let new_generation = f.stage.generation();
    assert!(new_generation > old_generation);
    assert_eq!(f.backend.borrow().init_count, 2);

    // Same actor id, same position, fresh GPU resources.
    let actor = f.stage.actor(id).unwrap();
    let runtime = actor.runtime.as_ref().unwrap();
    assert_eq!(runtime.generation, new_generation);
    assert_eq!((runtime.transform.x, runtime.transform.y), (42.0, 7.0));

    // Every recorded URL was re-fetched, the atlas included.
    assert_eq!(f.source.borrow().fetches_of(&hero_url("png")), 2);
    assert_eq!(f.source.borrow().fetches_of(&hero_url("atlas")), 2);
    assert_eq!(f.source.borrow().fetches_of(&hero_url("json")), 2);
    let uploads = f.backend.borrow().uploads.clone();
    assert_eq!(uploads.len(), 2);
    assert_eq!(uploads[1], (id, new_generation, 1));

    let events = f.events.borrow();
    assert!(events.iter().any(|e| matches!(e, StageEvent::ContextLost)));
    assert!(events.iter().any(|e| matches!(
        e,
        StageEvent::ActorRecovered { actor } if *actor == id
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        StageEvent::ContextRestored { generation } if *generation == new_generation
    )));
}

#[test]
fn shared_asset_is_re_decoded_once_during_recovery() {
    let mut f = ready_fixture(&["hero"]);
    f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    f.stage.process_pending_loads();

    f.stage.notify_context_lost();
    f.stage.notify_context_restored().unwrap();

    assert_eq!(f.source.borrow().fetches_of(&hero_url("png")), 2);
}

#[test]
fn recovery_fails_when_the_atlas_went_missing() {
    let mut f = ready_fixture(&["hero"]);
    let id = f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    f.stage.process_pending_loads();

    f.stage.notify_context_lost();
    f.source.borrow_mut().files.remove(&hero_url("atlas"));
    f.stage.notify_context_restored().unwrap();

    // The atlas re-fetch was attempted and its failure failed the rebuild,
    // exactly as it would have failed the original attach.
    assert_eq!(f.source.borrow().fetches_of(&hero_url("atlas")), 2);
    let events = f.events.borrow();
    assert!(events.iter().any(|e| matches!(
        e,
        StageEvent::ActorRecoveryFailed { actor, .. } if *actor == id
    )));
    assert!(!events.iter().any(|e| matches!(e, StageEvent::ActorRecovered { .. })));
}

#[test]
fn recovery_fails_when_the_atlas_went_malformed() {
    let mut f = ready_fixture(&["hero"]);
    let id = f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    f.stage.process_pending_loads();

    f.stage.notify_context_lost();
    f.source
        .borrow_mut()
        .files
        .insert(hero_url("atlas"), b"size: 64, 64\n".to_vec());
    f.stage.notify_context_restored().unwrap();

    assert!(f.events.borrow().iter().any(|e| matches!(
        e,
        StageEvent::ActorRecoveryFailed { actor, .. } if *actor == id
    )));
    // The stale runtime stays skippable until a later restore succeeds.
    assert_eq!(f.stage.debug_snapshot().recovery_entries, 1);
}

#[test]
fn failed_recovery_skips_the_actor_and_keeps_its_record() {
    let mut f = ready_fixture(&["hero", "villain"]);
    let hero = f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    let villain = f.stage.attach_actor("villain", &ActorOptions::default()).unwrap();
    f.stage.process_pending_loads();
    f.stage.start();

    f.stage.notify_context_lost();
    f.source.borrow_mut().files.remove(&asset_url("villain", "json"));
    f.stage.notify_context_restored().unwrap();

    let events = f.events.borrow();
    assert!(events.iter().any(|e| matches!(
        e,
        StageEvent::ActorRecovered { actor } if *actor == hero
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        StageEvent::ActorRecoveryFailed { actor, .. } if *actor == villain
    )));
    drop(events);

    // The record survives so a later restore can retry.
    assert_eq!(f.stage.debug_snapshot().recovery_entries, 2);

    // The unrecovered actor still carries the old generation and is skipped.
    f.stage.tick(0.016);
    let drawn: Vec<_> = f.backend.borrow().draws.iter().map(|(id, _, _)| *id).collect();
    assert_eq!(drawn, vec![hero]);
}

#[test]
fn detached_actor_record_is_dropped_during_recovery() {
    let mut f = ready_fixture(&["hero"]);
    let id = f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    f.stage.process_pending_loads();
    assert_eq!(f.stage.debug_snapshot().recovery_entries, 1);

    f.stage.notify_context_lost();
    // Loss-time detach drops the record with the actor; restore then has
    // nothing to rebuild and must not resurrect it.
    f.stage.detach_actor(id);
    f.stage.notify_context_restored().unwrap();

    assert_eq!(f.stage.debug_snapshot().recovery_entries, 0);
    assert!(!f
        .events
        .borrow()
        .iter()
        .any(|e| matches!(e, StageEvent::ActorRecovered { .. })));
}

#[test]
fn clear_actors_empties_everything() {
    let mut f = ready_fixture(&["hero", "villain"]);
    f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    f.stage.attach_actor("villain", &ActorOptions::default()).unwrap();
    f.stage.process_pending_loads();

    f.stage.clear_actors();

    let snapshot = f.stage.debug_snapshot();
    assert_eq!(snapshot.actor_count, 0);
    assert_eq!(snapshot.recovery_entries, 0);
    assert_eq!(f.backend.borrow().drops.len(), 2);
}

#[test]
fn disposed_stage_rejects_new_actors() {
    let mut f = ready_fixture(&["hero"]);
    f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    f.stage.process_pending_loads();

    f.stage.dispose();

    assert!(f.stage.attach_actor("hero", &ActorOptions::default()).is_err());
    assert!(f.stage.initialize_context().is_err());
    assert_eq!(f.stage.debug_snapshot().actor_count, 0);
}

#[test]
fn debug_snapshot_reports_counts() {
    let mut f = ready_fixture(&["hero"]);
    f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    f.stage.attach_actor("hero", &ActorOptions::default()).unwrap();
    f.stage.process_pending_loads();
    f.stage.start();

    let snapshot = f.stage.debug_snapshot();
    assert_eq!(snapshot.actor_count, 2);
    assert_eq!(snapshot.loaded_actor_count, 2);
    assert_eq!(snapshot.asset_cache_size, 1);
    assert_eq!(snapshot.pending_loads, 0);
    assert!(snapshot.running);
    assert_eq!(snapshot.generation, 0);
    assert_eq!(snapshot.recovery_entries, 2);

    assert!(serde_json::to_string(&snapshot).unwrap().contains("\"actor_count\":2"));
}
