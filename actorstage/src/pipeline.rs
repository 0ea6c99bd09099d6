//! The asset loading pipeline: descriptor to drawable runtime.
//!
//! One straight-line sequence per load: look up (or fall back to) the
//! descriptor, fetch and parse the atlas and skeleton text, wait for the
//! raster images, then assemble the runtime. The first failing step aborts
//! the whole load.

use crate::assets::{AssetRegistry, RawDescriptor};
use crate::atlas::AtlasSummary;
use crate::context::Generation;
use crate::decode::DecodeWaiter;
use crate::recovery::RecoveryRecord;
use crate::resolve::UrlResolver;
use crate::runtime::SkeletonRuntime;
use crate::skeleton::SkeletonDoc;
use crate::source::{AssetSource, DecodedImage, ImageDecoder};
use crate::Error;

/// Product of one successful load, ready for the stage to install.
pub struct LoadedActor {
    pub runtime: SkeletonRuntime,
    pub images: Vec<(String, DecodedImage)>,
    pub record: RecoveryRecord,
}

/// Runs the full pipeline for `asset_id` under the given context generation.
///
/// An unregistered asset id falls back to the conventional project layout
/// and registers it, so explicit registration is optional for assets that
/// follow the convention.
#[allow(clippy::too_many_arguments)]
pub fn load_actor_assets(
    asset_id: &str,
    generation: Generation,
    assets: &mut AssetRegistry,
    resolver: &UrlResolver,
    decode: &mut DecodeWaiter,
    source: &mut dyn AssetSource,
    decoder: &mut dyn ImageDecoder,
) -> Result<LoadedActor, Error> {
    if !assets.has(asset_id) {
        log::info!("asset '{asset_id}' not registered, trying conventional paths");
        assets.register(
            asset_id,
            RawDescriptor::conventional(asset_id),
            resolver,
            decode,
            source,
            decoder,
        );
    }
    let descriptor = assets.get(asset_id).ok_or_else(|| Error::NotRegistered {
        asset: asset_id.to_string(),
    })?;

    let atlas_url = descriptor.atlas_url.clone();
    let skeleton_url = descriptor.skeleton_url.clone();
    let texture_urls = descriptor.texture_urls.clone();

    let atlas_text = source.fetch_text(&atlas_url)?;
    let skeleton_text = source.fetch_text(&skeleton_url)?;

    decode.await_ready(asset_id)?;
    let images = decode.images_for(asset_id);

    let atlas = AtlasSummary::parse(asset_id, &atlas_text)?;
    let doc = SkeletonDoc::from_json_str(asset_id, &skeleton_text)?;

    Ok(LoadedActor {
        runtime: SkeletonRuntime::new(asset_id, doc, atlas, generation),
        images,
        record: RecoveryRecord {
            asset_id: asset_id.to_string(),
            atlas_url,
            skeleton_url,
            texture_urls,
        },
    })
}
