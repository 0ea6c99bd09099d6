//! Asset descriptors and the keyed registry that dedups fetches.

use crate::{AssetSource, DecodeWaiter, ImageDecoder, UrlResolver};
use std::collections::HashMap;

/// Unresolved file locations for one logical character, as supplied by the
/// caller (project-relative or absolute).
#[derive(Clone, Debug, PartialEq)]
pub struct RawDescriptor {
    pub atlas: String,
    pub skeleton: String,
    pub textures: Vec<String>,
}

impl RawDescriptor {
    /// Conventional project layout keyed by asset id, used when no descriptor
    /// was registered explicitly.
    pub fn conventional(asset_id: &str) -> Self {
        let base = format!("assets/characters/{asset_id}/{asset_id}");
        Self {
            atlas: format!("{base}.atlas"),
            skeleton: format!("{base}.json"),
            textures: vec![format!("{base}.png")],
        }
    }
}

/// Resolved file locations for one logical character. Immutable after
/// creation; every URL is absolute.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetDescriptor {
    pub id: String,
    pub atlas_url: String,
    pub skeleton_url: String,
    pub texture_urls: Vec<String>,
    pub resolved: bool,
}

/// Keyed store of resolved asset descriptors.
///
/// At most one descriptor exists per asset id, which is what prevents two
/// actors sharing a character from fetching it twice. Registration resolves
/// URLs and queues texture decoding immediately.
#[derive(Default)]
pub struct AssetRegistry {
    descriptors: HashMap<String, AssetDescriptor>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or overwrites) the descriptor for `asset_id`. Callers are
    /// expected to check `has` first; re-registering restarts decode.
    pub fn register(
        &mut self,
        asset_id: &str,
        raw: RawDescriptor,
        resolver: &UrlResolver,
        decode: &mut DecodeWaiter,
        source: &mut dyn AssetSource,
        decoder: &mut dyn ImageDecoder,
    ) {
        let descriptor = AssetDescriptor {
            id: asset_id.to_string(),
            atlas_url: resolver.resolve(&raw.atlas),
            skeleton_url: resolver.resolve(&raw.skeleton),
            texture_urls: raw.textures.iter().map(|t| resolver.resolve(t)).collect(),
            resolved: true,
        };
        decode.queue(asset_id, &descriptor.texture_urls, source, decoder);
        self.descriptors.insert(asset_id.to_string(), descriptor);
    }

    pub fn get(&self, asset_id: &str) -> Option<&AssetDescriptor> {
        self.descriptors.get(asset_id)
    }

    pub fn has(&self, asset_id: &str) -> bool {
        self.descriptors.contains_key(asset_id)
    }

    pub fn all(&self) -> impl Iterator<Item = (&str, &AssetDescriptor)> {
        self.descriptors.iter().map(|(id, d)| (id.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
