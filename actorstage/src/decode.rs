//! Decode tickets: tracking for in-flight image load + decode per asset.

use crate::{AssetSource, DecodedImage, Error, ImageDecoder};
use std::collections::{HashMap, HashSet};

/// Tracking record for one asset's raster images.
#[derive(Debug, Default)]
struct DecodeTicket {
    images: Vec<(String, DecodedImage)>,
    /// First failure, if any: (url, message).
    failure: Option<(String, String)>,
}

/// Drives raster image decode to completion before a texture is usable.
///
/// Decoding is kicked off when an asset is queued (registration time), so by
/// the time an actor needs the asset the work is done or well underway.
#[derive(Debug, Default)]
pub struct DecodeWaiter {
    tickets: HashMap<String, DecodeTicket>,
    ready: HashSet<String>,
}

impl DecodeWaiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches and decodes every texture URL for `asset_id`. An asset with no
    /// raster images is marked ready immediately. A failing image is recorded
    /// on this asset's ticket only; other assets are unaffected.
    pub fn queue(
        &mut self,
        asset_id: &str,
        texture_urls: &[String],
        source: &mut dyn AssetSource,
        decoder: &mut dyn ImageDecoder,
    ) {
        self.ready.remove(asset_id);
        if texture_urls.is_empty() {
            self.tickets.remove(asset_id);
            self.ready.insert(asset_id.to_string());
            return;
        }

        let mut ticket = DecodeTicket::default();
        for url in texture_urls {
            let result = source
                .fetch_bytes(url)
                .and_then(|bytes| decoder.decode(url, &bytes));
            match result {
                Ok(image) => ticket.images.push((url.clone(), image)),
                Err(e) => {
                    log::warn!("image decode failed for asset '{asset_id}': {e}");
                    if ticket.failure.is_none() {
                        ticket.failure = Some((url.clone(), e.to_string()));
                    }
                }
            }
        }
        self.tickets.insert(asset_id.to_string(), ticket);
    }

    /// Resolves once every queued image for `asset_id` has decoded. Completed
    /// assets are remembered, so repeated calls return immediately without
    /// re-queuing. An asset that was never queued has no raster images and is
    /// trivially ready.
    pub fn await_ready(&mut self, asset_id: &str) -> Result<(), Error> {
        if self.ready.contains(asset_id) {
            return Ok(());
        }
        let Some(ticket) = self.tickets.get(asset_id) else {
            self.ready.insert(asset_id.to_string());
            return Ok(());
        };
        if let Some((url, message)) = &ticket.failure {
            return Err(Error::Decode {
                asset: asset_id.to_string(),
                url: url.clone(),
                message: message.clone(),
            });
        }
        self.ready.insert(asset_id.to_string());
        Ok(())
    }

    pub fn is_ready(&self, asset_id: &str) -> bool {
        self.ready.contains(asset_id)
    }

    /// Decoded pixels for upload. Images stay cached so multiple actors can
    /// share one asset without a second fetch.
    pub fn images_for(&self, asset_id: &str) -> Vec<(String, DecodedImage)> {
        self.tickets
            .get(asset_id)
            .map(|t| t.images.clone())
            .unwrap_or_default()
    }

    /// Drops any completed state so the next `queue` re-fetches and
    /// re-decodes from scratch. Used by context recovery.
    pub fn invalidate(&mut self, asset_id: &str) {
        self.tickets.remove(asset_id);
        self.ready.remove(asset_id);
    }
}
