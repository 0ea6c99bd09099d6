use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to initialize render context: {message}")]
    Init { message: String },

    #[error("failed to fetch '{url}': {message}")]
    Fetch { url: String, message: String },

    #[error("failed to decode image '{url}' for asset '{asset}': {message}")]
    Decode {
        asset: String,
        url: String,
        message: String,
    },

    #[error("failed to parse atlas for asset '{asset}': {message}")]
    AtlasParse { asset: String, message: String },

    #[error("failed to parse skeleton data for asset '{asset}': {message}")]
    SkeletonParse { asset: String, message: String },

    #[error("asset not registered: {asset}")]
    NotRegistered { asset: String },

    #[error("render context is lost")]
    ContextLost,

    #[error("render context is disposed")]
    Disposed,

    #[error("draw failed: {message}")]
    Draw { message: String },
}
