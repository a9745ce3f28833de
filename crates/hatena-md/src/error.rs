#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("API credentials are not configured. Run `hatena-md config --wizard` first.")]
    NotConfigured,

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error(transparent)]
    Core(#[from] hatena_md_core::Error),
}
