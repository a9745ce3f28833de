#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("incomplete entry: {0}")]
    IncompleteEntry(String),

    #[error("front matter error: {0}")]
    FrontMatter(String),
}
