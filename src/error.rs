use thiserror::Error;

/// Reasons a single price source can fail. None of these leave the source:
/// they are logged and turned into an absent price at the trait boundary.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("no eligible data: {0}")]
    NoEligibleData(String),

    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),
}

pub type Result<T> = std::result::Result<T, SourceError>;

/// Decodes a response body as JSON, keeping a decode failure apart from a
/// transport failure.
pub(crate) async fn read_json(res: reqwest::Response) -> Result<serde_json::Value> {
    let body = res.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| SourceError::MalformedResponse(format!("invalid JSON: {}", e)))
}
