#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
pub enum Error {
    #[error("Generic {0}")]
    Generic(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Network error: {0}")]
    Network(String),
}
