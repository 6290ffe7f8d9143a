use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextError {
    #[error("invalid regex pattern: {0}")]
    Pattern(String),
}

pub type Result<T> = std::result::Result<T, TextError>;
