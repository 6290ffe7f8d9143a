use thiserror::Error;

#[derive(Error, Debug)]
pub enum DialogueError {
    #[error("invalid flow configuration: {0}")]
    InvalidFlow(String),
}
