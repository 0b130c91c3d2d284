use thiserror::Error;

#[derive(Error, Debug)]
pub enum WardenError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    #[error("{0}")]
    Other(String),
}
