use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("not authenticated")]
    Unauthenticated,
    #[error("missing required role")]
    Forbidden,
}
