use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token does not have three segments")]
    InvalidShape,
    #[error("token segment is not valid base64: {0}")]
    InvalidEncoding(String),
    #[error("malformed claim payload: {0}")]
    InvalidJson(String),
    #[error("invalid claim '{0}' with value '{1}'")]
    InvalidClaim(&'static str, String),
    #[error("token checksum does not match its payload")]
    ChecksumMismatch,
    #[error("unrecognized token lifetime '{0}'")]
    InvalidLifetime(String),
    #[error("unrecognized role '{0}'")]
    UnknownRole(String),
}
