pub mod backend;
pub mod error;
pub mod lifecycle;
pub mod record;
pub mod storage;
pub mod store;

pub use backend::{
    AuthBackend, BackendUser, HttpAuthBackend, LoginOutcome, LoginRequest, RefreshOutcome,
};
pub use error::{BackendError, SessionError, SessionResult, StorageError};
pub use lifecycle::{ActiveSession, SessionConfig, SessionManager, SessionState};
pub use record::{Profile, SessionRecord};
pub use storage::{MemoryStorage, Storage};
pub use store::{LoadedSession, SessionStore, SESSION_KEY};
