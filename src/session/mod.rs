//! Session and auth state: token storage, the observable session state and
//! the login/logout/restore transitions.

mod auth;
mod state;
mod store;

pub use auth::Session;
pub use state::{SessionHandle, SessionState};
pub use store::{MemoryTokenStore, SqliteTokenStore, TokenStore, TOKEN_KEY};
