//! TaskMate API client
//!
//! An authenticated client for the TaskMate task API. Requests carry the
//! stored bearer credential; an expired credential is renewed once per
//! failing call, and an unrecoverable session is wiped and handed to a
//! [`Navigator`] for the transition back to the login surface.

pub mod board;
pub mod client;
pub mod session;
pub mod token;
pub mod types;

pub use board::{Board, Filter, SortKey};
pub use client::error::ClientError;
pub use client::{
    ApiClient, ApiClientBuilder, DEFAULT_LOGIN_PATH, DEFAULT_TIMEOUT, Navigator, NoopNavigator,
    RenewalMode, RequestOptions,
};
pub use session::{Credentials, FileSessionStore, MemorySessionStore, SessionStore};
