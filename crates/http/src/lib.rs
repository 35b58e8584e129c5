//! hrdesk HTTP layer
//!
//! A typed client for the HR console backend and the session machinery built
//! on it: token persistence and refresh scheduling, bearer attachment with
//! rejection recovery, and the signed-in user.

pub mod client;
pub mod config;
pub mod session;

pub use client::error::ClientError;
pub use client::interceptor::{Interceptor, LogNotifier, Notifier};
pub use client::users::UserQuery;
pub use client::{HrClient, HrClientBuilder};
pub use config::SessionConfig;
pub use session::{AuthService, Navigator, Router, Session, TokenService};
