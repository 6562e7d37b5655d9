//! HTTP client for the taskdeck API.
//!
//! [`ApiClient`] keeps the cookie jar enabled for same-origin deployments and
//! also remembers the token returned in sign-in and sign-up payloads through a
//! [`TokenStore`]. Every request carries the stored token as a bearer header
//! when one exists; the server prefers the cookie when both arrive.

mod api;
mod errors;
mod store;

pub use api::{ApiClient, AuthSession};
pub use errors::ClientError;
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
