//! Authentication: the bearer-token client, the refresh exchange, and the
//! provider login that creates a session in the first place.
//!
//! All three share one `SessionHandle`, so a token rotated anywhere is
//! picked up everywhere.

mod client;
mod login;
mod refresh;

// Only export what callers actually use
pub use client::{AuthenticatedClient, Method};
pub use login::kakao_login;
pub use refresh::TokenRefresher;
