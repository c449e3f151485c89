//! # Kalem Auth
//!
//! Session gate for the single-author writer panel.
//!
//! This is an access gate for UI routing, not a security boundary: the
//! hosted backend enforces its own policies on every row operation. The
//! session is a small JSON file; a corrupt or missing file simply reads as
//! logged out.

mod error;
mod session;

pub use error::{AuthError, Result};
pub use session::{Credentials, SessionAuth};
