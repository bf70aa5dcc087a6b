//! Business operations
//!
//! A service encodes one operation as a unit of work: it validates input,
//! rebinds its stores to the transaction the manager lends it and maps
//! the outcome to a domain result.

mod auth;

pub use auth::{AuthService, Authenticator, PasswordPolicy};
