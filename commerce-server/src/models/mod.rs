//! Domain models with validation at the boundary
//!
//! Request payloads implement [`Validate`]; invalid input produces a
//! field-level [`Problems`] map, never a panic.

pub mod validation;
pub mod user;

pub use validation::{Problems, Validate};
pub use user::{Email, Identity, LoginInput, NewUser, RegisterInput, User, UserId, UserProfile};
