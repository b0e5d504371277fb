//! Bearer-token authentication and the request guards built on it.

mod extract;
mod token;

pub use extract::{AuthUser, MaybeAuthUser, ValidJson};
pub use token::{generate_token, hash_password, verify_password, verify_token};
