//! Wire types shared between the clinic server and its clients.

pub mod models;
pub mod requests;

pub use models::*;
pub use requests::*;
