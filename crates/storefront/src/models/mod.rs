//! Domain models for the storefront.
//!
//! # Models
//!
//! - `account` - Registered accounts and the summary returned to clients
//! - `session` - The verified identity carried by a session token

pub mod account;
pub mod session;

pub use account::{Account, AccountSummary};
pub use session::Session;
