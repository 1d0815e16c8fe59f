//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Account signup and login
//! - `cart` - Cart merge operations over the cart store
//! - `password` - Argon2id password hashing
//! - `token` - Session token issuance and verification

pub mod auth;
pub mod cart;
pub mod password;
pub mod token;

pub use auth::{AuthError, AuthService, SignedIn};
pub use cart::{CartService, CartServiceError};
pub use password::{PasswordError, PasswordHasher};
pub use token::{Clock, ManualClock, SESSION_TTL_SECS, SystemClock, TokenError, TokenService};
