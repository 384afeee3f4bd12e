//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// General utility commands
pub mod general;

/// Partner and member status commands
pub mod member;

/// Membership line and invoicing commands
pub mod membership;

/// Subscription commands
pub mod subscription;

// Export commands
pub use general::*;
pub use member::*;
pub use membership::*;
pub use subscription::*;
