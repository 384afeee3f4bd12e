//! Core business logic - framework-agnostic membership rules and record operations.
//!
//! Nothing in here knows about Discord. The bot layer calls these functions and
//! formats their results.

/// Invoicing wizard and invoice state setters
pub mod invoice;
/// Pure membership rules over subscription histories
pub mod membership;
/// Membership lines and their invoicing state machine
pub mod membership_line;
/// Membership type lookups
pub mod membership_type;
/// Partner lookups, creation and the partner-side membership rules
pub mod partner;
/// Membership fee products
pub mod product;
/// Member reports and their text formatting
pub mod report;
/// Reference data seeding from config.toml
pub mod seed;
/// Subscription stages
pub mod stage;
/// Subscriptions and membership propagation
pub mod subscription;

pub use seed::seed_reference_data;
