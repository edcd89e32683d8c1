//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs (ordered prefix scan)
//!     → rule.rs (literal prefix test)
//!     → Return: matched Rule or None (pass-through)
//!
//! Rule Compilation (at startup):
//!     RuleConfig[]
//!     → Parse targets into origins
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same rule
//! - First match wins (ordered by declaration)

pub mod router;
pub mod rule;

pub use router::Router;
pub use rule::{Origin, Rule, RuleError};
