//! Style Enforcement Tests
//!
//! Validates workspace-wide conventions that clippy does not catch on its own.
//!
//! - `dead_code_enforcement` - Prevents #[allow(dead_code)] and panicking
//!   unwraps in production code
//!
//! These tests scan the trawl crates and fail if violations are found.

#[path = "style/dead_code_enforcement.rs"]
mod dead_code_enforcement;
