//! # Lockpress Testkit
//!
//! Testing utilities for the Lockpress reading-key infrastructure.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: deterministic wallets and a fully wired in-memory
//!   platform for integration scenarios
//! - **Generators**: proptest strategies for property-based testing
//!
//! ## Test Fixtures
//!
//! Quickly set up a publish/read scenario:
//!
//! ```rust
//! use lockpress_testkit::fixtures::TestPlatform;
//!
//! # async fn example() {
//! let platform = TestPlatform::new("press.example");
//! let author = platform.wallet("0xauthor");
//! let publisher = platform.publisher_for(&author);
//! # }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{TestPlatform, TestWallet};
pub use generators::{address_strategy, locale_strategy};
