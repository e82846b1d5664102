//! Version checking layer
//!
//! This module provides the core functionality for fetching, caching, and comparing
//! the latest published version of a package against an installed one.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Registry   │────▶│   Checker   │◀────│    Cache    │
//! │  (fetch)    │     │  (decide)   │     │ (file/TTL)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │
//!        ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐
//! │    Retry    │     │ Comparator  │
//! │ (3x, fixed) │     │(version cmp)│
//! └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: Per-package cache file with a 24h validity window
//! - [`checker`]: The outdated decision procedure
//! - [`comparator`]: Version ordering for PEP 440 and SemVer indexes
//! - [`registry`]: Registry trait for fetching the latest version
//! - [`registries`]: Concrete registry implementations
//! - [`retry`]: Fixed-count retry helper
//! - [`error`]: Error types for cache, fetch and check operations
//! - [`semver`]: Shared semver utilities

pub mod cache;
pub mod checker;
pub mod comparator;
pub mod error;
pub mod registries;
pub mod registry;
pub mod retry;
pub mod semver;
