//! Registry implementations for fetching the latest package version

pub mod json_index;

pub use json_index::JsonIndexRegistry;
