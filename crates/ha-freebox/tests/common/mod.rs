//! Common test utilities for the Freebox integration
//!
//! Provides a scriptable Home API client and node fixtures.

#![allow(dead_code)]

mod fixtures;
mod mock_home_api;

pub use fixtures::*;
pub use mock_home_api::*;
