//! Test utilities for evidence handling.
//!
//! This module provides:
//! - Shared RSA key pairs, generated once per test binary
//! - A scripted in-memory storage network whose endpoints count attempts
//! - A provenance registry that records what it is given
//!
//! ## Usage
//!
//! ```rust,ignore
//! use evidence_lib::test_utils::{MockBehavior, MockStorageNetwork};
//!
//! let network = MockStorageNetwork::new();
//! let down = network.endpoint("down", MockBehavior::Fail(503));
//! let up = network.endpoint("up", MockBehavior::Accept);
//! // build a FailoverTransfer over [down, up] ...
//! assert_eq!(down.attempts(), 1);
//! ```

mod fixtures;
mod mock_endpoint;
mod mock_registry;

pub use fixtures::{other_key_pair, sample_evidence, shared_key_pair};
pub use mock_endpoint::{MockBehavior, MockEndpoint, MockStorageNetwork};
pub use mock_registry::RecordingRegistry;
