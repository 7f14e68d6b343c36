//! E2E test harness for aidb.
//!
//! Some helpers are only used by a subset of scenarios.

#![allow(dead_code)]

pub mod assertions;
pub mod clock;
pub mod doubles;
pub mod workspace;

pub use assertions::{assert_link_into, assert_regular_file};
pub use clock::MockClock;
pub use doubles::{FailingFs, FixedDiscovery, RecordingVcs, VcsCall};
pub use workspace::TestWorkspace;
