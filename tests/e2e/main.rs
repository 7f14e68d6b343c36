//! End-to-end tests for aidb.

mod harness;
