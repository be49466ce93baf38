//! Integration tests for the migration engine.
//!
//! These run the full coordinator → lister → transfer flow against the
//! in-memory store with scripted faults.

mod common;
mod e2e_test;
