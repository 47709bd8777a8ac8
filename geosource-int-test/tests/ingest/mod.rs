//! Ingest integration tests.
//!
//! These tests drive source registration through the store: payload
//! validation, loaders, normalization and replacement of existing sources.

mod remove_test;
