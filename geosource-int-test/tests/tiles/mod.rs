//! Tile serving integration tests.
//!
//! Tiles are decoded back from their protobuf bytes and checked against the
//! features they were built from.

mod cluster_tile_test;
mod vector_tile_test;
