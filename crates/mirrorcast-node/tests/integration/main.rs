//! Integration tests for mirrorcast-node.
//!
//! Run with: cargo test -p mirrorcast-node --test integration

mod api;
mod harness;
