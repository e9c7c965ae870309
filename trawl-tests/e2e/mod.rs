//! End-to-end tests for Trawl
//!
//! These tests drive complete searches through the registry and aggregator
//! with scripted origins standing in for the network.

mod search_workflow;
