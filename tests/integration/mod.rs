//! Integration tests for the uprtcl version-control substrate

mod cache_coalescing;
mod commit_scenario;
mod config_integration;
mod context_listing;
mod drafts_and_created_contexts;
mod merge_flows;
mod sled_persistence;
mod test_utils;
