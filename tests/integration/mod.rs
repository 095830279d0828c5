//! Integration tests for the deck asset registry

mod backup_retention;
mod cli_workflow;
mod store_roundtrip;
mod support;
