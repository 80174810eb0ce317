//! Integration tests for the hierarchy cache

mod cli_parse;
mod concurrent_saves;
mod deep_chains;
mod move_detection;
mod rebuild_verify;
mod support;
