// ABOUTME: Library module for postgres-snapshot-restore
// ABOUTME: Exports all core functionality for use in binary and tests

pub mod commands;
pub mod config;
pub mod document;
pub mod policy;
pub mod postgres;
pub mod restore;
pub mod snapshot;
pub mod utils;
