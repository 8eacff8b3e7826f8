// ABOUTME: Library module for movies-migration-checker
// ABOUTME: Exports all core functionality for use in binary and tests

pub mod checker;
pub mod commands;
pub mod config;
pub mod error;
pub mod interactive;
pub mod mapping;
pub mod source;
pub mod value;
