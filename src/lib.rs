// Memgate - Library Root
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// All modules exported here for use by the binary and tests.

pub mod paths;
pub mod config;
pub mod error;
pub mod mount;
pub mod gate;
pub mod extract;
pub mod memory;
pub mod validate;
pub mod library;
pub mod session;
pub mod storage;
pub mod context;
pub mod prompt;
pub mod agent;
pub mod mcp;
