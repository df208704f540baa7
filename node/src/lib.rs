// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod artifacts;
pub mod channel;
pub mod config;
pub mod errors;
pub mod orchestrator;
pub mod prover;
pub mod scanner;
pub mod server;
pub mod telemetry;
