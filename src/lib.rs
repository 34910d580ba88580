//! BBPS Bill Payment Aggregation API Library
//!
//! This library provides the core functionality for the BBPS bill payment
//! aggregation orchestrator: the biller capability model, input validation,
//! response normalization, the orchestration decision table, and the hand-off
//! payload passed to the payment screen.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core business logic.
//! - `integrations`: External service integrations.
//! - `capability`: Read-only biller capability view.
//! - `clients`: BBPS aggregator upstream client.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `handoff`: Hand-off payload builder and session store.
//! - `models`: Core data models.
//! - `normalizer`: Multi-shape response normalization.
//! - `orchestrator`: The orchestration state machine.
//! - `validation`: Input validation engine.

pub mod api;
pub mod core;
pub mod integrations;

// Re-export primary modules for shared use in tests and other binaries
pub mod capability;
pub mod clients;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod handoff;
pub mod models;
pub mod normalizer;
pub mod orchestrator;
pub mod validation;
