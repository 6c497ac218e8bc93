//! Synthetic electricity-consumption datasets for building stocks.
//!
//! The pipeline splits a requested number of buildings across locations by
//! population ([`alloc::allocate`]), decides each location's building class
//! mix ([`alloc::BuildingTypeDistributor`]), creates building records
//! ([`alloc::BuildingRecordFactory`]) and synthesizes a consumption series
//! per building ([`synth::ConsumptionSynthesizer`]). [`engine::Generator`]
//! runs the whole pipeline for one [`engine::GenerationRequest`].

pub mod alloc;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod report;
pub mod rng;
pub mod synth;
pub mod telemetry;

pub use error::{GenerationError, Result};
