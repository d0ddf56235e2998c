//! Core types and definitions for the STRAFE runtime.
//!
//! This crate defines the vocabulary shared across all other crates:
//! geometric types, enums, events, the entity trait, constants, config
//! and the error taxonomy. It has no dependency on any runtime machinery.

pub mod config;
pub mod constants;
pub mod entity;
pub mod enums;
pub mod error;
pub mod events;
pub mod types;
