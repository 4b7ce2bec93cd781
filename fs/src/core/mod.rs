//! Core types shared by every EmberFS subsystem.

pub mod config;
pub mod error;
pub mod types;
