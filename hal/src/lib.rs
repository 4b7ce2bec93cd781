//! # Ember HAL - Hardware Abstraction Layer
//!
//! This crate defines the traits and error types through which Ember
//! subsystems talk to hardware. Storage subsystems consume the
//! [`flash::FlashDevice`] trait; board crates provide implementations.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod flash;

/// Result type for HAL operations
pub type HalResult<T> = Result<T, HalError>;

/// Errors that can occur in HAL operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// Hardware reported an error
    HardwareError,
    /// Access past the end of the device
    OutOfBounds,
    /// Invalid parameter provided
    InvalidParameter,
}
