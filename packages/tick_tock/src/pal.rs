//! Platform abstraction layer for reading the hardware tick counter.
//!
//! All access to processor registers, the wall clock and sleeping goes through the
//! [`Platform`] trait, so rate calibration can be tested against a mock platform.

mod abstractions;
mod facade;
#[cfg(test)]
mod mock;
mod real;

pub(crate) use abstractions::*;
pub(crate) use facade::*;
#[cfg(test)]
pub(crate) use mock::*;
pub(crate) use real::*;
