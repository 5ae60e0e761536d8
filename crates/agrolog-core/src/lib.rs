//! Hardware-independent core library for agrolog
//!
//! This crate contains all platform-agnostic logic for the agrolog
//! field-monitoring agent: the channel/reading data model, burst sampling
//! and averaging, the clock service, the append-only CSV log store, and the
//! button-triggered diagnostic pass.
//!
//! It is `#![no_std]` so it compiles on both embedded targets (ESP32-S3)
//! and desktop hosts (for the simulator and tests). Hardware is reached
//! only through the narrow driver traits in [`sensors`], [`clock`], and
//! [`storage`].

#![no_std]

#[cfg(test)]
extern crate std;

pub mod agent;
pub mod clock;
pub mod config;
pub mod diagnostics;
pub mod reading;
pub mod sampling;
pub mod sensors;
pub mod storage;

#[cfg(test)]
pub(crate) mod testutil;
