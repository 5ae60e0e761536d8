//! Hardware drivers for the agrolog field-monitoring device.
//!
//! Everything here implements a driver trait from `agrolog-core`; the
//! portable logic never sees an esp-hal type.

#![no_std]

pub mod adc;
pub mod dht11;
pub mod ds1307;
pub mod sd;
