//! Transmit-side driver for the DW1000 UWB transceiver
//!
//! The [high-level interface] walks the radio through bring-up, configuration
//! and RF tuning as a sequence of typestates, then hands out a [`Sending`]
//! guard for every frame. The [register-level interface] underneath talks to
//! the chip through `embedded-hal`'s blocking SPI traits.
//!
//! [high-level interface]: hl/index.html
//! [register-level interface]: ll/index.html

#![cfg_attr(not(any(test, feature = "mock")), no_std)]
#![deny(missing_docs)]

pub mod configs;
pub mod hl;
pub mod ll;
pub mod util;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use crate::{
    configs::{ConfigError, LedConfig, RadioConfig, TxRfConfig},
    hl::{Configured, Error, Event, Idle, Ready, Sending, Uninitialized, DW1000},
    util::{Poll, PollBudget},
};

/// Number of frame check sequence bytes the DW1000 appends to every frame
pub const FCS_LEN: usize = 2;

/// Longest payload that fits the transmit buffer together with the FCS
pub const MAX_DATA_LEN: usize = ll::TX_BUFFER_LEN - FCS_LEN;
