//! Interactive UWB blink transmitter
//!
//! Brings a DW1000 up, then keeps turning whatever arrives on a non-blocking
//! input channel into 12-byte blink frames and sending them, one every
//! 10 ms at most. The radio side lives in the [`dw1000_radio`] crate; this
//! crate owns the frame, the loop around it and, with the `rt` feature, the
//! DWM1001 board glue.
//!
//! The entry point is [`app::run`].

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

pub use dw1000_radio as radio;
pub use embedded_hal;

pub mod app;
pub mod diag;
pub mod frame;
pub mod input;
pub mod settings;
pub mod transmitter;

#[cfg(feature = "rt")]
pub mod board;

pub use crate::{
    frame::Frame,
    input::{InputChannel, SerialInput},
    settings::Settings,
    transmitter::{BlinkTransmitter, Cycle},
};
