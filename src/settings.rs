//! Application settings
//!
//! Everything the transmitter needs to know up front, built once and passed
//! around by reference.

use dw1000_radio::{LedConfig, PollBudget, RadioConfig, TxRfConfig};

/// Pause after every transmitted frame
pub const INTER_FRAME_DELAY_MS: u32 = 10;

/// SYS_STATUS polls to wait for the PLL to lock after reset
pub const IDLE_POLL_ATTEMPTS: u32 = 10_000;

/// SYS_STATUS polls to wait for a frame to go out
///
/// A 12-byte frame with a 128 symbol preamble at 6.8 Mbps is on air for
/// roughly 160 µs, far below this at any SPI clock.
pub const TX_POLL_ATTEMPTS: u32 = 10_000;

/// Application settings
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Settings {
    /// Physical layer configuration applied during bring-up
    pub radio: RadioConfig,

    /// Transmitter calibration applied after `radio`
    pub tx_rf: TxRfConfig,

    /// DW1000 activity LEDs
    pub leds: LedConfig,

    /// Pause after every transmitted frame, in milliseconds
    pub inter_frame_delay_ms: u32,

    /// How long bring-up waits for the chip to become idle
    pub idle_budget: PollBudget,

    /// How long to wait for each frame to be sent
    pub tx_budget: PollBudget,
}

impl Default for Settings {
    fn default() -> Self {
        let radio = RadioConfig::default();

        Settings {
            radio,
            tx_rf: TxRfConfig::recommended(&radio),
            leds: LedConfig::default(),
            inter_frame_delay_ms: INTER_FRAME_DELAY_MS,
            idle_budget: PollBudget::Attempts(IDLE_POLL_ATTEMPTS),
            tx_budget: PollBudget::Attempts(TX_POLL_ATTEMPTS),
        }
    }
}
