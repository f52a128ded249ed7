use crate::{ll, ConfigError};
use core::fmt;
use embedded_hal::{blocking::spi, digital::v2::OutputPin};

/// A hardware event the driver waits for
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Event {
    /// The PLL locked after reset and the chip reached its idle state
    IdleReady,

    /// The transmitter reported that the frame went out (TXFRS)
    FrameSent,
}

/// An error that can occur during bring-up or transmission
pub enum Error<SPI, CS>
where
    SPI: spi::Transfer<u8> + spi::Write<u8>,
    CS: OutputPin,
{
    /// Error occured while using SPI bus
    Spi(ll::Error<SPI, CS>),

    /// The reset line could not be driven
    ResetLine,

    /// The chip didn't signal the event within the poll budget
    NotResponding(Event),

    /// DEV_ID didn't identify a DW1000
    InitFailed {
        /// The value that was read instead
        dev_id: u32,
    },

    /// The configuration was not valid. Some combinations of settings are not allowed.
    InvalidConfiguration(ConfigError),

    /// The chip didn't accept the configuration that was written to it
    ConfigRejected,

    /// The frame doesn't fit the transmit buffer
    FrameTooLong {
        /// Length of the rejected frame, without FCS
        len: usize,
    },
}

impl<SPI, CS> Error<SPI, CS>
where
    SPI: spi::Transfer<u8> + spi::Write<u8>,
    CS: OutputPin,
{
    /// Whether this error stops the radio from ever reaching `Ready`
    pub fn is_bring_up_failure(&self) -> bool {
        matches!(
            self,
            Error::ResetLine
                | Error::NotResponding(Event::IdleReady)
                | Error::InitFailed { .. }
                | Error::InvalidConfiguration(_)
                | Error::ConfigRejected
        )
    }
}

impl<SPI, CS> From<ll::Error<SPI, CS>> for Error<SPI, CS>
where
    SPI: spi::Transfer<u8> + spi::Write<u8>,
    CS: OutputPin,
{
    fn from(error: ll::Error<SPI, CS>) -> Self {
        Error::Spi(error)
    }
}

impl<SPI, CS> From<ConfigError> for Error<SPI, CS>
where
    SPI: spi::Transfer<u8> + spi::Write<u8>,
    CS: OutputPin,
{
    fn from(error: ConfigError) -> Self {
        Error::InvalidConfiguration(error)
    }
}

// We can't derive this implementation, as `Debug` is only implemented
// conditionally for `ll::Error`.
impl<SPI, CS> fmt::Debug for Error<SPI, CS>
where
    SPI: spi::Transfer<u8> + spi::Write<u8>,
    <SPI as spi::Transfer<u8>>::Error: fmt::Debug,
    <SPI as spi::Write<u8>>::Error: fmt::Debug,
    CS: OutputPin,
    <CS as OutputPin>::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Spi(error) => write!(f, "Spi({:?})", error),
            Error::ResetLine => write!(f, "ResetLine"),
            Error::NotResponding(event) => write!(f, "NotResponding({:?})", event),
            Error::InitFailed { dev_id } => write!(f, "InitFailed {{ dev_id: {:#010x} }}", dev_id),
            Error::InvalidConfiguration(error) => write!(f, "InvalidConfiguration({:?})", error),
            Error::ConfigRejected => write!(f, "ConfigRejected"),
            Error::FrameTooLong { len } => write!(f, "FrameTooLong {{ len: {} }}", len),
        }
    }
}
