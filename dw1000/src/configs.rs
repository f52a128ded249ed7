//! Configuration structs for bring-up and transmission
//!
//! [`RadioConfig`] holds the physical layer parameters that are applied once
//! during bring-up, [`TxRfConfig`] the transmitter calibration that follows it.
//! Both are plain `Copy` values: build them once, validate them, and hand them
//! to the driver by reference.

use core::fmt;

/// Physical layer configuration
///
/// Applied by [`DW1000::configure`]. The defaults match a channel 5, 6.8 Mbps
/// blink transmitter with a 128 symbol preamble.
///
/// [`DW1000::configure`]: ../hl/struct.DW1000.html#method.configure
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RadioConfig {
    /// The channel that the DW1000 will transmit at.
    pub channel: UwbChannel,
    /// Sets the PRF value of the transmission
    pub pulse_repetition_frequency: PulseRepetitionFrequency,
    /// The length of the preamble
    pub preamble_length: PreambleLength,
    /// The preamble code. Must be one of the codes the channel allows at the
    /// selected PRF.
    pub preamble_code: u8,
    /// Preamble acquisition chunk size in symbols (8, 16, 32 or 64)
    pub pac_size: u8,
    /// Sets the bitrate of the transmission
    pub bitrate: BitRate,
    /// PHY header mode
    pub phr_mode: PhrMode,
    /// The SFD sequence that is used to transmit a frame.
    pub sfd_sequence: SfdSequence,
    /// SFD detection timeout in preamble symbols. Must not be zero.
    pub sfd_timeout: u16,
}

impl Default for RadioConfig {
    fn default() -> Self {
        RadioConfig {
            channel: UwbChannel::Channel5,
            pulse_repetition_frequency: PulseRepetitionFrequency::Mhz64,
            preamble_length: PreambleLength::Bits128,
            preamble_code: 9,
            pac_size: 8,
            bitrate: BitRate::Kbps6800,
            phr_mode: PhrMode::Standard,
            sfd_sequence: SfdSequence::Decawave,
            // preamble length + 1 + SFD length - PAC size
            sfd_timeout: 128 + 1 + 8 - 8,
        }
    }
}

impl RadioConfig {
    /// Checks that the combination of settings is one the DW1000 supports
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self
            .channel
            .preamble_codes(self.pulse_repetition_frequency)
            .contains(&self.preamble_code)
        {
            return Err(ConfigError::PreambleCode {
                channel: self.channel,
                code: self.preamble_code,
            });
        }

        if !self.preamble_length.supports(self.bitrate) {
            return Err(ConfigError::PreambleLength {
                length: self.preamble_length,
                bitrate: self.bitrate,
            });
        }

        self.pulse_repetition_frequency
            .get_recommended_drx_tune2(self.pac_size)?;

        if self.sfd_timeout == 0 {
            return Err(ConfigError::SfdTimeout);
        }

        Ok(())
    }

    /// The SFD length in symbols that goes into the SFD_LENGTH register
    pub fn sfd_length(&self) -> Option<u8> {
        match self.sfd_sequence {
            // IEEE has predefined sfd lengths and the register has no effect.
            SfdSequence::IEEE => None,
            SfdSequence::Decawave => Some(match self.bitrate {
                BitRate::Kbps110 => 64,
                BitRate::Kbps850 => 16,
                BitRate::Kbps6800 => 8,
            }),
        }
    }
}

/// Transmitter RF calibration
///
/// Applied by [`DW1000::configure_tx_rf`] after the radio configuration. The
/// values reflect the bandwidth and power of the spectrum at the current
/// temperature and can be calibrated per board.
///
/// [`DW1000::configure_tx_rf`]: ../hl/struct.DW1000.html#method.configure_tx_rf
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TxRfConfig {
    /// Raw TX_POWER register value
    pub power: u32,
    /// Whether smart TX power control is used. Only meaningful at 6.8 Mbps
    /// with short frames.
    pub smart_power: bool,
    /// Pulse generator delay (TC_PGDELAY)
    pub pg_delay: u8,
}

impl TxRfConfig {
    /// Returns the user manual's recommended calibration for a configuration
    pub fn recommended(config: &RadioConfig) -> Self {
        TxRfConfig {
            power: config
                .channel
                .get_recommended_tx_power(config.pulse_repetition_frequency),
            smart_power: config.bitrate == BitRate::Kbps6800,
            pg_delay: config.channel.get_recommended_tc_pgdelay(),
        }
    }
}

impl Default for TxRfConfig {
    fn default() -> Self {
        TxRfConfig::recommended(&RadioConfig::default())
    }
}

/// Drives the DW1000's GPIO2/GPIO3 pins as RX/TX activity LEDs
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LedConfig {
    /// Route the RX and TX indications to GPIO2 and GPIO3
    pub enable: bool,
    /// Flash all LEDs once right away
    pub init_blink: bool,
    /// Blink duration, in units of 14 ms
    pub blink_time: u8,
}

impl Default for LedConfig {
    fn default() -> Self {
        LedConfig {
            enable: true,
            init_blink: true,
            blink_time: 0x10,
        }
    }
}

impl LedConfig {
    /// LEDs off, GPIOs left in their default mode
    pub fn disabled() -> Self {
        LedConfig {
            enable: false,
            init_blink: false,
            blink_time: 0,
        }
    }
}

/// An invalid combination of configuration values
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// The preamble code isn't allowed on this channel at this PRF
    PreambleCode {
        /// The configured channel
        channel: UwbChannel,
        /// The rejected code
        code: u8,
    },
    /// The preamble length can't be used at this bitrate
    PreambleLength {
        /// The rejected length
        length: PreambleLength,
        /// The configured bitrate
        bitrate: BitRate,
    },
    /// The PAC size is not 8, 16, 32 or 64
    PacSize(u8),
    /// The SFD timeout is zero
    SfdTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::PreambleCode { channel, code } => write!(
                f,
                "preamble code {} not allowed on channel {}",
                code, *channel as u8
            ),
            ConfigError::PreambleLength { length, bitrate } => write!(
                f,
                "preamble length {:?} not supported at {:?}",
                length, bitrate
            ),
            ConfigError::PacSize(size) => write!(f, "invalid PAC size {}", size),
            ConfigError::SfdTimeout => write!(f, "SFD timeout must not be zero"),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
/// The bitrate at which a message is transmitted
pub enum BitRate {
    /// 110 kilobits per second.
    /// This is an unofficial extension from decawave.
    Kbps110 = 0b00,
    /// 850 kilobits per second.
    Kbps850 = 0b01,
    /// 6.8 megabits per second.
    Kbps6800 = 0b10,
}

impl Default for BitRate {
    fn default() -> Self {
        BitRate::Kbps6800
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
/// The PRF value
pub enum PulseRepetitionFrequency {
    /// 16 megahertz
    Mhz16 = 0b01,
    /// 64 megahertz
    Mhz64 = 0b10,
}

impl Default for PulseRepetitionFrequency {
    fn default() -> Self {
        PulseRepetitionFrequency::Mhz64
    }
}

impl PulseRepetitionFrequency {
    /// Gets the recommended value for the drx_tune2 register based on the PRF and PAC size
    pub fn get_recommended_drx_tune2(&self, pac_size: u8) -> Result<u32, ConfigError> {
        // Values taken from Table 33 of the DW1000 User Manual.
        match (self, pac_size) {
            (PulseRepetitionFrequency::Mhz16, 8) => Ok(0x311A002D),
            (PulseRepetitionFrequency::Mhz64, 8) => Ok(0x313B006B),
            (PulseRepetitionFrequency::Mhz16, 16) => Ok(0x331A0052),
            (PulseRepetitionFrequency::Mhz64, 16) => Ok(0x333B00BE),
            (PulseRepetitionFrequency::Mhz16, 32) => Ok(0x351A009A),
            (PulseRepetitionFrequency::Mhz64, 32) => Ok(0x353B015E),
            (PulseRepetitionFrequency::Mhz16, 64) => Ok(0x371A011D),
            (PulseRepetitionFrequency::Mhz64, 64) => Ok(0x373B0296),
            (_, size) => Err(ConfigError::PacSize(size)),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
/// An enum that specifies the length of the preamble.
///
/// Longer preambles improve the reception quality and thus range.
/// This comes at the cost of longer transmission times and thus power consumption and bandwidth use.
///
/// For the bit pattern, see table 16 in the user manual. Two bits TXPSR,then two bits PE.
pub enum PreambleLength {
    /// 64 bits of preamble.
    /// Only supported at Bitrate::Kbps6800.
    Bits64 = 0b0100,
    /// 128 bits of preamble.
    /// Only supported at Bitrate::Kbps850 & Bitrate::Kbps6800.
    /// Unofficial extension from decawave.
    Bits128 = 0b0101,
    /// 256 bits of preamble.
    /// Only supported at Bitrate::Kbps850 & Bitrate::Kbps6800.
    /// Unofficial extension from decawave.
    Bits256 = 0b0110,
    /// 512 bits of preamble.
    /// Only supported at Bitrate::Kbps850 & Bitrate::Kbps6800.
    /// Unofficial extension from decawave.
    Bits512 = 0b0111,
    /// 1024 bits of preamble.
    /// Only supported at Bitrate::Kbps850 & Bitrate::Kbps6800.
    Bits1024 = 0b1000,
    /// 1536 bits of preamble.
    /// Only supported at Bitrate::Kbps110.
    /// Unofficial extension from decawave.
    Bits1536 = 0b1001,
    /// 2048 bits of preamble.
    /// Only supported at Bitrate::Kbps110.
    /// Unofficial extension from decawave.
    Bits2048 = 0b1010,
    /// 4096 bits of preamble.
    /// Only supported at Bitrate::Kbps110.
    Bits4096 = 0b1100,
}

impl Default for PreambleLength {
    fn default() -> Self {
        PreambleLength::Bits128
    }
}

impl PreambleLength {
    /// Whether this preamble length can be used at the given bitrate
    pub fn supports(&self, bitrate: BitRate) -> bool {
        match (self, bitrate) {
            (PreambleLength::Bits64, BitRate::Kbps6800) => true,
            (PreambleLength::Bits64, _) => false,
            (
                PreambleLength::Bits128
                | PreambleLength::Bits256
                | PreambleLength::Bits512
                | PreambleLength::Bits1024,
                BitRate::Kbps850 | BitRate::Kbps6800,
            ) => true,
            (
                PreambleLength::Bits1536 | PreambleLength::Bits2048 | PreambleLength::Bits4096,
                BitRate::Kbps110,
            ) => true,
            _ => false,
        }
    }

    /// The TXPSR bits of the TX_FCTRL register
    pub fn txpsr(&self) -> u8 {
        ((*self as u8) & 0b1100) >> 2
    }

    /// The PE bits of the TX_FCTRL register
    pub fn pe(&self) -> u8 {
        (*self as u8) & 0b0011
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
/// An enum that allows the selection between different SFD sequences
pub enum SfdSequence {
    /// The standard sequence defined by the IEEE standard.
    IEEE,
    /// A sequence defined by Decawave that is supposed to be more robust.
    /// This is an unofficial addition.
    Decawave,
}

impl Default for SfdSequence {
    fn default() -> Self {
        SfdSequence::IEEE
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
/// PHY header mode (SYS_CFG.PHR_MODE)
pub enum PhrMode {
    /// Standard IEEE 802.15.4 PHY header, frames of up to 127 bytes
    Standard = 0b00,
    /// Decawave proprietary long frames of up to 1023 bytes
    Extended = 0b11,
}

impl Default for PhrMode {
    fn default() -> Self {
        PhrMode::Standard
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
/// All the available UWB channels.
///
/// Note that while a channel may have more bandwidth than ~900 Mhz, the DW1000 can only send up to ~900 Mhz
pub enum UwbChannel {
    /// Channel 1
    /// - Center frequency: 3494.4 Mhz
    /// - Bandwidth: 499.2 Mhz
    Channel1 = 1,
    /// Channel 2
    /// - Center frequency: 3993.6 Mhz
    /// - Bandwidth: 499.2 Mhz
    Channel2 = 2,
    /// Channel 3
    /// - Center frequency: 4492.8 Mhz
    /// - Bandwidth: 499.2 Mhz
    Channel3 = 3,
    /// Channel 4
    /// - Center frequency: 3993.6 Mhz
    /// - Bandwidth: 1331.2 Mhz
    Channel4 = 4,
    /// Channel 5
    /// - Center frequency: 6489.6 Mhz
    /// - Bandwidth: 499.2 Mhz
    Channel5 = 5,
    /// Channel 7
    /// - Center frequency: 6489.6 Mhz
    /// - Bandwidth: 1081.6 Mhz
    Channel7 = 7,
}

impl Default for UwbChannel {
    fn default() -> Self {
        UwbChannel::Channel5
    }
}

impl UwbChannel {
    /// The preamble codes this channel allows at the given PRF
    pub fn preamble_codes(&self, prf: PulseRepetitionFrequency) -> &'static [u8] {
        // Values taken from Table 61 of the DW1000 User Manual.
        match (self, prf) {
            (UwbChannel::Channel1, PulseRepetitionFrequency::Mhz16) => &[1, 2],
            (UwbChannel::Channel2, PulseRepetitionFrequency::Mhz16)
            | (UwbChannel::Channel5, PulseRepetitionFrequency::Mhz16) => &[3, 4],
            (UwbChannel::Channel3, PulseRepetitionFrequency::Mhz16) => &[5, 6],
            (UwbChannel::Channel4, PulseRepetitionFrequency::Mhz16)
            | (UwbChannel::Channel7, PulseRepetitionFrequency::Mhz16) => &[7, 8],
            (UwbChannel::Channel4, PulseRepetitionFrequency::Mhz64)
            | (UwbChannel::Channel7, PulseRepetitionFrequency::Mhz64) => &[17, 18, 19, 20],
            (_, PulseRepetitionFrequency::Mhz64) => &[9, 10, 11, 12],
        }
    }

    /// Gets the recommended value for the rf_txctrl register
    pub fn get_recommended_rf_txctrl(&self) -> u32 {
        // Values based on Table 38 of the DW1000 User Manual
        match self {
            UwbChannel::Channel1 => 0x00005C40,
            UwbChannel::Channel2 => 0x00045CA0,
            UwbChannel::Channel3 => 0x00086CC0,
            UwbChannel::Channel4 => 0x00045C80,
            UwbChannel::Channel5 => 0x001E3FE0,
            UwbChannel::Channel7 => 0x001E7DE0,
        }
    }

    /// Gets the recommended value for the tc_pgdelay register
    pub fn get_recommended_tc_pgdelay(&self) -> u8 {
        // Values based on Table 40 of the DW1000 User Manual
        match self {
            UwbChannel::Channel1 => 0xC9,
            UwbChannel::Channel2 => 0xC2,
            UwbChannel::Channel3 => 0xC5,
            UwbChannel::Channel4 => 0x95,
            UwbChannel::Channel5 => 0xC0,
            UwbChannel::Channel7 => 0x93,
        }
    }

    /// Gets the recommended smart TX power value for the tx_power register
    pub fn get_recommended_tx_power(&self, prf: PulseRepetitionFrequency) -> u32 {
        // Values based on Table 20 of the DW1000 User Manual
        match (self, prf) {
            (UwbChannel::Channel1, PulseRepetitionFrequency::Mhz16)
            | (UwbChannel::Channel2, PulseRepetitionFrequency::Mhz16) => 0x15355575,
            (UwbChannel::Channel1, PulseRepetitionFrequency::Mhz64)
            | (UwbChannel::Channel2, PulseRepetitionFrequency::Mhz64) => 0x07274767,
            (UwbChannel::Channel3, PulseRepetitionFrequency::Mhz16) => 0x0F2F4F6F,
            (UwbChannel::Channel3, PulseRepetitionFrequency::Mhz64) => 0x2B4B6B8B,
            (UwbChannel::Channel4, PulseRepetitionFrequency::Mhz16) => 0x1F1F3F5F,
            (UwbChannel::Channel4, PulseRepetitionFrequency::Mhz64) => 0x3A5A7A9A,
            (UwbChannel::Channel5, PulseRepetitionFrequency::Mhz16) => 0x0E082848,
            (UwbChannel::Channel5, PulseRepetitionFrequency::Mhz64) => 0x25456585,
            (UwbChannel::Channel7, PulseRepetitionFrequency::Mhz16) => 0x32527292,
            (UwbChannel::Channel7, PulseRepetitionFrequency::Mhz64) => 0x5171B1D1,
        }
    }

    /// Gets the recommended value for the fs_pllcfg register
    pub fn get_recommended_fs_pllcfg(&self) -> u32 {
        // Values based on Table 43 of the DW1000 User Manual
        match self {
            UwbChannel::Channel1 => 0x09000407,
            UwbChannel::Channel2 | UwbChannel::Channel4 => 0x08400508,
            UwbChannel::Channel3 => 0x08401009,
            UwbChannel::Channel5 | UwbChannel::Channel7 => 0x0800041D,
        }
    }

    /// Gets the recommended value for the fs_plltune register
    pub fn get_recommended_fs_plltune(&self) -> u8 {
        // Values based on Table 44 of the DW1000 User Manual
        match self {
            UwbChannel::Channel1 => 0x1E,
            UwbChannel::Channel2 | UwbChannel::Channel4 => 0x26,
            UwbChannel::Channel3 => 0x56,
            UwbChannel::Channel5 | UwbChannel::Channel7 => 0xBE,
        }
    }
}
