//! Low-level interface to the DW1000
//!
//! This module implements a register-level interface to the DW1000. It only
//! covers the registers that bring-up, configuration and transmission touch.
//! Users of this library should typically not need it; please consider using
//! the [high-level interface] instead.
//!
//! **NOTE**: Field write methods accept types that have a larger number of
//! bits than the field actually consists of. If you use such a method to pass
//! a value that is too large to be written to the field, it will be silently
//! truncated.
//!
//! [high-level interface]: ../hl/index.html

use core::{fmt, marker::PhantomData};

use embedded_hal::{blocking::spi, digital::v2::OutputPin};

/// Entry point to the DW1000 driver's low-level API
///
/// Please consider using [hl::DW1000] instead.
///
/// [hl::DW1000]: ../hl/struct.DW1000.html
pub struct DW1000<SPI, CS> {
    spi: SPI,
    chip_select: CS,
}

impl<SPI, CS> DW1000<SPI, CS> {
    /// Create a new instance of `DW1000`
    ///
    /// Requires the SPI peripheral and the chip select pin that are connected
    /// to the DW1000.
    pub fn new(spi: SPI, chip_select: CS) -> Self {
        DW1000 { spi, chip_select }
    }

    /// Releases the SPI peripheral and the chip select pin
    pub fn free(self) -> (SPI, CS) {
        (self.spi, self.chip_select)
    }

    fn transaction<F>(&mut self, f: F) -> Result<(), Error<SPI, CS>>
    where
        SPI: spi::Transfer<u8> + spi::Write<u8>,
        CS: OutputPin,
        F: FnOnce(&mut SPI) -> Result<(), Error<SPI, CS>>,
    {
        self.chip_select.set_low().map_err(Error::ChipSelect)?;
        let result = f(&mut self.spi);
        self.chip_select.set_high().map_err(Error::ChipSelect)?;

        result
    }
}

/// Provides access to a register
///
/// You can get an instance for a given register using one of the methods on
/// [`DW1000`].
pub struct RegAccessor<'s, R, SPI, CS>(&'s mut DW1000<SPI, CS>, PhantomData<R>);

impl<'s, R, SPI, CS> RegAccessor<'s, R, SPI, CS>
where
    SPI: spi::Transfer<u8> + spi::Write<u8>,
    CS: OutputPin,
{
    /// Read from the register
    pub fn read(&mut self) -> Result<R::Read, Error<SPI, CS>>
    where
        R: Register + Readable,
    {
        let mut r = R::read();
        let buffer = R::buffer(&mut r);
        init_header::<R>(false, buffer);

        self.0.transaction(|spi| {
            spi.transfer(buffer).map_err(Error::Transfer)?;
            Ok(())
        })?;

        Ok(r)
    }

    /// Write to the register
    pub fn write<F>(&mut self, f: F) -> Result<(), Error<SPI, CS>>
    where
        R: Register + Writable,
        F: FnOnce(&mut R::Write) -> &mut R::Write,
    {
        let mut w = R::write();
        f(&mut w);

        self.send::<R>(R::buffer(&mut w))
    }

    /// Modify the register
    pub fn modify<F>(&mut self, f: F) -> Result<(), Error<SPI, CS>>
    where
        R: Register + Readable + Writable,
        F: for<'r> FnOnce(&mut R::Read, &'r mut R::Write) -> &'r mut R::Write,
    {
        let mut r = self.read()?;
        let mut w = R::write();

        <R as Writable>::buffer(&mut w).copy_from_slice(<R as Readable>::buffer(&mut r));

        f(&mut r, &mut w);

        self.send::<R>(<R as Writable>::buffer(&mut w))
    }

    fn send<Reg: Register>(&mut self, buffer: &mut [u8]) -> Result<(), Error<SPI, CS>> {
        init_header::<Reg>(true, buffer);

        self.0.transaction(|spi| {
            <SPI as spi::Write<u8>>::write(spi, buffer).map_err(Error::Write)
        })
    }
}

/// An SPI error that can occur when communicating with the DW1000
pub enum Error<SPI, CS>
where
    SPI: spi::Transfer<u8> + spi::Write<u8>,
    CS: OutputPin,
{
    /// SPI error occured during a transfer transaction
    Transfer(<SPI as spi::Transfer<u8>>::Error),

    /// SPI error occured during a write transaction
    Write(<SPI as spi::Write<u8>>::Error),

    /// Error occured while changing chip select signal
    ChipSelect(<CS as OutputPin>::Error),
}

// We can't derive this implementation, as the compiler will complain that the
// associated error type doesn't implement `Debug`.
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
            Error::Transfer(error) => write!(f, "Transfer({:?})", error),
            Error::Write(error) => write!(f, "Write({:?})", error),
            Error::ChipSelect(error) => write!(f, "ChipSelect({:?})", error),
        }
    }
}

/// Initializes the SPI message header
///
/// Writes the transaction header for accessing register `R` into the start of
/// `buffer` and returns its length. The layout is described in section 2.2.1.2
/// of the DW1000 user manual.
pub(crate) fn init_header<R: Register>(write: bool, buffer: &mut [u8]) -> usize {
    let sub_id = R::SUB_ID > 0;

    buffer[0] = (((write as u8) << 7) & 0x80) | (((sub_id as u8) << 6) & 0x40) | (R::ID & 0x3f);

    if !sub_id {
        return 1;
    }

    let ext_addr = R::SUB_ID > 127;

    buffer[1] = (((ext_addr as u8) << 7) & 0x80) | (R::SUB_ID as u8 & 0x7f); // lower 7 bits (of 15)

    if !ext_addr {
        return 2;
    }

    buffer[2] = ((R::SUB_ID & 0x7f80) >> 7) as u8; // higher 8 bits (of 15)

    3
}

/// Length of the transaction header for a register id/sub-id pair
pub const fn header_len(sub_id: u16) -> usize {
    1 + (sub_id > 0) as usize + (sub_id > 127) as usize
}

/// Implemented for all registers
///
/// This is a mostly internal trait that should not be implemented or used
/// directly by users of this crate. It is exposed through the public API
/// though, so it can't be made private.
///
/// The DW1000 user manual, section 7.1, specifies what the values of the
/// constant should be for each register.
pub trait Register {
    /// The register index
    const ID: u8;

    /// The registers's sub-index
    const SUB_ID: u16;

    /// The lenght of the register
    const LEN: usize;
}

/// Marker trait for registers that can be read from
pub trait Readable {
    /// The type that is used to read from the register
    type Read;

    /// Return the read type for this register
    fn read() -> Self::Read;

    /// Return the read type's internal buffer
    fn buffer(r: &mut Self::Read) -> &mut [u8];
}

/// Marker trait for registers that can be written to
pub trait Writable {
    /// The type that is used to write to the register
    type Write;

    /// Return the write type for this register
    fn write() -> Self::Write;

    /// Return the write type's internal buffer
    fn buffer(w: &mut Self::Write) -> &mut [u8];
}

/// Reads bits `first..=last` out of a little-endian register image
///
/// Fields never span more than 40 bits, so together with an in-byte offset of
/// at most 7 they always fit a `u64` window.
pub(crate) fn get_bits(data: &[u8], first: usize, last: usize) -> u64 {
    let start = first / 8;
    let end = last / 8 + 1;

    let mut window = 0u64;
    for (i, byte) in data[start..end].iter().enumerate() {
        window |= (*byte as u64) << (i * 8);
    }

    let width = last - first + 1;
    (window >> (first % 8)) & mask(width)
}

/// Writes `value` into bits `first..=last` of a little-endian register image
pub(crate) fn set_bits(data: &mut [u8], first: usize, last: usize, value: u64) {
    let start = first / 8;
    let end = last / 8 + 1;
    let offset = first % 8;
    let field_mask = mask(last - first + 1) << offset;

    let mut window = 0u64;
    for (i, byte) in data[start..end].iter().enumerate() {
        window |= (*byte as u64) << (i * 8);
    }

    window = (window & !field_mask) | ((value << offset) & field_mask);

    for (i, byte) in data[start..end].iter_mut().enumerate() {
        *byte = (window >> (i * 8)) as u8;
    }
}

fn mask(width: usize) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Generates register implementations
macro_rules! impl_register {
    (
        $(
            $id:expr,
            $sub_id:expr,
            $len:expr,
            $rw:tt,
            $name:ident($name_lower:ident) {
            #[$doc:meta]
            $(
                $field:ident,
                $first_bit:expr,
                $last_bit:expr,
                $ty:ty;
                #[$field_doc:meta]
            )*
            }
        )*
    ) => {
        $(
            #[$doc]
            #[allow(non_camel_case_types)]
            pub struct $name;

            impl Register for $name {
                const ID:     u8    = $id;
                const SUB_ID: u16   = $sub_id;
                const LEN:    usize = $len;
            }

            impl $name {
                const HEADER_LEN: usize = header_len($sub_id);
            }

            #[$doc]
            pub mod $name_lower {
                use core::fmt;

                const HEADER_LEN: usize = super::$name::HEADER_LEN;

                /// Used to read from the register
                pub struct R(pub(crate) [u8; HEADER_LEN + $len]);

                impl R {
                    $(
                        #[$field_doc]
                        pub fn $field(&self) -> $ty {
                            crate::ll::get_bits(
                                &self.0[HEADER_LEN..],
                                $first_bit,
                                $last_bit,
                            ) as $ty
                        }
                    )*
                }

                impl fmt::Debug for R {
                    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                        write!(f, "0x")?;
                        for i in (0 .. $len).rev() {
                            write!(f, "{:02x}", self.0[HEADER_LEN + i])?;
                        }

                        Ok(())
                    }
                }

                /// Used to write to the register
                pub struct W(pub(crate) [u8; HEADER_LEN + $len]);

                impl W {
                    $(
                        #[$field_doc]
                        pub fn $field(&mut self, value: $ty) -> &mut Self {
                            crate::ll::set_bits(
                                &mut self.0[HEADER_LEN..],
                                $first_bit,
                                $last_bit,
                                value as u64,
                            );
                            self
                        }
                    )*
                }
            }

            impl_rw!($rw, $name, $name_lower, $len);
        )*

        impl<SPI, CS> DW1000<SPI, CS> {
            $(
                #[$doc]
                pub fn $name_lower(&mut self) -> RegAccessor<'_, $name, SPI, CS> {
                    RegAccessor(self, PhantomData)
                }
            )*
        }
    }
}

// Helper macro, used internally by `impl_register!`
macro_rules! impl_rw {
    (RO, $name:ident, $name_lower:ident, $len:expr) => {
        impl_rw!(@R, $name, $name_lower, $len);
    };
    (RW, $name:ident, $name_lower:ident, $len:expr) => {
        impl_rw!(@R, $name, $name_lower, $len);
        impl_rw!(@W, $name, $name_lower, $len);
    };

    (@R, $name:ident, $name_lower:ident, $len:expr) => {
        impl Readable for $name {
            type Read = $name_lower::R;

            fn read() -> Self::Read {
                $name_lower::R([0; Self::HEADER_LEN + $len])
            }

            fn buffer(r: &mut Self::Read) -> &mut [u8] {
                &mut r.0
            }
        }
    };
    (@W, $name:ident, $name_lower:ident, $len:expr) => {
        impl Writable for $name {
            type Write = $name_lower::W;

            fn write() -> Self::Write {
                $name_lower::W([0; Self::HEADER_LEN + $len])
            }

            fn buffer(w: &mut Self::Write) -> &mut [u8] {
                &mut w.0
            }
        }
    };
}

// <id>, <sub-id>, <size-bytes>, <RO/RW>, <name-upper>(name-lower) { /// <doc>
//     <name>, <first-bit-index>, <last-bit-index>, <type>; /// <doc>
// }
impl_register! {
    0x00, 0x00, 4, RO, DEV_ID(dev_id) { /// Device identifier
        rev,     0,  3, u8;  /// Revision
        ver,     4,  7, u8;  /// Version
        model,   8, 15, u8;  /// Model
        ridtag, 16, 31, u16; /// Register Identification Tag
        value,   0, 31, u32; /// The whole identifier
    }
    0x04, 0x00, 4, RW, SYS_CFG(sys_cfg) { /// System Configuration
        phr_mode,   16, 17, u8; /// PHR Mode
        dis_stxp,   18, 18, u8; /// Disable Smart TX Power Control
    }
    0x08, 0x00, 5, RW, TX_FCTRL(tx_fctrl) { /// TX Frame Control
        tflen,     0,  6, u8;  /// TX Frame Length
        tfle,      7,  9, u8;  /// TX Frame Length Extension
        txbr,     13, 14, u8;  /// TX Bit Rate
        tr,       15, 15, u8;  /// TX Ranging Enable
        txprf,    16, 17, u8;  /// TX Pulse Repetition Frequency
        txpsr,    18, 19, u8;  /// TX Preamble Symbol Repetitions
        pe,       20, 21, u8;  /// Preamble Extension
        txboffs,  22, 31, u16; /// TX Buffer Index Offset
    }
    0x0D, 0x00, 4, RW, SYS_CTRL(sys_ctrl) { /// System Control Register
        txstrt,     1,  1, u8; /// Transmit Start
    }
    0x0F, 0x00, 5, RW, SYS_STATUS(sys_status) { /// System Event Status Register
        cplock,     1,  1, u8; /// Clock PLL Lock
        txfrb,      4,  4, u8; /// TX Frame Begins
        txprs,      5,  5, u8; /// TX Preamble Sent
        txphs,      6,  6, u8; /// TX PHY Header Sent
        txfrs,      7,  7, u8; /// TX Frame Sent
    }
    0x1E, 0x00, 4, RW, TX_POWER(tx_power) { /// TX Power Control
        // The field layout depends on the smart TX power setting, so only the
        // raw value is exposed.
        value, 0, 31, u32; /// TX Power Control value
    }
    0x1F, 0x00, 4, RW, CHAN_CTRL(chan_ctrl) { /// Channel Control Register
        tx_chan, 0, 3, u8; /// Selects the transmit channel.
        rx_chan, 4, 7, u8; /// Selects the receive channel.
        dwsfd, 17, 17, u8; /// Enables the non-standard Decawave proprietary SFD sequence.
        rxprf, 18, 19, u8; /// Selects the PRF used in the receiver.
        tnssfd, 20, 20, u8; /// Enables a user specified (non-standard) SFD in the transmitter.
        rnssfd, 21, 21, u8; /// Enables a user specified (non-standard) SFD in the receiver.
        tx_pcode, 22, 26, u8; /// Selects the preamble code used in the transmitter.
        rx_pcode, 27, 31, u8; /// Selects the preamble code used in the receiver.
    }
    0x21, 0x00, 1, RW, SFD_LENGTH(sfd_length) { /// Length of the SFD sequence used at 850kbps and higher
        value, 0, 7, u8; /// SFD length in symbols
    }
    0x26, 0x00, 4, RW, GPIO_MODE(gpio_mode) { /// GPIO Mode Control Register
        msgp2, 10, 11, u8; /// Mode Selection for GPIO2/RXLED
        msgp3, 12, 13, u8; /// Mode Selection for GPIO3/TXLED
    }
    0x27, 0x08, 4, RW, DRX_TUNE2(drx_tune2) { /// Digital Tuning Register 2
        value, 0, 31, u32; /// DRX_TUNE2 tuning value
    }
    0x27, 0x20, 2, RW, DRX_SFDTOC(drx_sfdtoc) { /// SFD timeout
        count, 0, 15, u16; /// SFD detection timeout count
    }
    0x28, 0x0C, 3, RW, RF_TXCTRL(rf_txctrl) { /// Analog TX Control Register
        value, 0, 23, u32; /// The entire register
    }
    0x2A, 0x0B, 1, RW, TC_PGDELAY(tc_pgdelay) { /// Pulse Generator Delay
        value, 0, 7, u8; /// Transmitter Calibration - Pulse Generator Delay
    }
    0x2B, 0x07, 4, RW, FS_PLLCFG(fs_pllcfg) { /// Frequency synth - PLL configuration
        value, 0, 31, u32; /// Frequency synth - PLL configuration
    }
    0x2B, 0x0B, 1, RW, FS_PLLTUNE(fs_plltune) { /// Frequency synth - PLL Tuning
        value, 0, 7, u8; /// Frequency synthesiser - PLL Tuning
    }
    0x36, 0x00, 4, RW, PMSC_CTRL0(pmsc_ctrl0) { /// PMSC Control Register 0
        gpdce,     18, 18, u8; /// GPIO De-bounce Clock Enable
        khzclken,  23, 23, u8; /// Kilohertz Clock Enable
    }
    0x36, 0x28, 4, RW, PMSC_LEDC(pmsc_ledc) { /// PMSC LED Control Register
        blink_tim, 0, 7, u8; /// Blink time count value
        blnken, 8, 8, u8; /// Blink Enable
        blnknow, 16, 19, u8; /// Manually triggers an LED blink. There is one trigger bit per LED IO
    }
}

/// Maximum number of bytes the transmit buffer accessor covers
pub const TX_BUFFER_LEN: usize = 127;

/// Transmit Data Buffer
///
/// Only the first 127 bytes of the buffer are supported, which is enough for
/// standard IEEE 802.15.4 UWB frames.
#[allow(non_camel_case_types)]
pub struct TX_BUFFER;

impl Register for TX_BUFFER {
    const ID: u8 = 0x09;
    const SUB_ID: u16 = 0x00;
    const LEN: usize = TX_BUFFER_LEN;
}

impl Writable for TX_BUFFER {
    type Write = tx_buffer::W;

    fn write() -> Self::Write {
        tx_buffer::W([0; TX_BUFFER_LEN + 1], TX_BUFFER_LEN + 1)
    }

    fn buffer(w: &mut Self::Write) -> &mut [u8] {
        let len = w.1;
        &mut w.0[..len]
    }
}

impl<SPI, CS> DW1000<SPI, CS> {
    /// Transmit Data Buffer
    pub fn tx_buffer(&mut self) -> RegAccessor<'_, TX_BUFFER, SPI, CS> {
        RegAccessor(self, PhantomData)
    }
}

/// Transmit Data Buffer
pub mod tx_buffer {
    use super::TX_BUFFER_LEN;

    /// Used to write to the register
    ///
    /// The second field is the number of bytes (header included) that go out
    /// over SPI, so short frames don't clock the whole buffer.
    pub struct W(pub(crate) [u8; TX_BUFFER_LEN + 1], pub(crate) usize);

    impl W {
        /// Copies `data` to the start of the buffer
        ///
        /// Only `data.len()` bytes are transferred. Data beyond the buffer's
        /// capacity is cut off.
        pub fn data(&mut self, data: &[u8]) -> &mut Self {
            let len = data.len().min(TX_BUFFER_LEN);
            self.0[1..=len].copy_from_slice(&data[..len]);
            self.1 = len + 1;
            self
        }
    }
}
