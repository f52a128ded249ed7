//! DWM1001 board glue
//!
//! Wires the nRF52832 to the DW1000 the way the [DWM1001 Module] does:
//!
//! | DW1000 | nRF52832 |
//! |--------|----------|
//! | SPICLK | P0.16    |
//! | SPIMOSI| P0.20    |
//! | SPIMISO| P0.18    |
//! | SPICSn | P0.17    |
//! | RSTn   | P0.24    |
//!
//! Only available with the `rt` feature.
//!
//! [DWM1001 Module]: https://www.decawave.com/product/dwm1001-module/

use dw1000_radio::{Uninitialized, DW1000};
use nrf52832_hal::{
    gpio::{
        p0::{self, P0_16, P0_17, P0_18, P0_20, P0_24},
        Level, OpenDrain, OpenDrainConfig, Output, PushPull,
    },
    pac::{self as nrf52, CorePeripherals, Peripherals, SPIM2},
    spim, Delay, Spim,
};

/// The DW1000 as wired on the DWM1001
pub type Radio<State> = DW1000<Spim<nrf52::SPIM2>, P0_17<Output<PushPull>>, State>;

/// The DW_RST line (P0.24)
///
/// RSTn may only ever be pulled low (DW1000 datasheet, section 5.6.3.1). The
/// pin is configured `Standard0Disconnect1`, so setting it high releases it.
pub type DwReset = P0_24<Output<OpenDrain>>;

/// SPIM settings for the DW1000 bus
///
/// The default 2 MHz clock is kept after the PLL locks. A 12-byte frame is
/// written in well under a millisecond at that rate, next to the 10 ms
/// inter-frame delay.
pub struct SpimConfig {
    /// SPIM Frequency
    pub frequency: spim::Frequency,

    /// SPIM Mode
    pub mode: spim::Mode,

    /// SPIM Overread Character
    pub orc: u8,
}

impl Default for SpimConfig {
    fn default() -> Self {
        // The DW1000 only takes up to 3 MHz until its PLL has locked
        SpimConfig {
            frequency: spim::Frequency::M2,
            mode: spim::MODE_0,
            orc: 0,
        }
    }
}

/// The parts of the DWM1001 the transmitter uses
#[allow(non_snake_case)]
pub struct DWM1001 {
    /// The Decawave DW1000 Radio IC
    pub DW1000: Radio<Uninitialized>,

    /// The DW1000's reset line
    pub DW_RST: DwReset,

    /// Blocking delay on top of SysTick
    pub delay: Delay,
}

impl DWM1001 {
    /// Take the peripherals safely
    ///
    /// This method will return an instance of `DWM1001` the first time it is
    /// called. It will return only `None` on subsequent calls.
    pub fn take(spim_config: SpimConfig) -> Option<Self> {
        Some(Self::new(
            CorePeripherals::take()?,
            Peripherals::take()?,
            spim_config,
        ))
    }

    fn new(cp: CorePeripherals, p: Peripherals, spim_config: SpimConfig) -> Self {
        let pins = p0::Parts::new(p.P0);

        let dw_rst = pins
            .p0_24
            .into_open_drain_output(OpenDrainConfig::Standard0Disconnect1, Level::High);

        DWM1001 {
            DW1000: new_dw1000(
                p.SPIM2,
                pins.p0_16,
                pins.p0_20,
                pins.p0_18,
                pins.p0_17,
                spim_config,
            ),
            DW_RST: dw_rst,
            delay: Delay::new(cp.SYST),
        }
    }
}

/// Create a new instance of the DW1000 radio
pub fn new_dw1000<SCK, MOSI, MISO, CS>(
    spim: SPIM2,
    sck: P0_16<SCK>,
    mosi: P0_20<MOSI>,
    miso: P0_18<MISO>,
    cs: P0_17<CS>,
    config: SpimConfig,
) -> Radio<Uninitialized> {
    let spim = Spim::new(
        spim,
        spim::Pins {
            sck: Some(sck.into_push_pull_output(Level::Low).degrade()),
            mosi: Some(mosi.into_push_pull_output(Level::Low).degrade()),
            miso: Some(miso.into_floating_input().degrade()),
        },
        config.frequency,
        config.mode,
        config.orc,
    );

    DW1000::new(spim, cs.into_push_pull_output(Level::High))
}
