use crate::{RadioConfig, TxRfConfig};

/// Indicates that the `DW1000` instance is not initialized yet
#[derive(Debug)]
pub struct Uninitialized;

/// Indicates that the DW1000 came out of reset and identified itself
#[derive(Debug)]
pub struct Idle {
    pub(super) dev_id: u32,
}

/// Indicates that the radio configuration has been applied
#[derive(Debug)]
pub struct Configured {
    pub(super) dev_id: u32,
    pub(super) config: RadioConfig,
}

/// Indicates that the `DW1000` instance is ready to transmit
#[derive(Debug)]
pub struct Ready {
    pub(super) dev_id: u32,
    pub(super) config: RadioConfig,
    pub(super) tx_rf: TxRfConfig,
}

impl Idle {
    /// The DEV_ID register value read during bring-up
    pub fn dev_id(&self) -> u32 {
        self.dev_id
    }
}

impl Configured {
    /// The applied radio configuration
    pub fn config(&self) -> &RadioConfig {
        &self.config
    }
}

impl Ready {
    /// The DEV_ID register value read during bring-up
    pub fn dev_id(&self) -> u32 {
        self.dev_id
    }

    /// The applied radio configuration
    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    /// The applied transmitter calibration
    pub fn tx_rf(&self) -> &TxRfConfig {
        &self.tx_rf
    }
}
