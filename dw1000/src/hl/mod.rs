//! High-level interface to the DW1000
//!
//! The entry point to this API is the [DW1000] struct. Please refer to the
//! documentation there for more details.
//!
//! This module implements a high-level interface to the DW1000. This is the
//! recommended way to access the DW1000 using this crate, unless you need the
//! greater flexibility provided by the [register-level interface].
//!
//! [register-level interface]: ../ll/index.html

use crate::ll;
use core::fmt;

pub use error::*;
pub use sending::*;
pub use state_impls::*;

mod configured;
mod error;
mod idle;
mod ready;
mod sending;
mod state_impls;
mod uninitialized;

/// Entry point to the DW1000 driver API
///
/// The `State` parameter tracks how far bring-up has progressed:
///
/// ```text
/// Uninitialized --bring_up--> Idle --configure--> Configured
///     --configure_tx_rf--> Ready --transmit--> Sending (borrows Ready)
/// ```
///
/// Every transition consumes the previous state, so a radio can't be
/// configured twice or used to transmit before it has been tuned.
pub struct DW1000<SPI, CS, State> {
    ll: ll::DW1000<SPI, CS>,
    state: State,
}

impl<SPI, CS, State> DW1000<SPI, CS, State> {
    /// Provides direct access to the register-level API
    ///
    /// Be aware that by using the register-level API, you can invalidate
    /// various assumptions that the high-level API makes about the operation
    /// of the DW1000. Don't use the register-level and high-level APIs in
    /// tandem, unless you know what you're doing.
    pub fn ll(&mut self) -> &mut ll::DW1000<SPI, CS> {
        &mut self.ll
    }

    /// The current state marker
    pub fn state(&self) -> &State {
        &self.state
    }
}

// Can't be derived without putting requirements on `SPI` and `CS`.
impl<SPI, CS, State> fmt::Debug for DW1000<SPI, CS, State>
where
    State: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DW1000 {{ state: ")?;
        self.state.fmt(f)?;
        write!(f, ", .. }}")?;

        Ok(())
    }
}
