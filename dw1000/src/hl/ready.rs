use crate::{Error, Ready, Sending, DW1000, FCS_LEN, MAX_DATA_LEN};
use embedded_hal::{blocking::spi, digital::v2::OutputPin};

impl<SPI, CS> DW1000<SPI, CS, Ready>
where
    SPI: spi::Transfer<u8> + spi::Write<u8>,
    CS: OutputPin,
{
    /// Send raw data
    ///
    /// Copies `data` to offset 0 of the transmit buffer, programs TX_FCTRL for
    /// the applied configuration and starts an immediate transmission. The
    /// chip appends the two FCS bytes itself, so `data` may be at most
    /// [`MAX_DATA_LEN`] bytes long.
    ///
    /// The returned [`Sending`] borrows the radio until the transmission has
    /// been waited for.
    pub fn transmit(&mut self, data: &[u8]) -> Result<Sending<'_, SPI, CS>, Error<SPI, CS>> {
        if data.len() > MAX_DATA_LEN {
            return Err(Error::FrameTooLong { len: data.len() });
        }

        // Drop events left over from a transmission that was never waited for
        self.clear_tx_events()?;

        self.ll.tx_buffer().write(|w| w.data(data))?;

        let config = self.state.config;
        self.ll.tx_fctrl().write(|w| {
            let tflen = (data.len() + FCS_LEN) as u8;
            w.tflen(tflen) // data length + two-octet CRC
                .tfle(0) // no non-standard length extension
                .txboffs(0) // no offset in TX_BUFFER
                .txbr(config.bitrate as u8) // configured bitrate
                .tr(0) // no ranging
                .txprf(config.pulse_repetition_frequency as u8) // configured PRF
                .txpsr(config.preamble_length.txpsr()) // first two bits of configured preamble length
                .pe(config.preamble_length.pe()) // last two bits of configured preamble length
        })?;

        self.ll.sys_ctrl().write(|w| w.txstrt(0b1))?;

        Ok(Sending {
            chip: self,
            finished: false,
        })
    }

    pub(crate) fn clear_tx_events(&mut self) -> Result<(), Error<SPI, CS>> {
        self.ll.sys_status().write(|w| {
            w.txfrb(0b1) // Transmit Frame Begins
                .txprs(0b1) // Transmit Preamble Sent
                .txphs(0b1) // Transmit PHY Header Sent
                .txfrs(0b1) // Transmit Frame Sent
        })?;

        Ok(())
    }
}
