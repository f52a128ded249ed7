use crate::{
    util::{poll, Poll, PollBudget},
    Error, Event, Ready, DW1000,
};
use embedded_hal::{blocking::spi, digital::v2::OutputPin};

/// A holder of state for a transmission
///
/// Returned by [`DW1000::transmit`]. The radio stays borrowed until the
/// guard is dropped, so a second frame can't be started on top of this one.
pub struct Sending<'a, SPI, CS> {
    pub(crate) chip: &'a mut DW1000<SPI, CS, Ready>,
    pub(crate) finished: bool,
}

impl<'a, SPI, CS> Sending<'a, SPI, CS>
where
    SPI: spi::Transfer<u8> + spi::Write<u8>,
    CS: OutputPin,
{
    /// Wait for the transmission to finish
    ///
    /// This method returns an `nb::Result` to indicate whether the transmission
    /// has finished, or whether it is still ongoing. You can use this to busily
    /// wait for the transmission to finish, for example using `nb`'s `block!`
    /// macro, or use [`Sending::wait_for_completion`] to give up after a
    /// number of attempts.
    ///
    /// Once TXFRS is seen, the transmit events are cleared in SYS_STATUS.
    pub fn wait_transmit(&mut self) -> nb::Result<(), Error<SPI, CS>> {
        if self.finished {
            return Ok(());
        }

        let sys_status = self
            .chip
            .ll
            .sys_status()
            .read()
            .map_err(|error| nb::Error::Other(Error::Spi(error)))?;

        // Has the frame been sent?
        if sys_status.txfrs() == 0b0 {
            // Frame has not been sent
            return Err(nb::Error::WouldBlock);
        }

        // Frame sent
        self.chip.clear_tx_events().map_err(nb::Error::Other)?;
        self.finished = true;

        Ok(())
    }

    /// Polls [`Sending::wait_transmit`] until the frame is out or `budget` is
    /// spent
    pub fn wait_for_completion(mut self, budget: PollBudget) -> Result<(), Error<SPI, CS>> {
        match poll(budget, || self.wait_transmit())? {
            Poll::Ready(()) => Ok(()),
            Poll::TimedOut => {
                log::warn!("DW1000 didn't report TXFRS in time");
                Err(Error::NotResponding(Event::FrameSent))
            }
        }
    }

    /// Whether TXFRS has been observed
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        mock::{FakeDelay, FakeDw1000, FakePin},
        Error, Event, PollBudget, RadioConfig, Ready, TxRfConfig, DW1000, MAX_DATA_LEN,
    };

    fn ready(fake: &FakeDw1000) -> DW1000<FakeDw1000, FakePin, Ready> {
        let config = RadioConfig::default();

        DW1000::new(fake.clone(), fake.chip_select())
            .bring_up(
                &mut fake.reset_line(),
                &mut FakeDelay::default(),
                PollBudget::Attempts(5),
            )
            .unwrap()
            .configure(&config)
            .unwrap()
            .configure_tx_rf(&TxRfConfig::recommended(&config))
            .unwrap()
    }

    #[test]
    fn frame_is_written_and_started() {
        let fake = FakeDw1000::new().tx_after(Some(2));
        let mut dw1000 = ready(&fake);

        let frame = [0xC5, 0x00, b'h', b'i', 0, 0, 0, 0, 0, 0, 0, 0];
        let mut sending = dw1000.transmit(&frame).unwrap();

        assert_eq!(fake.frames(), vec![frame.to_vec()]);
        // 12 bytes + FCS, 6.8 Mbps, 64 MHz PRF, 128 symbols, no ranging
        let tx_fctrl = fake.register(0x08, 0);
        assert_eq!(tx_fctrl[0], 14);
        assert_eq!(tx_fctrl[1], 0b0100_0000);
        assert_eq!(tx_fctrl[2], 0b0001_0110);

        assert!(matches!(sending.wait_transmit(), Err(nb::Error::WouldBlock)));
        assert!(matches!(sending.wait_transmit(), Err(nb::Error::WouldBlock)));
        assert!(sending.wait_transmit().is_ok());
        assert!(sending.is_finished());

        // TX events are cleared again
        assert_eq!(fake.register(0x0F, 0)[0] & 0xF0, 0);
    }

    #[test]
    fn completion_wait_gives_up_after_budget() {
        let fake = FakeDw1000::new().tx_after(None);
        let mut dw1000 = ready(&fake);
        let polls = fake.status_polls();

        let error = dw1000
            .transmit(b"abc")
            .unwrap()
            .wait_for_completion(PollBudget::Attempts(8))
            .unwrap_err();

        assert!(matches!(error, Error::NotResponding(Event::FrameSent)));
        assert!(!error.is_bring_up_failure());
        assert_eq!(fake.status_polls() - polls, 8);
    }

    #[test]
    fn completion_wait_returns_once_sent() {
        let fake = FakeDw1000::new().tx_after(Some(4));
        let mut dw1000 = ready(&fake);

        dw1000
            .transmit(b"abc")
            .unwrap()
            .wait_for_completion(PollBudget::Attempts(10))
            .unwrap();

        assert_eq!(fake.frames(), vec![b"abc".to_vec()]);
    }

    #[test]
    fn oversized_frames_are_refused() {
        let fake = FakeDw1000::new();
        let mut dw1000 = ready(&fake);

        let frame = [0u8; MAX_DATA_LEN + 1];
        let error = dw1000.transmit(&frame).err().unwrap();

        assert!(matches!(error, Error::FrameTooLong { len: 126 }));
        assert!(fake.frames().is_empty());

        assert!(dw1000.transmit(&frame[..MAX_DATA_LEN]).is_ok());
    }
}
