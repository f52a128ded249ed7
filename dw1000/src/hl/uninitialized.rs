use crate::{
    ll,
    util::{poll, Poll, PollBudget},
    Error, Event, Idle, Uninitialized, DW1000,
};
use embedded_hal::{
    blocking::{delay::DelayMs, spi},
    digital::v2::OutputPin,
};

/// Register Identification Tag every Decawave part reports in DEV_ID
const RIDTAG: u16 = 0xDECA;

/// DEV_ID model number of the DW1000
const MODEL: u8 = 0x01;

impl<SPI, CS> DW1000<SPI, CS, Uninitialized>
where
    SPI: spi::Transfer<u8> + spi::Write<u8>,
    CS: OutputPin,
{
    /// Create a new instance of `DW1000`
    ///
    /// Requires the SPI peripheral and the chip select pin that are connected
    /// to the DW1000.
    pub fn new(spi: SPI, chip_select: CS) -> Self {
        DW1000 {
            ll: ll::DW1000::new(spi, chip_select),
            state: Uninitialized,
        }
    }

    /// Releases the SPI peripheral and the chip select pin
    pub fn free(self) -> (SPI, CS) {
        self.ll.free()
    }

    /// Resets the DW1000 and waits until it is ready to be configured
    ///
    /// Holds RSTn low for 2 ms, releases it and waits another 2 ms for the
    /// chip to leave its INIT state. Then SYS_STATUS is polled until the clock
    /// PLL reports lock, at most `budget` times. Finally DEV_ID is checked to
    /// make sure a DW1000 is actually on the other end of the bus.
    ///
    /// According to the DW1000 datasheet (section 5.6.3.1), RSTn must never be
    /// driven high. On boards that wire it directly to a GPIO, `reset` should
    /// release the line (open drain) on `set_high`.
    pub fn bring_up<RST, D>(
        mut self,
        reset: &mut RST,
        delay: &mut D,
        budget: PollBudget,
    ) -> Result<DW1000<SPI, CS, Idle>, Error<SPI, CS>>
    where
        RST: OutputPin,
        D: DelayMs<u8>,
    {
        reset.set_low().map_err(|_| Error::ResetLine)?;
        delay.delay_ms(2);
        reset.set_high().map_err(|_| Error::ResetLine)?;
        delay.delay_ms(2);
        log::debug!("DW1000 reset released");

        let ll = &mut self.ll;
        let idle = poll(budget, || -> nb::Result<(), Error<SPI, CS>> {
            let sys_status = ll
                .sys_status()
                .read()
                .map_err(|error| nb::Error::Other(Error::Spi(error)))?;

            if sys_status.cplock() == 0b0 {
                return Err(nb::Error::WouldBlock);
            }

            Ok(())
        })?;

        if idle == Poll::TimedOut {
            log::error!("DW1000 did not reach IDLE");
            return Err(Error::NotResponding(Event::IdleReady));
        }

        let dev_id = self.ll.dev_id().read()?;
        if dev_id.ridtag() != RIDTAG || dev_id.model() != MODEL {
            return Err(Error::InitFailed {
                dev_id: dev_id.value(),
            });
        }
        log::debug!(
            "DW1000 identified: model {:#04x} ver {} rev {}",
            dev_id.model(),
            dev_id.ver(),
            dev_id.rev()
        );

        Ok(DW1000 {
            ll: self.ll,
            state: Idle {
                dev_id: dev_id.value(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        mock::{FakeDelay, FakeDw1000},
        Error, Event, PollBudget, DW1000,
    };

    #[test]
    fn bring_up_resets_and_identifies_the_chip() {
        let fake = FakeDw1000::new().lock_after(Some(3));
        let mut reset = fake.reset_line();
        let mut delay = FakeDelay::default();

        let dw1000 = DW1000::new(fake.clone(), fake.chip_select())
            .bring_up(&mut reset, &mut delay, PollBudget::Attempts(10))
            .unwrap();

        assert_eq!(fake.resets(), 1);
        assert_eq!(delay.calls, vec![2, 2]);
        assert_eq!(fake.status_polls(), 4);
        assert_eq!(dw1000.state().dev_id(), 0xDECA0130);
    }

    #[test]
    fn unbounded_budget_waits_for_the_chip() {
        let fake = FakeDw1000::new().lock_after(Some(500));
        let mut reset = fake.reset_line();

        let result = DW1000::new(fake.clone(), fake.chip_select()).bring_up(
            &mut reset,
            &mut FakeDelay::default(),
            PollBudget::Unbounded,
        );

        assert!(result.is_ok());
        assert_eq!(fake.status_polls(), 501);
    }

    #[test]
    fn chip_stuck_in_init_times_out() {
        let fake = FakeDw1000::new().lock_after(None);
        let mut reset = fake.reset_line();

        let error = DW1000::new(fake.clone(), fake.chip_select())
            .bring_up(&mut reset, &mut FakeDelay::default(), PollBudget::Attempts(20))
            .unwrap_err();

        assert!(matches!(error, Error::NotResponding(Event::IdleReady)));
        assert!(error.is_bring_up_failure());
        assert_eq!(fake.status_polls(), 20);
    }

    #[test]
    fn unknown_device_fails_init() {
        let fake = FakeDw1000::new().dev_id(0xDECA0302);
        let mut reset = fake.reset_line();

        let error = DW1000::new(fake.clone(), fake.chip_select())
            .bring_up(&mut reset, &mut FakeDelay::default(), PollBudget::Attempts(5))
            .unwrap_err();

        assert!(matches!(error, Error::InitFailed { dev_id: 0xDECA0302 }));
    }
}
