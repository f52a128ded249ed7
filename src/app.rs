//! Application entry sequence
//!
//! Brings the radio up step by step, logging each failure the way an
//! operator watching the RTT console expects to see it, then hands over to
//! the transmit loop.

use dw1000_radio::{Error, Event, Ready, Uninitialized, DW1000};
use embedded_hal::{
    blocking::{delay::DelayMs, spi},
    digital::v2::OutputPin,
};

use crate::{input::InputChannel, settings::Settings, transmitter::BlinkTransmitter};

/// Printed once at startup
pub const APP_NAME: &str = "SIMPLE TX v1.0";

/// Takes the radio from power-on to ready-to-transmit
///
/// Resets the chip, waits for it to become idle, checks its identity,
/// enables the activity LEDs, applies the radio configuration and then the
/// RF calibration. The first failing step ends bring-up, LED setup
/// included: it only fails when the SPI bus does.
pub fn bring_up<SPI, CS, RST, D>(
    radio: DW1000<SPI, CS, Uninitialized>,
    reset: &mut RST,
    delay: &mut D,
    settings: &Settings,
) -> Result<DW1000<SPI, CS, Ready>, Error<SPI, CS>>
where
    SPI: spi::Transfer<u8> + spi::Write<u8>,
    CS: OutputPin,
    RST: OutputPin,
    D: DelayMs<u8>,
{
    log::info!("{}", APP_NAME);

    let mut idle = radio
        .bring_up(reset, delay, settings.idle_budget)
        .map_err(|error| {
            match error {
                Error::NotResponding(Event::IdleReady) => log::error!("IDLE TIMEOUT"),
                _ => log::error!("INIT FAILED"),
            }
            error
        })?;

    idle.configure_leds(settings.leds).map_err(|error| {
        log::error!("LED SETUP FAILED");
        error
    })?;

    let configured = idle.configure(&settings.radio).map_err(|error| {
        log::error!("CONFIG FAILED");
        error
    })?;

    let ready = configured
        .configure_tx_rf(&settings.tx_rf)
        .map_err(|error| {
            log::error!("TX RF CONFIG FAILED");
            error
        })?;

    log::info!("Sending started");

    Ok(ready)
}

/// Brings the radio up and runs the transmit loop
///
/// Only returns when something went wrong, with the error that stopped it.
pub fn run<SPI, CS, RST, D, IN>(
    radio: DW1000<SPI, CS, Uninitialized>,
    reset: &mut RST,
    delay: &mut D,
    input: IN,
    settings: &Settings,
) -> Error<SPI, CS>
where
    SPI: spi::Transfer<u8> + spi::Write<u8>,
    CS: OutputPin,
    RST: OutputPin,
    D: DelayMs<u8> + DelayMs<u32>,
    IN: InputChannel,
{
    let ready = match bring_up(radio, reset, delay, settings) {
        Ok(ready) => ready,
        Err(error) => return error,
    };

    let error = BlinkTransmitter::new(ready, input, settings).run(delay);
    log::error!("TX FAILED");

    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use dw1000_radio::{
        mock::{FakeDelay, FakeDw1000},
        PollBudget,
    };

    /// Input that hands out one byte string and counts reads
    struct Once(Option<&'static [u8]>, usize);

    impl InputChannel for Once {
        fn read(&mut self, buf: &mut [u8]) -> usize {
            self.1 += 1;
            match self.0.take() {
                Some(data) => {
                    let len = data.len().min(buf.len());
                    buf[..len].copy_from_slice(&data[..len]);
                    len
                }
                None => 0,
            }
        }
    }

    #[test]
    fn bring_up_reaches_ready() {
        let fake = FakeDw1000::new().lock_after(Some(10));
        let mut delay = FakeDelay::default();

        let ready = bring_up(
            DW1000::new(fake.clone(), fake.chip_select()),
            &mut fake.reset_line(),
            &mut delay,
            &Settings::default(),
        )
        .unwrap();

        assert_eq!(ready.state().config(), &Settings::default().radio);
        assert_eq!(fake.resets(), 1);
        // LEDs were enabled on the way
        assert_eq!(fake.register(0x26, 0)[1], 0b0001_0100);
    }

    #[test]
    fn rejected_configuration_halts_before_the_loop() {
        let fake = FakeDw1000::new().freeze(0x1F, 0);
        let mut input = Once(Some(&b"never sent"[..]), 0);

        let error = run(
            DW1000::new(fake.clone(), fake.chip_select()),
            &mut fake.reset_line(),
            &mut FakeDelay::default(),
            &mut input,
            &Settings::default(),
        );

        assert!(matches!(error, Error::ConfigRejected));
        assert!(error.is_bring_up_failure());
        assert!(fake.frames().is_empty());
        assert_eq!(input.1, 0);
    }

    #[test]
    fn silent_chip_halts_bring_up() {
        let fake = FakeDw1000::new().lock_after(None);
        let settings = Settings {
            idle_budget: PollBudget::Attempts(50),
            ..Settings::default()
        };

        let error = run(
            DW1000::new(fake.clone(), fake.chip_select()),
            &mut fake.reset_line(),
            &mut FakeDelay::default(),
            Once(None, 0),
            &settings,
        );

        assert!(matches!(error, Error::NotResponding(Event::IdleReady)));
        assert_eq!(fake.status_polls(), 50);
    }

    #[test]
    fn run_sends_input_until_the_radio_fails() {
        let fake = FakeDw1000::new().tx_after(None);
        let settings = Settings {
            tx_budget: PollBudget::Attempts(3),
            ..Settings::default()
        };

        let error = run(
            DW1000::new(fake.clone(), fake.chip_select()),
            &mut fake.reset_line(),
            &mut FakeDelay::default(),
            Once(Some(&b"hi"[..]), 0),
            &settings,
        );

        assert!(matches!(error, Error::NotResponding(Event::FrameSent)));
        assert!(!error.is_bring_up_failure());
        assert_eq!(
            fake.frames(),
            vec![vec![0xC5, 0, b'h', b'i', 0, 0, 0, 0, 0, 0, 0, 0]]
        );
    }
}
