use crate::{
    configs::SfdSequence, Configured, Error, Idle, LedConfig, RadioConfig, DW1000,
};
use embedded_hal::{blocking::spi, digital::v2::OutputPin};

impl<SPI, CS> DW1000<SPI, CS, Idle>
where
    SPI: spi::Transfer<u8> + spi::Write<u8>,
    CS: OutputPin,
{
    /// Configures GPIO2 and GPIO3 to operate as RX and TX LED outputs
    ///
    /// - Note: This means that the function of the gpio pins change
    /// - Note: Both the kilohertz and debounce clock will be turned on or off
    ///
    /// With `init_blink` set, all LEDs flash once right away.
    pub fn configure_leds(&mut self, leds: LedConfig) -> Result<(), Error<SPI, CS>> {
        let enable = leds.enable as u8;

        // The blink timer runs off the debounce and kilohertz clocks
        self.ll
            .pmsc_ctrl0()
            .modify(|_, w| w.gpdce(enable).khzclken(enable))?;

        self.ll
            .pmsc_ledc()
            .modify(|_, w| w.blnken(enable).blink_tim(leds.blink_time))?;

        self.ll
            .gpio_mode()
            .modify(|_, w| w.msgp2(enable).msgp3(enable))?;

        if leds.enable && leds.init_blink {
            self.ll.pmsc_ledc().modify(|_, w| w.blnknow(0b1111))?;
            self.ll.pmsc_ledc().modify(|_, w| w.blnknow(0b0000))?;
        }

        Ok(())
    }

    /// Applies the physical layer configuration
    ///
    /// The configuration is validated first; an invalid one is rejected
    /// without touching the chip. After writing, CHAN_CTRL is read back to
    /// make sure the chip took the settings.
    pub fn configure(
        mut self,
        config: &RadioConfig,
    ) -> Result<DW1000<SPI, CS, Configured>, Error<SPI, CS>> {
        config.validate()?;

        let prf = config.pulse_repetition_frequency;
        let decawave_sfd = (config.sfd_sequence == SfdSequence::Decawave) as u8;

        self.ll.chan_ctrl().modify(|_, w| {
            w.tx_chan(config.channel as u8)
                .rx_chan(config.channel as u8)
                .dwsfd(decawave_sfd)
                .rxprf(prf as u8)
                .tnssfd(0)
                .rnssfd(0)
                .tx_pcode(config.preamble_code)
                .rx_pcode(config.preamble_code)
        })?;

        self.ll
            .sys_cfg()
            .modify(|_, w| w.phr_mode(config.phr_mode as u8))?;

        if let Some(length) = config.sfd_length() {
            self.ll.sfd_length().write(|w| w.value(length))?;
        }

        // Tune for the channel
        self.ll
            .rf_txctrl()
            .write(|w| w.value(config.channel.get_recommended_rf_txctrl()))?;
        self.ll
            .fs_pllcfg()
            .write(|w| w.value(config.channel.get_recommended_fs_pllcfg()))?;
        self.ll
            .fs_plltune()
            .write(|w| w.value(config.channel.get_recommended_fs_plltune()))?;

        let drx_tune2 = prf.get_recommended_drx_tune2(config.pac_size)?;
        self.ll.drx_tune2().write(|w| w.value(drx_tune2))?;
        self.ll
            .drx_sfdtoc()
            .write(|w| w.count(config.sfd_timeout))?;

        let chan_ctrl = self.ll.chan_ctrl().read()?;
        if chan_ctrl.tx_chan() != config.channel as u8
            || chan_ctrl.tx_pcode() != config.preamble_code
            || chan_ctrl.rxprf() != prf as u8
        {
            log::error!("DW1000 refused channel configuration: {:?}", chan_ctrl);
            return Err(Error::ConfigRejected);
        }

        log::debug!(
            "DW1000 configured: channel {}, code {}",
            config.channel as u8,
            config.preamble_code
        );

        Ok(DW1000 {
            ll: self.ll,
            state: Configured {
                dev_id: self.state.dev_id,
                config: *config,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        configs::{PulseRepetitionFrequency, UwbChannel},
        mock::{FakeDelay, FakeDw1000},
        ConfigError, Error, Idle, LedConfig, PollBudget, RadioConfig, DW1000,
    };

    fn idle(fake: &FakeDw1000) -> DW1000<FakeDw1000, crate::mock::FakePin, Idle> {
        DW1000::new(fake.clone(), fake.chip_select())
            .bring_up(
                &mut fake.reset_line(),
                &mut FakeDelay::default(),
                PollBudget::Attempts(5),
            )
            .unwrap()
    }

    #[test]
    fn configure_writes_channel_and_tuning() {
        let fake = FakeDw1000::new();
        let dw1000 = idle(&fake).configure(&RadioConfig::default()).unwrap();

        assert_eq!(dw1000.state().config(), &RadioConfig::default());

        // channel 5 TX/RX, DW SFD, 64 MHz PRF, code 9 TX/RX
        let chan_ctrl = u32::from_le_bytes([
            fake.register(0x1F, 0)[0],
            fake.register(0x1F, 0)[1],
            fake.register(0x1F, 0)[2],
            fake.register(0x1F, 0)[3],
        ]);
        assert_eq!(chan_ctrl, 5 | 5 << 4 | 1 << 17 | 2 << 18 | 9 << 22 | 9 << 27);

        assert_eq!(fake.register(0x21, 0), vec![8]);
        assert_eq!(fake.register(0x2B, 0x0B), vec![0xBE]);
        assert_eq!(fake.register(0x27, 0x08), 0x313B006Bu32.to_le_bytes().to_vec());
        assert_eq!(fake.register(0x27, 0x20), 129u16.to_le_bytes().to_vec());
    }

    #[test]
    fn invalid_configuration_never_reaches_the_chip() {
        let fake = FakeDw1000::new();
        let dw1000 = idle(&fake);
        let before = fake.transactions();

        let config = RadioConfig {
            channel: UwbChannel::Channel4,
            pulse_repetition_frequency: PulseRepetitionFrequency::Mhz64,
            preamble_code: 9,
            ..RadioConfig::default()
        };
        let error = dw1000.configure(&config).unwrap_err();

        assert!(matches!(
            error,
            Error::InvalidConfiguration(ConfigError::PreambleCode { code: 9, .. })
        ));
        assert!(error.is_bring_up_failure());
        assert_eq!(fake.transactions(), before);
    }

    #[test]
    fn refused_configuration_is_reported() {
        let fake = FakeDw1000::new().freeze(0x1F, 0);
        let error = idle(&fake)
            .configure(&RadioConfig::default())
            .unwrap_err();

        assert!(matches!(error, Error::ConfigRejected));
    }

    #[test]
    fn leds_are_routed_and_blinked() {
        let fake = FakeDw1000::new();
        let mut dw1000 = idle(&fake);

        dw1000.configure_leds(LedConfig::default()).unwrap();

        let gpio_mode = fake.register(0x26, 0);
        assert_eq!(gpio_mode[1], 0b0001_0100);
        let ledc = fake.register(0x36, 0x28);
        assert_eq!(ledc[0], 0x10);
        assert_eq!(ledc[1] & 0x01, 0x01);
        // the manual blink trigger is released again
        assert_eq!(ledc[2] & 0x0f, 0);
        let pmsc_ctrl0 = fake.register(0x36, 0);
        assert_eq!(pmsc_ctrl0[2] & 0x84, 0x84);
    }

    #[test]
    fn disabled_leds_switch_everything_back_off() {
        let fake = FakeDw1000::new();
        let mut dw1000 = idle(&fake);
        dw1000.configure_leds(LedConfig::default()).unwrap();

        dw1000.configure_leds(LedConfig::disabled()).unwrap();

        assert_eq!(fake.register(0x26, 0)[1] & 0b0011_1100, 0);
        let ledc = fake.register(0x36, 0x28);
        assert_eq!(ledc[0], 0);
        assert_eq!(ledc[1] & 0x01, 0);
        assert_eq!(ledc[2] & 0x0f, 0);
        assert_eq!(fake.register(0x36, 0)[2] & 0x84, 0);
    }
}
