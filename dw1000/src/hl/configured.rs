use crate::{Configured, Error, Ready, TxRfConfig, DW1000};
use embedded_hal::{blocking::spi, digital::v2::OutputPin};

impl<SPI, CS> DW1000<SPI, CS, Configured>
where
    SPI: spi::Transfer<u8> + spi::Write<u8>,
    CS: OutputPin,
{
    /// Applies the transmitter calibration and makes the radio ready to send
    ///
    /// Writes TX_POWER and TC_PGDELAY, and enables or disables smart TX power
    /// control in SYS_CFG to match how the power word is meant to be read.
    pub fn configure_tx_rf(
        mut self,
        tx_rf: &TxRfConfig,
    ) -> Result<DW1000<SPI, CS, Ready>, Error<SPI, CS>> {
        self.ll.tx_power().write(|w| w.value(tx_rf.power))?;
        self.ll
            .sys_cfg()
            .modify(|_, w| w.dis_stxp(!tx_rf.smart_power as u8))?;
        self.ll.tc_pgdelay().write(|w| w.value(tx_rf.pg_delay))?;

        log::debug!(
            "DW1000 TX RF: power {:#010x}, pg_delay {:#04x}",
            tx_rf.power,
            tx_rf.pg_delay
        );

        Ok(DW1000 {
            ll: self.ll,
            state: Ready {
                dev_id: self.state.dev_id,
                config: self.state.config,
                tx_rf: *tx_rf,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        mock::{FakeDelay, FakeDw1000},
        PollBudget, RadioConfig, TxRfConfig, DW1000,
    };

    #[test]
    fn tx_rf_lands_in_power_and_pg_delay() {
        let fake = FakeDw1000::new();
        let config = RadioConfig::default();
        // manual mode: the same TXPOWPHR and TXPOWSD setting in every byte
        let tx_rf = TxRfConfig {
            power: 0x85858585,
            smart_power: false,
            pg_delay: 0xC5,
        };

        let dw1000 = DW1000::new(fake.clone(), fake.chip_select())
            .bring_up(
                &mut fake.reset_line(),
                &mut FakeDelay::default(),
                PollBudget::Attempts(5),
            )
            .unwrap()
            .configure(&config)
            .unwrap()
            .configure_tx_rf(&tx_rf)
            .unwrap();

        assert_eq!(dw1000.state().tx_rf(), &tx_rf);
        assert_eq!(fake.register(0x1E, 0), vec![0x85, 0x85, 0x85, 0x85]);
        assert_eq!(fake.register(0x2A, 0x0B), vec![0xC5]);

        // DIS_STXP set, PHR_MODE standard
        let sys_cfg = fake.register(0x04, 0);
        assert_eq!(sys_cfg[2] & 0b0000_0111, 0b0000_0100);
    }
}
