//! Sends blink frames built from whatever is typed into the RTT terminal

#![no_main]
#![no_std]

use cortex_m_rt::entry;
use panic_semihosting as _;
use rtt_target::{rtt_init, set_print_channel, ChannelMode};
use uwb_blink::{
    app,
    board::{SpimConfig, DWM1001},
    Settings,
};

#[entry]
fn main() -> ! {
    let channels = rtt_init! {
        up: {
            0: {
                size: 1024,
                mode: ChannelMode::NoBlockSkip,
                name: "Terminal"
            }
        }
        down: {
            0: {
                size: 64,
                name: "Terminal"
            }
        }
    };
    set_print_channel(channels.up.0);
    rtt_target::init_logger_with_level(log::LevelFilter::Info);

    let DWM1001 {
        DW1000: radio,
        DW_RST: mut reset,
        mut delay,
    } = match DWM1001::take(SpimConfig::default()) {
        Some(dwm1001) => dwm1001,
        None => park(),
    };

    let settings = Settings::default();
    let error = app::run(radio, &mut reset, &mut delay, channels.down.0, &settings);
    log::error!("transmitter halted: {:?}", error);

    park()
}

fn park() -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}
