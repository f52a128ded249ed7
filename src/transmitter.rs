//! The transmit loop
//!
//! [`BlinkTransmitter`] owns the frame and the ready radio. Each cycle pulls
//! whatever input is pending into the frame and, if the frame is ready,
//! sends it, waits for the chip to report completion and pauses for the
//! inter-frame delay.

use dw1000_radio::{Error, PollBudget, Ready, DW1000};
use embedded_hal::{
    blocking::{delay::DelayMs, spi},
    digital::v2::OutputPin,
};

use crate::{
    diag,
    frame::{Frame, PAYLOAD_CAPACITY},
    input::InputChannel,
    settings::Settings,
};

/// What a call to [`BlinkTransmitter::run_cycle`] did
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Cycle {
    /// Nothing was ready, nothing was sent
    Idle,

    /// A frame went out
    Sent {
        /// Sequence number the frame carried
        sequence: u8,
    },
}

/// Sends blink frames built from interactive input
pub struct BlinkTransmitter<SPI, CS, IN> {
    radio: DW1000<SPI, CS, Ready>,
    input: IN,
    frame: Frame,
    inter_frame_delay_ms: u32,
    tx_budget: PollBudget,
}

impl<SPI, CS, IN> BlinkTransmitter<SPI, CS, IN>
where
    SPI: spi::Transfer<u8> + spi::Write<u8>,
    CS: OutputPin,
    IN: InputChannel,
{
    /// Starts with an empty frame at sequence number 0
    pub fn new(radio: DW1000<SPI, CS, Ready>, input: IN, settings: &Settings) -> Self {
        Self::with_frame(radio, input, Frame::new(), settings)
    }

    /// Starts with the given frame
    pub fn with_frame(
        radio: DW1000<SPI, CS, Ready>,
        input: IN,
        frame: Frame,
        settings: &Settings,
    ) -> Self {
        BlinkTransmitter {
            radio,
            input,
            frame,
            inter_frame_delay_ms: settings.inter_frame_delay_ms,
            tx_budget: settings.tx_budget,
        }
    }

    /// The current frame
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Gives back the radio and the input channel
    pub fn free(self) -> (DW1000<SPI, CS, Ready>, IN) {
        (self.radio, self.input)
    }

    /// Moves pending input into the frame
    ///
    /// Reads at most [`PAYLOAD_CAPACITY`] bytes. When something arrived, it
    /// replaces the payload and the frame becomes ready; otherwise the frame
    /// is left alone. Returns the number of bytes taken.
    pub fn ingest_input(&mut self) -> usize {
        let mut scratch = [0u8; PAYLOAD_CAPACITY];

        // Don't trust the channel to stay within the buffer it was given
        let count = self.input.read(&mut scratch).min(scratch.len());

        self.frame.load_payload(&scratch[..count])
    }

    /// Runs one iteration of the transmit loop
    ///
    /// Ingests input, then sends the frame if it is ready. After a successful
    /// send the inter-frame delay is waited out, the sequence number advances
    /// and the frame goes back to not ready. A failed send also clears the
    /// ready flag, so the same frame is never retried, but keeps the sequence
    /// number.
    pub fn run_cycle<D>(&mut self, delay: &mut D) -> Result<Cycle, Error<SPI, CS>>
    where
        D: DelayMs<u32>,
    {
        self.ingest_input();

        if !self.frame.is_ready() {
            return Ok(Cycle::Idle);
        }

        diag::log_frame(&self.frame);

        let budget = self.tx_budget;
        let sent = self
            .radio
            .transmit(self.frame.as_bytes())
            .and_then(|sending| sending.wait_for_completion(budget));

        if let Err(error) = sent {
            self.frame.discard();
            return Err(error);
        }

        delay.delay_ms(self.inter_frame_delay_ms);

        let sequence = self.frame.sequence();
        self.frame.mark_sent();

        Ok(Cycle::Sent { sequence })
    }

    /// Runs the transmit loop until something goes wrong
    pub fn run<D>(&mut self, delay: &mut D) -> Error<SPI, CS>
    where
        D: DelayMs<u32>,
    {
        loop {
            if let Err(error) = self.run_cycle(delay) {
                return error;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{BLINK_TAG, NOT_READY};
    use dw1000_radio::{
        mock::{FakeDelay, FakeDw1000, FakePin},
        Event,
    };
    use std::collections::VecDeque;

    /// Hands out one queued chunk per read
    ///
    /// With `overreport` set, it claims the full chunk length even when the
    /// buffer was shorter.
    #[derive(Default)]
    struct Script {
        chunks: VecDeque<Vec<u8>>,
        overreport: bool,
        reads: usize,
    }

    impl Script {
        fn push(&mut self, chunk: &[u8]) {
            self.chunks.push_back(chunk.to_vec());
        }
    }

    impl InputChannel for Script {
        fn read(&mut self, buf: &mut [u8]) -> usize {
            self.reads += 1;
            let chunk = match self.chunks.pop_front() {
                Some(chunk) => chunk,
                None => return 0,
            };

            let len = chunk.len().min(buf.len());
            buf[..len].copy_from_slice(&chunk[..len]);

            if self.overreport {
                chunk.len()
            } else {
                len
            }
        }
    }

    type Transmitter = BlinkTransmitter<FakeDw1000, FakePin, Script>;

    fn transmitter(fake: &FakeDw1000, frame: Frame) -> Transmitter {
        let settings = Settings::default();
        let radio = DW1000::new(fake.clone(), fake.chip_select())
            .bring_up(
                &mut fake.reset_line(),
                &mut FakeDelay::default(),
                settings.idle_budget,
            )
            .unwrap()
            .configure(&settings.radio)
            .unwrap()
            .configure_tx_rf(&settings.tx_rf)
            .unwrap();

        BlinkTransmitter::with_frame(radio, Script::default(), frame, &settings)
    }

    #[test]
    fn ingest_stays_inside_the_payload() {
        for overreport in [false, true] {
            for n in 0..=PAYLOAD_CAPACITY + 5 {
                let fake = FakeDw1000::new();
                let mut tx = transmitter(&fake, Frame::with_sequence(42));
                tx.input.overreport = overreport;
                let data: Vec<u8> = (1..=n as u8).collect();
                tx.input.push(&data);

                let taken = tx.ingest_input();
                let bytes = tx.frame().as_bytes();

                assert_eq!(taken, n.min(PAYLOAD_CAPACITY));
                assert_eq!(bytes[1], 42);
                assert_eq!(&bytes[2..2 + taken], &data[..taken]);
                assert!(bytes[2 + taken..].iter().all(|b| *b == 0));
                if n == 0 {
                    assert_eq!(tx.frame(), &Frame::with_sequence(42));
                } else {
                    assert_eq!(bytes[0], BLINK_TAG);
                }
            }
        }
    }

    #[test]
    fn short_input_is_zero_padded() {
        let fake = FakeDw1000::new();
        let mut tx = transmitter(&fake, Frame::new());
        tx.input.push(b"ABCDEFGH");

        assert_eq!(tx.ingest_input(), 8);

        let bytes = tx.frame().as_bytes();
        assert_eq!(bytes[0], BLINK_TAG);
        assert_eq!(&bytes[2..10], b"ABCDEFGH");
        assert_eq!(&bytes[10..], &[0u8, 0]);
    }

    #[test]
    fn empty_input_leaves_frame_alone() {
        let fake = FakeDw1000::new();
        let mut ready = Frame::with_sequence(5);
        ready.load_payload(b"pending");
        let mut tx = transmitter(&fake, ready.clone());

        assert_eq!(tx.ingest_input(), 0);
        assert_eq!(tx.frame(), &ready);
    }

    #[test]
    fn cycles_without_input_send_nothing() {
        let fake = FakeDw1000::new();
        let mut tx = transmitter(&fake, Frame::with_sequence(17));
        let mut delay = FakeDelay::default();

        assert_eq!(tx.run_cycle(&mut delay).unwrap(), Cycle::Idle);
        assert_eq!(tx.run_cycle(&mut delay).unwrap(), Cycle::Idle);

        assert!(fake.frames().is_empty());
        assert_eq!(tx.frame().sequence(), 17);
        assert!(delay.calls.is_empty());
        assert_eq!(tx.input.reads, 2);
    }

    #[test]
    fn sent_frame_advances_sequence_and_clears_ready() {
        let fake = FakeDw1000::new().tx_after(Some(3));
        let mut tx = transmitter(&fake, Frame::with_sequence(4));
        let mut delay = FakeDelay::default();
        tx.input.push(b"hello");

        assert_eq!(tx.run_cycle(&mut delay).unwrap(), Cycle::Sent { sequence: 4 });

        assert_eq!(
            fake.frames(),
            vec![vec![BLINK_TAG, 4, b'h', b'e', b'l', b'l', b'o', 0, 0, 0, 0, 0]]
        );
        assert_eq!(delay.calls, vec![10]);
        assert_eq!(tx.frame().sequence(), 5);
        assert_eq!(tx.frame().tag(), NOT_READY);

        // the same payload is not sent again
        assert_eq!(tx.run_cycle(&mut delay).unwrap(), Cycle::Idle);
        assert_eq!(fake.frames().len(), 1);
    }

    #[test]
    fn sequence_counts_successful_cycles() {
        let fake = FakeDw1000::new();
        let mut tx = transmitter(&fake, Frame::with_sequence(250));
        let mut delay = FakeDelay::default();

        for i in 0..300u32 {
            tx.input.push(&i.to_le_bytes());
            tx.run_cycle(&mut delay).unwrap();
        }

        assert_eq!(tx.frame().sequence(), ((250 + 300) % 256) as u8);
        assert_eq!(fake.frames().len(), 300);
        assert_eq!(delay.total_ms(), 300 * 10);
    }

    #[test]
    fn sequence_wraps_to_zero() {
        let fake = FakeDw1000::new();
        let mut tx = transmitter(&fake, Frame::with_sequence(255));
        tx.input.push(b"x");

        assert_eq!(
            tx.run_cycle(&mut FakeDelay::default()).unwrap(),
            Cycle::Sent { sequence: 255 }
        );
        assert_eq!(tx.frame().sequence(), 0);
    }

    #[test]
    fn transmit_follows_the_ready_flag() {
        let fake = FakeDw1000::new();
        let mut tx = transmitter(&fake, Frame::new());
        let mut delay = FakeDelay::default();

        let script: [&[u8]; 6] = [b"a", b"", b"", b"bc", b"d", b""];

        let mut sent = 0;
        for chunk in script.iter() {
            tx.input.push(chunk);
            tx.ingest_input();
            let ready = tx.frame().is_ready();
            // the input was already taken, the cycle's own read finds nothing
            let cycle = tx.run_cycle(&mut delay).unwrap();

            assert_eq!(ready, cycle != Cycle::Idle);
            if ready {
                sent += 1;
            }
            assert_eq!(fake.frames().len(), sent);
        }
        assert_eq!(sent, 3);
    }

    #[test]
    fn failed_send_drops_the_frame_but_keeps_sequence() {
        let fake = FakeDw1000::new().tx_after(None);
        let mut tx = transmitter(&fake, Frame::with_sequence(8));
        let mut delay = FakeDelay::default();
        tx.input.push(b"lost");

        let error = tx.run_cycle(&mut delay).unwrap_err();

        assert!(matches!(error, Error::NotResponding(Event::FrameSent)));
        assert_eq!(tx.frame().tag(), NOT_READY);
        assert_eq!(tx.frame().sequence(), 8);
        assert!(delay.calls.is_empty());
    }

    #[test]
    fn run_returns_the_first_error() {
        let fake = FakeDw1000::new().tx_after(None);
        let mut tx = transmitter(&fake, Frame::new());
        tx.input.push(b"ping");

        let error = tx.run(&mut FakeDelay::default());

        assert!(matches!(error, Error::NotResponding(Event::FrameSent)));
        assert_eq!(fake.frames().len(), 1);
    }
}
