//! The blink frame
//!
//! A fixed 12-byte buffer shaped like an IEEE 802.15.4e blink:
//!
//! | byte  | content                                        |
//! |-------|------------------------------------------------|
//! | 0     | type tag: [`BLINK_TAG`] when ready, else 0     |
//! | 1     | sequence number, wraps at 256                  |
//! | 2..12 | payload, zero padded                           |
//!
//! The type tag doubles as the "ready to send" flag. It is set when fresh
//! payload arrives and cleared after every transmit attempt.

/// Length of the frame, without the FCS the radio appends
pub const FRAME_LEN: usize = 12;

/// Number of payload bytes a frame carries
pub const PAYLOAD_CAPACITY: usize = FRAME_LEN - PAYLOAD_OFFSET;

/// Type tag of a blink frame, marks the frame as ready to send
pub const BLINK_TAG: u8 = 0xC5;

/// Type tag of a frame that has nothing new to send
pub const NOT_READY: u8 = 0x00;

const TAG_IDX: usize = 0;
const SEQ_IDX: usize = 1;
const PAYLOAD_OFFSET: usize = 2;

/// A blink frame buffer
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    /// An empty, not-ready frame with sequence number 0
    pub fn new() -> Self {
        Frame([0; FRAME_LEN])
    }

    /// An empty, not-ready frame starting at `sequence`
    pub fn with_sequence(sequence: u8) -> Self {
        let mut frame = Frame::new();
        frame.0[SEQ_IDX] = sequence;
        frame
    }

    /// Whether the frame holds payload that hasn't been sent yet
    pub fn is_ready(&self) -> bool {
        self.0[TAG_IDX] != NOT_READY
    }

    /// The type tag byte
    pub fn tag(&self) -> u8 {
        self.0[TAG_IDX]
    }

    /// The sequence number
    pub fn sequence(&self) -> u8 {
        self.0[SEQ_IDX]
    }

    /// The payload region
    pub fn payload(&self) -> &[u8] {
        &self.0[PAYLOAD_OFFSET..]
    }

    /// The whole frame as it goes on air
    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// Replaces the payload and marks the frame ready
    ///
    /// At most [`PAYLOAD_CAPACITY`] bytes are taken, the rest of the payload
    /// region is zeroed. Empty `data` leaves the frame untouched. Returns the
    /// number of bytes taken.
    pub fn load_payload(&mut self, data: &[u8]) -> usize {
        let len = data.len().min(PAYLOAD_CAPACITY);
        if len == 0 {
            return 0;
        }

        let payload = &mut self.0[PAYLOAD_OFFSET..];
        payload[..len].copy_from_slice(&data[..len]);
        for byte in &mut payload[len..] {
            *byte = 0;
        }
        self.0[TAG_IDX] = BLINK_TAG;

        len
    }

    /// Advances the sequence number and clears the ready flag
    pub fn mark_sent(&mut self) {
        self.0[SEQ_IDX] = self.0[SEQ_IDX].wrapping_add(1);
        self.0[TAG_IDX] = NOT_READY;
    }

    /// Clears the ready flag without touching the sequence number
    pub fn discard(&mut self) {
        self.0[TAG_IDX] = NOT_READY;
    }
}
