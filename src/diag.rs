//! Frame dumps for the log

use core::fmt::{self, Write as _};

use heapless::String;

use crate::frame::Frame;

/// Formats bytes as space separated hex followed by their printable ASCII
///
/// `c5 00 41 42 |..AB|`
pub struct HexDump<'a>(pub &'a [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x} ", byte)?;
        }

        f.write_char('|')?;
        for byte in self.0 {
            let c = if byte.is_ascii_graphic() || *byte == b' ' {
                *byte as char
            } else {
                '.'
            };
            f.write_char(c)?;
        }
        f.write_char('|')
    }
}

/// The label printed in front of a frame dump
pub fn frame_label(len: usize) -> String<16> {
    let mut label = String::new();
    // overflow leaves the label empty
    if write!(label, "len {}", len).is_err() {
        label.clear();
    }
    label
}

/// Logs a frame at info level
pub fn log_frame(frame: &Frame) {
    let bytes = frame.as_bytes();
    log::info!("{}: {}", frame_label(bytes.len()), HexDump(bytes));
}
