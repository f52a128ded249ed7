//! Non-blocking sources of payload bytes

use embedded_hal::serial;

/// A source of payload bytes that never blocks
pub trait InputChannel {
    /// Copies pending bytes into `buf` and returns how many were copied
    ///
    /// Returns 0 when nothing is pending. Implementations must not wait for
    /// input to arrive.
    fn read(&mut self, buf: &mut [u8]) -> usize;
}

impl<T> InputChannel for &mut T
where
    T: InputChannel + ?Sized,
{
    fn read(&mut self, buf: &mut [u8]) -> usize {
        (**self).read(buf)
    }
}

/// Reads from a serial port until it runs dry or the buffer is full
pub struct SerialInput<S>(S);

impl<S> SerialInput<S> {
    /// Wraps a serial receiver
    pub fn new(serial: S) -> Self {
        SerialInput(serial)
    }

    /// Returns the serial receiver
    pub fn free(self) -> S {
        self.0
    }
}

impl<S> InputChannel for SerialInput<S>
where
    S: serial::Read<u8>,
{
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut count = 0;

        while count < buf.len() {
            match self.0.read() {
                Ok(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(_)) => {
                    log::warn!("serial input error, dropping the rest of the read");
                    break;
                }
            }
        }

        count
    }
}

#[cfg(feature = "rt")]
impl InputChannel for rtt_target::DownChannel {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        rtt_target::DownChannel::read(self, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Uart {
        rx: VecDeque<nb::Result<u8, ()>>,
    }

    impl serial::Read<u8> for Uart {
        type Error = ();

        fn read(&mut self) -> nb::Result<u8, ()> {
            self.rx.pop_front().unwrap_or(Err(nb::Error::WouldBlock))
        }
    }

    fn uart(bytes: &[u8]) -> Uart {
        Uart {
            rx: bytes.iter().map(|b| Ok(*b)).collect(),
        }
    }

    #[test]
    fn serial_read_stops_when_idle() {
        let mut input = SerialInput::new(uart(b"hey"));
        let mut buf = [0; 10];

        assert_eq!(input.read(&mut buf), 3);
        assert_eq!(&buf[..3], b"hey");
        assert_eq!(input.read(&mut buf), 0);
    }

    #[test]
    fn serial_read_respects_buffer_size() {
        let mut input = SerialInput::new(uart(b"0123456789AB"));
        let mut buf = [0; 10];

        assert_eq!(input.read(&mut buf), 10);
        assert_eq!(input.read(&mut buf), 2);
        assert_eq!(&buf[..2], b"AB");
    }

    #[test]
    fn serial_errors_end_the_read() {
        let mut rx: VecDeque<_> = uart(b"ab").rx;
        rx.push_back(Err(nb::Error::Other(())));
        rx.push_back(Ok(b'c'));
        let mut input = SerialInput::new(Uart { rx });
        let mut buf = [0; 10];

        assert_eq!(input.read(&mut buf), 2);
        assert_eq!(input.read(&mut buf), 1);
    }
}
