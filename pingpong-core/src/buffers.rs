//! Fixed write buffers
//!
//! Two 10-byte sequences are sent in turn: `0x00..=0x09` and its reverse.

/// Length of every transfer
pub const DATA_LENGTH: usize = 10;

/// Ascending sequence
pub static WR_BUFFER: [u8; DATA_LENGTH] = [0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09];

/// Descending sequence
pub static WR_BUFFER_REVERSED: [u8; DATA_LENGTH] =
    [0x09, 0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01, 0x00];

/// Which of the two write buffers a packet references
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteBuffer {
    Forward,
    Reversed,
}

impl WriteBuffer {
    /// Bytes of this buffer
    pub fn data(self) -> &'static [u8; DATA_LENGTH] {
        match self {
            WriteBuffer::Forward => &WR_BUFFER,
            WriteBuffer::Reversed => &WR_BUFFER_REVERSED,
        }
    }

    /// Buffer to send after `current`
    ///
    /// Decided by the first byte of the data currently referenced: `0x00` means
    /// the forward buffer went last, so the reversed one is next. Any other
    /// value (including empty data) selects the forward buffer.
    pub fn after(current: &[u8]) -> Self {
        match current.first() {
            Some(0x00) => WriteBuffer::Reversed,
            _ => WriteBuffer::Forward,
        }
    }

    /// The other buffer
    pub fn toggled(self) -> Self {
        match self {
            WriteBuffer::Forward => WriteBuffer::Reversed,
            WriteBuffer::Reversed => WriteBuffer::Forward,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_buffers_are_reverses() {
        let mut reversed = WR_BUFFER;
        reversed.reverse();
        assert_eq!(reversed, WR_BUFFER_REVERSED);
        assert_eq!(WR_BUFFER[0], 0x00);
        assert_eq!(WR_BUFFER_REVERSED[0], 0x09);
    }

    #[test]
    fn test_after_alternates() {
        assert_eq!(WriteBuffer::after(&WR_BUFFER), WriteBuffer::Reversed);
        assert_eq!(WriteBuffer::after(&WR_BUFFER_REVERSED), WriteBuffer::Forward);
        assert_eq!(WriteBuffer::after(&[]), WriteBuffer::Forward);
    }

    #[test]
    fn test_after_matches_toggled() {
        for buffer in [WriteBuffer::Forward, WriteBuffer::Reversed] {
            assert_eq!(WriteBuffer::after(buffer.data()), buffer.toggled());
        }
    }

    proptest! {
        #[test]
        fn prop_only_zero_first_byte_selects_reversed(data in proptest::collection::vec(any::<u8>(), 0..16)) {
            let next = WriteBuffer::after(&data);
            let expect_reversed = data.first() == Some(&0x00);
            prop_assert_eq!(next == WriteBuffer::Reversed, expect_reversed);
        }

        #[test]
        fn prop_even_number_of_toggles_is_identity(n in 0usize..64) {
            let mut buffer = WriteBuffer::Forward;
            for _ in 0..(n * 2) {
                buffer = WriteBuffer::after(buffer.data());
            }
            prop_assert_eq!(buffer, WriteBuffer::Forward);
        }
    }
}
