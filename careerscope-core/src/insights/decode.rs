//! Incremental UTF-8 decoding of streamed response bodies

/// Accumulates text from byte chunks that may split multi-byte characters.
///
/// Invalid sequences become U+FFFD. An incomplete trailing sequence is held
/// until the next chunk, or replaced by [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct Utf8Accumulator {
    text: String,
    pending: Vec<u8>,
}

impl Utf8Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);

        let mut start = 0;
        while start < self.pending.len() {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(valid) => {
                    self.text.push_str(valid);
                    start = self.pending.len();
                }
                Err(e) => {
                    let valid_end = start + e.valid_up_to();
                    self.text
                        .push_str(&String::from_utf8_lossy(&self.pending[start..valid_end]));
                    start = valid_end;
                    match e.error_len() {
                        Some(len) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            start += len;
                        }
                        // Incomplete sequence at the end; wait for more bytes
                        None => break,
                    }
                }
            }
        }

        self.pending.drain(..start);
    }

    /// Text decoded so far, excluding any held partial character.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn finish(mut self) -> String {
        if !self.pending.is_empty() {
            self.text.push_str(&String::from_utf8_lossy(&self.pending));
        }
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_multibyte_character() {
        let bytes = "- Lead the café rollout ✓".as_bytes();
        // Split inside both the two-byte "é" and the three-byte "✓"
        let e_pos = bytes.iter().position(|&b| b == 0xC3).unwrap();
        let check_pos = bytes.len() - 2;

        let mut acc = Utf8Accumulator::new();
        acc.push(&bytes[..e_pos + 1]);
        assert_eq!(acc.text(), "- Lead the caf");
        acc.push(&bytes[e_pos + 1..check_pos]);
        acc.push(&bytes[check_pos..]);
        assert_eq!(acc.finish(), "- Lead the café rollout ✓");
    }

    #[test]
    fn test_invalid_bytes_are_replaced() {
        let mut acc = Utf8Accumulator::new();
        acc.push(b"ok \xFF done");
        assert_eq!(acc.finish(), "ok \u{FFFD} done");
    }

    #[test]
    fn test_truncated_tail_is_replaced_on_finish() {
        let mut acc = Utf8Accumulator::new();
        acc.push(&[b'a', 0xE2, 0x9C]);
        assert_eq!(acc.text(), "a");
        assert_eq!(acc.finish(), "a\u{FFFD}");
    }
}
