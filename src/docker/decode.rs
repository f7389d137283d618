/// Longest pending line kept while waiting for its terminator.
const MAX_LINE_LEN: usize = 1024 * 1024;

/// Splits a byte stream into `\n`-terminated lines.
///
/// Docker streams one JSON document per line, but body frames do not line up with
/// document boundaries, so partial lines are buffered until their terminator arrives.
/// A partial line growing beyond the limit is dropped.
#[derive(Debug)]
pub(super) struct LineDecoder {
    buf: Vec<u8>,
    max_line_len: usize,
    // the remainder of a dropped line is skipped up to its terminator
    discarding: bool,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::with_max_line_len(MAX_LINE_LEN)
    }
}

impl LineDecoder {
    pub(super) fn with_max_line_len(max_line_len: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_line_len,
            discarding: false,
        }
    }

    pub(super) fn push(&mut self, mut chunk: &[u8]) {
        if self.discarding {
            match chunk.iter().position(|b| *b == b'\n') {
                Some(pos) => {
                    chunk = &chunk[pos + 1..];
                    self.discarding = false;
                }
                None => return,
            }
        }
        self.buf.extend_from_slice(chunk);

        let pending = match self.buf.iter().rposition(|b| *b == b'\n') {
            Some(pos) => self.buf.len() - pos - 1,
            None => self.buf.len(),
        };
        if pending > self.max_line_len {
            log::warn!(
                "dropping unterminated stream line of {} bytes (limit {})",
                pending,
                self.max_line_len
            );
            let keep = self.buf.len() - pending;
            self.buf.truncate(keep);
            self.discarding = true;
        }
    }

    /// Returns the next complete line without its terminator (`\n` or `\r\n`).
    pub(super) fn next_line(&mut self) -> Option<Vec<u8>> {
        let pos = self.buf.iter().position(|b| *b == b'\n')?;
        let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(line)
    }
}
