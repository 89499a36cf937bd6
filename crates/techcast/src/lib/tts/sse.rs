/// Incremental decoder for `text/event-stream` bodies. Yields the `data`
/// payload of every complete event; bytes of a partially received line stay
/// buffered until the next push.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to hold no line break
    scanned: usize,
    data: Vec<String>,
}

impl SseDecoder {
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        let mut start = 0;
        let mut from = self.scanned;
        while let Some(offset) = self.buffer[from..].iter().position(|b| *b == b'\n') {
            let end = from + offset + 1;
            let line = String::from_utf8_lossy(&self.buffer[start..end]).into_owned();
            self.handle_line(line.trim_end_matches(['\n', '\r']), &mut events);
            start = end;
            from = end;
        }
        self.buffer.drain(..start);
        self.scanned = self.buffer.len();
        events
    }

    /// Flushes a final event the server did not terminate with a blank line
    pub(crate) fn finish(&mut self) -> Vec<String> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            self.scanned = 0;
            let line = String::from_utf8_lossy(&rest);
            self.handle_line(line.trim_end_matches(['\n', '\r']), &mut events);
        }
        self.dispatch(&mut events);
        events
    }

    fn handle_line(&mut self, line: &str, events: &mut Vec<String>) {
        if line.is_empty() {
            self.dispatch(events);
        } else if let Some(value) = line.strip_prefix("data:") {
            self.data
                .push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
        // comments (":") and other fields (event, id, retry) carry nothing we use
    }

    fn dispatch(&mut self, events: &mut Vec<String>) {
        if !self.data.is_empty() {
            events.push(self.data.join("\n"));
            self.data.clear();
        }
    }
}
