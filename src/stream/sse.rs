use serde::de::DeserializeOwned;

pub const DATA_PREFIX: &str = "data: ";

/// Carry-over buffer for a chunked event stream.
///
/// Lines are split on raw bytes so that a multi-byte UTF-8 sequence cut by a
/// chunk boundary is only decoded once the whole line has arrived.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    carry: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns the payloads of every completed `data:` line.
    /// The trailing partial line stays buffered for the next chunk.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.carry.extend_from_slice(chunk);

        let Some(last_newline) = self.carry.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let rest = self.carry.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.carry, rest);

        complete
            .split(|&b| b == b'\n')
            .filter_map(extract_payload)
            .collect()
    }

    /// Flushes the buffered remainder at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.carry);
        extract_payload(&rest)
    }

    pub fn discard(&mut self) {
        self.carry.clear();
    }

    pub fn pending_len(&self) -> usize {
        self.carry.len()
    }
}

fn extract_payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let payload = line.strip_prefix(DATA_PREFIX)?.trim();
    if payload.is_empty() {
        None
    } else {
        Some(payload.to_string())
    }
}

/// Decodes one frame payload. Callers treat failure as a dropped frame, not a
/// session error.
pub fn decode_frame<T: DeserializeOwned>(payload: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(payload)
}
