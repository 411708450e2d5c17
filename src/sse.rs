//! Incremental Server-Sent Events framing

/// Splits a byte stream into SSE message payloads.
///
/// Chunks may end anywhere, including inside a line or a multi-byte
/// character; incomplete lines stay buffered until the next push.
#[derive(Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every payload completed by it
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();

        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(payload) = self.handle_line(&line) {
                out.push(payload);
            }
        }
        out
    }

    fn handle_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            if self.data.is_empty() {
                return None;
            }
            let payload = self.data.join("\n");
            self.data.clear();
            return Some(payload);
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        // event/id/retry carry nothing we dispatch on
        if field == "data" {
            self.data.push(value.to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_messages_on_blank_lines() {
        let mut decoder = SseDecoder::new();
        let out = decoder.push(b"data: {\"type\":\"connected\"}\n\ndata: {\"type\":\"heartbeat\"}\n\n");
        assert_eq!(out, vec![r#"{"type":"connected"}"#, r#"{"type":"heartbeat"}"#]);
    }

    #[test]
    fn buffers_partial_lines_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"type\":\"down").is_empty());
        assert!(decoder.push(b"load_progress\"}\r\n").is_empty());
        assert_eq!(decoder.push(b"\r\n"), vec![r#"{"type":"download_progress"}"#]);
    }

    #[test]
    fn keeps_multibyte_characters_split_between_chunks() {
        let mut decoder = SseDecoder::new();
        let bytes = "data: Björk\n\n".as_bytes();
        let split = bytes.iter().position(|&b| b == 0xc3).unwrap() + 1;
        assert!(decoder.push(&bytes[..split]).is_empty());
        assert_eq!(decoder.push(&bytes[split..]), vec!["Björk"]);
    }

    #[test]
    fn ignores_comments_and_other_fields() {
        let mut decoder = SseDecoder::new();
        let out = decoder.push(b": ping\n\nevent: status\nid: 7\ndata: a\ndata: b\n\n");
        assert_eq!(out, vec!["a\nb"]);
    }
}
