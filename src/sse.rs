//! SSE (Server-Sent Events) stream parser.
//!
//! Subscriptions are delivered as SSE. The format consists of:
//! - `event: <type>` - event type line
//! - `data: <json>` - data payload line (may repeat)
//! - Empty line - signals end of event
//! - Lines starting with `:` - comments (ignored)

/// Represents a parsed SSE line
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    /// Event type declaration (e.g., "event: next")
    Event(String),
    /// Data payload (e.g., "data: {\"data\": {}}")
    Data(String),
    /// Empty line - signals end of event
    Empty,
    /// Comment line (starts with ':')
    Comment(String),
}

/// A complete SSE event.
#[derive(Debug, Clone, PartialEq)]
pub struct SseMessage {
    /// Explicit event type, if the server sent one
    pub event: Option<String>,
    /// Data lines joined with `\n`
    pub data: String,
}

impl SseMessage {
    /// True for the event that ends a subscription.
    pub fn is_complete(&self) -> bool {
        self.event.as_deref() == Some("complete")
    }
}

/// Parse a single SSE line into its component type
pub fn parse_sse_line(line: &str) -> SseLine {
    if line.is_empty() {
        return SseLine::Empty;
    }

    if let Some(stripped) = line.strip_prefix(':') {
        return SseLine::Comment(stripped.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("event:") {
        return SseLine::Event(rest.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("data:") {
        return SseLine::Data(rest.trim().to_string());
    }

    // Unknown line format - treat as comment
    SseLine::Comment(line.to_string())
}

/// Stateful SSE parser that accumulates chunks and emits complete events.
#[derive(Debug, Default)]
pub struct SseParser {
    /// Bytes of an unfinished line
    pending: Vec<u8>,
    /// Current event type being accumulated
    current_event_type: Option<String>,
    /// Accumulated data lines
    data_buffer: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a raw chunk, returning every event it completes.
    ///
    /// Chunks may split lines (and UTF-8 sequences) anywhere.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseMessage> {
        self.pending.extend_from_slice(chunk);

        let mut messages = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(message) = self.feed_line(&line) {
                messages.push(message);
            }
        }
        messages
    }

    /// Feed one line (without its terminator).
    pub fn feed_line(&mut self, line: &str) -> Option<SseMessage> {
        match parse_sse_line(line) {
            SseLine::Event(event_type) => {
                self.current_event_type = Some(event_type);
                None
            }
            SseLine::Data(data) => {
                self.data_buffer.push(data);
                None
            }
            SseLine::Empty => self.try_emit_event(),
            SseLine::Comment(_) => None,
        }
    }

    fn try_emit_event(&mut self) -> Option<SseMessage> {
        if self.current_event_type.is_none() && self.data_buffer.is_empty() {
            return None;
        }

        let message = SseMessage {
            event: self.current_event_type.take(),
            data: self.data_buffer.join("\n"),
        };
        self.data_buffer.clear();
        Some(message)
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.pending.clear();
        self.current_event_type = None;
        self.data_buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lines() {
        assert_eq!(parse_sse_line(""), SseLine::Empty);
        assert_eq!(parse_sse_line(": keepalive"), SseLine::Comment("keepalive".into()));
        assert_eq!(parse_sse_line("event: next"), SseLine::Event("next".into()));
        assert_eq!(parse_sse_line("data: {}"), SseLine::Data("{}".into()));
        assert_eq!(parse_sse_line("retry: 10"), SseLine::Comment("retry: 10".into()));
    }

    #[test]
    fn test_feed_complete_event() {
        let mut parser = SseParser::new();
        let messages = parser.feed(b"event: next\ndata: {\"data\":1}\n\n");
        assert_eq!(
            messages,
            vec![SseMessage {
                event: Some("next".into()),
                data: "{\"data\":1}".into()
            }]
        );
    }

    #[test]
    fn test_feed_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"data: {\"a\"").is_empty());
        assert!(parser.feed(b":1}\r\n").is_empty());
        let messages = parser.feed(b"\r\n");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].event, None);
        assert_eq!(messages[0].data, "{\"a\":1}");
    }

    #[test]
    fn test_multiple_data_lines_are_joined() {
        let mut parser = SseParser::new();
        let messages = parser.feed(b"data: line1\ndata: line2\n\n");
        assert_eq!(messages[0].data, "line1\nline2");
    }

    #[test]
    fn test_complete_event() {
        let mut parser = SseParser::new();
        let messages = parser.feed(b"event: complete\n\n");
        assert!(messages[0].is_complete());
    }

    #[test]
    fn test_blank_lines_without_event_emit_nothing() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"\n\n: ping\n\n").is_empty());
    }

    #[test]
    fn test_reset() {
        let mut parser = SseParser::new();
        parser.feed(b"event: next\ndata: partial");
        parser.reset();
        assert!(parser.feed(b"\n").is_empty());
    }
}
