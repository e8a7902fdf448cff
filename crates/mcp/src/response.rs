// Shaping tool outcomes into MCP call results

use crate::protocol::{CallToolResult, ToolContent};
use crate::tools::ToolOutcome;
use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::Value;
use std::io;

/// Convert a tool outcome into the wire result object.
///
/// - string successes become a single text item;
/// - any other success becomes its canonical JSON text plus
///   `structuredContent` holding the original value;
/// - failures become a text item with `isError: true`.
pub fn shape(outcome: ToolOutcome) -> serde_json::Result<CallToolResult> {
    match outcome {
        ToolOutcome::Success(Value::String(text)) => Ok(CallToolResult {
            content: vec![ToolContent::text(text)],
            structured_content: None,
            is_error: None,
        }),
        ToolOutcome::Success(value) => Ok(CallToolResult {
            content: vec![ToolContent::text(canonical_json(&value)?)],
            structured_content: Some(value),
            is_error: None,
        }),
        ToolOutcome::Failure(message) => Ok(failure(message)),
    }
}

/// Result for a call the rate limiter turned away.
pub fn rate_limited(tool: &str) -> CallToolResult {
    failure(rate_limit_message(tool))
}

pub fn rate_limit_message(tool: &str) -> String {
    format!("Rate limit exceeded for tool '{tool}'.")
}

fn failure(message: String) -> CallToolResult {
    CallToolResult {
        content: vec![ToolContent::text(message)],
        structured_content: None,
        is_error: Some(true),
    }
}

/// Render `value` the way Python's `json.dumps` does by default: `", "` and
/// `": "` separators and ASCII-only output with `\uXXXX` escapes.
pub fn canonical_json(value: &Value) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, SpacedAsciiFormatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(<serde_json::Error as serde::ser::Error>::custom)
}

struct SpacedAsciiFormatter;

impl Formatter for SpacedAsciiFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(fragment[start..index].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = index + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}
