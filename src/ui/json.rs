//! `--json` output: one JSON object per line, each tagged with a `type`.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;

/// Write a single NDJSON event (one JSON object per line).
pub fn write_event(out: &mut impl Write, event: &Value) -> io::Result<()> {
    let line = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    out.write_all(line.as_bytes())?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Convenience helper that writes to stdout.
pub fn emit(event: Value) -> io::Result<()> {
    let mut out = io::stdout().lock();
    write_event(&mut out, &event)
}

/// `payload`'s fields under a `type` tag. Non-object payloads land in `data`.
pub fn tagged(kind: &str, payload: &impl Serialize) -> Value {
    let mut event = serde_json::Map::new();
    event.insert("type".to_string(), Value::String(kind.to_string()));
    match serde_json::to_value(payload) {
        Ok(Value::Object(fields)) => event.extend(fields),
        Ok(other) => {
            event.insert("data".to_string(), other);
        }
        Err(e) => {
            event.insert("error".to_string(), Value::String(e.to_string()));
        }
    }
    Value::Object(event)
}
