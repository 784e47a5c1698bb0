//! Server-push streams: execution progress and the diagnostics log feed.
//!
//! The progress protocol is three line-oriented text events:
//! `PROCESSING <nodeId>`, `DONE`, and `END <json>` where the JSON carries
//! `{"results": {nodeId: value}}`. Parsing is pure and host-tested; only the
//! EventSource plumbing is browser-bound.

use std::collections::HashMap;

use crate::error::EditorError;
use crate::models::EndPayload;

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Processing(String),
    Done,
    End(HashMap<String, serde_json::Value>),
}

/// Decode one progress event. Unknown event words are skipped (`Ok(None)`)
/// so protocol additions don't break old clients; a malformed `END` payload
/// is an error because results would be silently lost otherwise.
pub fn parse_stream_event(data: &str) -> Result<Option<StreamEvent>, EditorError> {
    let data = data.trim();
    if data == "DONE" {
        return Ok(Some(StreamEvent::Done));
    }
    if let Some(node_id) = data.strip_prefix("PROCESSING ") {
        let node_id = node_id.trim();
        if node_id.is_empty() {
            return Ok(None);
        }
        return Ok(Some(StreamEvent::Processing(node_id.to_string())));
    }
    if let Some(json) = data.strip_prefix("END") {
        let payload: EndPayload = serde_json::from_str(json.trim())
            .map_err(|e| EditorError::StreamFailure(format!("bad END payload: {}", e)))?;
        return Ok(Some(StreamEvent::End(payload.results)));
    }
    Ok(None)
}

#[cfg(target_arch = "wasm32")]
pub use browser::{open_log_stream, open_progress_stream};

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::*;
    use crate::console_warn;
    use crate::messages::Message;
    use crate::state::dispatch_global_message;
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::JsCast;
    use web_sys::{ErrorEvent, EventSource, MessageEvent};

    /// Open the progress stream for an execution token. The stream closes
    /// itself on `END`; any earlier error closes it and reports a
    /// `StreamFailure` (no retry).
    pub fn open_progress_stream(token: &str) -> Result<(), wasm_bindgen::JsValue> {
        let url = super::super::api_url(&format!("/execute/stream/{}", token));
        let source = EventSource::new(&url)?;

        let on_message = {
            let source = source.clone();
            Closure::<dyn FnMut(MessageEvent)>::wrap(Box::new(move |event: MessageEvent| {
                let data = event.data().as_string().unwrap_or_default();
                match parse_stream_event(&data) {
                    Ok(Some(StreamEvent::Processing(node_id))) => {
                        dispatch_global_message(Message::StreamProcessing { node_id });
                    }
                    Ok(Some(StreamEvent::Done)) => {
                        dispatch_global_message(Message::StreamDone);
                    }
                    Ok(Some(StreamEvent::End(results))) => {
                        source.close();
                        dispatch_global_message(Message::StreamEnded { results });
                    }
                    Ok(None) => console_warn!("ignoring unknown stream event: {}", data),
                    Err(err) => {
                        source.close();
                        dispatch_global_message(Message::StreamFailed(err.to_string()));
                    }
                }
            }))
        };
        source.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        on_message.forget();

        let on_error = {
            let source = source.clone();
            Closure::<dyn FnMut(ErrorEvent)>::wrap(Box::new(move |_event: ErrorEvent| {
                // After a normal END we closed the stream ourselves and this
                // handler no longer fires; anything else is a real failure.
                source.close();
                dispatch_global_message(Message::StreamFailed(
                    "progress stream disconnected".to_string(),
                ));
            }))
        };
        source.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_error.forget();

        Ok(())
    }

    /// Open the diagnostics log feed; each message becomes a line in the log
    /// panel. Errors close the feed quietly, the panel is best-effort.
    pub fn open_log_stream() -> Result<(), wasm_bindgen::JsValue> {
        let url = super::super::api_url("/logs");
        let source = EventSource::new(&url)?;

        let on_message =
            Closure::<dyn FnMut(MessageEvent)>::wrap(Box::new(move |event: MessageEvent| {
                if let Some(line) = event.data().as_string() {
                    crate::components::log_panel::append_line(&line);
                }
            }));
        source.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        on_message.forget();

        let on_error = {
            let source = source.clone();
            Closure::<dyn FnMut(ErrorEvent)>::wrap(Box::new(move |_event: ErrorEvent| {
                source.close();
            }))
        };
        source.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_error.forget();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_processing_events() {
        assert_eq!(
            parse_stream_event("PROCESSING node_3").unwrap(),
            Some(StreamEvent::Processing("node_3".into()))
        );
        // Trailing whitespace from the wire is tolerated.
        assert_eq!(
            parse_stream_event("PROCESSING node_3\n").unwrap(),
            Some(StreamEvent::Processing("node_3".into()))
        );
        assert_eq!(parse_stream_event("PROCESSING ").unwrap(), None);
    }

    #[test]
    fn parses_done_and_end() {
        assert_eq!(parse_stream_event("DONE").unwrap(), Some(StreamEvent::Done));
        let parsed = parse_stream_event(r#"END {"results": {"node_1": 42}}"#).unwrap();
        match parsed {
            Some(StreamEvent::End(results)) => assert_eq!(results["node_1"], json!(42)),
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn malformed_end_is_an_error() {
        assert!(parse_stream_event("END {not json").is_err());
    }

    #[test]
    fn unknown_events_are_skipped() {
        assert_eq!(parse_stream_event("HEARTBEAT").unwrap(), None);
        assert_eq!(parse_stream_event("").unwrap(), None);
    }
}
