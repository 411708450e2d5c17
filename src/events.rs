//! Push-stream event model and decoding

use crate::types::DownloadMetadata;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DownloadStarted {
    pub id: String,
    #[serde(default)]
    pub metadata: Option<DownloadMetadata>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DownloadProgress {
    pub id: String,
    #[serde(default)]
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DownloadCompleted {
    pub id: String,
    #[serde(default = "completed_status")]
    pub status: String,
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DownloadFailed {
    pub id: String,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub output: Option<String>,
}

fn completed_status() -> String {
    "completed".to_string()
}

/// One decoded message from `/api/events`
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    Started(DownloadStarted),
    Progress(DownloadProgress),
    Completed(DownloadCompleted),
    Error(DownloadFailed),
    Heartbeat,
    Connected,
    /// Unrecognized `type`, kept for logging
    Unknown(String),
}

impl ServerEvent {
    pub fn kind(&self) -> &str {
        match self {
            ServerEvent::Started(_) => "download_started",
            ServerEvent::Progress(_) => "download_progress",
            ServerEvent::Completed(_) => "download_completed",
            ServerEvent::Error(_) => "download_error",
            ServerEvent::Heartbeat => "heartbeat",
            ServerEvent::Connected => "connected",
            ServerEvent::Unknown(kind) => kind,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EventDecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[source] serde_json::Error),
    #[error("event has no string `type` field")]
    MissingType,
    #[error("malformed `{kind}` payload: {source}")]
    Payload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Decode one event payload (the joined `data:` lines of an SSE message)
pub fn decode_event(payload: &str) -> Result<ServerEvent, EventDecodeError> {
    let value: serde_json::Value = serde_json::from_str(payload).map_err(EventDecodeError::Json)?;
    let kind = value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or(EventDecodeError::MissingType)?
        .to_string();

    let payload_err = |source| EventDecodeError::Payload { kind: kind.clone(), source };

    let event = match kind.as_str() {
        "download_started" => {
            ServerEvent::Started(serde_json::from_value(value).map_err(payload_err)?)
        }
        "download_progress" => {
            ServerEvent::Progress(serde_json::from_value(value).map_err(payload_err)?)
        }
        "download_completed" => {
            ServerEvent::Completed(serde_json::from_value(value).map_err(payload_err)?)
        }
        "download_error" => ServerEvent::Error(serde_json::from_value(value).map_err(payload_err)?),
        "heartbeat" => ServerEvent::Heartbeat,
        "connected" => ServerEvent::Connected,
        _ => ServerEvent::Unknown(kind),
    };
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_started_with_metadata() {
        let event = decode_event(
            r#"{"type":"download_started","id":"dl_1","status":"downloading",
                "metadata":{"title":"Blue Train","artist":"John Coltrane","service":"qobuz","album_art":"https://img/x.jpg"}}"#,
        )
        .unwrap();

        match event {
            ServerEvent::Started(started) => {
                assert_eq!(started.id, "dl_1");
                let meta = started.metadata.unwrap();
                assert_eq!(meta.title.as_deref(), Some("Blue Train"));
                assert_eq!(meta.album_art_url.as_deref(), Some("https://img/x.jpg"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn completed_defaults_status() {
        let event = decode_event(r#"{"type":"download_completed","id":"dl_2"}"#).unwrap();
        assert_eq!(
            event,
            ServerEvent::Completed(DownloadCompleted {
                id: "dl_2".into(),
                status: "completed".into(),
                output: None,
            })
        );
    }

    #[test]
    fn unknown_kind_is_forward_compatible() {
        let event = decode_event(r#"{"type":"queue_reordered","ids":[1,2]}"#).unwrap();
        assert_eq!(event, ServerEvent::Unknown("queue_reordered".into()));
        assert_eq!(event.kind(), "queue_reordered");
    }

    #[test]
    fn heartbeat_and_connected_decode() {
        assert_eq!(decode_event(r#"{"type":"heartbeat"}"#).unwrap(), ServerEvent::Heartbeat);
        assert_eq!(decode_event(r#"{"type":"connected"}"#).unwrap(), ServerEvent::Connected);
    }

    #[test]
    fn malformed_payloads_are_errors() {
        assert!(matches!(decode_event("not json"), Err(EventDecodeError::Json(_))));
        assert!(matches!(decode_event(r#"{"id":"x"}"#), Err(EventDecodeError::MissingType)));
        assert!(matches!(
            decode_event(r#"{"type":"download_progress","output":"x"}"#),
            Err(EventDecodeError::Payload { .. })
        ));
    }
}
