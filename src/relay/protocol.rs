//! Real-time event types shared by viewers and controllers.
//!
//! Every frame is a JSON object `{"event": "<name>", "data": <payload>}`;
//! `data` is absent for events without a payload.

use serde::{Deserialize, Serialize};

/// Events sent by a client to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Viewer asks for a new session.
    CreateSession,
    /// Controller joins with a session code.
    JoinSession(String),
    OpenLink {
        #[serde(rename = "sessionId")]
        session_id: String,
        url: String,
        #[serde(rename = "useProxy", default)]
        use_proxy: bool,
    },
    Fullscreen(String),
    ExitFullscreen(String),
    Refresh(String),
    GoBack(String),
    /// Viewer reports a page that refused to load in a frame.
    IframeError {
        #[serde(rename = "sessionId")]
        session_id: String,
        url: String,
    },
    OpenInNewTabOnTv {
        #[serde(rename = "sessionId")]
        session_id: String,
        url: String,
    },
}

/// Events sent by the relay to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    SessionCreated(String),
    SessionJoined {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        error: Option<String>,
    },
    PhoneConnected,
    OpenLink {
        url: String,
        #[serde(rename = "useProxy")]
        use_proxy: bool,
    },
    Fullscreen,
    ExitFullscreen,
    Refresh,
    GoBack,
    IframeBlocked(String),
    OpenInNewTab(String),
    TvDisconnected,
    PhoneDisconnected,
    /// A frame from this connection could not be understood.
    Error { code: String, message: String },
}

impl ServerEvent {
    pub fn joined() -> Self {
        ServerEvent::SessionJoined {
            success: true,
            error: None,
        }
    }

    pub fn join_failed(reason: impl Into<String>) -> Self {
        ServerEvent::SessionJoined {
            success: false,
            error: Some(reason.into()),
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerEvent::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}
