//! Origin-checked messaging with an embedded sub-frame
//!
//! Messages are JSON objects of the shape `{ "command": ..., "payload": ... }`.
//! Command types are plain serde enums:
//!
//! ```ignore
//! #[derive(Serialize, Deserialize)]
//! #[serde(tag = "command", content = "payload", rename_all = "kebab-case")]
//! enum NftCommand {
//!     UpdateLoading(bool),
//!     ToggleNftModal(bool),
//! }
//!
//! impl FrameCommand for NftCommand {
//!     const COMMANDS: &'static [&'static str] = &["update-loading", "toggle-nft-modal"];
//! }
//!
//! let channel = FrameChannel::new("chrome-untrusted://nft-display");
//! match channel.accept::<NftCommand>(&origin, &data)? {
//!     Some(NftCommand::ToggleNftModal(show)) => { /* ... */ }
//!     _ => {}
//! }
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::FrameError;

/// A tagged union of commands understood on a frame channel.
pub trait FrameCommand: Serialize + DeserializeOwned {
    /// Every recognized `command` tag.
    const COMMANDS: &'static [&'static str];
}

/// An encoded message ready to be posted to the peer frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameMessage {
    pub target_origin: String,
    pub data: String,
}

/// Message channel with one peer frame, identified by its exact origin.
#[derive(Debug, Clone)]
pub struct FrameChannel {
    origin: String,
}

impl FrameChannel {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Validate and decode an incoming message.
    ///
    /// Returns `Ok(None)` for messages without a recognized command; those
    /// are ignored rather than rejected.
    pub fn accept<C: FrameCommand>(&self, origin: &str, data: &str) -> Result<Option<C>, FrameError> {
        if origin != self.origin {
            return Err(FrameError::OriginMismatch {
                origin: origin.to_string(),
            });
        }

        let message: Value = serde_json::from_str(data).map_err(|err| FrameError::Malformed {
            command: String::new(),
            reason: err.to_string(),
        })?;

        let Some(command) = message.get("command").and_then(Value::as_str) else {
            tracing::trace!(origin, "Ignoring frame message without command");
            return Ok(None);
        };
        if !C::COMMANDS.contains(&command) {
            tracing::trace!(origin, command, "Ignoring unknown frame command");
            return Ok(None);
        }

        let command = command.to_string();
        serde_json::from_value(message)
            .map(Some)
            .map_err(|err| FrameError::Malformed {
                command,
                reason: err.to_string(),
            })
    }

    /// Encode a command for the peer frame.
    pub fn post<C: FrameCommand>(&self, command: &C) -> Result<FrameMessage, FrameError> {
        let data = serde_json::to_string(command).map_err(|err| FrameError::Malformed {
            command: String::new(),
            reason: err.to_string(),
        })?;
        Ok(FrameMessage {
            target_origin: self.origin.clone(),
            data,
        })
    }
}
