//! Domain types shared by the client and the dispatch engine

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Leading `/token`, optional `@botname` suffix, optional arguments.
static SYSTEM_COMMAND_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(/[A-Za-z0-9_]+)(?:@[A-Za-z0-9_]+)?(?:\s+(.*))?$")
        .expect("Invalid system command regex")
});

// ─────────────────────────────────────────────────────────────────
// Device Identifier
// ─────────────────────────────────────────────────────────────────

/// Stable identifier of a chat/device a session is bound to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceId {
    Int(i64),
    Str(String),
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceId::Int(id) => write!(f, "{}", id),
            DeviceId::Str(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for DeviceId {
    fn from(id: i64) -> Self {
        DeviceId::Int(id)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        DeviceId::Str(id.to_string())
    }
}

impl From<String> for DeviceId {
    fn from(id: String) -> Self {
        DeviceId::Str(id)
    }
}

// ─────────────────────────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────────────────────────

/// Content discriminator of an inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Photo,
    Document,
    Location,
    Contact,
    Video,
    Audio,
    Callback,
}

impl MessageKind {
    /// Attachment payloads are delivered through the form's data hook.
    pub fn is_attachment(&self) -> bool {
        matches!(
            self,
            MessageKind::Photo
                | MessageKind::Document
                | MessageKind::Location
                | MessageKind::Contact
                | MessageKind::Video
                | MessageKind::Audio
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Photo => "photo",
            MessageKind::Document => "document",
            MessageKind::Location => "location",
            MessageKind::Contact => "contact",
            MessageKind::Video => "video",
            MessageKind::Audio => "audio",
            MessageKind::Callback => "callback",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized inbound message as delivered by the platform client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub device_id: DeviceId,

    /// Chat title for group chats
    #[serde(default)]
    pub chat_title: Option<String>,

    /// Sender's username, used as title fallback for private chats
    #[serde(default)]
    pub username: Option<String>,

    pub kind: MessageKind,

    /// Text content or attachment caption
    #[serde(default)]
    pub text: Option<String>,

    /// Callback payload of an action
    #[serde(default)]
    pub data: Option<String>,

    /// Attachment payload (file reference, coordinates, contact card...)
    #[serde(default)]
    pub attachment: Option<serde_json::Value>,

    pub date: DateTime<Utc>,
}

impl Message {
    /// Create a plain text message
    pub fn text(device_id: impl Into<DeviceId>, message_id: i64, text: impl Into<String>) -> Self {
        Self {
            message_id,
            device_id: device_id.into(),
            chat_title: None,
            username: None,
            kind: MessageKind::Text,
            text: Some(text.into()),
            data: None,
            attachment: None,
            date: Utc::now(),
        }
    }

    /// Create an attachment message of the given kind
    pub fn attachment(
        device_id: impl Into<DeviceId>,
        message_id: i64,
        kind: MessageKind,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            message_id,
            device_id: device_id.into(),
            chat_title: None,
            username: None,
            kind,
            text: None,
            data: None,
            attachment: Some(payload),
            date: Utc::now(),
        }
    }

    /// Create a callback (action) message carrying `data`
    pub fn callback(device_id: impl Into<DeviceId>, message_id: i64, data: impl Into<String>) -> Self {
        Self {
            message_id,
            device_id: device_id.into(),
            chat_title: None,
            username: None,
            kind: MessageKind::Callback,
            text: None,
            data: Some(data.into()),
            attachment: None,
            date: Utc::now(),
        }
    }

    pub fn with_chat_title(mut self, title: impl Into<String>) -> Self {
        self.chat_title = Some(title.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Chat title, falling back to the sender's username
    pub fn display_title(&self) -> Option<&str> {
        self.chat_title.as_deref().or(self.username.as_deref())
    }

    /// Text content, or the callback payload for actions
    pub fn raw_data(&self) -> &str {
        match self.kind {
            MessageKind::Callback => self.data.as_deref().unwrap_or_default(),
            _ => self.text.as_deref().unwrap_or_default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// System Commands
// ─────────────────────────────────────────────────────────────────

/// A parsed `/command arg1 arg2` message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemCommand {
    /// Command token including the leading `/`, without any `@botname` suffix
    pub token: String,
    pub args: Vec<String>,
}

impl SystemCommand {
    /// Parse command syntax out of message text.
    ///
    /// Returns `None` when the text does not start with a command marker.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = SYSTEM_COMMAND_REGEX.captures(text.trim())?;
        let token = caps.get(1)?.as_str().to_string();
        let args = caps
            .get(2)
            .map(|m| m.as_str().split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        Some(Self { token, args })
    }
}

// ─────────────────────────────────────────────────────────────────
// Updates
// ─────────────────────────────────────────────────────────────────

/// Which entry path of the dispatcher an update takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    Message,
    Edited,
    Action,
}

/// One inbound event from the platform client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub kind: UpdateKind,
    pub message: Message,

    /// Present when the text matched command syntax
    #[serde(default)]
    pub command: Option<SystemCommand>,
}

impl Update {
    fn build(kind: UpdateKind, message: Message) -> Self {
        let command = match (kind, message.kind) {
            (UpdateKind::Action, _) | (_, MessageKind::Callback) => None,
            _ => message.text.as_deref().and_then(SystemCommand::parse),
        };
        Self {
            kind,
            message,
            command,
        }
    }

    /// A newly received message
    pub fn message(message: Message) -> Self {
        Self::build(UpdateKind::Message, message)
    }

    /// An edit of a previously sent message
    pub fn edited(message: Message) -> Self {
        Self::build(UpdateKind::Edited, message)
    }

    /// A callback/action (button press)
    pub fn action(message: Message) -> Self {
        Self::build(UpdateKind::Action, message)
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.message.device_id
    }

    pub fn is_system_call(&self) -> bool {
        self.command.is_some()
    }

    pub fn is_attachment(&self) -> bool {
        self.message.kind.is_attachment()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_display() {
        assert_eq!(DeviceId::from(42).to_string(), "42");
        assert_eq!(DeviceId::from("room-7").to_string(), "room-7");
    }

    #[test]
    fn test_device_id_untagged_serde() {
        let ids = vec![DeviceId::from(42), DeviceId::from("abc")];
        let json = serde_json::to_string(&ids).unwrap();
        assert_eq!(json, r#"[42,"abc"]"#);

        let back: Vec<DeviceId> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ids);
    }

    #[test]
    fn test_attachment_kinds() {
        for kind in [
            MessageKind::Photo,
            MessageKind::Document,
            MessageKind::Location,
            MessageKind::Contact,
            MessageKind::Video,
            MessageKind::Audio,
        ] {
            assert!(kind.is_attachment(), "{} should be an attachment", kind);
        }
        assert!(!MessageKind::Text.is_attachment());
        assert!(!MessageKind::Callback.is_attachment());
    }

    #[test]
    fn test_parse_system_command() {
        let cmd = SystemCommand::parse("/start").unwrap();
        assert_eq!(cmd.token, "/start");
        assert!(cmd.args.is_empty());

        let cmd = SystemCommand::parse("/greet  alice   bob").unwrap();
        assert_eq!(cmd.token, "/greet");
        assert_eq!(cmd.args, vec!["alice", "bob"]);
    }

    #[test]
    fn test_parse_system_command_strips_bot_suffix() {
        let cmd = SystemCommand::parse("/help@demo_bot topics").unwrap();
        assert_eq!(cmd.token, "/help");
        assert_eq!(cmd.args, vec!["topics"]);
    }

    #[test]
    fn test_parse_non_command() {
        assert!(SystemCommand::parse("hello /start").is_none());
        assert!(SystemCommand::parse("/").is_none());
        assert!(SystemCommand::parse("").is_none());
    }

    #[test]
    fn test_update_detects_command() {
        let update = Update::message(Message::text(42, 1, "/start now"));
        assert!(update.is_system_call());
        assert_eq!(update.command.as_ref().unwrap().token, "/start");

        let update = Update::message(Message::text(42, 2, "plain"));
        assert!(!update.is_system_call());
    }

    #[test]
    fn test_action_never_carries_command() {
        let update = Update::action(Message::callback(42, 3, "/start"));
        assert!(!update.is_system_call());
        assert_eq!(update.message.raw_data(), "/start");
    }

    #[test]
    fn test_display_title_fallback() {
        let msg = Message::text(1, 1, "hi").with_username("alice");
        assert_eq!(msg.display_title(), Some("alice"));

        let msg = msg.with_chat_title("Team");
        assert_eq!(msg.display_title(), Some("Team"));

        assert_eq!(Message::text(1, 1, "hi").display_title(), None);
    }
}
