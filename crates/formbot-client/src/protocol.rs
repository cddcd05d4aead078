//! Console line protocol
//!
//! Each stdin line becomes one update:
//!
//! | Line | Update |
//! |------|--------|
//! | `!action <data>` | action with callback payload `data` |
//! | `!edit <text>` | edited message |
//! | `!photo <caption>` (also `!document`, `!video`, `!audio`) | attachment |
//! | `!location <lat> <lon>` | location attachment |
//! | `!contact <phone> [name]` | contact attachment |
//! | anything else | text message (commands included) |

use serde_json::json;

use formbot_core::{DeviceId, Message, MessageKind, Update};

/// Parse one console line into an update for `device_id`.
///
/// Returns `None` for blank lines.
pub fn parse_console_line(device_id: &DeviceId, message_id: i64, line: &str) -> Option<Update> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let text_update = || Update::message(Message::text(device_id.clone(), message_id, line));

    let Some(directive) = line.strip_prefix('!') else {
        return Some(text_update());
    };

    let (name, rest) = match directive.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (directive, ""),
    };

    let update = match name {
        "action" => Update::action(Message::callback(device_id.clone(), message_id, rest)),
        "edit" => Update::edited(Message::text(device_id.clone(), message_id, rest)),
        "photo" | "document" | "video" | "audio" => {
            let kind = match name {
                "photo" => MessageKind::Photo,
                "document" => MessageKind::Document,
                "video" => MessageKind::Video,
                _ => MessageKind::Audio,
            };
            let mut message = Message::attachment(
                device_id.clone(),
                message_id,
                kind,
                json!({ "caption": rest }),
            );
            if !rest.is_empty() {
                message = message.with_text(rest);
            }
            Update::message(message)
        }
        "location" => match parse_location(rest) {
            Some((latitude, longitude)) => Update::message(Message::attachment(
                device_id.clone(),
                message_id,
                MessageKind::Location,
                json!({ "latitude": latitude, "longitude": longitude }),
            )),
            None => text_update(),
        },
        "contact" => {
            let mut parts = rest.splitn(2, char::is_whitespace);
            match parts.next().filter(|p| !p.is_empty()) {
                Some(phone) => {
                    let name = parts.next().map(str::trim).unwrap_or_default();
                    Update::message(Message::attachment(
                        device_id.clone(),
                        message_id,
                        MessageKind::Contact,
                        json!({ "phone_number": phone, "first_name": name }),
                    ))
                }
                None => text_update(),
            }
        }
        _ => text_update(),
    };

    Some(update)
}

fn parse_location(rest: &str) -> Option<(f64, f64)> {
    let mut parts = rest.split_whitespace();
    let latitude = parts.next()?.parse().ok()?;
    let longitude = parts.next()?.parse().ok()?;
    Some((latitude, longitude))
}
