use cwsync_core::{Chat, Person, Room};
use serde_json::{json, Value};

pub fn chat_json(chat: &Chat) -> Value {
    json!({
        "id": chat.id,
        "room_id": chat.room.id,
        "room": chat.room.name,
        "sender_id": chat.sender.id,
        "sender": chat.sender.display_name(),
        "time": chat.timestamp.to_rfc3339(),
        "message": chat.message,
    })
}

pub fn room_json(room: &Room) -> Value {
    json!({
        "id": room.id,
        "name": room.name,
        "type": room.kind,
        "chat_count": room.chat_count,
        "last_update": room.last_update_timestamp,
        "members": room.members.len(),
    })
}

pub fn person_json(person: &Person) -> Value {
    json!({
        "id": person.id,
        "cwid": person.external_id,
        "name": person.name,
        "organization": person.organization,
    })
}

pub fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    // Serializing a Value cannot fail
    rendered.unwrap_or_default()
}
