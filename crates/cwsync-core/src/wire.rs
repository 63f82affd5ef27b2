//! Gateway payloads.
//!
//! Every command answers with the same envelope:
//! `{"status": {"success": bool}, "result": {...}}`.
//!
//! The gateway is loosely typed: empty maps arrive as `[]`, optional fields
//! arrive as `null`, ids arrive as strings or numbers. Decoding here is
//! deliberately forgiving. A malformed entry inside a map or list is dropped
//! with a warning instead of failing the whole response.

use std::collections::{BTreeSet, HashMap};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{SyncError, SyncResult};
use crate::models::{Person, PersonId, RawMessage, Room, RoomAnchor, RoomId};

/// True when the envelope reports success.
pub fn is_success(response: &Value) -> bool {
    response
        .pointer("/status/success")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Check the envelope status and hand back its `result` payload.
pub fn into_result(command: &str, mut response: Value) -> SyncResult<Value> {
    if !is_success(&response) {
        return Err(SyncError::Protocol(format!(
            "{}: response status is fail: {}",
            command, response
        )));
    }
    Ok(response
        .get_mut("result")
        .map(Value::take)
        .unwrap_or(Value::Null))
}

// ----------------------------------------------------------------------------
// Requests
// ----------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    #[serde(rename = "type")]
    pub login_type: &'a str,
    pub with_profile: u8,
}

#[derive(Debug, Serialize)]
pub struct GetUpdateRequest<'a> {
    pub last_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct AccountInfoRequest<'a> {
    pub aid: &'a [PersonId],
}

#[derive(Debug, Serialize)]
pub struct SendChatRequest<'a> {
    pub room_id: &'a str,
    pub text: &'a str,
    pub last_chat_id: Option<i64>,
    pub read: bool,
    pub edit_id: Option<i64>,
}

/// `{"i": {"<room>": {"c": chat_count, "u": page_size, "t": last_update, "l": 0}}}`
pub fn room_info_request(room_id: &str, anchor: RoomAnchor, page_size: u32) -> Value {
    let mut rooms = Map::new();
    rooms.insert(
        room_id.to_string(),
        serde_json::json!({
            "c": anchor.chat_count,
            "u": page_size,
            "t": anchor.last_update_timestamp,
            "l": 0,
        }),
    );
    serde_json::json!({ "i": Value::Object(rooms) })
}

// ----------------------------------------------------------------------------
// Results
// ----------------------------------------------------------------------------

/// Everything a successful login hands back.
#[derive(Debug)]
pub struct LoginSnapshot {
    pub token: String,
    pub cursor: String,
    pub my_id: Option<String>,
    pub rooms: Vec<Room>,
    pub people: Vec<Person>,
}

#[derive(Debug, Deserialize)]
pub struct LoginResult {
    pub token: String,
    #[serde(default, deserialize_with = "optional_id")]
    pub myid: Option<String>,
    #[serde(default, deserialize_with = "entry_map")]
    pub room_dat: HashMap<String, Value>,
    #[serde(default, deserialize_with = "entry_map")]
    pub contact_dat: HashMap<String, Value>,
    #[serde(deserialize_with = "cursor")]
    pub last_id: String,
}

impl LoginResult {
    pub fn into_snapshot(self) -> LoginSnapshot {
        let rooms = self
            .room_dat
            .into_iter()
            .filter_map(|(id, value)| {
                decode_entry::<WireRoom>("room", &id, value).map(|room| room.into_room(id))
            })
            .collect();
        let people = decode_people(self.contact_dat);

        LoginSnapshot {
            token: self.token,
            cursor: self.last_id,
            my_id: self.myid,
            rooms,
            people,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateResult {
    #[serde(deserialize_with = "cursor")]
    pub last_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub update_info: UpdateInfo,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateInfo {
    /// Keyed by room id when rooms changed, but the shape is not guaranteed.
    #[serde(default)]
    pub room: Value,
}

impl UpdateInfo {
    /// Room ids reported as changed. Object keys and array entries are both
    /// accepted; anything unrecognizable contributes nothing.
    pub fn changed_room_ids(&self) -> BTreeSet<RoomId> {
        match &self.room {
            Value::Object(rooms) => rooms
                .keys()
                .filter(|id| !id.is_empty())
                .cloned()
                .collect(),
            Value::Array(items) => items.iter().filter_map(room_id_of).collect(),
            _ => BTreeSet::new(),
        }
    }
}

fn room_id_of(value: &Value) -> Option<RoomId> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
pub struct RoomInfoResult {
    #[serde(default, deserialize_with = "entry_map")]
    pub room_dat: HashMap<String, Value>,
}

impl RoomInfoResult {
    /// The chat list and refreshed chat count for one room, if the service sent it.
    pub fn take_room(&mut self, room_id: &str) -> Option<(Option<i64>, Vec<RawMessage>)> {
        let value = self.room_dat.remove(room_id)?;
        let info = decode_entry::<WireRoomInfo>("room info", room_id, value)?;
        let messages = info
            .chat_list
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| {
                decode_entry::<WireChat>("chat", &index.to_string(), value)
            })
            .map(WireChat::into_raw)
            .collect();
        Some((info.c, messages))
    }
}

#[derive(Debug, Deserialize)]
pub struct AccountInfoResult {
    #[serde(default, deserialize_with = "entry_map")]
    pub account_dat: HashMap<String, Value>,
}

impl AccountInfoResult {
    pub fn into_people(self) -> Vec<Person> {
        decode_people(self.account_dat)
    }
}

// ----------------------------------------------------------------------------
// Entities
// ----------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct WirePerson {
    #[serde(default, deserialize_with = "nullable")]
    aid: i64,
    #[serde(default, deserialize_with = "nullable")]
    cwid: String,
    #[serde(default, deserialize_with = "nullable")]
    name: String,
    #[serde(default, deserialize_with = "nullable")]
    onm: String,
}

impl WirePerson {
    /// Falls back to the map key when the record carries no account id.
    fn into_person(self, key: &str) -> Option<Person> {
        let id = if self.aid != 0 {
            self.aid
        } else {
            key.parse().ok()?
        };
        Some(Person {
            id,
            external_id: self.cwid,
            name: self.name,
            organization: self.onm,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct WireRoom {
    #[serde(default, deserialize_with = "nullable")]
    n: String,
    #[serde(default, deserialize_with = "nullable")]
    t: i64,
    #[serde(default, deserialize_with = "nullable")]
    lt: i64,
    #[serde(default, deserialize_with = "nullable")]
    r: i64,
    #[serde(default, deserialize_with = "nullable")]
    c: i64,
    #[serde(default, deserialize_with = "entry_map")]
    m: HashMap<String, Value>,
}

impl WireRoom {
    fn into_room(self, id: RoomId) -> Room {
        let members = self
            .m
            .into_iter()
            .filter_map(|(person, role)| Some((person.parse().ok()?, role.as_i64()?)))
            .collect();
        Room {
            id,
            name: self.n,
            kind: self.t,
            last_update_timestamp: self.lt,
            last_read_count: self.r,
            chat_count: self.c,
            members,
            high_water_message_id: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireRoomInfo {
    #[serde(default)]
    c: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    chat_list: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct WireChat {
    id: i64,
    aid: i64,
    #[serde(default, deserialize_with = "nullable")]
    msg: String,
    tm: i64,
}

impl WireChat {
    fn into_raw(self) -> RawMessage {
        RawMessage {
            id: self.id,
            sender_id: self.aid,
            body: self.msg,
            timestamp: self.tm,
        }
    }
}

fn decode_people(entries: HashMap<String, Value>) -> Vec<Person> {
    entries
        .into_iter()
        .filter_map(|(key, value)| {
            decode_entry::<WirePerson>("person", &key, value)?.into_person(&key)
        })
        .collect()
}

fn decode_entry<T: DeserializeOwned>(kind: &str, key: &str, value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(entry) => Some(entry),
        Err(err) => {
            tracing::warn!(kind, key, error = %err, "discarding malformed entry");
            None
        }
    }
}

// ----------------------------------------------------------------------------
// Field helpers
// ----------------------------------------------------------------------------

/// `null` decodes as the type's default.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A JSON object as a map; `[]`, `null` and other shapes decode as empty.
fn entry_map<'de, D>(deserializer: D) -> Result<HashMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Ok(HashMap::new()),
    }
}

/// Cursors are opaque; the gateway sends them as strings or numbers.
fn cursor<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "invalid cursor: {}",
            other
        ))),
    }
}

fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_result_checks_status() {
        let ok = json!({"status": {"success": true}, "result": {"x": 1}});
        assert_eq!(into_result("cmd", ok).unwrap(), json!({"x": 1}));

        let failed = json!({"status": {"success": false, "message": "bad"}});
        let err = into_result("cmd", failed).unwrap_err();
        assert!(matches!(err, SyncError::Protocol(ref m) if m.contains("cmd")));

        // Missing status counts as failure
        assert!(into_result("cmd", json!({"result": {}})).is_err());
    }

    #[test]
    fn test_login_snapshot_decodes_rooms_and_people() {
        let result = json!({
            "token": "tok",
            "myid": 1000,
            "room_dat": {
                "42": {"n": "General", "t": 2, "lt": 1000, "r": 3, "c": 57, "m": {"7": 1, "8": 2, "bogus": 1}},
                "43": "not a room"
            },
            "contact_dat": {
                "7": {"aid": 7, "cwid": "alice", "name": "Alice", "onm": "Acme"},
                "8": {"cwid": "bob", "name": null, "onm": null}
            },
            "announce_id": null,
            "last_id": "cursor-1"
        });
        let snapshot = serde_json::from_value::<LoginResult>(result)
            .unwrap()
            .into_snapshot();

        assert_eq!(snapshot.token, "tok");
        assert_eq!(snapshot.cursor, "cursor-1");
        assert_eq!(snapshot.my_id.as_deref(), Some("1000"));

        assert_eq!(snapshot.rooms.len(), 1);
        let room = &snapshot.rooms[0];
        assert_eq!(room.id, "42");
        assert_eq!(room.name, "General");
        assert_eq!(room.chat_count, 57);
        assert_eq!(room.last_update_timestamp, 1000);
        assert_eq!(room.members.len(), 2);
        assert_eq!(room.members.get(&8), Some(&2));
        assert_eq!(room.high_water_message_id, 0);

        assert_eq!(snapshot.people.len(), 2);
        let bob = snapshot.people.iter().find(|p| p.id == 8).unwrap();
        assert_eq!(bob.external_id, "bob");
        assert_eq!(bob.name, "");
    }

    #[test]
    fn test_empty_maps_arrive_as_arrays() {
        let result = json!({"token": "t", "room_dat": [], "contact_dat": [], "last_id": 99});
        let snapshot = serde_json::from_value::<LoginResult>(result)
            .unwrap()
            .into_snapshot();
        assert!(snapshot.rooms.is_empty());
        assert!(snapshot.people.is_empty());
        assert_eq!(snapshot.cursor, "99");
    }

    #[test]
    fn test_changed_room_ids_shapes() {
        let object: UpdateResult = serde_json::from_value(json!({
            "last_id": "c2",
            "update_info": {"num": 2, "room": {"42": {"p": 0, "ld": 1, "i": 3}, "43": 1}}
        }))
        .unwrap();
        assert_eq!(
            object.update_info.changed_room_ids().into_iter().collect::<Vec<_>>(),
            vec!["42".to_string(), "43".to_string()]
        );

        let array: UpdateInfo =
            serde_json::from_value(json!({"room": ["42", 43, null, {"x": 1}, ""]})).unwrap();
        assert_eq!(array.changed_room_ids().len(), 2);

        let garbage: UpdateInfo = serde_json::from_value(json!({"room": 17})).unwrap();
        assert!(garbage.changed_room_ids().is_empty());

        let missing: UpdateResult =
            serde_json::from_value(json!({"last_id": "c3", "update_info": null})).unwrap();
        assert!(missing.update_info.changed_room_ids().is_empty());
    }

    #[test]
    fn test_update_without_cursor_is_rejected() {
        assert!(serde_json::from_value::<UpdateResult>(json!({"update_info": {}})).is_err());
    }

    #[test]
    fn test_room_info_discards_malformed_chats() {
        let mut result: RoomInfoResult = serde_json::from_value(json!({
            "room_dat": {
                "42": {
                    "c": 60,
                    "chat_list": [
                        {"id": 101, "aid": 7, "msg": "hi", "tm": 1005, "utm": 0},
                        {"id": "not a number", "aid": 7, "tm": 1006},
                        {"id": 102, "aid": 8, "msg": null, "tm": 1007}
                    ]
                }
            }
        }))
        .unwrap();

        assert!(result.take_room("43").is_none());

        let (chat_count, messages) = result.take_room("42").unwrap();
        assert_eq!(chat_count, Some(60));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, 101);
        assert_eq!(messages[0].body, "hi");
        assert_eq!(messages[1].sender_id, 8);
        assert_eq!(messages[1].body, "");
    }

    #[test]
    fn test_room_info_request_shape() {
        let anchor = RoomAnchor {
            chat_count: 57,
            last_update_timestamp: 1000,
        };
        assert_eq!(
            room_info_request("42", anchor, 20),
            json!({"i": {"42": {"c": 57, "u": 20, "t": 1000, "l": 0}}})
        );
    }

    #[test]
    fn test_account_info_keys_fallback() {
        let result: AccountInfoResult = serde_json::from_value(json!({
            "account_dat": {
                "7": {"cwid": "alice", "name": "Alice", "onm": ""},
                "x": {"name": "no usable id"}
            }
        }))
        .unwrap();
        let people = result.into_people();
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].id, 7);
    }

    #[test]
    fn test_send_chat_request_shape() {
        let request = SendChatRequest {
            room_id: "42",
            text: "hello",
            last_chat_id: None,
            read: true,
            edit_id: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"room_id": "42", "text": "hello", "last_chat_id": null, "read": true, "edit_id": null})
        );
    }
}
