//! Scripted transport and clock for engine tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::engine::Clock;
use crate::error::{SyncError, SyncResult};
use crate::transport::Transport;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub command: String,
    pub payload: Value,
    pub token: Option<String>,
}

/// Answers each command from its own FIFO queue and records every call.
/// A command with an empty queue fails with a transport error.
#[derive(Default)]
pub struct MockTransport {
    scripted: Mutex<HashMap<String, VecDeque<SyncResult<Value>>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful envelope carrying `result`.
    pub fn respond(&self, command: &str, result: Value) {
        self.respond_raw(command, json!({"status": {"success": true}, "result": result}));
    }

    /// Queue a response exactly as given.
    pub fn respond_raw(&self, command: &str, response: Value) {
        self.push(command, Ok(response));
    }

    pub fn fail(&self, command: &str, err: SyncError) {
        self.push(command, Err(err));
    }

    fn push(&self, command: &str, response: SyncResult<Value>) {
        self.scripted
            .lock()
            .entry(command.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, command: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.command == command)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, command: &str, payload: Value, token: Option<&str>) -> SyncResult<Value> {
        self.calls.lock().push(RecordedCall {
            command: command.to_string(),
            payload,
            token: token.map(str::to_string),
        });
        self.scripted
            .lock()
            .get_mut(command)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(SyncError::Transport(format!(
                    "no scripted response for {}",
                    command
                )))
            })
    }
}

/// Manually driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct FixedClock(Arc<AtomicI64>);

impl FixedClock {
    pub fn new(now: i64) -> Self {
        Self(Arc::new(AtomicI64::new(now)))
    }

    pub fn set(&self, now: i64) {
        self.0.store(now, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn login_result(rooms: Value, people: Value) -> Value {
    json!({
        "token": "tok",
        "myid": "1000",
        "room_dat": rooms,
        "contact_dat": people,
        "announce_id": 0,
        "last_id": "c0",
    })
}

pub fn update_result(cursor: &str, rooms: Value) -> Value {
    json!({
        "last_id": cursor,
        "update_info": {"num": 0, "room": rooms},
    })
}

pub fn room_info_result(room_id: &str, chat_count: i64, chats: Value) -> Value {
    let mut rooms = serde_json::Map::new();
    rooms.insert(
        room_id.to_string(),
        json!({"c": chat_count, "chat_list": chats}),
    );
    json!({ "room_dat": Value::Object(rooms) })
}

pub fn chat(id: i64, sender: i64, timestamp: i64) -> Value {
    json!({"id": id, "aid": sender, "msg": format!("message {}", id), "tm": timestamp, "utm": 0})
}
