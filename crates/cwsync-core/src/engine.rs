//! Incremental synchronization engine.
//!
//! One `SyncClient` owns one session: its token and cursor, the entity cache,
//! and the transport. Nothing here runs in the background; the caller drives
//! every poll cycle:
//!
//! 1. `poll_changes` asks which rooms changed since the cursor and advances it
//! 2. `fetch_room_delta` pulls each changed room's recent chat list, one room at a time
//! 3. `filter::filter_messages` drops seen, stale and out-of-window messages
//! 4. `resolve_person` fills in unknown senders before anything is emitted
//!
//! A failure aborts the rest of the cycle. Rooms already committed in that
//! cycle stay committed and their chats are dropped with the error; the
//! high-water marks keep them from being emitted later.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::config::{Credentials, SyncConfig};
use crate::constants::commands;
use crate::error::{SyncError, SyncResult};
use crate::filter::filter_messages;
use crate::models::{Chat, Person, PersonId, RawMessage, Room, RoomAnchor, RoomId};
use crate::store::{EntityCache, Session};
use crate::transport::{HttpTransport, Transport};
use crate::wire::{
    self, AccountInfoRequest, AccountInfoResult, GetUpdateRequest, LoginRequest, LoginResult,
    RoomInfoResult, SendChatRequest, UpdateResult,
};

/// Source of "now" for the recency window, in Unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Outcome of change detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    /// Cursor after this poll
    pub cursor: String,
    /// Changed rooms that exist in the entity cache
    pub rooms: BTreeSet<RoomId>,
}

/// A room's chat list as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomDelta {
    /// Refreshed chat count, when the service sent one
    pub chat_count: Option<i64>,
    pub messages: Vec<RawMessage>,
}

pub struct SyncClient<T: Transport> {
    transport: T,
    config: SyncConfig,
    clock: Box<dyn Clock>,
    session: Option<Session>,
    cache: EntityCache,
}

impl SyncClient<HttpTransport> {
    /// Client talking to the configured gateway over HTTPS.
    pub fn connect(config: SyncConfig) -> SyncResult<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(transport, config))
    }
}

impl<T: Transport> SyncClient<T> {
    pub fn new(transport: T, config: SyncConfig) -> Self {
        Self {
            transport,
            config,
            clock: Box::new(SystemClock),
            session: None,
            cache: EntityCache::new(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    pub fn rooms(&self) -> Vec<Arc<Room>> {
        self.cache.rooms()
    }

    /// Exchange credentials for a session and load the full room/contact
    /// snapshot, replacing anything cached before.
    ///
    /// Any earlier session is dropped first, so a failed login leaves the
    /// client logged out with an empty cache.
    pub async fn login(&mut self, credentials: &Credentials) -> SyncResult<&Session> {
        self.reset();

        let payload = serde_json::to_value(LoginRequest {
            email: &credentials.email,
            password: &credentials.password,
            login_type: &self.config.login_type,
            with_profile: 1,
        })?;
        let response = self.transport.send(commands::LOGIN, payload, None).await?;
        if !wire::is_success(&response) {
            tracing::warn!(email = %credentials.email, "login rejected");
            return Err(SyncError::Auth(format!(
                "login rejected for {}",
                credentials.email
            )));
        }

        let result = wire::into_result(commands::LOGIN, response)?;
        let snapshot = serde_json::from_value::<LoginResult>(result)?.into_snapshot();
        self.cache.replace_all(snapshot.rooms, snapshot.people);

        tracing::info!(
            email = %credentials.email,
            rooms = self.cache.room_count(),
            people = self.cache.person_count(),
            "logged in"
        );

        let session = Session::new(snapshot.token, snapshot.cursor, snapshot.my_id);
        Ok(&*self.session.insert(session))
    }

    /// Forget the session and everything cached for it.
    pub fn logout(&mut self) {
        if self.session.is_some() {
            tracing::info!("logged out");
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.session = None;
        self.cache.clear();
    }

    async fn call(&self, command: &str, payload: Value) -> SyncResult<Value> {
        let token = self
            .session
            .as_ref()
            .map(Session::token)
            .ok_or(SyncError::NotLoggedIn)?;
        let response = self.transport.send(command, payload, Some(token)).await?;
        wire::into_result(command, response)
    }

    /// Ask which rooms changed since the session cursor.
    ///
    /// The cursor advances on every successful call, even when nothing
    /// changed. Rooms the cache does not know are dropped here; new rooms
    /// only appear through `login`.
    pub async fn poll_changes(&mut self) -> SyncResult<ChangeSet> {
        let cursor = self
            .session
            .as_ref()
            .ok_or(SyncError::NotLoggedIn)?
            .cursor()
            .to_string();

        let payload = serde_json::to_value(GetUpdateRequest { last_id: &cursor })?;
        let result = self.call(commands::GET_UPDATE, payload).await?;
        let update: UpdateResult = serde_json::from_value(result)?;

        let (rooms, unknown): (BTreeSet<RoomId>, BTreeSet<RoomId>) = update
            .update_info
            .changed_room_ids()
            .into_iter()
            .partition(|room_id| self.cache.room(room_id).is_some());
        if !unknown.is_empty() {
            tracing::debug!(?unknown, "ignoring updates for rooms not in cache");
        }

        if let Some(session) = self.session.as_mut() {
            session.advance(update.last_id.clone());
        }

        Ok(ChangeSet {
            cursor: update.last_id,
            rooms,
        })
    }

    /// Fetch one page of a room's recent chats, anchored at `anchor`.
    ///
    /// `Ok(None)` means the response did not include the room; the service
    /// has nothing for it yet.
    pub async fn fetch_room_delta(
        &self,
        room_id: &str,
        anchor: RoomAnchor,
    ) -> SyncResult<Option<RoomDelta>> {
        let payload = wire::room_info_request(room_id, anchor, self.config.page_size);
        let result = self.call(commands::GET_ROOM_INFO, payload).await?;
        let mut info: RoomInfoResult = serde_json::from_value(result)?;

        Ok(info
            .take_room(room_id)
            .map(|(chat_count, messages)| RoomDelta {
                chat_count,
                messages,
            }))
    }

    /// Look people up by id and cache everyone the service returns.
    ///
    /// People already cached are not replaced; the returned handles are the
    /// cached ones.
    pub async fn lookup_people(&mut self, ids: &[PersonId]) -> SyncResult<Vec<Arc<Person>>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let payload = serde_json::to_value(AccountInfoRequest { aid: ids })?;
        let result = self.call(commands::GET_ACCOUNT_INFO, payload).await?;
        let people = serde_json::from_value::<AccountInfoResult>(result)?.into_people();

        let returned: Vec<PersonId> = people.iter().map(|person| person.id).collect();
        let added = self.cache.insert_people(people);
        tracing::debug!(
            requested = ids.len(),
            returned = returned.len(),
            added,
            "looked up people"
        );

        Ok(returned
            .iter()
            .filter_map(|id| self.cache.person(*id).cloned())
            .collect())
    }

    /// Cache-first person lookup.
    pub async fn resolve_person(&mut self, person_id: PersonId) -> SyncResult<Arc<Person>> {
        if let Some(person) = self.cache.person(person_id) {
            return Ok(person.clone());
        }

        self.lookup_people(&[person_id]).await?;
        self.cache
            .person(person_id)
            .cloned()
            .ok_or(SyncError::UnresolvedPerson(person_id))
    }

    /// Run one poll cycle and return the chats it discovered.
    ///
    /// On error nothing is returned, but rooms handled before the failure
    /// keep their advanced state.
    pub async fn poll(&mut self) -> SyncResult<Vec<Chat>> {
        let changes = self.poll_changes().await?;
        let now = self.clock.now();
        let window = self.config.recency_window();
        let mut chats = Vec::new();

        for room_id in &changes.rooms {
            let Some(room) = self.cache.room(room_id).cloned() else {
                continue;
            };

            let Some(delta) = self.fetch_room_delta(room_id, room.anchor()).await? else {
                tracing::debug!(%room_id, "room missing from delta response, skipping");
                continue;
            };

            let outcome = filter_messages(room.state(), &delta.messages, now, window);

            // Resolve every sender before touching the room, so a failed
            // lookup leaves this room to be retried by the next cycle.
            let mut senders = Vec::with_capacity(outcome.accepted.len());
            for message in &outcome.accepted {
                senders.push(self.resolve_person(message.sender_id).await?);
            }

            let chat_count = delta.chat_count.unwrap_or(room.chat_count);
            let Some(committed) = self.cache.commit_room(room_id, outcome.state, chat_count)
            else {
                continue;
            };

            tracing::debug!(
                %room_id,
                fetched = delta.messages.len(),
                accepted = outcome.accepted.len(),
                high_water = committed.high_water_message_id,
                last_update = committed.last_update_timestamp,
                "room delta applied"
            );

            chats.extend(
                outcome
                    .accepted
                    .into_iter()
                    .zip(senders)
                    .map(|(message, sender)| Chat::new(message, sender, committed.clone())),
            );
        }

        tracing::debug!(
            cursor = %changes.cursor,
            rooms = changes.rooms.len(),
            chats = chats.len(),
            "poll cycle complete"
        );
        Ok(chats)
    }

    /// Post a message to a room. Does not touch sync state.
    pub async fn send_message(&self, room_id: &str, text: &str) -> SyncResult<()> {
        let payload = serde_json::to_value(SendChatRequest {
            room_id,
            text,
            last_chat_id: None,
            read: true,
            edit_id: None,
        })?;
        self.call(commands::SEND_CHAT, payload).await?;
        tracing::info!(%room_id, "message sent");
        Ok(())
    }
}
