use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{Person, PersonId, Room, RoomState};

/// Local mirror of rooms and people - single source of truth for entity lookups.
/// Replaced wholesale on login, updated incrementally by polls.
///
/// Entries are handed out as `Arc`s. A room update swaps in a new `Arc`, so
/// chats emitted earlier keep the room as it was when they were produced.
#[derive(Debug, Default)]
pub struct EntityCache {
    rooms: HashMap<String, Arc<Room>>,
    people: HashMap<PersonId, Arc<Person>>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything and load a fresh snapshot.
    pub fn replace_all(
        &mut self,
        rooms: impl IntoIterator<Item = Room>,
        people: impl IntoIterator<Item = Person>,
    ) {
        self.rooms = rooms
            .into_iter()
            .map(|room| (room.id.clone(), Arc::new(room)))
            .collect();
        self.people = people
            .into_iter()
            .map(|person| (person.id, Arc::new(person)))
            .collect();
    }

    pub fn clear(&mut self) {
        self.rooms.clear();
        self.people.clear();
    }

    pub fn room(&self, room_id: &str) -> Option<&Arc<Room>> {
        self.rooms.get(room_id)
    }

    /// All rooms, ordered by id
    pub fn rooms(&self) -> Vec<Arc<Room>> {
        let mut rooms: Vec<Arc<Room>> = self.rooms.values().cloned().collect();
        rooms.sort_by(|a, b| a.id.cmp(&b.id));
        rooms
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn person(&self, person_id: PersonId) -> Option<&Arc<Person>> {
        self.people.get(&person_id)
    }

    pub fn person_count(&self) -> usize {
        self.people.len()
    }

    /// Add people that are not cached yet. Existing entries are left untouched.
    /// Returns how many were added.
    pub fn insert_people(&mut self, people: impl IntoIterator<Item = Person>) -> usize {
        let mut added = 0;
        for person in people {
            self.people.entry(person.id).or_insert_with(|| {
                added += 1;
                Arc::new(person)
            });
        }
        added
    }

    /// Apply a filtered delta to a room. Sync anchors only move forward:
    /// values lower than the stored ones are ignored.
    ///
    /// Returns the room as stored afterwards, or `None` for an unknown room.
    pub fn commit_room(
        &mut self,
        room_id: &str,
        state: RoomState,
        chat_count: i64,
    ) -> Option<Arc<Room>> {
        let current = self.rooms.get_mut(room_id)?;
        let next_state = current.state().max(state);
        let next_chat_count = current.chat_count.max(chat_count);

        if next_state != current.state() || next_chat_count != current.chat_count {
            let room = Arc::make_mut(current);
            room.high_water_message_id = next_state.high_water_message_id;
            room.last_update_timestamp = next_state.last_update_timestamp;
            room.chat_count = next_chat_count;
        }
        Some(current.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: &str, last_update: i64, chat_count: i64) -> Room {
        Room {
            id: id.to_string(),
            name: format!("room {}", id),
            kind: 1,
            last_update_timestamp: last_update,
            last_read_count: 0,
            chat_count,
            members: HashMap::new(),
            high_water_message_id: 0,
        }
    }

    fn person(id: PersonId, name: &str) -> Person {
        Person {
            id,
            external_id: String::new(),
            name: name.to_string(),
            organization: String::new(),
        }
    }

    #[test]
    fn test_replace_all_discards_previous_entries() {
        let mut cache = EntityCache::new();
        cache.replace_all(vec![room("1", 0, 0)], vec![person(7, "Alice")]);
        cache.replace_all(vec![room("2", 0, 0)], vec![]);

        assert!(cache.room("1").is_none());
        assert!(cache.room("2").is_some());
        assert_eq!(cache.person_count(), 0);
    }

    #[test]
    fn test_insert_people_keeps_existing_entries() {
        let mut cache = EntityCache::new();
        assert_eq!(cache.insert_people(vec![person(7, "Alice")]), 1);
        assert_eq!(
            cache.insert_people(vec![person(7, "Alice Renamed"), person(8, "Bob")]),
            1
        );

        assert_eq!(cache.person(7).unwrap().name, "Alice");
        assert_eq!(cache.person(8).unwrap().name, "Bob");
        assert_eq!(cache.person_count(), 2);
    }

    #[test]
    fn test_commit_room_is_monotonic() {
        let mut cache = EntityCache::new();
        cache.replace_all(vec![room("1", 1000, 50)], vec![]);

        let advanced = cache
            .commit_room(
                "1",
                RoomState {
                    high_water_message_id: 102,
                    last_update_timestamp: 1010,
                },
                55,
            )
            .unwrap();
        assert_eq!(advanced.high_water_message_id, 102);
        assert_eq!(advanced.last_update_timestamp, 1010);
        assert_eq!(advanced.chat_count, 55);

        let unchanged = cache
            .commit_room(
                "1",
                RoomState {
                    high_water_message_id: 90,
                    last_update_timestamp: 900,
                },
                10,
            )
            .unwrap();
        assert!(Arc::ptr_eq(&advanced, &unchanged));
        assert_eq!(unchanged.high_water_message_id, 102);
        assert_eq!(unchanged.last_update_timestamp, 1010);
        assert_eq!(unchanged.chat_count, 55);
    }

    #[test]
    fn test_commit_room_leaves_earlier_snapshots_alone() {
        let mut cache = EntityCache::new();
        cache.replace_all(vec![room("1", 1000, 50)], vec![]);
        let before = cache.room("1").unwrap().clone();

        cache.commit_room(
            "1",
            RoomState {
                high_water_message_id: 5,
                last_update_timestamp: 1001,
            },
            50,
        );

        assert_eq!(before.high_water_message_id, 0);
        assert_eq!(cache.room("1").unwrap().high_water_message_id, 5);
    }

    #[test]
    fn test_commit_unknown_room() {
        let mut cache = EntityCache::new();
        assert!(cache.commit_room("404", RoomState::default(), 0).is_none());
    }

    #[test]
    fn test_rooms_are_sorted() {
        let mut cache = EntityCache::new();
        cache.replace_all(vec![room("b", 0, 0), room("a", 0, 0)], vec![]);
        let ids: Vec<String> = cache.rooms().iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(cache.room_count(), 2);
    }
}
