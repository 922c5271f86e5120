//! The render-driving state of a directory session.
//!
//! # Design
//! `UserCollection` changes only through `apply`, and `apply` is only fed
//! server-confirmed outcomes. Nothing here performs I/O; `Directory` owns a
//! `DirectoryState` and publishes a fresh snapshot after every change.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

use crate::types::{UserId, UserRecord};

/// Ordered users mirrored from the server. No two records share an id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserCollection {
    records: Vec<UserRecord>,
}

/// A confirmed remote outcome, ready to be applied to the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Loaded(Vec<UserRecord>),
    Created(UserRecord),
    Updated(UserRecord),
    Deleted(UserId),
}

impl UserCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection in the given order, keeping the first record of
    /// any repeated id.
    pub fn from_records(records: Vec<UserRecord>) -> Self {
        let mut seen = HashSet::with_capacity(records.len());
        let mut kept = Vec::with_capacity(records.len());
        for record in records {
            if seen.insert(record.id) {
                kept.push(record);
            } else {
                warn!(id = %record.id, "dropping duplicate user from list response");
            }
        }
        Self { records: kept }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UserRecord> {
        self.records.iter()
    }

    pub fn get(&self, id: UserId) -> Option<&UserRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: UserId) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> Vec<UserId> {
        self.records.iter().map(|r| r.id).collect()
    }

    /// Applies a confirmed outcome. Returns whether the collection changed.
    pub fn apply(&mut self, transition: Transition) -> bool {
        match transition {
            Transition::Loaded(records) => {
                let next = Self::from_records(records);
                if next == *self {
                    return false;
                }
                *self = next;
                true
            }
            Transition::Created(record) => match self.records.iter_mut().find(|r| r.id == record.id) {
                // A list that completed after the POST already carries it.
                Some(existing) if *existing == record => false,
                Some(existing) => {
                    *existing = record;
                    true
                }
                None => {
                    self.records.push(record);
                    true
                }
            },
            Transition::Updated(record) => match self.records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => {
                    if existing.name == record.name && existing.email == record.email {
                        return false;
                    }
                    existing.name = record.name;
                    existing.email = record.email;
                    true
                }
                None => {
                    debug!(id = %record.id, "update confirmed for a user no longer listed");
                    false
                }
            },
            Transition::Deleted(id) => {
                let before = self.records.len();
                self.records.retain(|r| r.id != id);
                self.records.len() != before
            }
        }
    }
}

impl<'a> IntoIterator for &'a UserCollection {
    type Item = &'a UserRecord;
    type IntoIter = std::slice::Iter<'a, UserRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Draft for the creation form. Cleared after a successful create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftCreate {
    pub name: String,
    pub email: String,
}

/// The single record currently being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub target: UserId,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Idle,
    Editing(PendingEdit),
}

/// Key of the per-operation loading indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    Load,
    Create,
    Update(UserId),
    Delete(UserId),
}

/// Page-level outcome of the most recent `list`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    NotLoaded,
    Loaded,
    /// Blocking error; the collection keeps its prior contents.
    Failed(String),
}

/// Everything the presentation layer needs to render one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryState {
    pub users: UserCollection,
    pub load: LoadStatus,
    pub edit: EditState,
    pub draft: DraftCreate,
    in_flight: BTreeMap<Operation, usize>,
    /// Transient, non-blocking messages about failed creates, updates and
    /// deletes, one per operation.
    notices: BTreeMap<Operation, String>,
}

impl DirectoryState {
    pub fn is_pending(&self, operation: Operation) -> bool {
        self.in_flight.contains_key(&operation)
    }

    /// `true` while a `list` is outstanding.
    pub fn is_loading(&self) -> bool {
        self.is_pending(Operation::Load)
    }

    pub fn pending(&self) -> impl Iterator<Item = Operation> + '_ {
        self.in_flight.keys().copied()
    }

    pub fn editing(&self) -> Option<&PendingEdit> {
        match &self.edit {
            EditState::Idle => None,
            EditState::Editing(edit) => Some(edit),
        }
    }

    pub fn notice(&self, operation: Operation) -> Option<&str> {
        self.notices.get(&operation).map(String::as_str)
    }

    pub fn notices(&self) -> impl Iterator<Item = (Operation, &str)> + '_ {
        self.notices.iter().map(|(op, message)| (*op, message.as_str()))
    }

    /// Marks `operation` in flight. A new attempt supersedes its old notice.
    pub(crate) fn begin(&mut self, operation: Operation) {
        *self.in_flight.entry(operation).or_insert(0) += 1;
        self.notices.remove(&operation);
    }

    pub(crate) fn set_notice(&mut self, operation: Operation, message: String) {
        self.notices.insert(operation, message);
    }

    pub(crate) fn clear_notice(&mut self, operation: Operation) -> bool {
        self.notices.remove(&operation).is_some()
    }

    pub(crate) fn finish(&mut self, operation: Operation) {
        if let Some(count) = self.in_flight.get_mut(&operation) {
            *count -= 1;
            if *count == 0 {
                self.in_flight.remove(&operation);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> UserCollection {
        let mut users = UserCollection::new();
        users.apply(Transition::Loaded(vec![
            UserRecord::new(1, "A", "a@x.com"),
            UserRecord::new(2, "B", "b@x.com"),
            UserRecord::new(3, "C", "c@x.com"),
        ]));
        users
    }

    #[test]
    fn loaded_preserves_server_order() {
        let mut users = UserCollection::new();
        let changed = users.apply(Transition::Loaded(vec![
            UserRecord::new(9, "A", "a@x.com"),
            UserRecord::new(2, "B", "b@x.com"),
            UserRecord::new(5, "C", "c@x.com"),
        ]));
        assert!(changed);
        assert_eq!(users.ids(), vec![UserId(9), UserId(2), UserId(5)]);
    }

    #[test]
    fn loaded_overwrites_everything() {
        let mut users = abc();
        users.apply(Transition::Loaded(vec![UserRecord::new(4, "D", "d@x.com")]));
        assert_eq!(users.ids(), vec![UserId(4)]);
    }

    #[test]
    fn loaded_drops_duplicate_ids() {
        let users = UserCollection::from_records(vec![
            UserRecord::new(1, "A", "a@x.com"),
            UserRecord::new(1, "Again", "again@x.com"),
        ]);
        assert_eq!(users.len(), 1);
        assert_eq!(users.get(UserId(1)).unwrap().name, "A");
    }

    #[test]
    fn identical_reload_reports_no_change() {
        let mut users = abc();
        let same: Vec<UserRecord> = users.iter().cloned().collect();
        assert!(!users.apply(Transition::Loaded(same)));
    }

    #[test]
    fn created_appends() {
        let mut users = abc();
        let ada = UserRecord::new(7, "Ada", "ada@x.com");
        assert!(users.apply(Transition::Created(ada.clone())));
        assert_eq!(users.iter().last(), Some(&ada));
        assert_eq!(users.len(), 4);
    }

    #[test]
    fn created_after_overtaking_list_does_not_duplicate() {
        let mut users = abc();
        let ada = UserRecord::new(7, "Ada", "ada@x.com");
        users.apply(Transition::Created(ada.clone()));
        assert!(!users.apply(Transition::Created(ada)));
        assert_eq!(users.iter().filter(|u| u.id == UserId(7)).count(), 1);
    }

    #[test]
    fn updated_replaces_in_place() {
        let mut users = abc();
        assert!(users.apply(Transition::Updated(UserRecord::new(2, "Bee", "bee@x.com"))));
        assert_eq!(users.ids(), vec![UserId(1), UserId(2), UserId(3)]);
        assert_eq!(users.get(UserId(2)).unwrap().name, "Bee");
    }

    #[test]
    fn update_of_deleted_record_is_a_no_op() {
        let mut users = abc();
        users.apply(Transition::Created(UserRecord::new(7, "Ada", "ada@x.com")));
        users.apply(Transition::Deleted(UserId(7)));
        let before = users.clone();

        assert!(!users.apply(Transition::Updated(UserRecord::new(7, "Ada L.", "ada@x.com"))));
        assert_eq!(users, before);
        assert!(!users.contains(UserId(7)));
    }

    #[test]
    fn delete_is_idempotent() {
        let mut once = abc();
        once.apply(Transition::Deleted(UserId(3)));

        let mut twice = abc();
        assert!(twice.apply(Transition::Deleted(UserId(3))));
        assert!(!twice.apply(Transition::Deleted(UserId(3))));

        assert_eq!(once, twice);
        assert_eq!(twice.ids(), vec![UserId(1), UserId(2)]);
    }

    #[test]
    fn in_flight_counts_overlapping_operations() {
        let mut state = DirectoryState::default();
        state.begin(Operation::Delete(UserId(3)));
        state.begin(Operation::Delete(UserId(3)));
        state.finish(Operation::Delete(UserId(3)));
        assert!(state.is_pending(Operation::Delete(UserId(3))));
        state.finish(Operation::Delete(UserId(3)));
        assert!(!state.is_pending(Operation::Delete(UserId(3))));
        assert_eq!(state.pending().count(), 0);
    }

    #[test]
    fn notices_are_kept_per_operation() {
        let mut state = DirectoryState::default();
        state.set_notice(Operation::Create, "Failed to create user.".to_string());
        state.set_notice(Operation::Delete(UserId(3)), "Failed to delete user.".to_string());

        assert_eq!(state.notices().count(), 2);
        assert_eq!(state.notice(Operation::Create), Some("Failed to create user."));

        state.begin(Operation::Create);
        assert_eq!(state.notice(Operation::Create), None);
        assert_eq!(state.notice(Operation::Delete(UserId(3))), Some("Failed to delete user."));
    }
}
