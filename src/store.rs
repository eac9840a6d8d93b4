use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single waitlist entry. `deleted_at` doubles as the soft-delete flag.
#[derive(Debug, Clone, Serialize)]
pub struct Subscriber {
    pub id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Subscriber {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Active/deleted/total breakdown for the admin stats view.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StoreStats {
    pub active: usize,
    pub deleted: usize,
    pub total: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Storage capability for waitlist subscribers. The service only depends on
/// this interface; swapping in a relational backend means implementing it.
pub trait SubscriberStore: Send + Sync {
    /// Insert a normalized email. Uniqueness spans soft-deleted rows.
    fn insert(&self, email: &str) -> Result<Subscriber, StoreError>;

    fn count_active(&self) -> Result<usize, StoreError>;

    /// Active subscribers, newest first.
    fn all_active(&self) -> Result<Vec<Subscriber>, StoreError>;

    /// Every row including soft-deleted ones, newest first.
    fn all_including_deleted(&self) -> Result<Vec<Subscriber>, StoreError>;

    fn get(&self, id: i64) -> Result<Option<Subscriber>, StoreError>;

    /// Mark an active row deleted. Returns false when the id is unknown or
    /// the row is already deleted.
    fn soft_delete(&self, id: i64) -> Result<bool, StoreError>;

    /// Clear the deleted mark. Returns false when the id is unknown.
    fn restore(&self, id: i64) -> Result<bool, StoreError>;

    fn stats(&self) -> Result<StoreStats, StoreError>;
}

/// In-memory store: a mutex-guarded table with monotonically increasing ids.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

struct Inner {
    next_id: i64,
    rows: BTreeMap<i64, Subscriber>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                rows: BTreeMap::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriberStore for MemoryStore {
    fn insert(&self, email: &str) -> Result<Subscriber, StoreError> {
        let mut inner = self.lock();

        if inner.rows.values().any(|row| row.email == email) {
            return Err(StoreError::DuplicateEmail);
        }

        let id = inner.next_id;
        inner.next_id += 1;
        let subscriber = Subscriber {
            id,
            email: email.to_string(),
            created_at: Utc::now(),
            deleted_at: None,
        };
        inner.rows.insert(id, subscriber.clone());
        Ok(subscriber)
    }

    fn count_active(&self) -> Result<usize, StoreError> {
        Ok(self.lock().rows.values().filter(|r| r.is_active()).count())
    }

    fn all_active(&self) -> Result<Vec<Subscriber>, StoreError> {
        let inner = self.lock();
        // Ids are monotonic, so reverse id order is newest first.
        Ok(inner
            .rows
            .values()
            .rev()
            .filter(|r| r.is_active())
            .cloned()
            .collect())
    }

    fn all_including_deleted(&self) -> Result<Vec<Subscriber>, StoreError> {
        Ok(self.lock().rows.values().rev().cloned().collect())
    }

    fn get(&self, id: i64) -> Result<Option<Subscriber>, StoreError> {
        Ok(self.lock().rows.get(&id).cloned())
    }

    fn soft_delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        match inner.rows.get_mut(&id) {
            Some(row) if row.is_active() => {
                row.deleted_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn restore(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        match inner.rows.get_mut(&id) {
            Some(row) => {
                row.deleted_at = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        let inner = self.lock();
        let total = inner.rows.len();
        let active = inner.rows.values().filter(|r| r.is_active()).count();
        Ok(StoreStats {
            active,
            deleted: total - active,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_assigns_monotonic_ids() {
        let store = MemoryStore::new();
        let a = store.insert("a@example.com").unwrap();
        let b = store.insert("b@example.com").unwrap();
        assert!(b.id > a.id);
        assert!(a.is_active());
    }

    #[test]
    fn duplicate_email_is_a_distinct_error() {
        let store = MemoryStore::new();
        store.insert("a@example.com").unwrap();

        let err = store.insert("a@example.com").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
        assert_eq!(store.count_active().unwrap(), 1);
    }

    #[test]
    fn uniqueness_spans_deleted_rows() {
        let store = MemoryStore::new();
        let a = store.insert("a@example.com").unwrap();
        store.soft_delete(a.id).unwrap();

        let err = store.insert("a@example.com").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[test]
    fn soft_delete_is_idempotent_via_not_found() {
        let store = MemoryStore::new();
        let a = store.insert("a@example.com").unwrap();

        assert!(store.soft_delete(a.id).unwrap());
        assert!(!store.soft_delete(a.id).unwrap());
        assert!(!store.soft_delete(999).unwrap());
        assert_eq!(store.count_active().unwrap(), 0);
    }

    #[test]
    fn restore_preserves_id_and_created_at() {
        let store = MemoryStore::new();
        let original = store.insert("a@example.com").unwrap();

        store.soft_delete(original.id).unwrap();
        assert!(store.restore(original.id).unwrap());
        assert!(!store.restore(999).unwrap());

        let restored = store.get(original.id).unwrap().unwrap();
        assert!(restored.is_active());
        assert_eq!(restored.id, original.id);
        assert_eq!(restored.created_at, original.created_at);
    }

    #[test]
    fn listings_are_newest_first_and_respect_deletion() {
        let store = MemoryStore::new();
        let a = store.insert("a@example.com").unwrap();
        let b = store.insert("b@example.com").unwrap();
        store.soft_delete(a.id).unwrap();

        let active = store.all_active().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, b.id);

        let all = store.all_including_deleted().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, b.id);
    }

    #[test]
    fn stats_break_down_active_and_deleted() {
        let store = MemoryStore::new();
        let a = store.insert("a@example.com").unwrap();
        store.insert("b@example.com").unwrap();
        store.soft_delete(a.id).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(
            stats,
            StoreStats {
                active: 1,
                deleted: 1,
                total: 2
            }
        );
    }
}
