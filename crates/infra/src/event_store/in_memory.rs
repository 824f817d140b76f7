use std::collections::HashMap;
use std::sync::RwLock;

use repairdesk_core::AggregateId;

use super::r#trait::{
    AppendBatch, EventStore, EventStoreError, ExpectedVersion, StoredEvent, UncommittedEvent,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StreamKey {
    aggregate_type: String,
    aggregate_id: AggregateId,
}

impl StreamKey {
    /// The single stream a batch targets; `None` for an empty batch.
    fn of(events: &[UncommittedEvent]) -> Result<Option<Self>, EventStoreError> {
        let Some(first) = events.first() else {
            return Ok(None);
        };

        for (idx, e) in events.iter().enumerate() {
            if e.aggregate_id != first.aggregate_id {
                return Err(EventStoreError::InvalidAppend(format!(
                    "batch contains multiple aggregate_ids (index {idx})"
                )));
            }
            if e.aggregate_type != first.aggregate_type {
                return Err(EventStoreError::AggregateTypeMismatch(format!(
                    "batch contains multiple aggregate_types (index {idx})"
                )));
            }
        }

        Ok(Some(Self {
            aggregate_type: first.aggregate_type.clone(),
            aggregate_id: first.aggregate_id,
        }))
    }
}

#[derive(Debug, Default)]
struct Journal {
    streams: HashMap<StreamKey, Vec<StoredEvent>>,
    /// Every committed event, in append order.
    log: Vec<StoredEvent>,
}

impl Journal {
    fn current_version(&self, key: &StreamKey) -> u64 {
        self.streams
            .get(key)
            .and_then(|stream| stream.last())
            .map(|e| e.sequence_number)
            .unwrap_or(0)
    }

    fn push(&mut self, key: StreamKey, events: Vec<UncommittedEvent>) -> Vec<StoredEvent> {
        let mut next = self.current_version(&key) + 1;
        let mut position = self.log.len() as u64 + 1;
        let Journal { streams, log } = self;
        let stream = streams.entry(key).or_default();

        let mut committed = Vec::with_capacity(events.len());
        for e in events {
            let stored = StoredEvent {
                event_id: e.event_id,
                aggregate_id: e.aggregate_id,
                aggregate_type: e.aggregate_type,
                sequence_number: next,
                position,
                event_type: e.event_type,
                event_version: e.event_version,
                occurred_at: e.occurred_at,
                payload: e.payload,
            };
            next += 1;
            position += 1;
            stream.push(stored.clone());
            log.push(stored.clone());
            committed.push(stored);
        }
        committed
    }
}

/// In-memory append-only event store.
///
/// The whole journal is lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    inner: RwLock<Journal>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventStore for InMemoryEventStore {
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        self.append_batches(vec![(events, expected_version)])
    }

    fn append_batches(&self, batches: Vec<AppendBatch>) -> Result<Vec<StoredEvent>, EventStoreError> {
        let mut keyed = Vec::with_capacity(batches.len());
        for (events, expected) in batches {
            if let Some(key) = StreamKey::of(&events)? {
                keyed.push((key, events, expected));
            }
        }

        let mut journal = self
            .inner
            .write()
            .map_err(|_| EventStoreError::InvalidAppend("lock poisoned".to_string()))?;

        // Check every batch against the version the earlier ones leave behind.
        let mut projected: HashMap<&StreamKey, u64> = HashMap::new();
        for (key, events, expected) in &keyed {
            let current = match projected.get(key) {
                Some(version) => *version,
                None => journal.current_version(key),
            };
            if !expected.matches(current) {
                return Err(EventStoreError::Concurrency(format!(
                    "expected {expected:?}, found {current}"
                )));
            }
            projected.insert(key, current + events.len() as u64);
        }
        drop(projected);

        let mut committed = Vec::new();
        for (key, events, _) in keyed {
            committed.extend(journal.push(key, events));
        }
        Ok(committed)
    }

    fn load_stream(
        &self,
        aggregate_type: &str,
        aggregate_id: AggregateId,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        let key = StreamKey {
            aggregate_type: aggregate_type.to_string(),
            aggregate_id,
        };

        let journal = self
            .inner
            .read()
            .map_err(|_| EventStoreError::InvalidAppend("lock poisoned".to_string()))?;

        Ok(journal.streams.get(&key).cloned().unwrap_or_default())
    }

    fn load_all(&self) -> Result<Vec<StoredEvent>, EventStoreError> {
        let journal = self
            .inner
            .read()
            .map_err(|_| EventStoreError::InvalidAppend("lock poisoned".to_string()))?;

        Ok(journal.log.clone())
    }
}
