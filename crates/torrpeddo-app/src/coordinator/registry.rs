//! Authoritative map from identifier to transfer record.
//!
//! # Design
//! - One `std::sync::Mutex` guards the map; it is never held across an await, so every
//!   operation is a single short critical section.
//! - Callers always receive clones. A listing is a copy and never changes afterwards.
//! - Each insertion gets a fresh sequence number that orders listings.
//! - At most one engine registration runs per identifier. A record admitted while an earlier
//!   registration is still in flight waits for that registration's handle instead of
//!   starting a second one.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use torrpeddo_core::{
    EngineHandle, LifecycleState, TransferError, TransferId, TransferRecord, TransferResult,
};

/// Outcome of [`Registry::admit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// A fresh pending record was stored; the caller starts its registration.
    Inserted(TransferRecord),
    /// A fresh pending record was stored and will adopt the registration already in flight.
    Queued(TransferRecord),
    /// A live record already exists for the identifier; nothing changed.
    Existing(TransferRecord),
}

/// Outcome of [`Registry::activate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The record now carries the handle.
    Applied {
        /// A pause was requested while registration was in flight.
        pause_requested: bool,
    },
    /// No pending record is waiting; the handle is orphaned and must be released before
    /// calling [`Registry::settle`].
    Stale,
}

#[derive(Default)]
struct RegistryState {
    records: HashMap<TransferId, TransferRecord>,
    registering: HashSet<TransferId>,
    next_sequence: u64,
}

impl RegistryState {
    fn store(&mut self, mut record: TransferRecord) -> TransferRecord {
        self.next_sequence += 1;
        record.sequence = self.next_sequence;
        self.records.insert(record.id, record.clone());
        record
    }

    fn pending_mut(&mut self, id: TransferId) -> Option<&mut TransferRecord> {
        self.records
            .get_mut(&id)
            .filter(|record| record.state == LifecycleState::Pending)
    }
}

/// Transfer registry.
#[derive(Default)]
pub struct Registry {
    state: Mutex<RegistryState>,
}

impl Registry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under a new identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::DuplicateIdentifier`] when the identifier is present.
    pub fn insert(&self, record: TransferRecord) -> TransferResult<TransferRecord> {
        let mut state = self.lock();
        if state.records.contains_key(&record.id) {
            return Err(TransferError::DuplicateIdentifier { id: record.id });
        }
        Ok(state.store(record))
    }

    /// Insert a pending record unless a live one exists. Cancelled and failed records are
    /// replaced.
    #[must_use]
    pub fn admit(&self, record: TransferRecord) -> Admission {
        let mut state = self.lock();
        if let Some(existing) = state.records.get(&record.id)
            && !existing.state.is_terminal()
        {
            return Admission::Existing(existing.clone());
        }
        let id = record.id;
        let record = state.store(record);
        if state.registering.insert(id) {
            Admission::Inserted(record)
        } else {
            Admission::Queued(record)
        }
    }

    /// Copy of one record.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::NotFound`] for unknown identifiers.
    pub fn get(&self, id: TransferId) -> TransferResult<TransferRecord> {
        self.lock()
            .records
            .get(&id)
            .cloned()
            .ok_or(TransferError::NotFound { id })
    }

    /// Remove and return a record.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::NotFound`] for unknown identifiers.
    pub fn remove(&self, id: TransferId) -> TransferResult<TransferRecord> {
        self.lock()
            .records
            .remove(&id)
            .ok_or(TransferError::NotFound { id })
    }

    /// Snapshot of every record in insertion order.
    #[must_use]
    pub fn list(&self) -> Vec<TransferRecord> {
        let mut records: Vec<TransferRecord> = self.lock().records.values().cloned().collect();
        records.sort_by_key(|record| record.sequence);
        records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    /// Whether the registry holds no record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run a check-then-mutate step against one record inside the critical section.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::NotFound`] for unknown identifiers, or whatever `mutate`
    /// returns.
    pub fn update<R>(
        &self,
        id: TransferId,
        mutate: impl FnOnce(&mut TransferRecord) -> TransferResult<R>,
    ) -> TransferResult<R> {
        let mut state = self.lock();
        let record = state
            .records
            .get_mut(&id)
            .ok_or(TransferError::NotFound { id })?;
        mutate(record)
    }

    /// Attach a freshly registered handle to the pending record for `id`, whichever
    /// admission created it. The record adopts `save_path`, the directory the engine was
    /// given.
    #[must_use]
    pub fn activate(&self, id: TransferId, save_path: &Path, handle: EngineHandle) -> Activation {
        let mut state = self.lock();
        let Some(record) = state.pending_mut(id) else {
            return Activation::Stale;
        };
        record.handle = Some(handle);
        record.save_dir = save_path.to_path_buf();
        record.state = if record.pause_requested {
            LifecycleState::Paused
        } else {
            LifecycleState::Active
        };
        let pause_requested = record.pause_requested;
        state.registering.remove(&id);
        Activation::Applied { pause_requested }
    }

    /// Close out a registration whose handle was released as stale. Returns the save
    /// directory of a pending record admitted meanwhile, which needs a new registration;
    /// the identifier then stays marked as registering.
    #[must_use]
    pub fn settle(&self, id: TransferId) -> Option<PathBuf> {
        let mut state = self.lock();
        if let Some(record) = state.pending_mut(id) {
            return Some(record.save_dir.clone());
        }
        state.registering.remove(&id);
        None
    }

    /// Mark the pending record for `id` as failed and end its registration. Returns `false`
    /// when no pending record was waiting.
    #[must_use]
    pub fn fail(&self, id: TransferId, message: String) -> bool {
        let mut state = self.lock();
        state.registering.remove(&id);
        match state.pending_mut(id) {
            Some(record) => {
                record.state = LifecycleState::Failed { message };
                record.pause_requested = false;
                true
            }
            None => false,
        }
    }

    /// Whether an engine registration is in flight for `id`.
    #[must_use]
    pub fn is_registering(&self, id: TransferId) -> bool {
        self.lock().registering.contains(&id)
    }

    /// Store the engine-reported name, provided the record still points at `handle`.
    pub fn record_name(&self, id: TransferId, handle: EngineHandle, name: &str) {
        let mut state = self.lock();
        if let Some(record) = state.records.get_mut(&id)
            && record.handle == Some(handle)
            && record.name.as_deref() != Some(name)
        {
            record.name = Some(name.to_string());
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;
    use torrpeddo_core::parse_magnet;

    fn pending(byte: u8) -> TransferRecord {
        let uri = format!("magnet:?xt=urn:btih:{}", hex_byte(byte).repeat(20));
        let descriptor = parse_magnet(&uri).expect("magnet");
        TransferRecord::pending(&descriptor, PathBuf::from("/downloads"))
    }

    fn hex_byte(byte: u8) -> String {
        format!("{byte:02x}")
    }

    #[test]
    fn insert_get_remove_follow_the_contract() {
        let registry = Registry::new();
        let record = registry.insert(pending(1)).expect("insert");
        assert_eq!(record.sequence, 1);
        assert!(matches!(
            registry.insert(pending(1)),
            Err(TransferError::DuplicateIdentifier { .. })
        ));
        assert_eq!(registry.get(record.id).expect("get"), record);
        assert_eq!(registry.remove(record.id).expect("remove"), record);
        assert!(registry.get(record.id).is_err_and(|err| err.is_not_found()));
        assert!(registry.remove(record.id).is_err_and(|err| err.is_not_found()));
        assert!(registry.is_empty());
    }

    #[test]
    fn admit_is_idempotent_for_live_records_and_replaces_terminal_ones() {
        let registry = Registry::new();
        let Admission::Inserted(first) = registry.admit(pending(2)) else {
            panic!("first admission must insert");
        };
        assert!(matches!(registry.admit(pending(2)), Admission::Existing(_)));
        assert_eq!(registry.len(), 1);

        assert!(registry.fail(first.id, "rejected".into()));
        assert!(!registry.is_registering(first.id));
        let Admission::Inserted(second) = registry.admit(pending(2)) else {
            panic!("failed record must be replaced");
        };
        assert!(second.sequence > first.sequence);
        assert_eq!(registry.get(first.id).expect("get").state, LifecycleState::Pending);
    }

    #[test]
    fn readmission_during_registration_adopts_the_pending_handle() {
        let registry = Registry::new();
        let Admission::Inserted(first) = registry.admit(pending(3)) else {
            panic!("insert");
        };
        registry.remove(first.id).expect("remove");
        let Admission::Queued(second) = registry.admit(pending(3)) else {
            panic!("registration is still in flight");
        };
        assert!(registry.is_registering(second.id));

        assert_eq!(
            registry.activate(second.id, Path::new("/elsewhere"), EngineHandle::new(4)),
            Activation::Applied {
                pause_requested: false
            }
        );
        let stored = registry.get(second.id).expect("get");
        assert_eq!(stored.state, LifecycleState::Active);
        assert_eq!(stored.sequence, second.sequence);
        assert_eq!(stored.save_dir, PathBuf::from("/elsewhere"));
        assert!(!registry.is_registering(second.id));
    }

    #[test]
    fn settle_hands_over_to_records_admitted_during_release() {
        let registry = Registry::new();
        let Admission::Inserted(first) = registry.admit(pending(8)) else {
            panic!("insert");
        };
        registry.remove(first.id).expect("remove");
        assert_eq!(
            registry.activate(first.id, Path::new("/downloads"), EngineHandle::new(1)),
            Activation::Stale
        );
        assert!(registry.is_registering(first.id));

        assert!(matches!(registry.admit(pending(8)), Admission::Queued(_)));
        assert_eq!(registry.settle(first.id), Some(PathBuf::from("/downloads")));
        assert!(registry.is_registering(first.id));

        registry.remove(first.id).expect("remove");
        assert_eq!(registry.settle(first.id), None);
        assert!(!registry.is_registering(first.id));
    }

    #[test]
    fn list_is_a_copy_in_insertion_order() {
        let registry = Registry::new();
        for byte in [9, 3, 7] {
            let _ = registry.admit(pending(byte));
        }
        let listed = registry.list();
        let order: Vec<u8> = listed.iter().map(|record| record.id.as_bytes()[0]).collect();
        assert_eq!(order, vec![9, 3, 7]);

        registry
            .update(listed[0].id, |record| {
                record.state = LifecycleState::Cancelled;
                Ok(())
            })
            .expect("update");
        assert_eq!(listed[0].state, LifecycleState::Pending);
    }

    #[test]
    fn activation_honours_pending_pauses() {
        let registry = Registry::new();
        let Admission::Inserted(record) = registry.admit(pending(4)) else {
            panic!("insert");
        };
        registry
            .update(record.id, |record| {
                record.pause_requested = true;
                Ok(())
            })
            .expect("update");

        assert_eq!(
            registry.activate(record.id, Path::new("/downloads"), EngineHandle::new(1)),
            Activation::Applied {
                pause_requested: true
            }
        );
        let stored = registry.get(record.id).expect("get");
        assert_eq!(stored.state, LifecycleState::Paused);
        assert_eq!(stored.handle, Some(EngineHandle::new(1)));

        assert_eq!(
            registry.activate(record.id, Path::new("/downloads"), EngineHandle::new(2)),
            Activation::Stale
        );
        assert!(!registry.fail(record.id, "late".into()));
    }

    #[test]
    fn activation_after_removal_is_stale() {
        let registry = Registry::new();
        let Admission::Inserted(record) = registry.admit(pending(5)) else {
            panic!("insert");
        };
        registry.remove(record.id).expect("remove");
        assert_eq!(
            registry.activate(record.id, Path::new("/downloads"), EngineHandle::new(3)),
            Activation::Stale
        );
        assert!(registry.is_empty());
        assert_eq!(registry.settle(record.id), None);
    }

    #[test]
    fn names_only_stick_to_the_current_handle() {
        let registry = Registry::new();
        let Admission::Inserted(record) = registry.admit(pending(6)) else {
            panic!("insert");
        };
        let _ = registry.activate(record.id, Path::new("/downloads"), EngineHandle::new(8));
        registry.record_name(record.id, EngineHandle::new(9), "stale");
        registry.record_name(record.id, EngineHandle::new(8), "payload");
        assert_eq!(
            registry.get(record.id).expect("get").name.as_deref(),
            Some("payload")
        );
    }

    #[tokio::test]
    async fn concurrent_admissions_keep_every_entry() {
        let registry = Arc::new(Registry::new());
        let mut handles = Vec::new();
        for byte in 0..32_u8 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                let _ = registry.admit(pending(byte));
                let _ = registry.admit(pending(byte));
            }));
        }
        for handle in handles {
            handle.await.expect("join");
        }
        let listed = registry.list();
        assert_eq!(listed.len(), 32);
        let mut sequences: Vec<u64> = listed.iter().map(|record| record.sequence).collect();
        sequences.dedup();
        assert_eq!(sequences.len(), 32);
    }
}
