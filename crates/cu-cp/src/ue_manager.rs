//! UE registry: bounded slots keyed by `ue_index`, with a secondary index
//! enforcing that no two UEs share `(du_index, crnti)` (original spec §3,
//! §8 testable property 7).

use std::sync::Arc;

use ran_types::{DuCrntiKey, DuIndex, Rnti, SlotArray, SlotArrayError, UeIndex};
use std::collections::HashMap;

use crate::error::CuCpError;
use crate::ue_context::UeContext;

pub struct UeManager {
    ues: SlotArray<Arc<UeContext>>,
    by_du_crnti: HashMap<DuCrntiKey, UeIndex>,
}

impl UeManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            ues: SlotArray::new(capacity),
            by_du_crnti: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.ues.capacity()
    }

    pub fn len(&self) -> usize {
        self.ues.len()
    }

    pub fn get(&self, ue_index: UeIndex) -> Option<Arc<UeContext>> {
        self.ues.get(ue_index.value() as usize).cloned()
    }

    pub fn find_by_du_crnti(&self, du_index: DuIndex, crnti: Rnti) -> Option<Arc<UeContext>> {
        let key = DuCrntiKey { du_index, crnti };
        let ue_index = *self.by_du_crnti.get(&key)?;
        self.get(ue_index)
    }

    /// Registers a fresh UE. Rejects a duplicate `(du_index, crnti)` pair
    /// and a full registry (original spec §8, testable property 7).
    pub fn insert(
        &mut self,
        du_index: DuIndex,
        crnti: Rnti,
        make: impl FnOnce(UeIndex) -> UeContext,
    ) -> Result<Arc<UeContext>, CuCpError> {
        let key = DuCrntiKey { du_index, crnti };
        if self.by_du_crnti.contains_key(&key) {
            return Err(CuCpError::DuplicateUeIdentity {
                du_index,
                crnti: crnti.value(),
            });
        }

        let index = self.ues.find_first_empty();
        if index >= self.ues.capacity() {
            return Err(CuCpError::UeRegistryFull {
                capacity: self.ues.capacity(),
            });
        }
        let ue_index = UeIndex::new(index as u32);
        let context = Arc::new(make(ue_index));
        match self.ues.insert_at(index, context.clone()) {
            Ok(()) => {
                self.by_du_crnti.insert(key, ue_index);
                Ok(context)
            }
            Err(SlotArrayError::Full { capacity }) | Err(SlotArrayError::OutOfBounds { capacity, .. }) => {
                Err(CuCpError::UeRegistryFull { capacity })
            }
            Err(other) => unreachable!("unexpected slot array error on UE insert: {other:?}"),
        }
    }

    /// Re-keys an existing UE to a new `(du_index, crnti)`, used when
    /// reestablishment transfers identity onto the surviving context
    /// (original spec §4.2.5).
    pub fn rekey(&mut self, ue_index: UeIndex, old: DuCrntiKey, new: DuCrntiKey) {
        self.by_du_crnti.remove(&old);
        self.by_du_crnti.insert(new, ue_index);
    }

    pub fn remove(&mut self, ue_index: UeIndex, key: DuCrntiKey) -> Option<Arc<UeContext>> {
        self.by_du_crnti.remove(&key);
        self.ues.remove(ue_index.value() as usize).ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<UeContext>> {
        self.ues.values()
    }
}
