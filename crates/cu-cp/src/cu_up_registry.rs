//! E1 link registry: capacity-bounded CU-UP entries (original spec §4.2.1
//! "E1 link registry", §4.2.2 "CU-UP connection", symmetric to the DU one).

use ran_types::{CuUpIndex, GnbCuUpId, SlotArray, SlotArrayError};

use crate::error::CuCpError;

#[derive(Debug, Clone, Copy)]
pub struct CuUpEntry {
    pub gnb_cu_up_id: GnbCuUpId,
}

pub struct CuUpRegistry {
    cu_ups: SlotArray<CuUpEntry>,
}

impl CuUpRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            cu_ups: SlotArray::new(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.cu_ups.capacity()
    }

    pub fn len(&self) -> usize {
        self.cu_ups.len()
    }

    pub fn find_by_gnb_cu_up_id(&self, gnb_cu_up_id: GnbCuUpId) -> Option<CuUpIndex> {
        self.cu_ups
            .iter()
            .find(|(_, entry)| entry.gnb_cu_up_id == gnb_cu_up_id)
            .map(|(index, _)| CuUpIndex::new(index as u32))
    }

    pub fn get(&self, index: CuUpIndex) -> Option<&CuUpEntry> {
        self.cu_ups.get(index.value() as usize)
    }

    pub fn insert(&mut self, gnb_cu_up_id: GnbCuUpId) -> Result<CuUpIndex, CuCpError> {
        if self.find_by_gnb_cu_up_id(gnb_cu_up_id).is_some() {
            // E1AP has no documented duplicate-id rejection in the original
            // spec; treat it the same as a full registry would be odd, so
            // silently reuse the existing slot instead of erroring.
            return Ok(self.find_by_gnb_cu_up_id(gnb_cu_up_id).unwrap());
        }
        match self.cu_ups.insert(CuUpEntry { gnb_cu_up_id }) {
            Ok(index) => Ok(CuUpIndex::new(index as u32)),
            Err(SlotArrayError::Full { capacity }) => Err(CuCpError::CuUpRegistryFull { capacity }),
            Err(other) => unreachable!("unexpected slot array error on CU-UP insert: {other:?}"),
        }
    }

    pub fn remove(&mut self, index: CuUpIndex) -> Option<CuUpEntry> {
        self.cu_ups.remove(index.value() as usize).ok()
    }
}
