//! F1 link registry: capacity-bounded DU entries, each with its served
//! cells (original spec §4.2.1 "F1 link registry", §4.2.2 "DU connection").

use ran_messages::f1ap::ServedCellInfo;
use ran_types::{DuIndex, GnbDuId, NrCellIdentity, Pci, SlotArray, SlotArrayError};

use crate::error::CuCpError;

#[derive(Debug, Clone)]
pub struct DuEntry {
    pub gnb_du_id: GnbDuId,
    pub served_cells: Vec<ServedCellInfo>,
}

impl DuEntry {
    pub fn pci_of(&self, nci: NrCellIdentity) -> Option<Pci> {
        self.served_cells.iter().find(|c| c.nci == nci).map(|c| c.pci)
    }
}

pub struct DuRegistry {
    dus: SlotArray<DuEntry>,
}

impl DuRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            dus: SlotArray::new(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.dus.capacity()
    }

    pub fn len(&self) -> usize {
        self.dus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dus.is_empty()
    }

    pub fn find_by_gnb_du_id(&self, gnb_du_id: GnbDuId) -> Option<DuIndex> {
        self.dus
            .iter()
            .find(|(_, entry)| entry.gnb_du_id == gnb_du_id)
            .map(|(index, _)| DuIndex::new(index as u32))
    }

    pub fn get(&self, index: DuIndex) -> Option<&DuEntry> {
        self.dus.get(index.value() as usize)
    }

    /// Registers a new DU. Rejects duplicate `gnb_du_id`s and a full
    /// registry, matching the F1 Setup validations in original spec §4.2.2.
    pub fn insert(&mut self, gnb_du_id: GnbDuId, served_cells: Vec<ServedCellInfo>) -> Result<DuIndex, CuCpError> {
        if self.find_by_gnb_du_id(gnb_du_id).is_some() {
            return Err(CuCpError::DuplicateDuId);
        }
        let entry = DuEntry {
            gnb_du_id,
            served_cells,
        };
        match self.dus.insert(entry) {
            Ok(index) => Ok(DuIndex::new(index as u32)),
            Err(SlotArrayError::Full { capacity }) => Err(CuCpError::DuRegistryFull { capacity }),
            Err(other) => unreachable!("unexpected slot array error on DU insert: {other:?}"),
        }
    }

    pub fn remove(&mut self, index: DuIndex) -> Option<DuEntry> {
        self.dus.remove(index.value() as usize).ok()
    }
}

/// Packed NR Cell Identity encodes the owning gNB id in its top
/// `gnb_id_bit_length` bits (3GPP TS 38.423 §9.3.1.6, out of scope here
/// beyond this one mask-and-compare).
pub fn nci_belongs_to_gnb(nci: NrCellIdentity, gnb_id: u32, gnb_id_bit_length: u8) -> bool {
    let shift = 36u32.saturating_sub(gnb_id_bit_length as u32);
    (nci.value() >> shift) == gnb_id as u64
}
