//! Shared identifiers and the bounded slot-array container used by the
//! CU-CP core and the rx-buffer pool.

mod ids;
mod slot_array;

pub use ids::{
    AmfUeId, CuUpIndex, DuCrntiKey, DuIndex, GnbCuCpUeE1apId, GnbCuUeF1apId, GnbCuUpId,
    GnbCuUpUeE1apId, GnbDuId, GnbDuUeF1apId, HarqProcessId, NrCellIdentity, Pci, RanUeId, Rnti,
    RxBufferIdentifier, UeIndex,
};
pub use slot_array::{SlotArray, SlotArrayError};
