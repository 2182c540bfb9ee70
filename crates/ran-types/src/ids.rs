//! Identifiers shared by the CU-CP core, the rx-buffer pool, and the boundary
//! adapters.
//!
//! Each id is a thin newtype over its wire-sized integer so that the
//! compiler rejects mixing, say, a `GnbDuId` with a `GnbCuUeF1apId`.

use std::fmt;

macro_rules! newtype_id {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub $inner);

        impl $name {
            pub const fn new(value: $inner) -> Self {
                Self(value)
            }

            pub const fn value(self) -> $inner {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }
    };
}

newtype_id!(
    /// Internal, CU-CP-local UE handle. Stable for the lifetime of the UE
    /// context; never reused while any peer still references the UE.
    UeIndex(u32)
);

newtype_id!(
    /// Internal, CU-CP-local DU handle (slot index into the DU registry).
    DuIndex(u32)
);

newtype_id!(
    /// Internal, CU-CP-local CU-UP handle (slot index into the CU-UP registry).
    CuUpIndex(u32)
);

newtype_id!(
    /// DU-assigned F1AP UE id, unique per DU.
    GnbDuUeF1apId(u32)
);

newtype_id!(
    /// CU-CP-assigned F1AP UE id, unique per CU-CP.
    GnbCuUeF1apId(u32)
);

newtype_id!(
    /// CU-CP-assigned E1AP id for a CU-UP association.
    GnbCuCpUeE1apId(u32)
);

newtype_id!(
    /// CU-UP-assigned E1AP id for a CU-CP association.
    GnbCuUpUeE1apId(u32)
);

newtype_id!(
    /// AMF-assigned UE id (RAN UE NGAP ID is the CU-CP-local half; this is
    /// the AMF UE NGAP ID, present once NGAP association is confirmed).
    AmfUeId(u64)
);

newtype_id!(
    /// CU-CP-local NGAP id allocated to a UE at Initial UE Message time.
    RanUeId(u32)
);

newtype_id!(
    /// DU identity assigned by configuration, carried in F1 Setup Request.
    GnbDuId(u64)
);

newtype_id!(
    /// CU-UP identity assigned by configuration, carried in E1 Setup Request.
    GnbCuUpId(u64)
);

newtype_id!(
    /// Radio network temporary identifier, scoped to one cell.
    Rnti(u16)
);

newtype_id!(
    /// Packed NR Cell Identity (36 bits, stored widened).
    NrCellIdentity(u64)
);

newtype_id!(
    /// Physical cell id, scoped to one carrier.
    Pci(u16)
);

newtype_id!(
    /// HARQ process identifier, scoped to one RNTI.
    HarqProcessId(u8)
);

/// Composite key the CU-CP registry enforces uniqueness over: no two UEs may
/// share a `(du_index, crnti)` pair (original spec §3, §8 invariant 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DuCrntiKey {
    pub du_index: DuIndex,
    pub crnti: Rnti,
}

/// Composite key the rx-buffer pool indexes reservations by (original spec
/// §3 "Rx buffer identifier").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RxBufferIdentifier {
    pub rnti: Rnti,
    pub harq_process_id: HarqProcessId,
}

impl RxBufferIdentifier {
    /// Sentinel marking a free slot, matching the original spec's
    /// `invalid()` constructor.
    pub const fn invalid() -> Self {
        Self {
            rnti: Rnti(0xffff),
            harq_process_id: HarqProcessId(0xff),
        }
    }

    pub fn is_valid(&self) -> bool {
        *self != Self::invalid()
    }
}

impl Default for RxBufferIdentifier {
    fn default() -> Self {
        Self::invalid()
    }
}
