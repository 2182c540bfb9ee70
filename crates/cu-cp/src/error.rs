//! Recoverable rejection reasons surfaced by the CU-CP core's connection and
//! UE-lifecycle entry points (original spec §7, "recoverable" class).

use ran_types::{DuIndex, UeIndex};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CuCpError {
    #[error("DU registry is at capacity ({capacity})")]
    DuRegistryFull { capacity: usize },
    #[error("gnb_du_id is already registered")]
    DuplicateDuId,
    #[error("served cell's gnb_id does not match this CU-CP")]
    CellsNotServedByThisGnb,
    #[error("CU-UP registry is at capacity ({capacity})")]
    CuUpRegistryFull { capacity: usize },
    #[error("UE registry is at capacity ({capacity})")]
    UeRegistryFull { capacity: usize },
    #[error("a UE already exists for (du_index={du_index:?}, crnti={crnti:#x})")]
    DuplicateUeIdentity { du_index: DuIndex, crnti: u16 },
    #[error("CU-CP is not AMF-connected")]
    NoCoreConnection,
    #[error("reestablishment context transfer failed for UE {0:?}")]
    ReestablishmentFailed(UeIndex),
}

impl CuCpError {
    /// Stable tag for log/metric correlation, independent of the
    /// interpolated `Display` message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuRegistryFull { .. } => "du_registry_full",
            Self::DuplicateDuId => "duplicate_du_id",
            Self::CellsNotServedByThisGnb => "cells_not_served_by_this_gnb",
            Self::CuUpRegistryFull { .. } => "cu_up_registry_full",
            Self::UeRegistryFull { .. } => "ue_registry_full",
            Self::DuplicateUeIdentity { .. } => "duplicate_ue_identity",
            Self::NoCoreConnection => "no_core_connection",
            Self::ReestablishmentFailed(_) => "reestablishment_failed",
        }
    }
}
