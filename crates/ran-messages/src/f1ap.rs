//! F1AP: CU-CP ↔ DU.

use ran_types::{GnbCuUeF1apId, GnbDuId, GnbDuUeF1apId, NrCellIdentity, Pci, Rnti};

use crate::cause::Cause;
use crate::rrc::{RrcDlMessage, RrcUlMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedCellInfo {
    pub nci: NrCellIdentity,
    pub pci: Pci,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct F1SetupRequest {
    pub gnb_du_id: GnbDuId,
    pub served_cells: Vec<ServedCellInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct F1SetupResponse {
    pub cells_to_activate: Vec<NrCellIdentity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct F1SetupFailure {
    pub cause: Cause,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialUlRrcMessageTransfer {
    pub gnb_du_ue_f1ap_id: GnbDuUeF1apId,
    pub crnti: Rnti,
    pub pcell: NrCellIdentity,
    pub rrc_container: RrcUlMessage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DlRrcMessageTransfer {
    pub gnb_cu_ue_f1ap_id: GnbCuUeF1apId,
    pub gnb_du_ue_f1ap_id: GnbDuUeF1apId,
    pub rrc_container: RrcDlMessage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UlRrcMessageTransfer {
    pub gnb_du_ue_f1ap_id: GnbDuUeF1apId,
    pub gnb_cu_ue_f1ap_id: GnbCuUeF1apId,
    pub rrc_container: RrcUlMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UeContextSetupRequest {
    pub drbs_to_be_setup: Vec<u8>,
    /// Set during attach to piggyback the RRC Security Mode Command
    /// (original spec §4.2.3 step 3).
    pub rrc_container: Option<RrcDlMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UeContextSetupResponse {
    pub drbs_setup: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UeContextSetupFailure {
    pub cause: Cause,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UeContextModificationRequest {
    pub drbs_to_be_setup: Vec<u8>,
    pub drbs_to_be_modified: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UeContextModificationResponse {
    pub drbs_setup: Vec<u8>,
    pub drbs_modified: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UeContextModificationFailure {
    pub cause: Cause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UeContextReleaseCommand {
    pub cause: Cause,
    pub rrc_reject: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UeContextReleaseComplete;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct F1RemovalRequest {
    pub gnb_du_id: GnbDuId,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GnbCuConfigurationUpdate {
    pub cells_to_deactivate: Vec<NrCellIdentity>,
}
