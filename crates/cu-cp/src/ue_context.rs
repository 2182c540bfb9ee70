//! Per-UE identifiers, lifecycle state, and the sequencer that serialises
//! its procedures (original spec §3 "UE context", §4.2.4 "UE states").

use std::sync::Mutex;

use ran_messages::e1ap::{
    BearerContextModificationFailure, BearerContextModificationResponse,
    BearerContextSetupFailure, BearerContextSetupResponse,
};
use ran_messages::f1ap::{
    UeContextModificationFailure, UeContextModificationResponse, UeContextReleaseComplete,
    UeContextSetupFailure, UeContextSetupResponse,
};
use ran_messages::rrc::RrcUlMessage;
use ran_types::{
    AmfUeId, DuIndex, GnbCuCpUeE1apId, GnbCuUeF1apId, GnbCuUpUeE1apId, GnbDuUeF1apId, Pci, RanUeId,
    Rnti, UeIndex,
};
use rt_async::{TaskSequencer, TransactionManager};

/// Outcome of an F1 UE Context Setup/Modification round trip, correlated
/// through the UE's own transaction manager.
#[derive(Debug, Clone)]
pub enum F1ContextOutcome {
    SetupResponse(UeContextSetupResponse),
    SetupFailure(UeContextSetupFailure),
    ModificationResponse(UeContextModificationResponse),
    ModificationFailure(UeContextModificationFailure),
    ReleaseComplete(UeContextReleaseComplete),
}

/// Outcome of an E1 Bearer Context Setup/Modification round trip.
#[derive(Debug, Clone)]
pub enum E1BearerOutcome {
    SetupResponse(BearerContextSetupResponse),
    SetupFailure(BearerContextSetupFailure),
    ModificationResponse(BearerContextModificationResponse),
    ModificationFailure(BearerContextModificationFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UeState {
    New,
    Connected,
    Reestablishing,
    HandoverPending,
    Deleting,
}

/// Fields that mutate over the UE's lifetime. Reestablishment transfers
/// identity onto the surviving context rather than replacing it, so these
/// need interior mutability even though `ue_index` itself never changes.
#[derive(Debug)]
pub struct UeMutableState {
    pub du_index: DuIndex,
    pub crnti: Rnti,
    pub gnb_du_ue_f1ap_id: GnbDuUeF1apId,
    pub amf_ue_id: Option<AmfUeId>,
    pub ran_ue_id: Option<RanUeId>,
    pub cu_cp_ue_e1ap_id: Option<GnbCuCpUeE1apId>,
    pub cu_up_ue_e1ap_id: Option<GnbCuUpUeE1apId>,
    pub has_drb: bool,
    pub state: UeState,
    pub reestablishing: bool,
}

pub struct UeContext {
    pub ue_index: UeIndex,
    pub pci: Pci,
    pub gnb_cu_ue_f1ap_id: GnbCuUeF1apId,
    pub mutable: Mutex<UeMutableState>,
    /// Serialises every procedure run against this UE; at most one runs at
    /// a time (original spec §5 "within one UE sequencer, procedures run
    /// in strict FIFO").
    pub sequencer: TaskSequencer,
    pub f1_transactions: TransactionManager<F1ContextOutcome>,
    pub e1_transactions: TransactionManager<E1BearerOutcome>,
    pub rrc_transactions: TransactionManager<RrcUlMessage>,
}

impl UeContext {
    pub fn new(
        ue_index: UeIndex,
        du_index: DuIndex,
        crnti: Rnti,
        pci: Pci,
        gnb_du_ue_f1ap_id: GnbDuUeF1apId,
        gnb_cu_ue_f1ap_id: GnbCuUeF1apId,
        sequencer_capacity: usize,
    ) -> Self {
        Self {
            ue_index,
            pci,
            gnb_cu_ue_f1ap_id,
            mutable: Mutex::new(UeMutableState {
                du_index,
                crnti,
                gnb_du_ue_f1ap_id,
                amf_ue_id: None,
                ran_ue_id: None,
                cu_cp_ue_e1ap_id: None,
                cu_up_ue_e1ap_id: None,
                has_drb: false,
                state: UeState::New,
                reestablishing: false,
            }),
            sequencer: TaskSequencer::new(sequencer_capacity),
            f1_transactions: TransactionManager::new(4),
            e1_transactions: TransactionManager::new(4),
            rrc_transactions: TransactionManager::new(4),
        }
    }

    pub fn du_index(&self) -> DuIndex {
        self.mutable.lock().unwrap().du_index
    }

    pub fn crnti(&self) -> Rnti {
        self.mutable.lock().unwrap().crnti
    }

    pub fn state(&self) -> UeState {
        self.mutable.lock().unwrap().state
    }

    pub fn set_state(&self, state: UeState) {
        self.mutable.lock().unwrap().state = state;
    }

    pub fn is_amf_connected(&self) -> bool {
        self.mutable.lock().unwrap().amf_ue_id.is_some()
    }

    pub fn has_drb(&self) -> bool {
        self.mutable.lock().unwrap().has_drb
    }
}
