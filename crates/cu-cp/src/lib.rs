//! CU-CP connection and UE lifecycle engine (original spec §4.2).
//!
//! Owns the DU, CU-UP and AMF registries, serialises per-UE procedures
//! through a [`rt_async::TaskSequencer`] each, and enforces the invariants
//! named in original spec §3 and §8: no two UEs share `(du_index, crnti)`,
//! a UE is never created while the core is not AMF-connected, and
//! reestablishment either transfers an existing context or falls back to a
//! fresh RRC Setup.

pub mod adapters;
pub mod config;
pub mod cu_up_registry;
pub mod du_registry;
pub mod error;
pub mod metrics;
pub mod ngap_link;
mod procedures;
pub mod ue_context;
pub mod ue_manager;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ran_messages::cause::{Cause, MiscCause};
use ran_messages::f1ap::{F1SetupRequest, F1SetupResponse, InitialUlRrcMessageTransfer, UeContextReleaseCommand};
use ran_messages::ngap::NgSetupRequest;
use ran_messages::rrc::RrcUlMessage;
use ran_types::{DuCrntiKey, DuIndex, GnbDuId, NrCellIdentity, Pci, UeIndex};
use tracing::{info, warn};

pub use adapters::{AdapterError, E1apAdapter, F1apAdapter, NgapAdapter, RrcCodec};
pub use config::CuCpConfig;
pub use error::CuCpError;
pub use metrics::CuCpMetrics;
pub use ngap_link::{NgSetupResult, NgapLink};
pub use ue_context::{UeContext, UeState};

use cu_up_registry::CuUpRegistry;
use du_registry::DuRegistry;
use ue_manager::UeManager;

/// Top-level CU-CP instance. Cheaply shareable: clone the `Arc<CuCp>` into
/// every spawned per-UE procedure.
pub struct CuCp {
    config: CuCpConfig,
    pub(crate) du_registry: Mutex<DuRegistry>,
    pub(crate) cu_up_registry: Mutex<CuUpRegistry>,
    pub(crate) ue_manager: Mutex<UeManager>,
    ngap_link: NgapLink,
    metrics: CuCpMetrics,
    pub(crate) f1ap: Arc<dyn F1apAdapter>,
    pub(crate) e1ap: Arc<dyn E1apAdapter>,
    pub(crate) ngap: Arc<dyn NgapAdapter>,
}

impl CuCp {
    pub fn new(
        config: CuCpConfig,
        f1ap: Arc<dyn F1apAdapter>,
        e1ap: Arc<dyn E1apAdapter>,
        ngap: Arc<dyn NgapAdapter>,
    ) -> Arc<Self> {
        Arc::new(Self {
            du_registry: Mutex::new(DuRegistry::new(config.max_nof_dus)),
            cu_up_registry: Mutex::new(CuUpRegistry::new(config.max_nof_cu_ups)),
            ue_manager: Mutex::new(UeManager::new(config.max_nof_ues)),
            ngap_link: NgapLink::new(),
            metrics: CuCpMetrics::new(),
            config,
            f1ap,
            e1ap,
            ngap,
        })
    }

    pub fn config(&self) -> &CuCpConfig {
        &self.config
    }

    pub fn metrics(&self) -> &CuCpMetrics {
        &self.metrics
    }

    pub fn is_amf_connected(&self) -> bool {
        self.ngap_link.is_connected()
    }

    pub fn nof_ues(&self) -> usize {
        self.ue_manager.lock().unwrap().len()
    }

    pub fn nof_dus(&self) -> usize {
        self.du_registry.lock().unwrap().len()
    }

    pub fn get_ue(&self, ue_index: UeIndex) -> Option<Arc<UeContext>> {
        self.ue_manager.lock().unwrap().get(ue_index)
    }

    pub(crate) fn transaction_timeout(&self) -> Duration {
        self.config.transaction_timeout
    }

    // ---- Start-up (original spec §4.2.2 "CU-CP start-up") ----

    /// Attempts NG Setup against the AMF. On failure, CU-CP stays
    /// "not AMF-connected" and every subsequent F1 Setup is rejected.
    pub async fn start(self: &Arc<Self>) -> NgSetupResult {
        let handle = match self.ngap_link.arm_setup_transaction(self.transaction_timeout()) {
            Ok(handle) => handle,
            Err(err) => {
                warn!(?err, "failed to arm NG setup transaction");
                return NgSetupResult::Failure(ran_messages::ngap::NgSetupFailure {
                    cause: Cause::Misc(MiscCause::Unspecified),
                });
            }
        };
        if self.ngap.ng_setup_request(NgSetupRequest).await.is_err() {
            handle.cancel();
            return NgSetupResult::Failure(ran_messages::ngap::NgSetupFailure {
                cause: Cause::Misc(MiscCause::Unspecified),
            });
        }
        match handle.result().await {
            rt_async::TransactionOutcome::Value(result) => result,
            rt_async::TransactionOutcome::TimedOut => {
                NgSetupResult::Failure(ran_messages::ngap::NgSetupFailure {
                    cause: Cause::Misc(MiscCause::Unspecified),
                })
            }
        }
    }

    pub fn handle_ng_setup_response(&self, msg: ran_messages::ngap::NgSetupResponse) -> bool {
        self.ngap_link.complete_setup_success(msg)
    }

    pub fn handle_ng_setup_failure(&self, msg: ran_messages::ngap::NgSetupFailure) -> bool {
        self.ngap_link.complete_setup_failure(msg)
    }

    // ---- DU connection (original spec §4.2.2 "DU connection") ----

    pub async fn handle_f1_setup_request(&self, req: F1SetupRequest) -> Result<DuIndex, CuCpError> {
        if !self.is_amf_connected() {
            let _ = self
                .f1ap
                .f1_setup_failure(req.gnb_du_id, ran_messages::f1ap::F1SetupFailure {
                    cause: Cause::no_core_connection(),
                })
                .await;
            return Err(CuCpError::NoCoreConnection);
        }

        for cell in &req.served_cells {
            if !du_registry::nci_belongs_to_gnb(cell.nci, self.config.gnb_id, self.config.gnb_id_bit_length) {
                let _ = self
                    .f1ap
                    .f1_setup_failure(req.gnb_du_id, ran_messages::f1ap::F1SetupFailure {
                        cause: Cause::cells_not_served(),
                    })
                    .await;
                return Err(CuCpError::CellsNotServedByThisGnb);
            }
        }

        let cells_to_activate: Vec<NrCellIdentity> = req.served_cells.iter().map(|c| c.nci).collect();
        let result = {
            let mut registry = self.du_registry.lock().unwrap();
            registry.insert(req.gnb_du_id, req.served_cells.clone())
        };

        match result {
            Ok(du_index) => {
                let _ = self
                    .f1ap
                    .f1_setup_response(req.gnb_du_id, F1SetupResponse {
                        cells_to_activate,
                    })
                    .await;
                info!(?du_index, gnb_du_id = ?req.gnb_du_id, "DU registered");
                Ok(du_index)
            }
            Err(err) => {
                let cause = match err {
                    CuCpError::DuplicateDuId => Cause::duplicate_du_id(),
                    _ => Cause::Misc(MiscCause::Unspecified),
                };
                warn!(code = err.code(), gnb_du_id = ?req.gnb_du_id, "F1 Setup rejected");
                let _ = self
                    .f1ap
                    .f1_setup_failure(req.gnb_du_id, ran_messages::f1ap::F1SetupFailure { cause })
                    .await;
                Err(err)
            }
        }
    }

    /// On DU-side disconnect: release every UE on that DU, then remove the
    /// DU slot (original spec §4.2.2).
    pub async fn handle_du_disconnect(self: &Arc<Self>, du_index: DuIndex) {
        let ue_indices: Vec<UeIndex> = {
            let manager = self.ue_manager.lock().unwrap();
            manager
                .iter()
                .filter(|ue| ue.du_index() == du_index)
                .map(|ue| ue.ue_index)
                .collect()
        };
        for ue_index in ue_indices {
            procedures::release::release_ue(self.clone(), ue_index, ran_messages::cause::Cause::Misc(MiscCause::Unspecified)).await;
        }
        let _ = self.ngap.ng_reset(ran_messages::ngap::NgReset).await;
        self.du_registry.lock().unwrap().remove(du_index);
    }

    // ---- CU-UP connection (original spec §4.2.2 "CU-UP connection") ----

    pub async fn handle_e1_setup_request(&self, req: ran_messages::e1ap::E1SetupRequest) -> Result<(), CuCpError> {
        let result = self.cu_up_registry.lock().unwrap().insert(req.gnb_cu_up_id);
        match result {
            Ok(_) => {
                let _ = self.e1ap.e1_setup_response(req.gnb_cu_up_id, ran_messages::e1ap::E1SetupResponse).await;
                Ok(())
            }
            Err(err) => {
                let _ = self
                    .e1ap
                    .e1_setup_failure(req.gnb_cu_up_id, ran_messages::e1ap::E1SetupFailure {
                        cause: Cause::Misc(MiscCause::Unspecified),
                    })
                    .await;
                Err(err)
            }
        }
    }

    /// On E1 Release Request with connected UEs, releases each via NGAP and
    /// only responds once every release is acknowledged.
    pub async fn handle_e1_release_request(self: &Arc<Self>) {
        let ue_indices: Vec<UeIndex> = {
            let manager = self.ue_manager.lock().unwrap();
            manager.iter().filter(|ue| ue.has_drb()).map(|ue| ue.ue_index).collect()
        };
        for ue_index in ue_indices {
            procedures::release::release_ue(self.clone(), ue_index, ran_messages::cause::Cause::Misc(MiscCause::Unspecified)).await;
        }
        let _ = self.e1ap.e1_release_response(ran_messages::e1ap::E1ReleaseResponse).await;
    }

    // ---- AMF disconnect (original spec §4.2.2 "AMF disconnect") ----

    pub async fn handle_amf_disconnect(self: &Arc<Self>) {
        self.ngap_link.disconnect();

        let ue_indices: Vec<UeIndex> = {
            let manager = self.ue_manager.lock().unwrap();
            manager.iter().map(|ue| ue.ue_index).collect()
        };
        for ue_index in ue_indices {
            if let Some(ue) = self.get_ue(ue_index) {
                let _ = self
                    .f1ap
                    .ue_context_release_command(ue_index, UeContextReleaseCommand {
                        cause: Cause::no_core_connection(),
                        rrc_reject: true,
                    })
                    .await;
                let key = DuCrntiKey {
                    du_index: ue.du_index(),
                    crnti: ue.crnti(),
                };
                self.ue_manager.lock().unwrap().remove(ue_index, key);
            }
        }

        let du_indices: Vec<DuIndex> = {
            let registry = self.du_registry.lock().unwrap();
            (0..registry.capacity())
                .map(|i| DuIndex::new(i as u32))
                .filter(|idx| registry.get(*idx).is_some())
                .collect()
        };
        for du_index in du_indices {
            let gnb_du_id = match self.du_registry.lock().unwrap().get(du_index) {
                Some(entry) => entry.gnb_du_id,
                None => continue,
            };
            let _ = self
                .f1ap
                .gnb_cu_configuration_update(gnb_du_id, ran_messages::f1ap::GnbCuConfigurationUpdate {
                    cells_to_deactivate: Vec::new(),
                })
                .await;
        }
    }

    // ---- UE attach entry point (original spec §4.2.3) ----

    pub async fn handle_initial_ul_rrc(
        self: &Arc<Self>,
        du_index: DuIndex,
        msg: InitialUlRrcMessageTransfer,
    ) -> Result<UeIndex, CuCpError> {
        match msg.rrc_container.clone() {
            RrcUlMessage::ReestablishmentRequest { old_crnti, old_pci, short_mac_i } => {
                procedures::reestablishment::handle_reestablishment_request(
                    self.clone(),
                    du_index,
                    msg,
                    old_crnti,
                    old_pci,
                    short_mac_i,
                )
                .await
            }
            _ => procedures::attach::create_ue_and_start_attach(self.clone(), du_index, msg).await,
        }
    }

    pub async fn handle_ul_rrc_message_transfer(&self, ue_index: UeIndex, msg: ran_messages::f1ap::UlRrcMessageTransfer) {
        let Some(ue) = self.get_ue(ue_index) else { return };
        match msg.rrc_container {
            RrcUlMessage::SetupComplete => ue.set_state(UeState::Connected),
            RrcUlMessage::UlInformationTransfer { nas_pdu } => {
                let ran_ue_id = ue.mutable.lock().unwrap().ran_ue_id;
                if let Some(ran_ue_id) = ran_ue_id {
                    let _ = self
                        .ngap
                        .uplink_nas_transport(ran_messages::ngap::UplinkNasTransport { ran_ue_id, nas_pdu })
                        .await;
                }
            }
            other => {
                ue.rrc_transactions.set(0, other);
            }
        }
    }

    /// Step 2: inbound NGAP Downlink NAS Transport, forwarded to the UE as
    /// F1 DL RRC Message Transfer (original spec §4.2.3 step 2).
    pub async fn handle_downlink_nas_transport(self: &Arc<Self>, ue_index: UeIndex, msg: ran_messages::ngap::DownlinkNasTransport) {
        let Some(ue) = self.get_ue(ue_index) else { return };
        let cu_cp = self.clone();
        let _ = ue.sequencer.enqueue(async move {
            procedures::attach::run_downlink_nas_transport(cu_cp, ue, msg).await;
        });
    }

    pub async fn handle_initial_context_setup_request(
        self: &Arc<Self>,
        ue_index: UeIndex,
        req: ran_messages::ngap::InitialContextSetupRequest,
        amf_ue_id: ran_types::AmfUeId,
    ) {
        let Some(ue) = self.get_ue(ue_index) else { return };
        let cu_cp = self.clone();
        let _ = ue.sequencer.enqueue(async move {
            procedures::attach::run_initial_context_setup(cu_cp, ue, req, amf_ue_id).await;
        });
    }

    pub fn handle_ue_context_setup_response(&self, ue_index: UeIndex, msg: ran_messages::f1ap::UeContextSetupResponse) {
        if let Some(ue) = self.get_ue(ue_index) {
            ue.f1_transactions.set(0, ue_context::F1ContextOutcome::SetupResponse(msg));
        }
    }

    pub fn handle_ue_context_setup_failure(&self, ue_index: UeIndex, msg: ran_messages::f1ap::UeContextSetupFailure) {
        if let Some(ue) = self.get_ue(ue_index) {
            ue.f1_transactions.set(0, ue_context::F1ContextOutcome::SetupFailure(msg));
        }
    }

    pub fn handle_ue_context_modification_response(&self, ue_index: UeIndex, msg: ran_messages::f1ap::UeContextModificationResponse) {
        if let Some(ue) = self.get_ue(ue_index) {
            ue.f1_transactions.set(1, ue_context::F1ContextOutcome::ModificationResponse(msg));
        }
    }

    pub fn handle_ue_context_modification_failure(&self, ue_index: UeIndex, msg: ran_messages::f1ap::UeContextModificationFailure) {
        if let Some(ue) = self.get_ue(ue_index) {
            ue.f1_transactions.set(1, ue_context::F1ContextOutcome::ModificationFailure(msg));
        }
    }

    pub async fn handle_pdu_session_resource_setup_request(
        self: &Arc<Self>,
        ue_index: UeIndex,
        req: ran_messages::ngap::PduSessionResourceSetupRequest,
    ) {
        let Some(ue) = self.get_ue(ue_index) else { return };
        let cu_cp = self.clone();
        let _ = ue.sequencer.enqueue(async move {
            procedures::attach::run_pdu_session_setup(cu_cp, ue, req).await;
        });
    }

    pub fn handle_bearer_context_setup_response(&self, ue_index: UeIndex, msg: ran_messages::e1ap::BearerContextSetupResponse) {
        if let Some(ue) = self.get_ue(ue_index) {
            ue.e1_transactions.set(0, ue_context::E1BearerOutcome::SetupResponse(msg));
        }
    }

    pub fn handle_bearer_context_setup_failure(&self, ue_index: UeIndex, msg: ran_messages::e1ap::BearerContextSetupFailure) {
        if let Some(ue) = self.get_ue(ue_index) {
            ue.e1_transactions.set(0, ue_context::E1BearerOutcome::SetupFailure(msg));
        }
    }

    pub fn handle_bearer_context_modification_response(&self, ue_index: UeIndex, msg: ran_messages::e1ap::BearerContextModificationResponse) {
        if let Some(ue) = self.get_ue(ue_index) {
            ue.e1_transactions.set(1, ue_context::E1BearerOutcome::ModificationResponse(msg));
        }
    }

    pub fn handle_bearer_context_modification_failure(&self, ue_index: UeIndex, msg: ran_messages::e1ap::BearerContextModificationFailure) {
        if let Some(ue) = self.get_ue(ue_index) {
            ue.e1_transactions.set(1, ue_context::E1BearerOutcome::ModificationFailure(msg));
        }
    }

    // ---- PDU session modify/release (original spec §4.2.1, §6) ----

    pub async fn handle_pdu_session_resource_modify_request(
        self: &Arc<Self>,
        ue_index: UeIndex,
        req: ran_messages::ngap::PduSessionResourceModifyRequest,
    ) {
        let Some(ue) = self.get_ue(ue_index) else { return };
        let cu_cp = self.clone();
        let _ = ue.sequencer.enqueue(async move {
            procedures::pdu_session::run_pdu_session_modify(cu_cp, ue, req).await;
        });
    }

    pub async fn handle_pdu_session_resource_release_command(
        self: &Arc<Self>,
        ue_index: UeIndex,
        cmd: ran_messages::ngap::PduSessionResourceReleaseCommand,
    ) {
        let Some(ue) = self.get_ue(ue_index) else { return };
        let cu_cp = self.clone();
        let _ = ue.sequencer.enqueue(async move {
            procedures::pdu_session::run_pdu_session_release(cu_cp, ue, cmd).await;
        });
    }

    // ---- UE release triggers (original spec §4.2.6) ----

    /// AMF-driven release (inbound NGAP UE Context Release Command).
    pub fn handle_ue_context_release_command(self: &Arc<Self>, ue_index: UeIndex, msg: ran_messages::ngap::UeContextReleaseCommand) {
        self.request_ue_release(ue_index, msg.cause);
    }

    /// Completes the release-class F1 transaction armed in
    /// [`procedures::release::release_ue`] once the DU confirms teardown.
    pub fn handle_ue_context_release_complete(&self, ue_index: UeIndex, msg: ran_messages::f1ap::UeContextReleaseComplete) {
        if let Some(ue) = self.get_ue(ue_index) {
            ue.f1_transactions.set(
                procedures::release::RELEASE_SLOT,
                ue_context::F1ContextOutcome::ReleaseComplete(msg),
            );
        }
    }

    /// F1 Removal Request: the DU is withdrawing, release every UE on it
    /// and drop the link (original spec §4.2.6).
    pub async fn handle_f1_removal_request(self: &Arc<Self>, req: ran_messages::f1ap::F1RemovalRequest) {
        let du_index = self.du_registry.lock().unwrap().find_by_gnb_du_id(req.gnb_du_id);
        if let Some(du_index) = du_index {
            self.handle_du_disconnect(du_index).await;
        }
    }

    pub async fn handle_measurement_report(self: &Arc<Self>, ue_index: UeIndex, target_du: DuIndex, target_pci: Pci) {
        let Some(ue) = self.get_ue(ue_index) else { return };
        let cu_cp = self.clone();
        let _ = ue.sequencer.enqueue(async move {
            procedures::handover::run_intra_du_handover(cu_cp, ue, target_du, target_pci).await;
        });
    }

    /// Triggers the release cascade on a single UE (original spec §4.2.6).
    pub fn request_ue_release(self: &Arc<Self>, ue_index: UeIndex, cause: Cause) {
        let cu_cp = self.clone();
        tokio::spawn(async move {
            procedures::release::release_ue(cu_cp, ue_index, cause).await;
        });
    }
}

pub(crate) fn du_crnti_key(du_index: DuIndex, crnti: ran_types::Rnti) -> DuCrntiKey {
    DuCrntiKey { du_index, crnti }
}
