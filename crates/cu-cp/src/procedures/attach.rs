//! UE attach (original spec §4.2.3).

use std::sync::Arc;

use ran_messages::cause::{Cause, MiscCause};
use ran_messages::f1ap::{DlRrcMessageTransfer, InitialUlRrcMessageTransfer, UeContextModificationRequest, UeContextSetupRequest};
use ran_messages::ngap::{DownlinkNasTransport, InitialContextSetupRequest, InitialUeMessage, PduSessionResourceSetupRequest, UeRadioCapabilityInfoIndication};
use ran_messages::rrc::{RrcDlMessage, RrcUlMessage};
use ran_types::{AmfUeId, DuIndex, GnbCuUeF1apId, Pci, RanUeId, UeIndex};
use rt_async::TransactionOutcome;
use tracing::{info, warn};

use crate::error::CuCpError;
use crate::ue_context::{E1BearerOutcome, F1ContextOutcome, UeContext, UeState};
use crate::CuCp;

/// Step 1: Initial UL RRC → create UE context; reject immediately if no
/// AMF, else assign `ran_ue_id` and send NGAP Initial UE Message.
pub(crate) async fn create_ue_and_start_attach(
    cu_cp: Arc<CuCp>,
    du_index: DuIndex,
    msg: InitialUlRrcMessageTransfer,
) -> Result<UeIndex, CuCpError> {
    let pci = {
        let registry = cu_cp.du_registry.lock().unwrap();
        registry
            .get(du_index)
            .and_then(|entry| entry.pci_of(msg.pcell))
            .unwrap_or(Pci::new(0))
    };

    let sequencer_capacity = cu_cp.config().ue_sequencer_queue_capacity;
    let ue = {
        let mut manager = cu_cp.ue_manager.lock().unwrap();
        manager.insert(du_index, msg.crnti, |ue_index| {
            UeContext::new(
                ue_index,
                du_index,
                msg.crnti,
                pci,
                msg.gnb_du_ue_f1ap_id,
                GnbCuUeF1apId::new(ue_index.value()),
                sequencer_capacity,
            )
        })?
    };

    if !cu_cp.is_amf_connected() {
        let _ = cu_cp
            .f1ap
            .dl_rrc_message_transfer(DlRrcMessageTransfer {
                gnb_cu_ue_f1ap_id: ue.gnb_cu_ue_f1ap_id,
                gnb_du_ue_f1ap_id: msg.gnb_du_ue_f1ap_id,
                rrc_container: RrcDlMessage::Reject,
            })
            .await;
        let key = crate::du_crnti_key(du_index, msg.crnti);
        cu_cp.ue_manager.lock().unwrap().remove(ue.ue_index, key);
        return Err(CuCpError::NoCoreConnection);
    }

    let ran_ue_id = RanUeId::new(ue.ue_index.value());
    ue.mutable.lock().unwrap().ran_ue_id = Some(ran_ue_id);

    let _ = cu_cp
        .ngap
        .initial_ue_message(InitialUeMessage {
            ran_ue_id,
            rrc_container: msg.rrc_container,
        })
        .await;

    info!(ue_index = ?ue.ue_index, "UE created, initial UE message sent");
    Ok(ue.ue_index)
}

/// Step 3: NGAP Initial Context Setup Request → F1 UE Context Setup Request
/// carrying an RRC Security Mode Command → await Security Mode Complete →
/// UE Capability Enquiry → await UE Capability Information → NGAP Initial
/// Context Setup Response plus UE Radio Capability Info Indication.
pub(crate) async fn run_initial_context_setup(
    cu_cp: Arc<CuCp>,
    ue: Arc<UeContext>,
    _req: InitialContextSetupRequest,
    amf_ue_id: AmfUeId,
) {
    ue.mutable.lock().unwrap().amf_ue_id = Some(amf_ue_id);

    let f1_setup = match ue.f1_transactions.create_transaction(Some(0), Some(cu_cp.transaction_timeout())) {
        Ok(handle) => handle,
        Err(err) => {
            warn!(?err, ue_index = ?ue.ue_index, "failed to arm F1 context setup transaction");
            return;
        }
    };
    let security_mode_complete = match ue.rrc_transactions.create_transaction(Some(0), Some(cu_cp.transaction_timeout())) {
        Ok(handle) => handle,
        Err(err) => {
            warn!(?err, ue_index = ?ue.ue_index, "failed to arm security mode transaction");
            f1_setup.cancel();
            return;
        }
    };

    if cu_cp
        .f1ap
        .ue_context_setup_request(ue.ue_index, UeContextSetupRequest {
            drbs_to_be_setup: Vec::new(),
            rrc_container: Some(RrcDlMessage::SecurityModeCommand),
        })
        .await
        .is_err()
    {
        f1_setup.cancel();
        security_mode_complete.cancel();
        cu_cp.request_ue_release(ue.ue_index, Cause::Misc(MiscCause::Unspecified));
        return;
    }

    if !matches!(
        f1_setup.result().await,
        TransactionOutcome::Value(F1ContextOutcome::SetupResponse(_))
    ) {
        security_mode_complete.cancel();
        cu_cp.request_ue_release(ue.ue_index, Cause::Misc(MiscCause::Unspecified));
        return;
    }

    if !matches!(
        security_mode_complete.result().await,
        TransactionOutcome::Value(RrcUlMessage::SecurityModeComplete)
    ) {
        cu_cp.request_ue_release(ue.ue_index, Cause::Misc(MiscCause::Unspecified));
        return;
    }

    let (gnb_cu_ue_f1ap_id, gnb_du_ue_f1ap_id) = (ue.gnb_cu_ue_f1ap_id, ue.mutable.lock().unwrap().gnb_du_ue_f1ap_id);
    let capability_info = match ue.rrc_transactions.create_transaction(Some(0), Some(cu_cp.transaction_timeout())) {
        Ok(handle) => handle,
        Err(err) => {
            warn!(?err, ue_index = ?ue.ue_index, "failed to arm UE capability transaction");
            return;
        }
    };
    let _ = cu_cp
        .f1ap
        .dl_rrc_message_transfer(DlRrcMessageTransfer {
            gnb_cu_ue_f1ap_id,
            gnb_du_ue_f1ap_id,
            rrc_container: RrcDlMessage::UeCapabilityEnquiry,
        })
        .await;

    if !matches!(
        capability_info.result().await,
        TransactionOutcome::Value(RrcUlMessage::UeCapabilityInformation)
    ) {
        cu_cp.request_ue_release(ue.ue_index, Cause::Misc(MiscCause::Unspecified));
        return;
    }

    ue.set_state(UeState::Connected);
    let _ = cu_cp
        .ngap
        .initial_context_setup_response(ran_messages::ngap::InitialContextSetupResponse)
        .await;
    let _ = cu_cp
        .ngap
        .ue_radio_capability_info_indication(UeRadioCapabilityInfoIndication::default())
        .await;
}

/// Step 2: inbound NGAP Downlink NAS Transport → F1 DL RRC Message
/// Transfer carrying the NAS PDU opaquely (original spec §4.2.3 step 2,
/// "NAS ping-pong").
pub(crate) async fn run_downlink_nas_transport(cu_cp: Arc<CuCp>, ue: Arc<UeContext>, msg: DownlinkNasTransport) {
    ue.mutable.lock().unwrap().amf_ue_id = Some(msg.amf_ue_id);
    let gnb_du_ue_f1ap_id = ue.mutable.lock().unwrap().gnb_du_ue_f1ap_id;
    let _ = cu_cp
        .f1ap
        .dl_rrc_message_transfer(DlRrcMessageTransfer {
            gnb_cu_ue_f1ap_id: ue.gnb_cu_ue_f1ap_id,
            gnb_du_ue_f1ap_id,
            rrc_container: RrcDlMessage::DlInformationTransfer { nas_pdu: msg.nas_pdu },
        })
        .await;
}

/// Step 4: PDU Session Resource Setup Request → E1 Bearer Context Setup →
/// F1 UE Context Modification → E1 Bearer Context Modification → NGAP
/// PDU Session Resource Setup Response.
pub(crate) async fn run_pdu_session_setup(cu_cp: Arc<CuCp>, ue: Arc<UeContext>, req: PduSessionResourceSetupRequest) {
    let e1_setup = match ue.e1_transactions.create_transaction(Some(0), Some(cu_cp.transaction_timeout())) {
        Ok(handle) => handle,
        Err(_) => return,
    };
    if cu_cp
        .e1ap
        .bearer_context_setup_request(ue.ue_index, ran_messages::e1ap::BearerContextSetupRequest {
            pdu_sessions_to_setup: req.pdu_sessions.clone(),
        })
        .await
        .is_err()
    {
        e1_setup.cancel();
        return;
    }
    let bearer = match e1_setup.result().await {
        TransactionOutcome::Value(E1BearerOutcome::SetupResponse(resp)) => resp,
        _ => {
            cu_cp.request_ue_release(ue.ue_index, Cause::Misc(MiscCause::Unspecified));
            return;
        }
    };

    let f1_modify = match ue.f1_transactions.create_transaction(Some(1), Some(cu_cp.transaction_timeout())) {
        Ok(handle) => handle,
        Err(_) => return,
    };
    if cu_cp
        .f1ap
        .ue_context_modification_request(ue.ue_index, UeContextModificationRequest {
            drbs_to_be_setup: bearer.drbs_setup.clone(),
            drbs_to_be_modified: Vec::new(),
        })
        .await
        .is_err()
    {
        f1_modify.cancel();
        return;
    }
    if !matches!(
        f1_modify.result().await,
        TransactionOutcome::Value(F1ContextOutcome::ModificationResponse(_))
    ) {
        cu_cp.request_ue_release(ue.ue_index, Cause::Misc(MiscCause::Unspecified));
        return;
    }

    let e1_modify = match ue.e1_transactions.create_transaction(Some(1), Some(cu_cp.transaction_timeout())) {
        Ok(handle) => handle,
        Err(_) => return,
    };
    if cu_cp
        .e1ap
        .bearer_context_modification_request(ue.ue_index, ran_messages::e1ap::BearerContextModificationRequest {
            drbs_to_be_setup: Vec::new(),
            drbs_to_be_modified: bearer.drbs_setup.clone(),
        })
        .await
        .is_err()
    {
        e1_modify.cancel();
        return;
    }
    if !matches!(
        e1_modify.result().await,
        TransactionOutcome::Value(E1BearerOutcome::ModificationResponse(_))
    ) {
        cu_cp.request_ue_release(ue.ue_index, Cause::Misc(MiscCause::Unspecified));
        return;
    }

    ue.mutable.lock().unwrap().has_drb = true;

    let reconfig_complete = match ue.rrc_transactions.create_transaction(Some(0), Some(cu_cp.transaction_timeout())) {
        Ok(handle) => handle,
        Err(_) => return,
    };
    let (gnb_cu_ue_f1ap_id, gnb_du_ue_f1ap_id) = (ue.gnb_cu_ue_f1ap_id, ue.mutable.lock().unwrap().gnb_du_ue_f1ap_id);
    let _ = cu_cp
        .f1ap
        .dl_rrc_message_transfer(DlRrcMessageTransfer {
            gnb_cu_ue_f1ap_id,
            gnb_du_ue_f1ap_id,
            rrc_container: RrcDlMessage::Reconfiguration {
                drbs_to_be_setup: bearer.drbs_setup.clone(),
            },
        })
        .await;

    if !matches!(
        reconfig_complete.result().await,
        TransactionOutcome::Value(RrcUlMessage::ReconfigurationComplete)
    ) {
        cu_cp.request_ue_release(ue.ue_index, Cause::Misc(MiscCause::Unspecified));
        return;
    }

    let _ = cu_cp
        .ngap
        .pdu_session_resource_setup_response(ran_messages::ngap::PduSessionResourceSetupResponse {
            pdu_sessions_setup: req.pdu_sessions,
        })
        .await;
}
