//! PDU session modify/release (original spec §4.2.1, §6).

use std::sync::Arc;

use ran_messages::cause::{Cause, MiscCause};
use ran_messages::e1ap::BearerContextModificationRequest;
use ran_messages::f1ap::{DlRrcMessageTransfer, UeContextModificationRequest};
use ran_messages::ngap::{PduSessionResourceModifyRequest, PduSessionResourceReleaseCommand};
use ran_messages::rrc::{RrcDlMessage, RrcUlMessage};
use rt_async::TransactionOutcome;

use crate::ue_context::{E1BearerOutcome, F1ContextOutcome, UeContext};
use crate::CuCp;

/// E1 Bearer Context Modification → F1 UE Context Modification → RRC
/// Reconfiguration, awaiting Reconfiguration Complete before replying to
/// the AMF.
pub(crate) async fn run_pdu_session_modify(cu_cp: Arc<CuCp>, ue: Arc<UeContext>, req: PduSessionResourceModifyRequest) {
    let e1_modify = match ue.e1_transactions.create_transaction(Some(1), Some(cu_cp.transaction_timeout())) {
        Ok(handle) => handle,
        Err(_) => return,
    };
    if cu_cp
        .e1ap
        .bearer_context_modification_request(ue.ue_index, BearerContextModificationRequest {
            drbs_to_be_setup: Vec::new(),
            drbs_to_be_modified: req.pdu_sessions.clone(),
        })
        .await
        .is_err()
    {
        e1_modify.cancel();
        return;
    }
    let bearer = match e1_modify.result().await {
        TransactionOutcome::Value(E1BearerOutcome::ModificationResponse(resp)) => resp,
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
            drbs_to_be_setup: Vec::new(),
            drbs_to_be_modified: bearer.drbs_modified.clone(),
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
                drbs_to_be_setup: bearer.drbs_modified.clone(),
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
        .pdu_session_resource_modify_response(ran_messages::ngap::PduSessionResourceModifyResponse {
            pdu_sessions_modified: bearer.drbs_modified,
        })
        .await;
}

/// E1 Bearer Context Release, fire-and-forget, then reply to the AMF.
pub(crate) async fn run_pdu_session_release(cu_cp: Arc<CuCp>, ue: Arc<UeContext>, _cmd: PduSessionResourceReleaseCommand) {
    let _ = cu_cp
        .e1ap
        .bearer_context_release_command(ue.ue_index, ran_messages::e1ap::BearerContextReleaseCommand)
        .await;
    ue.mutable.lock().unwrap().has_drb = false;
    let _ = cu_cp
        .ngap
        .pdu_session_resource_release_response(ran_messages::ngap::PduSessionResourceReleaseResponse)
        .await;
}
