//! RRC reestablishment (original spec §4.2.5).
//!
//! Either transfers the surviving UE context onto the new `(du_index,
//! crnti)` or falls back to a fresh attach, matching the decision table:
//! no matching old context, no `amf_ue_id`, no DRB yet, or an
//! already-in-flight reestablishment all fall back; only a DRB-bearing,
//! AMF-connected, not-already-reestablishing context is transferred.

use std::sync::Arc;

use ran_messages::cause::{Cause, MiscCause};
use ran_messages::e1ap::BearerContextModificationRequest;
use ran_messages::f1ap::{DlRrcMessageTransfer, InitialUlRrcMessageTransfer, UeContextModificationRequest};
use ran_messages::ngap::UeContextReleaseRequest;
use ran_messages::rrc::{RrcDlMessage, RrcUlMessage};
use ran_types::{DuIndex, Pci, Rnti, UeIndex};
use rt_async::TransactionOutcome;
use tracing::{info, warn};

use crate::error::CuCpError;
use crate::procedures::attach;
use crate::ue_context::{E1BearerOutcome, F1ContextOutcome, UeState};
use crate::CuCp;

pub(crate) async fn handle_reestablishment_request(
    cu_cp: Arc<CuCp>,
    du_index: DuIndex,
    msg: InitialUlRrcMessageTransfer,
    old_crnti: Rnti,
    old_pci: Pci,
    _short_mac_i: u16,
) -> Result<UeIndex, CuCpError> {
    let old_ue = {
        let manager = cu_cp.ue_manager.lock().unwrap();
        manager
            .iter()
            .find(|ue| ue.crnti() == old_crnti && ue.pci == old_pci)
            .cloned()
    };

    let Some(old_ue) = old_ue else {
        cu_cp.metrics().reestablishment_without_context();
        return attach::create_ue_and_start_attach(cu_cp, du_index, msg).await;
    };

    let (old_amf_ue_id, old_has_drb, already_reestablishing) = {
        let state = old_ue.mutable.lock().unwrap();
        (state.amf_ue_id, state.has_drb, state.reestablishing)
    };

    if already_reestablishing {
        cu_cp.metrics().reestablishment_without_context();
        return attach::create_ue_and_start_attach(cu_cp, du_index, msg).await;
    }

    if old_amf_ue_id.is_none() {
        let old_key = crate::du_crnti_key(old_ue.du_index(), old_ue.crnti());
        cu_cp.ue_manager.lock().unwrap().remove(old_ue.ue_index, old_key);
        cu_cp.metrics().reestablishment_without_context();
        return attach::create_ue_and_start_attach(cu_cp, du_index, msg).await;
    }

    if !old_has_drb {
        let _ = cu_cp
            .ngap
            .ue_context_release_request(old_ue.ue_index, UeContextReleaseRequest {
                cause: Cause::Misc(MiscCause::Unspecified),
            })
            .await;
        old_ue.set_state(UeState::Deleting);
        let old_key = crate::du_crnti_key(old_ue.du_index(), old_ue.crnti());
        cu_cp.ue_manager.lock().unwrap().remove(old_ue.ue_index, old_key);
        cu_cp.metrics().reestablishment_without_context();
        return attach::create_ue_and_start_attach(cu_cp, du_index, msg).await;
    }

    // Transfer path: the old context has DRBs, is AMF-connected and is not
    // already mid-reestablishment.
    old_ue.mutable.lock().unwrap().reestablishing = true;
    old_ue.set_state(UeState::Reestablishing);

    let e1_modify = match old_ue.e1_transactions.create_transaction(Some(1), Some(cu_cp.transaction_timeout())) {
        Ok(handle) => handle,
        Err(err) => {
            warn!(?err, ue_index = ?old_ue.ue_index, "failed to arm reestablishment E1 transaction");
            old_ue.mutable.lock().unwrap().reestablishing = false;
            return Err(CuCpError::ReestablishmentFailed(old_ue.ue_index));
        }
    };
    if cu_cp
        .e1ap
        .bearer_context_modification_request(old_ue.ue_index, BearerContextModificationRequest::default())
        .await
        .is_err()
    {
        e1_modify.cancel();
        old_ue.mutable.lock().unwrap().reestablishing = false;
        return Err(CuCpError::ReestablishmentFailed(old_ue.ue_index));
    }
    if !matches!(
        e1_modify.result().await,
        TransactionOutcome::Value(E1BearerOutcome::ModificationResponse(_))
    ) {
        old_ue.mutable.lock().unwrap().reestablishing = false;
        cu_cp.request_ue_release(old_ue.ue_index, Cause::Misc(MiscCause::Unspecified));
        return Err(CuCpError::ReestablishmentFailed(old_ue.ue_index));
    }

    let f1_modify = match old_ue.f1_transactions.create_transaction(Some(1), Some(cu_cp.transaction_timeout())) {
        Ok(handle) => handle,
        Err(err) => {
            warn!(?err, ue_index = ?old_ue.ue_index, "failed to arm reestablishment F1 transaction");
            old_ue.mutable.lock().unwrap().reestablishing = false;
            return Err(CuCpError::ReestablishmentFailed(old_ue.ue_index));
        }
    };
    if cu_cp
        .f1ap
        .ue_context_modification_request(old_ue.ue_index, UeContextModificationRequest::default())
        .await
        .is_err()
    {
        f1_modify.cancel();
        old_ue.mutable.lock().unwrap().reestablishing = false;
        return Err(CuCpError::ReestablishmentFailed(old_ue.ue_index));
    }
    if !matches!(
        f1_modify.result().await,
        TransactionOutcome::Value(F1ContextOutcome::ModificationResponse(_))
    ) {
        old_ue.mutable.lock().unwrap().reestablishing = false;
        cu_cp.request_ue_release(old_ue.ue_index, Cause::Misc(MiscCause::Unspecified));
        return Err(CuCpError::ReestablishmentFailed(old_ue.ue_index));
    }

    let old_key = crate::du_crnti_key(old_ue.du_index(), old_ue.crnti());
    let new_key = crate::du_crnti_key(du_index, msg.crnti);
    cu_cp.ue_manager.lock().unwrap().rekey(old_ue.ue_index, old_key, new_key);
    {
        let mut state = old_ue.mutable.lock().unwrap();
        state.du_index = du_index;
        state.crnti = msg.crnti;
        state.gnb_du_ue_f1ap_id = msg.gnb_du_ue_f1ap_id;
    }

    let rrc_complete = match old_ue.rrc_transactions.create_transaction(Some(0), Some(cu_cp.transaction_timeout())) {
        Ok(handle) => handle,
        Err(err) => {
            warn!(?err, ue_index = ?old_ue.ue_index, "failed to arm reestablishment RRC transaction");
            old_ue.mutable.lock().unwrap().reestablishing = false;
            return Err(CuCpError::ReestablishmentFailed(old_ue.ue_index));
        }
    };
    let _ = cu_cp
        .f1ap
        .dl_rrc_message_transfer(DlRrcMessageTransfer {
            gnb_cu_ue_f1ap_id: old_ue.gnb_cu_ue_f1ap_id,
            gnb_du_ue_f1ap_id: msg.gnb_du_ue_f1ap_id,
            rrc_container: RrcDlMessage::Reestablishment,
        })
        .await;

    match rrc_complete.result().await {
        TransactionOutcome::Value(RrcUlMessage::ReestablishmentComplete) => {
            let _ = cu_cp
                .f1ap
                .dl_rrc_message_transfer(DlRrcMessageTransfer {
                    gnb_cu_ue_f1ap_id: old_ue.gnb_cu_ue_f1ap_id,
                    gnb_du_ue_f1ap_id: msg.gnb_du_ue_f1ap_id,
                    rrc_container: RrcDlMessage::Reconfiguration { drbs_to_be_setup: Vec::new() },
                })
                .await;
            old_ue.mutable.lock().unwrap().reestablishing = false;
            old_ue.set_state(UeState::Connected);
            cu_cp.metrics().reestablishment_with_context();
            info!(ue_index = ?old_ue.ue_index, "reestablishment transferred context");
            Ok(old_ue.ue_index)
        }
        _ => {
            old_ue.mutable.lock().unwrap().reestablishing = false;
            cu_cp.request_ue_release(old_ue.ue_index, Cause::Misc(MiscCause::Unspecified));
            Err(CuCpError::ReestablishmentFailed(old_ue.ue_index))
        }
    }
}
