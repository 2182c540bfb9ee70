//! Intra-DU handover (original spec §4.2.4 "handover-pending" state,
//! §8 "Intra-DU handover success").
//!
//! The target UE context is disjoint from the source until the switch:
//! it is created fresh, carries the source's AMF/bearer association once
//! F1 and E1 confirm the target cell, and only then is the source
//! released.

use std::sync::Arc;

use ran_messages::cause::{Cause, MiscCause};
use ran_messages::e1ap::BearerContextModificationRequest;
use ran_messages::f1ap::{UeContextModificationRequest, UeContextSetupRequest};
use ran_types::{DuIndex, GnbCuUeF1apId, GnbDuUeF1apId, Pci};
use rt_async::TransactionOutcome;
use tracing::{info, warn};

use crate::ue_context::{F1ContextOutcome, UeContext, UeState, E1BearerOutcome};
use crate::CuCp;

pub(crate) async fn run_intra_du_handover(cu_cp: Arc<CuCp>, source: Arc<UeContext>, target_du: DuIndex, target_pci: Pci) {
    cu_cp.metrics().handover_requested();
    source.set_state(UeState::HandoverPending);

    let source_crnti = source.crnti();
    let sequencer_capacity = cu_cp.config().ue_sequencer_queue_capacity;
    let target = {
        let mut manager = cu_cp.ue_manager.lock().unwrap();
        match manager.insert(target_du, source_crnti, |ue_index| {
            UeContext::new(
                ue_index,
                target_du,
                source_crnti,
                target_pci,
                GnbDuUeF1apId::new(ue_index.value()),
                GnbCuUeF1apId::new(ue_index.value()),
                sequencer_capacity,
            )
        }) {
            Ok(target) => target,
            Err(err) => {
                warn!(?err, ue_index = ?source.ue_index, "failed to create target UE for handover");
                source.set_state(UeState::Connected);
                return;
            }
        }
    };

    {
        let source_state = source.mutable.lock().unwrap();
        let mut target_state = target.mutable.lock().unwrap();
        target_state.amf_ue_id = source_state.amf_ue_id;
        target_state.ran_ue_id = source_state.ran_ue_id;
        target_state.cu_cp_ue_e1ap_id = source_state.cu_cp_ue_e1ap_id;
        target_state.cu_up_ue_e1ap_id = source_state.cu_up_ue_e1ap_id;
        target_state.has_drb = source_state.has_drb;
    }

    if !fail_safe_setup(&cu_cp, &target).await {
        abort_target(&cu_cp, &source, &target).await;
        return;
    }

    target.set_state(UeState::Connected);
    cu_cp.request_ue_release(source.ue_index, Cause::Misc(MiscCause::Unspecified));
    cu_cp.metrics().handover_succeeded();
    info!(source = ?source.ue_index, target = ?target.ue_index, "intra-DU handover complete");
}

/// F1 UE Context Setup on the target, then E1 Bearer Context Modification
/// and F1 UE Context Modification to move the bearer across.
async fn fail_safe_setup(cu_cp: &Arc<CuCp>, target: &Arc<UeContext>) -> bool {
    let f1_setup = match target.f1_transactions.create_transaction(Some(0), Some(cu_cp.transaction_timeout())) {
        Ok(handle) => handle,
        Err(_) => return false,
    };
    if cu_cp
        .f1ap
        .ue_context_setup_request(target.ue_index, UeContextSetupRequest::default())
        .await
        .is_err()
    {
        f1_setup.cancel();
        return false;
    }
    if !matches!(
        f1_setup.result().await,
        TransactionOutcome::Value(F1ContextOutcome::SetupResponse(_))
    ) {
        return false;
    }

    let e1_modify = match target.e1_transactions.create_transaction(Some(1), Some(cu_cp.transaction_timeout())) {
        Ok(handle) => handle,
        Err(_) => return false,
    };
    if cu_cp
        .e1ap
        .bearer_context_modification_request(target.ue_index, BearerContextModificationRequest::default())
        .await
        .is_err()
    {
        e1_modify.cancel();
        return false;
    }
    if !matches!(
        e1_modify.result().await,
        TransactionOutcome::Value(E1BearerOutcome::ModificationResponse(_))
    ) {
        return false;
    }

    let f1_modify = match target.f1_transactions.create_transaction(Some(1), Some(cu_cp.transaction_timeout())) {
        Ok(handle) => handle,
        Err(_) => return false,
    };
    if cu_cp
        .f1ap
        .ue_context_modification_request(target.ue_index, UeContextModificationRequest::default())
        .await
        .is_err()
    {
        f1_modify.cancel();
        return false;
    }
    matches!(
        f1_modify.result().await,
        TransactionOutcome::Value(F1ContextOutcome::ModificationResponse(_))
    )
}

/// Handover failed: per original spec §4.2.4, the target is deleted and
/// the source stays connected.
async fn abort_target(cu_cp: &Arc<CuCp>, source: &Arc<UeContext>, target: &Arc<UeContext>) {
    target.set_state(UeState::Deleting);
    let key = crate::du_crnti_key(target.du_index(), target.crnti());
    cu_cp.ue_manager.lock().unwrap().remove(target.ue_index, key);
    source.set_state(UeState::Connected);
}
