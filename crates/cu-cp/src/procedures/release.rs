//! UE release cascade (original spec §4.2.6 "failure cascades").
//!
//! Tears down whichever peers actually hold context for this UE, skipping
//! any side that has already lost its connection, then drops the UE from
//! the registry.

use std::sync::Arc;

use ran_messages::cause::Cause;
use ran_messages::e1ap::BearerContextReleaseCommand;
use ran_messages::f1ap::UeContextReleaseCommand;
use ran_messages::ngap::UeContextReleaseComplete;
use ran_types::UeIndex;
use tracing::info;

use crate::ue_context::UeState;
use crate::CuCp;

/// F1 transaction slot reserved for the release-class round trip, distinct
/// from the setup (0) and modification (1) slots used elsewhere on this UE.
pub(crate) const RELEASE_SLOT: usize = 2;

pub(crate) async fn release_ue(cu_cp: Arc<CuCp>, ue_index: UeIndex, cause: Cause) {
    let Some(ue) = cu_cp.get_ue(ue_index) else { return };
    ue.set_state(UeState::Deleting);

    let (du_index, crnti, has_drb, amf_ue_id) = {
        let state = ue.mutable.lock().unwrap();
        (state.du_index, state.crnti, state.has_drb, state.amf_ue_id)
    };

    if has_drb {
        let _ = cu_cp
            .e1ap
            .bearer_context_release_command(ue_index, BearerContextReleaseCommand)
            .await;
    }

    let release_complete = ue
        .f1_transactions
        .create_transaction(Some(RELEASE_SLOT), Some(cu_cp.transaction_timeout()))
        .ok();

    let _ = cu_cp
        .f1ap
        .ue_context_release_command(ue_index, UeContextReleaseCommand {
            cause,
            rrc_reject: false,
        })
        .await;

    // Waits for the DU's own F1 UE Context Release Complete before telling
    // the AMF; a timeout still proceeds to removal rather than leaving the
    // UE stranded on a DU that never answered.
    if let Some(handle) = release_complete {
        let _ = handle.result().await;
    }

    if amf_ue_id.is_some() {
        let _ = cu_cp.ngap.ue_context_release_complete(UeContextReleaseComplete).await;
    }

    let key = crate::du_crnti_key(du_index, crnti);
    cu_cp.ue_manager.lock().unwrap().remove(ue_index, key);
    info!(?ue_index, "UE released");
}
