//! End-to-end scenarios against a recording fake of the F1/E1/NGAP
//! adapters (original spec §8).

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use async_trait::async_trait;
use cu_cp::{AdapterError, CuCp, CuCpConfig, E1apAdapter, F1apAdapter, NgapAdapter};
use ran_messages::cause::{Cause, MiscCause};
use ran_messages::rrc::{RrcDlMessage, RrcUlMessage};
use ran_messages::{e1ap, f1ap, ngap};
use ran_types::{GnbCuUpId, GnbDuId, GnbDuUeF1apId, NrCellIdentity, Pci, Rnti, UeIndex};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    F1SetupResponse,
    F1SetupFailure,
    DlRrcReject,
    DlRrcOther,
    UeContextSetupRequest,
    UeContextModificationRequest,
    UeContextReleaseCommand,
    GnbCuConfigurationUpdate,
    BearerContextModificationRequest,
    BearerReleaseCommand,
    InitialUeMessage,
    UeContextReleaseRequest,
}

/// Records every outbound send and, for the request/response pairs this
/// core awaits a transaction on, synchronously calls back into `CuCp` to
/// complete it, standing in for a DU/CU-UP/AMF peer that always replies.
struct FakeAdapters {
    cu_cp: Mutex<Weak<CuCp>>,
    events: Mutex<Vec<Event>>,
    ng_setup_succeeds: bool,
}

impl FakeAdapters {
    fn new(ng_setup_succeeds: bool) -> Arc<Self> {
        Arc::new(Self {
            cu_cp: Mutex::new(Weak::new()),
            events: Mutex::new(Vec::new()),
            ng_setup_succeeds,
        })
    }

    fn bind(&self, cu_cp: &Arc<CuCp>) {
        *self.cu_cp.lock().unwrap() = Arc::downgrade(cu_cp);
    }

    fn cu_cp(&self) -> Arc<CuCp> {
        self.cu_cp.lock().unwrap().upgrade().expect("cu_cp still alive")
    }

    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl F1apAdapter for FakeAdapters {
    async fn f1_setup_response(&self, _du: GnbDuId, _msg: f1ap::F1SetupResponse) -> Result<(), AdapterError> {
        self.push(Event::F1SetupResponse);
        Ok(())
    }

    async fn f1_setup_failure(&self, _du: GnbDuId, _msg: f1ap::F1SetupFailure) -> Result<(), AdapterError> {
        self.push(Event::F1SetupFailure);
        Ok(())
    }

    async fn dl_rrc_message_transfer(&self, msg: f1ap::DlRrcMessageTransfer) -> Result<(), AdapterError> {
        let ue_index = UeIndex::new(msg.gnb_cu_ue_f1ap_id.value());
        let reply = |rrc_container| f1ap::UlRrcMessageTransfer {
            gnb_du_ue_f1ap_id: msg.gnb_du_ue_f1ap_id,
            gnb_cu_ue_f1ap_id: msg.gnb_cu_ue_f1ap_id,
            rrc_container,
        };
        match msg.rrc_container {
            RrcDlMessage::Reject => self.push(Event::DlRrcReject),
            RrcDlMessage::Reestablishment => {
                self.push(Event::DlRrcOther);
                // Stand in for the UE immediately completing reestablishment.
                self.cu_cp().handle_ul_rrc_message_transfer(ue_index, reply(RrcUlMessage::ReestablishmentComplete)).await;
            }
            RrcDlMessage::SecurityModeCommand => {
                self.push(Event::DlRrcOther);
                self.cu_cp().handle_ul_rrc_message_transfer(ue_index, reply(RrcUlMessage::SecurityModeComplete)).await;
            }
            RrcDlMessage::UeCapabilityEnquiry => {
                self.push(Event::DlRrcOther);
                self.cu_cp().handle_ul_rrc_message_transfer(ue_index, reply(RrcUlMessage::UeCapabilityInformation)).await;
            }
            RrcDlMessage::Reconfiguration { .. } => {
                self.push(Event::DlRrcOther);
                self.cu_cp().handle_ul_rrc_message_transfer(ue_index, reply(RrcUlMessage::ReconfigurationComplete)).await;
            }
            _ => self.push(Event::DlRrcOther),
        }
        Ok(())
    }

    async fn ue_context_setup_request(&self, ue: UeIndex, _msg: f1ap::UeContextSetupRequest) -> Result<(), AdapterError> {
        self.push(Event::UeContextSetupRequest);
        self.cu_cp().handle_ue_context_setup_response(ue, f1ap::UeContextSetupResponse::default());
        Ok(())
    }

    async fn ue_context_modification_request(&self, ue: UeIndex, _msg: f1ap::UeContextModificationRequest) -> Result<(), AdapterError> {
        self.push(Event::UeContextModificationRequest);
        self.cu_cp().handle_ue_context_modification_response(ue, f1ap::UeContextModificationResponse::default());
        Ok(())
    }

    async fn ue_context_release_command(&self, _ue: UeIndex, _msg: f1ap::UeContextReleaseCommand) -> Result<(), AdapterError> {
        self.push(Event::UeContextReleaseCommand);
        Ok(())
    }

    async fn gnb_cu_configuration_update(&self, _du: GnbDuId, _msg: f1ap::GnbCuConfigurationUpdate) -> Result<(), AdapterError> {
        self.push(Event::GnbCuConfigurationUpdate);
        Ok(())
    }
}

#[async_trait]
impl E1apAdapter for FakeAdapters {
    async fn e1_setup_response(&self, _cu_up: GnbCuUpId, _msg: e1ap::E1SetupResponse) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn e1_setup_failure(&self, _cu_up: GnbCuUpId, _msg: e1ap::E1SetupFailure) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn bearer_context_setup_request(&self, ue: UeIndex, _msg: e1ap::BearerContextSetupRequest) -> Result<(), AdapterError> {
        self.cu_cp().handle_bearer_context_setup_response(ue, e1ap::BearerContextSetupResponse {
            drbs_setup: vec![1],
        });
        Ok(())
    }

    async fn bearer_context_modification_request(&self, ue: UeIndex, _msg: e1ap::BearerContextModificationRequest) -> Result<(), AdapterError> {
        self.push(Event::BearerContextModificationRequest);
        self.cu_cp().handle_bearer_context_modification_response(ue, e1ap::BearerContextModificationResponse {
            drbs_modified: vec![1],
        });
        Ok(())
    }

    async fn bearer_context_release_command(&self, _ue: UeIndex, _msg: e1ap::BearerContextReleaseCommand) -> Result<(), AdapterError> {
        self.push(Event::BearerReleaseCommand);
        Ok(())
    }

    async fn e1_release_response(&self, _msg: e1ap::E1ReleaseResponse) -> Result<(), AdapterError> {
        Ok(())
    }
}

#[async_trait]
impl NgapAdapter for FakeAdapters {
    async fn ng_setup_request(&self, _msg: ngap::NgSetupRequest) -> Result<(), AdapterError> {
        let cu_cp = self.cu_cp();
        if self.ng_setup_succeeds {
            cu_cp.handle_ng_setup_response(ngap::NgSetupResponse);
        } else {
            cu_cp.handle_ng_setup_failure(ngap::NgSetupFailure {
                cause: Cause::Misc(MiscCause::Unspecified),
            });
        }
        Ok(())
    }

    async fn initial_ue_message(&self, _msg: ngap::InitialUeMessage) -> Result<(), AdapterError> {
        self.push(Event::InitialUeMessage);
        Ok(())
    }

    async fn uplink_nas_transport(&self, _msg: ngap::UplinkNasTransport) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn initial_context_setup_response(&self, _msg: ngap::InitialContextSetupResponse) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn ue_radio_capability_info_indication(&self, _msg: ngap::UeRadioCapabilityInfoIndication) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn pdu_session_resource_setup_response(&self, _msg: ngap::PduSessionResourceSetupResponse) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn pdu_session_resource_modify_response(&self, _msg: ngap::PduSessionResourceModifyResponse) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn pdu_session_resource_release_response(&self, _msg: ngap::PduSessionResourceReleaseResponse) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn ue_context_release_complete(&self, _msg: ngap::UeContextReleaseComplete) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn ue_context_release_request(&self, _ue: UeIndex, _msg: ngap::UeContextReleaseRequest) -> Result<(), AdapterError> {
        self.push(Event::UeContextReleaseRequest);
        Ok(())
    }

    async fn ng_reset(&self, _msg: ngap::NgReset) -> Result<(), AdapterError> {
        Ok(())
    }
}

fn test_config() -> CuCpConfig {
    CuCpConfig {
        gnb_id: 1,
        gnb_id_bit_length: 22,
        max_nof_dus: 4,
        max_nof_cu_ups: 4,
        max_nof_ues: 16,
        ue_sequencer_queue_capacity: 8,
        transaction_timeout: Duration::from_millis(500),
    }
}

fn make_cu_cp(ng_setup_succeeds: bool) -> (Arc<CuCp>, Arc<FakeAdapters>) {
    let fake = FakeAdapters::new(ng_setup_succeeds);
    let cu_cp = CuCp::new(test_config(), fake.clone(), fake.clone(), fake.clone());
    fake.bind(&cu_cp);
    (cu_cp, fake)
}

fn served_cell(pci: u16, nci_offset: u64) -> f1ap::ServedCellInfo {
    f1ap::ServedCellInfo {
        nci: NrCellIdentity::new((1u64 << (36 - 22)) + nci_offset),
        pci: Pci::new(pci),
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition did not become true in time");
}

#[tokio::test]
async fn ng_setup_failure_then_f1_setup_is_rejected() {
    let (cu_cp, fake) = make_cu_cp(false);

    let outcome = cu_cp.start().await;
    assert!(matches!(outcome, cu_cp::NgSetupResult::Failure(_)));
    assert!(!cu_cp.is_amf_connected());

    let result = cu_cp
        .handle_f1_setup_request(f1ap::F1SetupRequest {
            gnb_du_id: GnbDuId::new(1),
            served_cells: vec![served_cell(5, 0)],
        })
        .await;

    assert!(result.is_err());
    assert_eq!(cu_cp.nof_dus(), 0);
    assert!(fake.events().contains(&Event::F1SetupFailure));
    assert!(!fake.events().contains(&Event::F1SetupResponse));
}

#[tokio::test]
async fn amf_drop_cascade_rejects_existing_ue_and_new_attach() {
    let (cu_cp, fake) = make_cu_cp(true);

    let _ = cu_cp.start().await;
    assert!(cu_cp.is_amf_connected());

    let du_index = cu_cp
        .handle_f1_setup_request(f1ap::F1SetupRequest {
            gnb_du_id: GnbDuId::new(1),
            served_cells: vec![served_cell(5, 0)],
        })
        .await
        .expect("F1 setup succeeds while AMF-connected");

    cu_cp
        .handle_initial_ul_rrc(du_index, f1ap::InitialUlRrcMessageTransfer {
            gnb_du_ue_f1ap_id: GnbDuUeF1apId::new(1),
            crnti: Rnti::new(0x4601),
            pcell: served_cell(5, 0).nci,
            rrc_container: RrcUlMessage::SetupRequest,
        })
        .await
        .expect("attach succeeds while AMF-connected");
    assert_eq!(cu_cp.nof_ues(), 1);

    cu_cp.handle_amf_disconnect().await;

    assert!(!cu_cp.is_amf_connected());
    assert_eq!(cu_cp.nof_ues(), 0);
    let events = fake.events();
    let release_pos = events.iter().position(|e| *e == Event::UeContextReleaseCommand);
    let update_pos = events.iter().position(|e| *e == Event::GnbCuConfigurationUpdate);
    assert!(release_pos.is_some() && update_pos.is_some());
    assert!(release_pos < update_pos, "release command must precede configuration update");

    // A subsequent Initial UL RRC must be rejected with DL RRC Reject, not create a UE.
    let rejected = cu_cp
        .handle_initial_ul_rrc(du_index, f1ap::InitialUlRrcMessageTransfer {
            gnb_du_ue_f1ap_id: GnbDuUeF1apId::new(2),
            crnti: Rnti::new(0x4602),
            pcell: served_cell(5, 0).nci,
            rrc_container: RrcUlMessage::SetupRequest,
        })
        .await;
    assert!(rejected.is_err());
    assert_eq!(cu_cp.nof_ues(), 0);
    assert!(fake.events().contains(&Event::DlRrcReject));
}

#[tokio::test]
async fn reestablishment_with_context_transfers_identity() {
    let (cu_cp, fake) = make_cu_cp(true);
    let _ = cu_cp.start().await;
    let du_index = cu_cp
        .handle_f1_setup_request(f1ap::F1SetupRequest {
            gnb_du_id: GnbDuId::new(1),
            served_cells: vec![served_cell(5, 0)],
        })
        .await
        .unwrap();

    let old_ue = cu_cp
        .handle_initial_ul_rrc(du_index, f1ap::InitialUlRrcMessageTransfer {
            gnb_du_ue_f1ap_id: GnbDuUeF1apId::new(1),
            crnti: Rnti::new(0x4601),
            pcell: served_cell(5, 0).nci,
            rrc_container: RrcUlMessage::SetupRequest,
        })
        .await
        .unwrap();

    // Give the old UE an AMF association and a DRB so the transfer path applies.
    {
        let ue = cu_cp.get_ue(old_ue).unwrap();
        let mut state = ue.mutable.lock().unwrap();
        state.amf_ue_id = Some(ran_types::AmfUeId::new(42));
        state.has_drb = true;
    }

    let new_ue = cu_cp
        .handle_initial_ul_rrc(du_index, f1ap::InitialUlRrcMessageTransfer {
            gnb_du_ue_f1ap_id: GnbDuUeF1apId::new(2),
            crnti: Rnti::new(0x4602),
            pcell: served_cell(5, 0).nci,
            rrc_container: RrcUlMessage::ReestablishmentRequest {
                old_crnti: Rnti::new(0x4601),
                old_pci: Pci::new(5),
                short_mac_i: 0,
            },
        })
        .await;

    assert!(new_ue.is_ok(), "transfer path should succeed: {new_ue:?}");
    assert_eq!(cu_cp.nof_ues(), 1);
    assert_eq!(cu_cp.metrics().reestablishments_with_context.load(Ordering::Relaxed), 1);
    assert!(fake.events().contains(&Event::BearerContextModificationRequest));
    assert!(fake.events().contains(&Event::UeContextModificationRequest));
}

#[tokio::test]
async fn reestablishment_fallback_without_context_releases_old_ue() {
    let (cu_cp, fake) = make_cu_cp(true);
    let _ = cu_cp.start().await;
    let du_index = cu_cp
        .handle_f1_setup_request(f1ap::F1SetupRequest {
            gnb_du_id: GnbDuId::new(1),
            served_cells: vec![served_cell(5, 0)],
        })
        .await
        .unwrap();

    // Fresh UE: no security, no DRB, no AMF association yet.
    cu_cp
        .handle_initial_ul_rrc(du_index, f1ap::InitialUlRrcMessageTransfer {
            gnb_du_ue_f1ap_id: GnbDuUeF1apId::new(1),
            crnti: Rnti::new(0x4601),
            pcell: served_cell(5, 0).nci,
            rrc_container: RrcUlMessage::SetupRequest,
        })
        .await
        .unwrap();

    let result = cu_cp
        .handle_initial_ul_rrc(du_index, f1ap::InitialUlRrcMessageTransfer {
            gnb_du_ue_f1ap_id: GnbDuUeF1apId::new(2),
            crnti: Rnti::new(0x4602),
            pcell: served_cell(5, 0).nci,
            rrc_container: RrcUlMessage::ReestablishmentRequest {
                old_crnti: Rnti::new(0x4601),
                old_pci: Pci::new(5),
                short_mac_i: 0,
            },
        })
        .await;

    assert!(result.is_ok());
    assert_eq!(cu_cp.nof_ues(), 1);
    assert_eq!(cu_cp.metrics().reestablishments_without_context.load(Ordering::Relaxed), 1);
    assert!(!fake.events().contains(&Event::UeContextReleaseRequest));
}

#[tokio::test]
async fn reestablishment_fallback_with_amf_id_but_no_drb_releases_old_ue() {
    let (cu_cp, fake) = make_cu_cp(true);
    let _ = cu_cp.start().await;
    let du_index = cu_cp
        .handle_f1_setup_request(f1ap::F1SetupRequest {
            gnb_du_id: GnbDuId::new(1),
            served_cells: vec![served_cell(5, 0)],
        })
        .await
        .unwrap();

    let old_ue = cu_cp
        .handle_initial_ul_rrc(du_index, f1ap::InitialUlRrcMessageTransfer {
            gnb_du_ue_f1ap_id: GnbDuUeF1apId::new(1),
            crnti: Rnti::new(0x4601),
            pcell: served_cell(5, 0).nci,
            rrc_container: RrcUlMessage::SetupRequest,
        })
        .await
        .unwrap();

    // AMF-connected, but no DRB yet: the no-DRB fallback branch, distinct
    // from the no-`amf_ue_id` branch exercised elsewhere.
    {
        let ue = cu_cp.get_ue(old_ue).unwrap();
        let mut state = ue.mutable.lock().unwrap();
        state.amf_ue_id = Some(ran_types::AmfUeId::new(42));
        state.has_drb = false;
    }

    let result = cu_cp
        .handle_initial_ul_rrc(du_index, f1ap::InitialUlRrcMessageTransfer {
            gnb_du_ue_f1ap_id: GnbDuUeF1apId::new(2),
            crnti: Rnti::new(0x4602),
            pcell: served_cell(5, 0).nci,
            rrc_container: RrcUlMessage::ReestablishmentRequest {
                old_crnti: Rnti::new(0x4601),
                old_pci: Pci::new(5),
                short_mac_i: 0,
            },
        })
        .await;

    assert!(result.is_ok());
    // The old UE must actually be gone, not just release-requested: only the
    // fresh UE created by the fallback attach remains registered.
    assert_eq!(cu_cp.nof_ues(), 1);
    assert!(cu_cp.get_ue(old_ue).is_none());
    assert_eq!(cu_cp.metrics().reestablishments_without_context.load(Ordering::Relaxed), 1);
    assert!(fake.events().contains(&Event::UeContextReleaseRequest));
}

#[tokio::test]
async fn initial_context_setup_runs_security_and_capability_then_pdu_session_setup() {
    let (cu_cp, fake) = make_cu_cp(true);
    let _ = cu_cp.start().await;
    let du_index = cu_cp
        .handle_f1_setup_request(f1ap::F1SetupRequest {
            gnb_du_id: GnbDuId::new(1),
            served_cells: vec![served_cell(5, 0)],
        })
        .await
        .unwrap();

    let ue_index = cu_cp
        .handle_initial_ul_rrc(du_index, f1ap::InitialUlRrcMessageTransfer {
            gnb_du_ue_f1ap_id: GnbDuUeF1apId::new(1),
            crnti: Rnti::new(0x4601),
            pcell: served_cell(5, 0).nci,
            rrc_container: RrcUlMessage::SetupRequest,
        })
        .await
        .unwrap();

    cu_cp
        .handle_initial_context_setup_request(ue_index, ngap::InitialContextSetupRequest::default(), ran_types::AmfUeId::new(7))
        .await;

    wait_until(|| cu_cp.get_ue(ue_index).map(|ue| ue.state() == cu_cp::UeState::Connected).unwrap_or(false)).await;

    cu_cp
        .handle_pdu_session_resource_setup_request(ue_index, ngap::PduSessionResourceSetupRequest {
            pdu_sessions: vec![9],
        })
        .await;

    wait_until(|| cu_cp.get_ue(ue_index).map(|ue| ue.has_drb()).unwrap_or(false)).await;

    let events = fake.events();
    assert!(events.contains(&Event::UeContextSetupRequest));
    assert!(events.contains(&Event::UeContextModificationRequest));
}

#[tokio::test]
async fn intra_du_handover_success() {
    let (cu_cp, _fake) = make_cu_cp(true);
    let _ = cu_cp.start().await;

    let source_du = cu_cp
        .handle_f1_setup_request(f1ap::F1SetupRequest {
            gnb_du_id: GnbDuId::new(1),
            served_cells: vec![served_cell(5, 0)],
        })
        .await
        .unwrap();
    let target_du = cu_cp
        .handle_f1_setup_request(f1ap::F1SetupRequest {
            gnb_du_id: GnbDuId::new(2),
            served_cells: vec![served_cell(9, 1)],
        })
        .await
        .unwrap();

    let source_ue = cu_cp
        .handle_initial_ul_rrc(source_du, f1ap::InitialUlRrcMessageTransfer {
            gnb_du_ue_f1ap_id: GnbDuUeF1apId::new(1),
            crnti: Rnti::new(0x4601),
            pcell: served_cell(5, 0).nci,
            rrc_container: RrcUlMessage::SetupRequest,
        })
        .await
        .unwrap();

    {
        let ue = cu_cp.get_ue(source_ue).unwrap();
        let mut state = ue.mutable.lock().unwrap();
        state.amf_ue_id = Some(ran_types::AmfUeId::new(42));
        state.has_drb = true;
    }

    cu_cp.handle_measurement_report(source_ue, target_du, Pci::new(9)).await;

    wait_until(|| cu_cp.metrics().handovers_succeeded.load(Ordering::Relaxed) == 1).await;
    wait_until(|| cu_cp.nof_ues() == 1).await;

    assert_eq!(cu_cp.metrics().handovers_requested.load(Ordering::Relaxed), 1);
    assert_eq!(cu_cp.metrics().handovers_succeeded.load(Ordering::Relaxed), 1);
    assert_eq!(cu_cp.nof_ues(), 1);
}
