//! External collaborators this core assumes (original spec §6). Wire
//! encoding, transport, and retry policy all live on the other side of
//! these traits; the CU-CP core only needs "deliver this message" and
//! "I was handed this message".

use async_trait::async_trait;
use ran_messages::{e1ap, f1ap, ngap, rrc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("adapter transport failure: {0}")]
pub struct AdapterError(pub String);

/// Downlink F1AP sends. Inbound F1AP arrives through `CuCp::handle_f1_*`
/// methods instead, since the core is the consumer there, not the producer.
#[async_trait]
pub trait F1apAdapter: Send + Sync {
    async fn f1_setup_response(&self, du: ran_types::GnbDuId, msg: f1ap::F1SetupResponse) -> Result<(), AdapterError>;
    async fn f1_setup_failure(&self, du: ran_types::GnbDuId, msg: f1ap::F1SetupFailure) -> Result<(), AdapterError>;
    async fn dl_rrc_message_transfer(&self, msg: f1ap::DlRrcMessageTransfer) -> Result<(), AdapterError>;
    async fn ue_context_setup_request(&self, ue: ran_types::UeIndex, msg: f1ap::UeContextSetupRequest) -> Result<(), AdapterError>;
    async fn ue_context_modification_request(&self, ue: ran_types::UeIndex, msg: f1ap::UeContextModificationRequest) -> Result<(), AdapterError>;
    async fn ue_context_release_command(&self, ue: ran_types::UeIndex, msg: f1ap::UeContextReleaseCommand) -> Result<(), AdapterError>;
    async fn gnb_cu_configuration_update(&self, du: ran_types::GnbDuId, msg: f1ap::GnbCuConfigurationUpdate) -> Result<(), AdapterError>;
}

/// Downlink E1AP sends.
#[async_trait]
pub trait E1apAdapter: Send + Sync {
    async fn e1_setup_response(&self, cu_up: ran_types::GnbCuUpId, msg: e1ap::E1SetupResponse) -> Result<(), AdapterError>;
    async fn e1_setup_failure(&self, cu_up: ran_types::GnbCuUpId, msg: e1ap::E1SetupFailure) -> Result<(), AdapterError>;
    async fn bearer_context_setup_request(&self, ue: ran_types::UeIndex, msg: e1ap::BearerContextSetupRequest) -> Result<(), AdapterError>;
    async fn bearer_context_modification_request(&self, ue: ran_types::UeIndex, msg: e1ap::BearerContextModificationRequest) -> Result<(), AdapterError>;
    async fn bearer_context_release_command(&self, ue: ran_types::UeIndex, msg: e1ap::BearerContextReleaseCommand) -> Result<(), AdapterError>;
    async fn e1_release_response(&self, msg: e1ap::E1ReleaseResponse) -> Result<(), AdapterError>;
}

/// Downlink NGAP sends.
#[async_trait]
pub trait NgapAdapter: Send + Sync {
    async fn ng_setup_request(&self, msg: ngap::NgSetupRequest) -> Result<(), AdapterError>;
    async fn initial_ue_message(&self, msg: ngap::InitialUeMessage) -> Result<(), AdapterError>;
    async fn uplink_nas_transport(&self, msg: ngap::UplinkNasTransport) -> Result<(), AdapterError>;
    async fn initial_context_setup_response(&self, msg: ngap::InitialContextSetupResponse) -> Result<(), AdapterError>;
    async fn ue_radio_capability_info_indication(&self, msg: ngap::UeRadioCapabilityInfoIndication) -> Result<(), AdapterError>;
    async fn pdu_session_resource_setup_response(&self, msg: ngap::PduSessionResourceSetupResponse) -> Result<(), AdapterError>;
    async fn pdu_session_resource_modify_response(&self, msg: ngap::PduSessionResourceModifyResponse) -> Result<(), AdapterError>;
    async fn pdu_session_resource_release_response(&self, msg: ngap::PduSessionResourceReleaseResponse) -> Result<(), AdapterError>;
    async fn ue_context_release_complete(&self, msg: ngap::UeContextReleaseComplete) -> Result<(), AdapterError>;
    async fn ue_context_release_request(&self, ue: ran_types::UeIndex, msg: ngap::UeContextReleaseRequest) -> Result<(), AdapterError>;
    async fn ng_reset(&self, msg: ngap::NgReset) -> Result<(), AdapterError>;
}

/// Pack/unpack for RRC UL-CCCH/DL-CCCH/UL-DCCH/DL-DCCH. Field semantics are
/// out of scope; the core only needs the typed enum on either side of the
/// opaque F1AP container.
pub trait RrcCodec: Send + Sync {
    fn encode(&self, msg: &rrc::RrcDlMessage) -> Vec<u8>;
    fn decode(&self, bytes: &[u8]) -> Option<rrc::RrcUlMessage>;
}
