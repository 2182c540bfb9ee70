//! NGAP: CU-CP ↔ AMF.

use ran_types::{AmfUeId, RanUeId};

use crate::cause::Cause;
use crate::rrc::RrcUlMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NgSetupRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NgSetupResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NgSetupFailure {
    pub cause: Cause,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialUeMessage {
    pub ran_ue_id: RanUeId,
    pub rrc_container: RrcUlMessage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownlinkNasTransport {
    pub amf_ue_id: AmfUeId,
    pub ran_ue_id: RanUeId,
    pub nas_pdu: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UplinkNasTransport {
    pub ran_ue_id: RanUeId,
    pub nas_pdu: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InitialContextSetupRequest {
    pub security_context: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InitialContextSetupResponse;

/// Sent alongside Initial Context Setup Response once the UE's capabilities
/// have been collected (original spec §4.2.3 step 3).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UeRadioCapabilityInfoIndication {
    pub ue_radio_capability: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitialContextSetupFailure {
    pub cause: Cause,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PduSessionResourceSetupRequest {
    pub pdu_sessions: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PduSessionResourceSetupResponse {
    pub pdu_sessions_setup: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PduSessionResourceModifyRequest {
    pub pdu_sessions: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PduSessionResourceModifyResponse {
    pub pdu_sessions_modified: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PduSessionResourceReleaseCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PduSessionResourceReleaseResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UeContextReleaseCommand {
    pub cause: Cause,
}

/// CU-CP-initiated: requests the AMF release a UE that has no DRBs yet
/// (original spec §4.2.5 reestablishment fallback without context).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UeContextReleaseRequest {
    pub cause: Cause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UeContextReleaseComplete;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NgReset;
