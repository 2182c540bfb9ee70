//! E1AP: CU-CP ↔ CU-UP.

use ran_types::GnbCuUpId;

use crate::cause::Cause;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct E1SetupRequest {
    pub gnb_cu_up_id: GnbCuUpId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct E1SetupResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct E1SetupFailure {
    pub cause: Cause,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BearerContextSetupRequest {
    pub pdu_sessions_to_setup: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BearerContextSetupResponse {
    pub drbs_setup: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BearerContextSetupFailure {
    pub cause: Cause,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BearerContextModificationRequest {
    pub drbs_to_be_setup: Vec<u8>,
    pub drbs_to_be_modified: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BearerContextModificationResponse {
    pub drbs_modified: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BearerContextModificationFailure {
    pub cause: Cause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BearerContextReleaseCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BearerContextReleaseComplete;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct E1ReleaseRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct E1ReleaseResponse;
