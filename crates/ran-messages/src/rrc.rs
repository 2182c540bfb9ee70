//! RRC is carried opaquely inside F1AP containers; the wire codec itself is
//! an external collaborator (see `RrcCodec` in the `cu-cp` crate). What
//! follows is the typed shape the CU-CP core reasons about, not an ASN.1
//! transcription.

use ran_types::{Pci, Rnti};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RrcUlMessage {
    SetupRequest,
    SetupComplete,
    ReestablishmentRequest {
        old_crnti: Rnti,
        old_pci: Pci,
        short_mac_i: u16,
    },
    ReestablishmentComplete,
    ReconfigurationComplete,
    SecurityModeComplete,
    UeCapabilityInformation,
    /// Carries an uplink NAS PDU opaquely back to the AMF (original spec
    /// §4.2.3 step 2, "NAS ping-pong").
    UlInformationTransfer { nas_pdu: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RrcDlMessage {
    Setup,
    Reject,
    Reestablishment,
    Reconfiguration { drbs_to_be_setup: Vec<u8> },
    SecurityModeCommand,
    UeCapabilityEnquiry,
    /// Carries a downlink NAS PDU opaquely from the AMF (original spec
    /// §4.2.3 step 2, "NAS ping-pong").
    DlInformationTransfer { nas_pdu: Vec<u8> },
}
