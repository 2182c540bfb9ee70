//! NGAP link: the single AMF connection (original spec §4.2.1 "NGAP link").

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rt_async::{TransactionError, TransactionManager, TransactionOutcome};

use ran_messages::ngap::{NgSetupFailure, NgSetupResponse};

#[derive(Debug, Clone)]
pub enum NgSetupResult {
    Success(NgSetupResponse),
    Failure(NgSetupFailure),
}

const NG_SETUP_TRANSACTION_ID: usize = 0;

/// Owns the NG-Setup transaction at startup and tracks whether CU-CP is
/// currently AMF-connected. Per-UE AMF correlation (`amf_ue_id`) lives on
/// `UeContext`, not here.
pub struct NgapLink {
    connected: AtomicBool,
    setup: TransactionManager<NgSetupResult>,
}

impl NgapLink {
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            setup: TransactionManager::new(1),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    /// Arms the single NG-Setup transaction slot ahead of sending the
    /// request; returns a handle the caller awaits for the outcome.
    pub fn arm_setup_transaction(
        &self,
        timeout: Duration,
    ) -> Result<rt_async::TransactionHandle<'_, NgSetupResult>, TransactionError> {
        self.setup
            .create_transaction(Some(NG_SETUP_TRANSACTION_ID), Some(timeout))
    }

    pub fn complete_setup_success(&self, msg: NgSetupResponse) -> bool {
        self.set_connected(true);
        self.setup
            .set(NG_SETUP_TRANSACTION_ID, NgSetupResult::Success(msg))
    }

    pub fn complete_setup_failure(&self, msg: NgSetupFailure) -> bool {
        self.set_connected(false);
        self.setup
            .set(NG_SETUP_TRANSACTION_ID, NgSetupResult::Failure(msg))
    }

    pub fn disconnect(&self) {
        self.set_connected(false);
    }
}

impl Default for NgapLink {
    fn default() -> Self {
        Self::new()
    }
}

pub type NgSetupOutcome = TransactionOutcome<NgSetupResult>;
