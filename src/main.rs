//! Entry point for the `gnb` control-plane core: loads configuration,
//! wires the CU-CP core to its F1/E1/NG boundary adapters, and starts
//! NG Setup against the AMF.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cu_cp::{AdapterError, CuCp, CuCpConfig, E1apAdapter, F1apAdapter, NgapAdapter};
use gnb_config::GnbConfig;
use ran_messages::{e1ap, f1ap, ngap};
use ran_types::{GnbCuUpId, GnbDuId, UeIndex};
use rx_buffer_pool::{RxBufferPool, RxBufferPoolConfig};
use tracing::info;

/// Logs every outbound message instead of putting it on the wire; a real
/// deployment swaps this for the SCTP/ASN.1 transport.
struct LoggingAdapters;

#[async_trait]
impl F1apAdapter for LoggingAdapters {
    async fn f1_setup_response(&self, du: GnbDuId, msg: f1ap::F1SetupResponse) -> Result<(), AdapterError> {
        info!(?du, ?msg, "-> F1 Setup Response");
        Ok(())
    }

    async fn f1_setup_failure(&self, du: GnbDuId, msg: f1ap::F1SetupFailure) -> Result<(), AdapterError> {
        info!(?du, ?msg, "-> F1 Setup Failure");
        Ok(())
    }

    async fn dl_rrc_message_transfer(&self, msg: f1ap::DlRrcMessageTransfer) -> Result<(), AdapterError> {
        info!(?msg, "-> DL RRC Message Transfer");
        Ok(())
    }

    async fn ue_context_setup_request(&self, ue: UeIndex, msg: f1ap::UeContextSetupRequest) -> Result<(), AdapterError> {
        info!(?ue, ?msg, "-> UE Context Setup Request");
        Ok(())
    }

    async fn ue_context_modification_request(&self, ue: UeIndex, msg: f1ap::UeContextModificationRequest) -> Result<(), AdapterError> {
        info!(?ue, ?msg, "-> UE Context Modification Request");
        Ok(())
    }

    async fn ue_context_release_command(&self, ue: UeIndex, msg: f1ap::UeContextReleaseCommand) -> Result<(), AdapterError> {
        info!(?ue, ?msg, "-> UE Context Release Command");
        Ok(())
    }

    async fn gnb_cu_configuration_update(&self, du: GnbDuId, msg: f1ap::GnbCuConfigurationUpdate) -> Result<(), AdapterError> {
        info!(?du, ?msg, "-> gNB-CU Configuration Update");
        Ok(())
    }
}

#[async_trait]
impl E1apAdapter for LoggingAdapters {
    async fn e1_setup_response(&self, cu_up: GnbCuUpId, msg: e1ap::E1SetupResponse) -> Result<(), AdapterError> {
        info!(?cu_up, ?msg, "-> E1 Setup Response");
        Ok(())
    }

    async fn e1_setup_failure(&self, cu_up: GnbCuUpId, msg: e1ap::E1SetupFailure) -> Result<(), AdapterError> {
        info!(?cu_up, ?msg, "-> E1 Setup Failure");
        Ok(())
    }

    async fn bearer_context_setup_request(&self, ue: UeIndex, msg: e1ap::BearerContextSetupRequest) -> Result<(), AdapterError> {
        info!(?ue, ?msg, "-> Bearer Context Setup Request");
        Ok(())
    }

    async fn bearer_context_modification_request(&self, ue: UeIndex, msg: e1ap::BearerContextModificationRequest) -> Result<(), AdapterError> {
        info!(?ue, ?msg, "-> Bearer Context Modification Request");
        Ok(())
    }

    async fn bearer_context_release_command(&self, ue: UeIndex, msg: e1ap::BearerContextReleaseCommand) -> Result<(), AdapterError> {
        info!(?ue, ?msg, "-> Bearer Context Release Command");
        Ok(())
    }

    async fn e1_release_response(&self, msg: e1ap::E1ReleaseResponse) -> Result<(), AdapterError> {
        info!(?msg, "-> E1 Release Response");
        Ok(())
    }
}

#[async_trait]
impl NgapAdapter for LoggingAdapters {
    async fn ng_setup_request(&self, msg: ngap::NgSetupRequest) -> Result<(), AdapterError> {
        info!(?msg, "-> NG Setup Request");
        Ok(())
    }

    async fn initial_ue_message(&self, msg: ngap::InitialUeMessage) -> Result<(), AdapterError> {
        info!(?msg, "-> Initial UE Message");
        Ok(())
    }

    async fn uplink_nas_transport(&self, msg: ngap::UplinkNasTransport) -> Result<(), AdapterError> {
        info!(?msg, "-> Uplink NAS Transport");
        Ok(())
    }

    async fn initial_context_setup_response(&self, msg: ngap::InitialContextSetupResponse) -> Result<(), AdapterError> {
        info!(?msg, "-> Initial Context Setup Response");
        Ok(())
    }

    async fn ue_radio_capability_info_indication(&self, msg: ngap::UeRadioCapabilityInfoIndication) -> Result<(), AdapterError> {
        info!(?msg, "-> UE Radio Capability Info Indication");
        Ok(())
    }

    async fn pdu_session_resource_setup_response(&self, msg: ngap::PduSessionResourceSetupResponse) -> Result<(), AdapterError> {
        info!(?msg, "-> PDU Session Resource Setup Response");
        Ok(())
    }

    async fn pdu_session_resource_modify_response(&self, msg: ngap::PduSessionResourceModifyResponse) -> Result<(), AdapterError> {
        info!(?msg, "-> PDU Session Resource Modify Response");
        Ok(())
    }

    async fn pdu_session_resource_release_response(&self, msg: ngap::PduSessionResourceReleaseResponse) -> Result<(), AdapterError> {
        info!(?msg, "-> PDU Session Resource Release Response");
        Ok(())
    }

    async fn ue_context_release_complete(&self, msg: ngap::UeContextReleaseComplete) -> Result<(), AdapterError> {
        info!(?msg, "-> UE Context Release Complete");
        Ok(())
    }

    async fn ue_context_release_request(&self, ue: UeIndex, msg: ngap::UeContextReleaseRequest) -> Result<(), AdapterError> {
        info!(?ue, ?msg, "-> UE Context Release Request");
        Ok(())
    }

    async fn ng_reset(&self, msg: ngap::NgReset) -> Result<(), AdapterError> {
        info!(?msg, "-> NG Reset");
        Ok(())
    }
}

fn init_tracing(config: &gnb_config::LogConfig) {
    let filter = tracing_subscriber::EnvFilter::new(config.filter.clone());
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if config.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match env::args().nth(1) {
        Some(path) => GnbConfig::from_file(&path)?,
        None => GnbConfig::default(),
    };
    init_tracing(&config.log);

    let cu_cp_config = CuCpConfig {
        gnb_id: config.gnb_id.id,
        gnb_id_bit_length: config.gnb_id.bit_length,
        max_nof_dus: config.cu_cp.max_nof_dus,
        max_nof_cu_ups: config.cu_cp.max_nof_cu_ups,
        max_nof_ues: config.cu_cp.max_nof_ues,
        ue_sequencer_queue_capacity: config.cu_cp.ue_sequencer_queue_capacity,
        transaction_timeout: Duration::from_secs(config.cu_cp.transaction_timeout_secs),
    };

    let adapters = Arc::new(LoggingAdapters);
    let cu_cp = CuCp::new(cu_cp_config, adapters.clone(), adapters.clone(), adapters);

    let rx_buffer_pool_config = RxBufferPoolConfig {
        max_codeblock_size: config.rx_buffer_pool.max_codeblock_size,
        nof_buffers: config.rx_buffer_pool.nof_buffers,
        nof_codeblocks: config.rx_buffer_pool.nof_codeblocks,
        expire_timeout_slots: config.rx_buffer_pool.expire_timeout_slots,
        external_soft_bits: config.rx_buffer_pool.external_soft_bits,
    };
    let _rx_buffer_pool = RxBufferPool::new(rx_buffer_pool_config);

    info!("gNB control-plane core starting, attempting NG Setup");
    let outcome = cu_cp.start().await;
    info!(?outcome, "NG Setup complete");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    Ok(())
}
