//! CU-CP core configuration: registry capacities and the timeout applied
//! to every F1/E1/NG transaction this core awaits.

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct CuCpConfig {
    pub gnb_id: u32,
    pub gnb_id_bit_length: u8,
    pub max_nof_dus: usize,
    pub max_nof_cu_ups: usize,
    pub max_nof_ues: usize,
    pub ue_sequencer_queue_capacity: usize,
    pub transaction_timeout: Duration,
}

impl Default for CuCpConfig {
    fn default() -> Self {
        Self {
            gnb_id: 1,
            gnb_id_bit_length: 22,
            max_nof_dus: 6,
            max_nof_cu_ups: 4,
            max_nof_ues: 4096,
            ue_sequencer_queue_capacity: 16,
            transaction_timeout: Duration::from_secs(5),
        }
    }
}
