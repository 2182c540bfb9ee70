//! Procedure library: coroutines for UE attach, release, reestablishment
//! and intra-DU handover (original spec §4.2.1 "Procedure library").

pub(crate) mod attach;
pub(crate) mod handover;
pub(crate) mod pdu_session;
pub(crate) mod reestablishment;
pub(crate) mod release;
