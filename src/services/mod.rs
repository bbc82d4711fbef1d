//! Domain services used by the websocket gateway.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the synchronization logic — room lifecycle, the
//! ordered event log, presence, and fan-out — so the websocket handler can
//! stay focused on protocol translation and connection plumbing.

pub mod broadcast;
pub mod log;
pub mod presence;
pub mod registry;
