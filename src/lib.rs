//! inkroom — real-time collaborative drawing rooms.
//!
//! ARCHITECTURE
//! ============
//! Multiple clients draw concurrently on a shared canvas, organized into
//! public or password-protected rooms. Every drawing mutation is committed to
//! a per-room ordered event log; the log is the authoritative history, and a
//! room's visual state is always a pure function of replaying it in order.
//! That is what makes late-join consistency work: a joining client receives a
//! snapshot of the log plus every event committed after it, with no gap and
//! no duplicate.
//!
//! Module map:
//! - `protocol` — the JSON wire vocabulary shared by server and client
//! - `state` — room registry and per-room serialized state
//! - `services` — registry, event log, presence, and broadcast logic
//! - `routes` — axum router and the websocket connection gateway
//! - `reconcile` — client-side deterministic replay onto a drawing surface

pub mod protocol;
pub mod reconcile;
pub mod routes;
pub mod services;
pub mod state;
