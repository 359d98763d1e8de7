//! Metric names and recording helpers.
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed (see `switchboard-telemetry`).

use metrics::{counter, gauge};

use crate::error::HubError;
use crate::frame::FrameKind;

/// Gauge of currently registered connections.
pub const CONNECTIONS_ACTIVE: &str = "switchboard_connections_active";
/// Counter of accepted connections.
pub const CONNECTIONS_TOTAL: &str = "switchboard_connections_total";
/// Counter of connections refused at admission.
pub const CONNECTIONS_REJECTED: &str = "switchboard_connections_rejected_total";
/// Counter of inbound frames, labelled by `kind`.
pub const FRAMES_RECEIVED: &str = "switchboard_frames_received_total";
/// Counter of outbound frames, labelled by `kind`.
pub const FRAMES_SENT: &str = "switchboard_frames_sent_total";
/// Counter of undeliverable fan-out targets, labelled by `reason`.
pub const FANOUT_FAILURES: &str = "switchboard_fanout_failures_total";

pub(crate) fn record_accepted() {
    counter!(CONNECTIONS_TOTAL).increment(1);
    gauge!(CONNECTIONS_ACTIVE).increment(1.0);
}

pub(crate) fn record_rejected(reason: &'static str) {
    counter!(CONNECTIONS_REJECTED, "reason" => reason).increment(1);
}

pub(crate) fn record_disconnected() {
    gauge!(CONNECTIONS_ACTIVE).decrement(1.0);
}

pub(crate) fn record_frame_received(kind: FrameKind) {
    counter!(FRAMES_RECEIVED, "kind" => kind.as_str()).increment(1);
}

pub(crate) fn record_frame_sent(kind: FrameKind) {
    counter!(FRAMES_SENT, "kind" => kind.as_str()).increment(1);
}

pub(crate) fn record_fanout_failure(error: &HubError) {
    counter!(FANOUT_FAILURES, "reason" => error.reason()).increment(1);
}
