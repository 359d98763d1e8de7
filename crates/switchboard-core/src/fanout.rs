//! Fan-out primitives.
//!
//! Sends are addressed by [`ConnectionId`] and resolved against the registry
//! at call time. A target that is missing fails with [`HubError::NotFound`];
//! one that is registered but no longer live fails with [`HubError::Dead`].
//! Multi-target calls isolate failures per target and report them in a
//! [`FanoutReport`].
//!
//! The connection-scoped variants additionally fire `error` on the calling
//! connection for every failure, with the target id as data. The hub-wide
//! variants have no caller to notify and only report.

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::connection::Connection;
use crate::error::{HubError, HubResult};
use crate::events::EVENT_ERROR;
use crate::frame::{Frame, FrameKind};
use crate::hub::Hub;
use crate::id::ConnectionId;
use crate::metrics;

/// Outcome of a multi-target send.
#[derive(Debug, Default)]
pub struct FanoutReport {
    /// Targets whose queue accepted the frame.
    pub delivered: Vec<ConnectionId>,
    /// Targets that could not be reached, with the reason.
    pub failed: Vec<(ConnectionId, HubError)>,
}

impl FanoutReport {
    /// Check if every target was reached.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total number of targets attempted.
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }

    /// Check if `id` failed.
    pub fn failed_for(&self, id: &str) -> Option<&HubError> {
        self.failed
            .iter()
            .find(|(target, _)| target.as_str() == id)
            .map(|(_, err)| err)
    }

    fn record(&mut self, id: ConnectionId, result: HubResult<()>) {
        match result {
            Ok(()) => self.delivered.push(id),
            Err(err) => self.failed.push((id, err)),
        }
    }
}

fn text_frame(payload: Bytes) -> Frame {
    Frame::new(FrameKind::Text, payload)
}

impl Hub {
    /// Queue a frame for one connection.
    pub(crate) async fn deliver(&self, id: &str, frame: Frame) -> HubResult<()> {
        let target = self
            .connections()
            .get(id)
            .ok_or_else(|| HubError::not_found(id))?;
        if !target.is_alive() {
            return Err(HubError::dead(target.id()));
        }
        target.enqueue(frame).await
    }

    async fn deliver_logged(&self, id: &str, frame: Frame) -> HubResult<()> {
        let result = self.deliver(id, frame).await;
        if let Err(err) = &result {
            metrics::record_fanout_failure(err);
            debug!(connection_id = %id, error = %err, "Fan-out target unreachable");
        }
        result
    }

    /// Send a text payload to one connection.
    pub async fn emit_to(&self, id: &str, payload: impl Into<Bytes>) -> HubResult<()> {
        self.deliver_logged(id, text_frame(payload.into())).await
    }

    /// Send a text payload to each listed connection.
    pub async fn emit_to_list<I>(&self, ids: I, payload: impl Into<Bytes>) -> FanoutReport
    where
        I: IntoIterator,
        I::Item: Into<ConnectionId>,
    {
        let payload = payload.into();
        let mut report = FanoutReport::default();
        for id in ids {
            let id = id.into();
            let result = self
                .deliver_logged(id.as_str(), text_frame(payload.clone()))
                .await;
            report.record(id, result);
        }
        report
    }

    /// Send a text payload to every registered connection.
    pub async fn broadcast(&self, payload: impl Into<Bytes>) -> FanoutReport {
        let payload = payload.into();
        let mut report = FanoutReport::default();
        for id in self.connections().ids() {
            let result = self
                .deliver_logged(id.as_str(), text_frame(payload.clone()))
                .await;
            report.record(id, result);
        }
        report
    }

    /// Fire a custom event on every registered connection.
    ///
    /// Listeners run on the calling task, connection by connection.
    pub async fn fire(&self, event: &str, data: impl Into<Bytes>) {
        let data = data.into();
        for conn in self.connections().snapshot() {
            conn.fire_event(event, Some(data.clone()), None).await;
        }
    }
}

impl Connection {
    async fn deliver_reported(self: &Arc<Self>, id: &str, frame: Frame) -> HubResult<()> {
        let result = self.hub().deliver(id, frame).await;
        if let Err(err) = &result {
            metrics::record_fanout_failure(err);
            debug!(
                connection_id = %self.id(),
                target = %id,
                error = %err,
                "Fan-out target unreachable"
            );
            self.fire_event(
                EVENT_ERROR,
                Some(Bytes::copy_from_slice(id.as_bytes())),
                Some(err.clone()),
            )
            .await;
        }
        result
    }

    /// Send a text payload to another connection.
    ///
    /// Failures are returned and also fire `error` on this connection.
    pub async fn emit_to(self: &Arc<Self>, id: &str, payload: impl Into<Bytes>) -> HubResult<()> {
        self.deliver_reported(id, text_frame(payload.into())).await
    }

    /// Send a text payload to each listed connection.
    pub async fn emit_to_list<I>(
        self: &Arc<Self>,
        ids: I,
        payload: impl Into<Bytes>,
    ) -> FanoutReport
    where
        I: IntoIterator,
        I::Item: Into<ConnectionId>,
    {
        let payload = payload.into();
        let mut report = FanoutReport::default();
        for id in ids {
            let id = id.into();
            let result = self
                .deliver_reported(id.as_str(), text_frame(payload.clone()))
                .await;
            report.record(id, result);
        }
        report
    }

    /// Send a text payload to every registered connection.
    ///
    /// With `exclude_self`, this connection is skipped.
    pub async fn broadcast(
        self: &Arc<Self>,
        payload: impl Into<Bytes>,
        exclude_self: bool,
    ) -> FanoutReport {
        let payload = payload.into();
        let mut report = FanoutReport::default();
        for id in self.hub().connections().ids() {
            if exclude_self && id == *self.id() {
                continue;
            }
            let result = self
                .deliver_reported(id.as_str(), text_frame(payload.clone()))
                .await;
            report.record(id, result);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_accounting() {
        let mut report = FanoutReport::default();
        report.record(ConnectionId::new("a"), Ok(()));
        report.record(ConnectionId::new("b"), Err(HubError::not_found("b")));

        assert_eq!(report.attempted(), 2);
        assert!(!report.is_complete());
        assert!(report.failed_for("a").is_none());
        assert!(matches!(
            report.failed_for("b"),
            Some(HubError::NotFound { .. })
        ));
    }

    #[test]
    fn test_empty_report_is_complete() {
        let report = FanoutReport::default();
        assert!(report.is_complete());
        assert_eq!(report.attempted(), 0);
    }
}
