//! End-to-end wiring through the facade crate.

use switchboard::core::fixtures::MockTransport;
use switchboard::prelude::*;

#[tokio::test]
async fn test_configured_hub_relays_between_connections() {
    let config = ConfigLoader::new()
        .with_string("[hub]\nid_length = 12\nheartbeat_interval_ms = 0\n", "toml")
        .unwrap()
        .load()
        .unwrap();
    let hub = Hub::new(config.hub.to_hub_config());

    hub.on(EVENT_MESSAGE, |payload| async move {
        if let Some(data) = payload.data.clone() {
            payload.connection.broadcast(data, true).await;
        }
    });

    let sender = MockTransport::new();
    let receiver = MockTransport::new();
    let from = hub
        .accept(sender.clone(), RequestContext::new(), |_| {})
        .await
        .unwrap();
    let to = hub
        .accept(receiver.clone(), RequestContext::new(), |_| {})
        .await
        .unwrap();
    assert_eq!(from.id().len(), 12);
    assert_eq!(hub.len(), 2);

    sender.push_text("hello room");
    let written = receiver.wait_for_writes(1).await;
    assert_eq!(written[0], Frame::text("hello room"));
    assert!(sender.written().is_empty());

    hub.shutdown().await;
    from.closed().await;
    to.closed().await;
    assert!(hub.is_empty());
}
