// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the bus connection using mockforge-mqtt.

#![cfg(feature = "mqtt")]

use std::sync::Arc;
use std::time::Duration;

use autohome::protocol::{MqttBus, Publisher, RetryBackoff};
use autohome::{ProtocolError, TopicStore};
use mockforge_mqtt::broker::MqttConfig;
use mockforge_mqtt::start_mqtt_server;
use tokio::net::TcpListener;
use tokio::time::sleep;

/// Helper to find an available port for testing.
fn get_test_port() -> u16 {
    use std::sync::atomic::{AtomicU16, Ordering};
    static PORT_COUNTER: AtomicU16 = AtomicU16::new(18950);
    PORT_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Starts a mock MQTT broker on the given port.
async fn start_mock_broker(port: u16) {
    let config = MqttConfig {
        port,
        host: "127.0.0.1".to_string(),
        ..Default::default()
    };

    tokio::spawn(async move {
        let _ = start_mqtt_server(config).await;
    });

    // Give the broker time to bind
    sleep(Duration::from_millis(500)).await;
}

mod bus_connection {
    use super::*;

    #[tokio::test]
    async fn connect_to_broker() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let store = Arc::new(TopicStore::new("test home"));
        let result = MqttBus::builder()
            .host("127.0.0.1")
            .port(port)
            .client_id("autohome_test_connect")
            .build(store)
            .await;

        assert!(result.is_ok(), "Failed to connect: {:?}", result.err());

        let (bus, ingestion) = result.unwrap();
        assert!(bus.is_connected());
        assert_eq!(bus.host(), "127.0.0.1");
        assert_eq!(bus.port(), port);
        assert_eq!(bus.subscription(), "#");
        ingestion.abort();
    }

    #[tokio::test]
    async fn publish_after_connect() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let store = Arc::new(TopicStore::new("test home"));
        let (bus, ingestion) = MqttBus::builder()
            .host("127.0.0.1")
            .port(port)
            .build(store)
            .await
            .unwrap();

        assert!(bus.publish("/set/room3L/Yeelight/power", "on").await.is_ok());
        assert!(bus.publish("1234/publish/ABCD", "field1=21.5").await.is_ok());

        bus.disconnect().await.unwrap();
        assert!(!bus.is_connected());
        ingestion.abort();
    }

    #[tokio::test]
    async fn clones_share_connection() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let store = Arc::new(TopicStore::new("test home"));
        let (bus, ingestion) = MqttBus::builder()
            .host("127.0.0.1")
            .port(port)
            .build(store)
            .await
            .unwrap();

        let clone = bus.clone();
        assert!(clone.is_connected());
        assert!(clone.publish("/room1L/lights", "1").await.is_ok());
        ingestion.abort();
    }
}

mod bus_ingestion {
    use super::*;

    /// Polls the store until `topic` shows up or five seconds pass.
    async fn wait_for(store: &TopicStore, topic: &str) -> bool {
        for _ in 0..100 {
            if store.lookup(topic).is_some() {
                return true;
            }
            sleep(Duration::from_millis(50)).await;
        }
        false
    }

    #[tokio::test]
    async fn sensor_readings_from_other_clients_reach_the_store() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let store = Arc::new(TopicStore::new("test home"));
        let (coordinator, ingestion) = MqttBus::builder()
            .host("127.0.0.1")
            .port(port)
            .client_id("autohome_test_coordinator")
            .build(Arc::clone(&store))
            .await
            .unwrap();

        let node_store = Arc::new(TopicStore::new("room node"));
        let (node, node_ingestion) = MqttBus::builder()
            .host("127.0.0.1")
            .port(port)
            .client_id("autohome_test_node")
            .build(node_store)
            .await
            .unwrap();

        node.publish("/set/room3L/Yeelight/power", "on").await.unwrap();
        node.publish("1234/publish/ABCD", "field1=21.5").await.unwrap();
        node.publish("/room2R/DHT22/temperature", "21.5").await.unwrap();

        assert!(wait_for(&store, "/room2R/DHT22/temperature").await);
        let entry = store.lookup("/room2R/DHT22/temperature").unwrap();
        assert_eq!(entry.value(), "21.5");

        // Sent ahead of the reading on the same connection
        assert!(store.lookup("/set/room3L/Yeelight/power").is_none());
        assert!(store.lookup("1234/publish/ABCD").is_none());
        assert_eq!(store.len(), 1);

        coordinator.disconnect().await.unwrap();
        node.disconnect().await.unwrap();
        ingestion.abort();
        node_ingestion.abort();
    }

    #[tokio::test]
    async fn later_readings_overwrite_earlier_ones() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let store = Arc::new(TopicStore::new("test home"));
        let (_coordinator, ingestion) = MqttBus::builder()
            .host("127.0.0.1")
            .port(port)
            .client_id("autohome_test_overwrite")
            .build(Arc::clone(&store))
            .await
            .unwrap();

        let (node, node_ingestion) = MqttBus::builder()
            .host("127.0.0.1")
            .port(port)
            .client_id("autohome_test_overwrite_node")
            .build(Arc::new(TopicStore::new("room node")))
            .await
            .unwrap();

        node.publish("/room1L/lights", "0").await.unwrap();
        assert!(wait_for(&store, "/room1L/lights").await);
        node.publish("/room1L/lights", "1").await.unwrap();

        let mut value = String::new();
        for _ in 0..100 {
            value = store
                .lookup("/room1L/lights")
                .map(|e| e.value().to_string())
                .unwrap_or_default();
            if value == "1" {
                break;
            }
            sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(value, "1");

        ingestion.abort();
        node_ingestion.abort();
    }
}

mod bus_failures {
    use super::*;

    #[tokio::test]
    async fn no_broker_fails_once_retries_are_exhausted() {
        // Nothing listens on this port
        let port = get_test_port();

        let store = Arc::new(TopicStore::new("test home"));
        let result = MqttBus::builder()
            .host("127.0.0.1")
            .port(port)
            .connection_timeout(Duration::from_secs(5))
            .reconnection(RetryBackoff::default().with_max_retries(0))
            .build(store)
            .await;

        assert!(matches!(result, Err(ProtocolError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn missing_host_is_rejected() {
        let store = Arc::new(TopicStore::new("test home"));
        let result = MqttBus::builder().build(store).await;
        assert!(matches!(result, Err(ProtocolError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn broker_that_never_acknowledges_times_out() {
        // Accepts TCP but never answers CONNECT
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let store = Arc::new(TopicStore::new("test home"));
        let result = MqttBus::builder()
            .host("127.0.0.1")
            .port(port)
            .connection_timeout(Duration::from_secs(1))
            .build(store)
            .await;

        assert!(matches!(result, Err(ProtocolError::Timeout(1000))));
    }
}
