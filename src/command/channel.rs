// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! TCP request/response server for text commands.

use std::fmt::Write as _;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::error::Result;
use crate::protocol::Publisher;
use crate::store::TopicStore;

use super::{ActuatorCommand, Request, default_actuators};

/// Read limits applied to every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLimits {
    /// How long to wait for the first bytes of a request, and for the
    /// client to take the whole response.
    pub request_timeout: Duration,
    /// Quiet gap after which a partial request is dispatched as is.
    pub idle_timeout: Duration,
    /// Requests are cut at this size.
    pub max_request_bytes: usize,
}

impl Default for ChannelLimits {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_millis(200),
            max_request_bytes: 1024,
        }
    }
}

/// Interactive command server.
///
/// Each connection carries exactly one request and one response; the
/// server closes the connection after writing. Connections are served
/// concurrently.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use autohome::command::CommandChannel;
/// use autohome::protocol::RecordingPublisher;
/// use autohome::store::TopicStore;
///
/// # async fn example() {
/// let store = Arc::new(TopicStore::new("My SVT"));
/// store.ingest("/room1L/lights", "1");
///
/// let channel = CommandChannel::new(store, RecordingPublisher::new());
/// let response = channel.handle_request("/list").await;
/// assert_eq!(response, "/room1L/lights\n");
/// # }
/// ```
#[derive(Debug)]
pub struct CommandChannel<P> {
    store: Arc<TopicStore>,
    publisher: P,
    actuators: Vec<ActuatorCommand>,
    limits: ChannelLimits,
}

impl<P: Publisher + 'static> CommandChannel<P> {
    /// Creates a channel with the stock actuator table and default limits.
    #[must_use]
    pub fn new(store: Arc<TopicStore>, publisher: P) -> Self {
        Self {
            store,
            publisher,
            actuators: default_actuators(),
            limits: ChannelLimits::default(),
        }
    }

    /// Replaces the actuator table.
    #[must_use]
    pub fn with_actuators(mut self, actuators: Vec<ActuatorCommand>) -> Self {
        self.actuators = actuators;
        self
    }

    /// Sets the read limits.
    #[must_use]
    pub fn with_limits(mut self, limits: ChannelLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns the actuator table.
    #[must_use]
    pub fn actuators(&self) -> &[ActuatorCommand] {
        &self.actuators
    }

    /// Returns the usage text.
    #[must_use]
    pub fn help_text(&self) -> String {
        let mut out = String::from("autohome command channel\n\n");
        for (usage, about) in [
            ("/help", "show this help"),
            ("/list", "list every known topic"),
            ("/status", "show every topic with its value and last update"),
            ("/rooms", "list the known rooms"),
            ("/view <topic>", "show one topic in detail"),
        ] {
            let _ = writeln!(out, "{usage:<16} {about}");
        }

        if !self.actuators.is_empty() {
            out.push_str("\nactuator commands:\n");
            for actuator in &self.actuators {
                let _ = writeln!(out, "{}", actuator.command);
            }
        }
        out
    }

    /// Dispatches one request and returns the response text.
    ///
    /// Never fails: publish errors are logged and unknown input gets an
    /// explanatory response.
    pub async fn handle_request(&self, raw: &str) -> String {
        match Request::parse(raw, &self.actuators) {
            Request::Help => self.help_text(),
            Request::List => self.store.render_listing(),
            Request::Status => self.store.render_status(),
            Request::Rooms => self.store.rooms().iter().fold(String::new(), |mut out, room| {
                let _ = writeln!(out, "{room}");
                out
            }),
            Request::View(topic) => self
                .store
                .lookup(topic)
                .map_or_else(|| format!("topic not found: {topic}\n"), |entry| entry.detail()),
            Request::Actuator(actuator) => {
                self.run_actuator(actuator).await;
                String::new()
            }
            Request::Unrecognized(text) => {
                tracing::info!(request = %text, "Unrecognized command");
                format!("unrecognized command: {text}\nsend /help for the list of commands\n")
            }
        }
    }

    async fn run_actuator(&self, actuator: &ActuatorCommand) {
        tracing::info!(command = %actuator.command, "Running actuator command");
        for target in &actuator.publishes {
            if let Err(e) = self.publisher.publish(&target.topic, &target.payload).await {
                tracing::warn!(
                    topic = %target.topic,
                    payload = %target.payload,
                    error = %e,
                    "Actuator publish failed"
                );
            }
        }
    }

    /// Accepts connections until the listener fails.
    ///
    /// # Errors
    ///
    /// Returns the accept error that ended the loop.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> Result<()> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(addr = %addr, "Command channel listening");
        }

        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::error!(error = %e, "Command channel accept failed");
                    return Err(e.into());
                }
            };

            let channel = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = channel.handle_connection(stream, peer).await {
                    tracing::warn!(peer = %peer, error = %e, "Command connection aborted");
                }
            });
        }
    }

    async fn handle_connection(&self, mut stream: TcpStream, peer: SocketAddr) -> std::io::Result<()> {
        tracing::debug!(peer = %peer, "Command client connected");

        let Some(request) = self.read_request(&mut stream).await? else {
            tracing::debug!(peer = %peer, "No request before timeout, closing");
            return Ok(());
        };

        tracing::debug!(peer = %peer, request = %request.trim_end(), "Command received");
        let response = self.handle_request(&request).await;

        let write = async {
            stream.write_all(response.as_bytes()).await?;
            stream.shutdown().await
        };
        tokio::time::timeout(self.limits.request_timeout, write)
            .await
            .unwrap_or_else(|_| {
                Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "client stopped reading the response",
                ))
            })
    }

    /// Reads one request: up to the first newline, end of stream, size
    /// limit or idle gap, whichever comes first.
    ///
    /// Returns `None` if nothing arrives within the request timeout.
    async fn read_request(&self, stream: &mut TcpStream) -> std::io::Result<Option<String>> {
        let max = self.limits.max_request_bytes;
        let mut buf: Vec<u8> = Vec::with_capacity(max.min(256));
        let mut chunk = [0u8; 256];
        let mut received_any = false;

        loop {
            let wait = if received_any {
                self.limits.idle_timeout
            } else {
                self.limits.request_timeout
            };

            match tokio::time::timeout(wait, stream.read(&mut chunk)).await {
                Err(_) if !received_any => return Ok(None),
                Err(_) | Ok(Ok(0)) => break,
                Ok(Ok(n)) => {
                    received_any = true;
                    buf.extend_from_slice(&chunk[..n]);
                    if buf.contains(&b'\n') || buf.len() >= max {
                        break;
                    }
                }
                Ok(Err(e)) => return Err(e),
            }
        }

        if let Some(end) = buf.iter().position(|&b| b == b'\n') {
            buf.truncate(end);
        }
        buf.truncate(max);
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ActuatorPublish;
    use crate::protocol::RecordingPublisher;

    fn channel() -> (CommandChannel<RecordingPublisher>, Arc<TopicStore>, RecordingPublisher) {
        let store = Arc::new(TopicStore::new("My SVT"));
        let publisher = RecordingPublisher::new();
        let channel = CommandChannel::new(Arc::clone(&store), publisher.clone());
        (channel, store, publisher)
    }

    #[tokio::test]
    async fn list_and_status_come_from_store() {
        let (channel, store, _) = channel();
        store.ingest("/room2R/DHT22/temperature", "21.5");
        store.ingest("/room3L/Yeelight/power", "on");

        assert_eq!(channel.handle_request("/list").await, store.render_listing());

        let status = channel.handle_request("/status").await;
        assert!(status.starts_with("My SVT created on "));
        assert_eq!(status.lines().count(), 3);
    }

    #[tokio::test]
    async fn rooms_lists_each_room_once() {
        let (channel, store, _) = channel();
        store.ingest("/room2R/DHT22/temperature", "21.5");
        store.ingest("/room2R/DHT22/humidity", "60.0");
        store.ingest("/garden/soil/moisture", "30");

        assert_eq!(channel.handle_request("/rooms").await, "room2R\ngarden\n");
    }

    #[tokio::test]
    async fn view_found_and_missing() {
        let (channel, store, _) = channel();
        store.ingest("/room1L/lights", "1");

        let detail = channel.handle_request("/view /room1L/lights").await;
        assert!(detail.starts_with("/room1L/lights\n"));
        assert!(detail.contains("value: 1"));

        assert_eq!(
            channel.handle_request("/view /room9/lights").await,
            "topic not found: /room9/lights\n"
        );
    }

    #[tokio::test]
    async fn actuator_publishes_and_returns_empty() {
        let (channel, _, publisher) = channel();

        let response = channel.handle_request("/lights=on").await;
        assert!(response.is_empty());

        let sent = publisher.published();
        assert_eq!(sent.len(), 3);
        assert!(sent.iter().all(|m| m.payload == "1"));
        assert_eq!(sent[1].topic, "/room2R/lights");
    }

    #[tokio::test]
    async fn actuator_publish_failure_still_responds() {
        let (channel, _, publisher) = channel();
        publisher.set_failing(true);

        let response = channel.handle_request("/set/room3L/Yeelight/power on").await;
        assert!(response.is_empty());
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn unrecognized_is_a_no_op() {
        let (channel, store, publisher) = channel();

        let response = channel.handle_request("/reboot").await;
        assert!(response.starts_with("unrecognized command: /reboot"));
        assert!(publisher.published().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn help_lists_builtins_and_actuators() {
        let (channel, _, _) = channel();
        let channel = channel.with_actuators(vec![ActuatorCommand::new(
            "/fan=on",
            [ActuatorPublish::new("/room2R/fan", "1")],
        )]);

        let help = channel.help_text();
        for command in ["/help", "/list", "/status", "/rooms", "/view <topic>", "/fan=on"] {
            assert!(help.contains(command), "missing {command}");
        }
        assert!(!help.contains("/lights=on"));
    }

    #[test]
    fn help_without_actuators_has_no_actuator_section() {
        let (channel, _, _) = channel();
        let help = channel.with_actuators(Vec::new()).help_text();
        assert!(!help.contains("actuator commands"));
    }
}
