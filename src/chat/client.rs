//! Connection Manager
//!
//! Owns the live channel for one user session. A background task opens the
//! channel, dispatches inbound frames into the [`ChatState`] and reopens the
//! channel a fixed delay after every closure, forever. A failed connection
//! attempt counts as a closure.
//!
//! Sends are handed to the task through a queue that only exists while a
//! channel is open, so a send made between channels fails instead of being
//! buffered.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;

use super::error::{ChatError, ChatResult};
use super::frames::{DeliverFrame, SendFrame, UserId};
use super::history::ChatApi;
use super::transcript::{ChatState, Preview, TranscriptEntry};
use super::transport::{Channel, Connector};
use crate::config::ChatConfig;

/// Notifications for whatever renders the chat panel
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    Connected,
    Disconnected,
    /// The channel will be reopened after `delay`
    ReconnectScheduled { attempt: u64, delay: Duration },
    MessageAppended(TranscriptEntry),
    PreviewUpdated { sender_id: UserId, preview: Preview },
    /// The transcript was replaced by fetched history
    TranscriptReset { counterpart: UserId, len: usize },
}

/// State shared between the manager handle and its channel task
struct Session {
    user_id: UserId,
    state: RwLock<ChatState>,
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    connected: AtomicBool,
    reconnect_attempts: AtomicU64,
    events: mpsc::UnboundedSender<ChatEvent>,
}

impl Session {
    fn emit(&self, event: ChatEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }

    async fn dispatch(&self, text: &str) {
        let frame: DeliverFrame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, user_id = self.user_id, "Skipping malformed frame");
                return;
            }
        };

        let appended = self.state.write().await.receive(&frame);

        tracing::debug!(
            sender_id = frame.sender_id,
            appended = appended.is_some(),
            "Message received"
        );

        if let Some(entry) = appended {
            self.emit(ChatEvent::MessageAppended(entry));
        }
        self.emit(ChatEvent::PreviewUpdated {
            sender_id: frame.sender_id,
            preview: Preview {
                content: frame.content,
                timestamp: frame.timestamp,
            },
        });
    }
}

/// Client side of one chat session
pub struct ConnectionManager {
    session: Arc<Session>,
    api: Arc<dyn ChatApi>,
    task: JoinHandle<()>,
}

impl ConnectionManager {
    /// Open the session's channel and start the reconnect loop
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: &ChatConfig,
        user_id: UserId,
        connector: Arc<dyn Connector>,
        api: Arc<dyn ChatApi>,
    ) -> (Self, mpsc::UnboundedReceiver<ChatEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let session = Arc::new(Session {
            user_id,
            state: RwLock::new(ChatState::new(user_id)),
            outbound: Mutex::new(None),
            connected: AtomicBool::new(false),
            reconnect_attempts: AtomicU64::new(0),
            events: events_tx,
        });

        let task = tokio::spawn(run_session(
            config.channel_url(user_id),
            connector,
            config.reconnect_delay(),
            session.clone(),
        ));

        (Self { session, api, task }, events_rx)
    }

    pub fn user_id(&self) -> UserId {
        self.session.user_id
    }

    /// Switch to `counterpart` and load the conversation history
    ///
    /// The transcript is replaced once the history arrives, then a read
    /// receipt is sent in the background. Returns the transcript length.
    pub async fn select_conversation(&self, counterpart: UserId) -> ChatResult<usize> {
        let user_id = self.session.user_id;
        self.session.state.write().await.select(counterpart);

        let history = match self.api.history(user_id, counterpart).await {
            Ok(history) => history,
            Err(e) => {
                tracing::error!(error = %e, user_id, counterpart, "Failed to load chat history");
                return Err(e);
            }
        };

        let len = {
            let mut state = self.session.state.write().await;
            state.replace_history(&history);
            state.transcript().len()
        };
        self.session
            .emit(ChatEvent::TranscriptReset { counterpart, len });

        let api = self.api.clone();
        tokio::spawn(async move {
            if let Err(e) = api.mark_read(user_id, counterpart).await {
                tracing::warn!(error = %e, user_id, sender_id = counterpart, "Read receipt failed");
            }
        });

        Ok(len)
    }

    /// Send a message to the active conversation
    ///
    /// Content is trimmed; empty content or no active conversation does
    /// nothing and returns `Ok(None)`. On success the optimistic local copy
    /// is appended and returned without waiting for any acknowledgment.
    pub async fn send(&self, content: &str) -> ChatResult<Option<TranscriptEntry>> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }

        let Some(receiver_id) = self.session.state.read().await.active() else {
            return Ok(None);
        };

        let frame = serde_json::to_string(&SendFrame {
            receiver_id,
            content: content.to_string(),
        })?;

        {
            let outbound = self.session.outbound.lock().await;
            let queue = outbound.as_ref().ok_or(ChatError::NotConnected)?;
            queue.send(frame).map_err(|_| ChatError::NotConnected)?;
        }

        let entry = self
            .session
            .state
            .write()
            .await
            .record_sent(content, Utc::now());
        self.session.emit(ChatEvent::MessageAppended(entry.clone()));

        Ok(Some(entry))
    }

    /// Visible transcript of the active conversation
    pub async fn transcript(&self) -> Vec<TranscriptEntry> {
        self.session.state.read().await.transcript().to_vec()
    }

    /// Latest message per sender
    pub async fn previews(&self) -> HashMap<UserId, Preview> {
        self.session.state.read().await.previews().clone()
    }

    pub async fn active_conversation(&self) -> Option<UserId> {
        self.session.state.read().await.active()
    }

    /// Reconnects scheduled since start
    pub fn reconnect_attempts(&self) -> u64 {
        self.session.reconnect_attempts.load(Ordering::SeqCst)
    }

    pub fn is_connected(&self) -> bool {
        self.session.connected.load(Ordering::SeqCst)
    }

    /// Stop the reconnect loop and close the channel
    pub async fn shutdown(&self) {
        self.task.abort();
        self.session.outbound.lock().await.take();
        self.session.connected.store(false, Ordering::SeqCst);
        tracing::info!(user_id = self.session.user_id, "Chat session closed");
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_session(
    url: String,
    connector: Arc<dyn Connector>,
    delay: Duration,
    session: Arc<Session>,
) {
    loop {
        match connector.connect(&url).await {
            Ok(channel) => {
                tracing::info!(url = %url, user_id = session.user_id, "Chat channel open");
                pump(channel, &session).await;
                tracing::info!(url = %url, user_id = session.user_id, "Chat channel closed");
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Chat connection failed");
            }
        }

        let attempt = session.reconnect_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Reconnect scheduled");
        session.emit(ChatEvent::ReconnectScheduled { attempt, delay });

        tokio::time::sleep(delay).await;
    }
}

/// Move frames both ways until the channel closes
async fn pump(mut channel: Box<dyn Channel>, session: &Session) {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    *session.outbound.lock().await = Some(tx);
    session.connected.store(true, Ordering::SeqCst);
    session.emit(ChatEvent::Connected);

    loop {
        tokio::select! {
            inbound = channel.next_text() => match inbound {
                Some(Ok(text)) => session.dispatch(&text).await,
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Chat channel error");
                    break;
                }
                None => break,
            },
            Some(frame) = rx.recv() => {
                if let Err(e) = channel.send_text(frame).await {
                    tracing::warn!(error = %e, "Chat send failed");
                    break;
                }
            }
        }
    }

    session.outbound.lock().await.take();
    session.connected.store(false, Ordering::SeqCst);
    session.emit(ChatEvent::Disconnected);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::frames::HistoryMessage;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::Instant;

    const DELAY: Duration = Duration::from_millis(1000);

    /// Test side of one mock channel; dropping it closes the channel
    struct MockServer {
        to_client: mpsc::UnboundedSender<String>,
        from_client: mpsc::UnboundedReceiver<String>,
    }

    struct MockChannel {
        inbound: mpsc::UnboundedReceiver<String>,
        outbound: mpsc::UnboundedSender<String>,
    }

    #[async_trait]
    impl Channel for MockChannel {
        async fn send_text(&mut self, text: String) -> ChatResult<()> {
            self.outbound
                .send(text)
                .map_err(|e| ChatError::Transport(e.to_string()))
        }

        async fn next_text(&mut self) -> Option<ChatResult<String>> {
            self.inbound.recv().await.map(Ok)
        }
    }

    struct MockConnector {
        servers: mpsc::UnboundedSender<MockServer>,
        fail: AtomicBool,
        attempts: AtomicUsize,
    }

    impl MockConnector {
        fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<MockServer>) {
            let (servers, rx) = mpsc::unbounded_channel();
            let connector = Arc::new(Self {
                servers,
                fail: AtomicBool::new(false),
                attempts: AtomicUsize::new(0),
            });
            (connector, rx)
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Connector for MockConnector {
        async fn connect(&self, url: &str) -> ChatResult<Box<dyn Channel>> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            assert_eq!(url, "ws://localhost:8000/ws/1");

            if self.fail.load(Ordering::SeqCst) {
                return Err(ChatError::Transport("connection refused".to_string()));
            }

            let (to_client, inbound) = mpsc::unbounded_channel();
            let (outbound, from_client) = mpsc::unbounded_channel();
            self.servers
                .send(MockServer {
                    to_client,
                    from_client,
                })
                .map_err(|e| ChatError::Transport(e.to_string()))?;

            Ok(Box::new(MockChannel { inbound, outbound }))
        }
    }

    #[derive(Default)]
    struct MockApi {
        history: Vec<HistoryMessage>,
        fail_history: bool,
        mark_reads: std::sync::Mutex<Vec<(UserId, UserId)>>,
    }

    #[async_trait]
    impl ChatApi for MockApi {
        async fn history(
            &self,
            _user_id: UserId,
            _other_user_id: UserId,
        ) -> ChatResult<Vec<HistoryMessage>> {
            if self.fail_history {
                return Err(ChatError::Api {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(self.history.clone())
        }

        async fn mark_read(&self, user_id: UserId, sender_id: UserId) -> ChatResult<()> {
            self.mark_reads.lock().unwrap().push((user_id, sender_id));
            Ok(())
        }
    }

    fn config() -> ChatConfig {
        ChatConfig {
            reconnect_delay_ms: DELAY.as_millis() as u64,
            ..ChatConfig::default()
        }
    }

    async fn wait_for(
        events: &mut mpsc::UnboundedReceiver<ChatEvent>,
        pred: impl Fn(&ChatEvent) -> bool,
    ) -> ChatEvent {
        loop {
            let event = events.recv().await.expect("event stream ended");
            if pred(&event) {
                return event;
            }
        }
    }

    fn history_message(id: i64, sender_id: UserId, receiver_id: UserId) -> HistoryMessage {
        HistoryMessage {
            id,
            sender_id,
            receiver_id,
            content: format!("message {}", id),
            timestamp: Utc.with_ymd_and_hms(2024, 6, 15, 10, id as u32, 0).unwrap(),
            read: false,
        }
    }

    fn deliver(sender_id: UserId, content: &str) -> String {
        serde_json::to_string(&DeliverFrame {
            sender_id,
            content: content.to_string(),
            timestamp: Utc::now(),
        })
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_closure_schedules_exactly_one_reconnect() {
        let (connector, mut servers) = MockConnector::new();
        let (manager, mut events) =
            ConnectionManager::start(&config(), 1, connector.clone(), Arc::new(MockApi::default()));

        for n in 1..=3u64 {
            let server = servers.recv().await.unwrap();
            wait_for(&mut events, |e| *e == ChatEvent::Connected).await;
            assert!(manager.is_connected());

            drop(server);
            let event = wait_for(&mut events, |e| {
                matches!(e, ChatEvent::ReconnectScheduled { .. })
            })
            .await;
            assert_eq!(
                event,
                ChatEvent::ReconnectScheduled {
                    attempt: n,
                    delay: DELAY
                }
            );
            assert!(!manager.is_connected());
        }

        // The next channel opens only after the fixed delay
        let scheduled_at = Instant::now();
        let _server = servers.recv().await.unwrap();
        assert!(scheduled_at.elapsed() >= DELAY);
        assert!(scheduled_at.elapsed() < DELAY * 2);

        assert_eq!(connector.attempts(), 4);
        assert_eq!(manager.reconnect_attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_connects_retry_at_constant_rate() {
        let (connector, mut servers) = MockConnector::new();
        connector.fail.store(true, Ordering::SeqCst);

        let started = Instant::now();
        let (manager, mut events) =
            ConnectionManager::start(&config(), 1, connector.clone(), Arc::new(MockApi::default()));

        for n in 1..=5u64 {
            let event = events.recv().await.unwrap();
            assert_eq!(
                event,
                ChatEvent::ReconnectScheduled {
                    attempt: n,
                    delay: DELAY
                }
            );
        }
        // First attempt is immediate, then one per delay
        assert!(started.elapsed() >= DELAY * 4);
        assert!(started.elapsed() < DELAY * 5);
        assert_eq!(connector.attempts(), 5);

        connector.fail.store(false, Ordering::SeqCst);
        let _server = servers.recv().await.unwrap();
        wait_for(&mut events, |e| *e == ChatEvent::Connected).await;
        assert_eq!(manager.reconnect_attempts(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_is_optimistic() {
        let (connector, mut servers) = MockConnector::new();
        let (manager, mut events) =
            ConnectionManager::start(&config(), 1, connector, Arc::new(MockApi::default()));
        let mut server = servers.recv().await.unwrap();
        wait_for(&mut events, |e| *e == ChatEvent::Connected).await;

        manager.select_conversation(2).await.unwrap();
        let entry = manager.send("  hello  ").await.unwrap().unwrap();
        assert_eq!(entry.content, "hello");
        assert!(entry.is_sent());

        // Local copy is visible before the server has read anything
        assert_eq!(manager.transcript().await, vec![entry.clone()]);
        assert_eq!(
            wait_for(&mut events, |e| matches!(e, ChatEvent::MessageAppended(_))).await,
            ChatEvent::MessageAppended(entry)
        );

        let frame: SendFrame =
            serde_json::from_str(&server.from_client.recv().await.unwrap()).unwrap();
        assert_eq!(
            frame,
            SendFrame {
                receiver_id: 2,
                content: "hello".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_without_target_or_content_is_noop() {
        let (connector, mut servers) = MockConnector::new();
        let (manager, mut events) =
            ConnectionManager::start(&config(), 1, connector, Arc::new(MockApi::default()));
        let _server = servers.recv().await.unwrap();
        wait_for(&mut events, |e| *e == ChatEvent::Connected).await;

        assert!(manager.send("hello").await.unwrap().is_none());

        manager.select_conversation(2).await.unwrap();
        assert!(manager.send("   ").await.unwrap().is_none());
        assert!(manager.transcript().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_while_disconnected_fails() {
        let (connector, _servers) = MockConnector::new();
        connector.fail.store(true, Ordering::SeqCst);
        let (manager, mut events) =
            ConnectionManager::start(&config(), 1, connector, Arc::new(MockApi::default()));
        wait_for(&mut events, |e| {
            matches!(e, ChatEvent::ReconnectScheduled { .. })
        })
        .await;

        manager.select_conversation(2).await.unwrap();
        let err = manager.send("hello").await.unwrap_err();
        assert!(matches!(err, ChatError::NotConnected));
        assert!(manager.transcript().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_inbound_routing() {
        let (connector, mut servers) = MockConnector::new();
        let (manager, mut events) =
            ConnectionManager::start(&config(), 1, connector, Arc::new(MockApi::default()));
        let server = servers.recv().await.unwrap();
        wait_for(&mut events, |e| *e == ChatEvent::Connected).await;
        manager.select_conversation(2).await.unwrap();

        // From someone else: preview only
        server.to_client.send(deliver(3, "psst")).unwrap();
        let event = events.recv().await.unwrap();
        assert!(matches!(event, ChatEvent::TranscriptReset { .. }));
        let event = events.recv().await.unwrap();
        assert!(matches!(event, ChatEvent::PreviewUpdated { sender_id: 3, .. }));
        assert!(manager.transcript().await.is_empty());

        // Garbage is skipped and the channel stays up
        server.to_client.send("not json".to_string()).unwrap();

        // From the active conversation: appended and previewed
        server.to_client.send(deliver(2, "hi there")).unwrap();
        let event = events.recv().await.unwrap();
        match event {
            ChatEvent::MessageAppended(entry) => {
                assert_eq!(entry.sender_id, 2);
                assert!(!entry.is_sent());
            }
            other => panic!("Expected appended message, got {:?}", other),
        }
        let event = events.recv().await.unwrap();
        assert!(matches!(event, ChatEvent::PreviewUpdated { sender_id: 2, .. }));

        assert!(manager.is_connected());
        assert_eq!(manager.transcript().await.len(), 1);
        let previews = manager.previews().await;
        assert_eq!(previews[&3].content, "psst");
        assert_eq!(previews[&2].content, "hi there");
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_conversation_loads_history_and_marks_read() {
        let api = Arc::new(MockApi {
            history: vec![history_message(1, 2, 1), history_message(2, 1, 2)],
            ..MockApi::default()
        });
        let (connector, _servers) = MockConnector::new();
        let (manager, mut events) = ConnectionManager::start(&config(), 1, connector, api.clone());

        let len = manager.select_conversation(2).await.unwrap();
        assert_eq!(len, 2);
        assert_eq!(manager.active_conversation().await, Some(2));

        let transcript = manager.transcript().await;
        assert!(!transcript[0].is_sent());
        assert!(transcript[1].is_sent());

        wait_for(&mut events, |e| {
            *e == ChatEvent::TranscriptReset {
                counterpart: 2,
                len: 2,
            }
        })
        .await;

        // Read receipt runs in the background
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(*api.mark_reads.lock().unwrap(), vec![(1, 2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_failure_skips_read_receipt() {
        let api = Arc::new(MockApi {
            fail_history: true,
            ..MockApi::default()
        });
        let (connector, _servers) = MockConnector::new();
        let (manager, _events) = ConnectionManager::start(&config(), 1, connector, api.clone());

        assert!(manager.select_conversation(4).await.is_err());
        assert_eq!(manager.active_conversation().await, Some(4));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(api.mark_reads.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_reconnecting() {
        let (connector, mut servers) = MockConnector::new();
        let (manager, mut events) =
            ConnectionManager::start(&config(), 1, connector.clone(), Arc::new(MockApi::default()));
        let _server = servers.recv().await.unwrap();
        wait_for(&mut events, |e| *e == ChatEvent::Connected).await;

        manager.shutdown().await;
        assert!(!manager.is_connected());

        tokio::time::sleep(DELAY * 5).await;
        assert_eq!(connector.attempts(), 1);
        assert_eq!(manager.reconnect_attempts(), 0);
    }
}
