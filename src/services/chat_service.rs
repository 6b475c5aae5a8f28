use async_trait::async_trait;
use log::{debug, error, info};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::error::TwitchError;
use crate::services::transport::Transport;
use crate::services::twitch_service::TwitchService;

pub const TWITCH_CHAT_SERVER: &str = "tmi.twitch.tv";
pub const TWITCH_CHAT_PORT: u16 = 6667;

/// Fired by the connector once the IRC connection is established.
#[derive(Debug, Clone)]
pub struct ConnectedEvent {
    pub server: String,
}

/// Everything the underlying IRC client needs to open the connection.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub nickname: String,
    pub password: String,
}

/// Raw-line suppression predicate; `true` means drop the line before the
/// client's own parser sees it.
pub type LineFilter = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Interface to the external IRC client. The client owns the wire
/// protocol, reconnection, and message dispatch; this crate only
/// registers hooks and supplies connection parameters.
#[async_trait]
pub trait ChatConnector: Send + Sync {
    /// Subscribe to connection-established events. Subscribing before
    /// `connect` guarantees the signal cannot be missed.
    fn connected(&self) -> broadcast::Receiver<ConnectedEvent>;

    fn install_line_filter(&self, filter: LineFilter);

    async fn connect(&self, params: ConnectParams) -> Result<(), TwitchError>;

    async fn join(&self, channel: &str) -> Result<(), TwitchError>;
}

/// True for the malformed `004` greeting the Twitch gateway sends (the
/// numeric with a bare `:-` trailing instead of RFC parameters), which
/// trips strict IRC parsers and is safe to drop.
pub fn is_stub_greeting(line: &str) -> bool {
    let trimmed = line.trim_end();
    let expected = [":", TWITCH_CHAT_SERVER, " 004"].concat();
    trimmed.starts_with(&expected) && trimmed.ends_with(":-")
}

/// Open chat for a channel: resolve the nickname, install the greeting
/// filter, arm the join hook, then start the connection.
///
/// The join hook is a spawned waiter on the connector's connected
/// events, armed before `connect` so the signal cannot be missed. It
/// joins at most once by construction: the joining path breaks out of
/// the receive loop, and task exit drops the subscription on every
/// path, join failure included. Signals from other servers leave it
/// armed. Each call arms its own waiter; nothing is shared with
/// earlier calls.
///
/// Returns the waiter's handle. If "connected" never arrives for this
/// server the waiter stays armed indefinitely; callers that need a
/// bound can wrap the handle in `tokio::time::timeout`.
pub async fn open_chat<T, C>(
    twitch: &mut TwitchService<T>,
    connector: &C,
    channel: &str,
) -> Result<JoinHandle<()>, TwitchError>
where
    T: Transport,
    C: ChatConnector + Clone + 'static,
{
    if twitch.session().oauth_token().is_empty() {
        return Err(TwitchError::Unauthorized);
    }
    if channel.is_empty() {
        return Err(TwitchError::Precondition(
            "Channel name must not be empty".to_string(),
        ));
    }

    let username = twitch.resolve_username().await?;
    let token = twitch.session().oauth_token().to_string();

    connector.install_line_filter(Box::new(is_stub_greeting));

    // Subscribe before connecting so the signal cannot slip past
    let mut events = connector.connected();

    let channel = format!("#{}", channel.trim_start_matches('#').to_lowercase());
    let waiter_connector = connector.clone();
    let waiter = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) if event.server == TWITCH_CHAT_SERVER => {
                    info!("[Chat] Connected to {}, joining {}", event.server, channel);
                    if let Err(e) = waiter_connector.join(&channel).await {
                        error!("[Chat] Failed to join {}: {}", channel, e);
                    }
                    break;
                }
                Ok(event) => {
                    debug!("[Chat] Ignoring connect signal from {}", event.server);
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    debug!("[Chat] Missed {} connect signals, still waiting", missed);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let params = ConnectParams {
        host: TWITCH_CHAT_SERVER.to_string(),
        port: TWITCH_CHAT_PORT,
        nickname: username.to_lowercase(),
        password: format!("oauth:{}", token),
    };
    connector.connect(params).await?;

    Ok(waiter)
}


#[cfg(test)]
mod tests {
    use super::mock::MockConnector;
    use super::*;
    use crate::models::settings::Session;
    use crate::services::transport::mock::MockTransport;
    use std::sync::atomic::Ordering;

    fn authed_session() -> Session {
        let mut session = Session::new("client-id");
        session.set_oauth_token("token123");
        session
    }

    fn service_with(session: Session) -> (TwitchService<MockTransport>, MockTransport) {
        let mock = MockTransport::new();
        let service = TwitchService::with_transport(session, mock.clone());
        (service, mock)
    }

    /// Give spawned waiters a chance to process pending events.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_stub_greeting_predicate() {
        assert!(is_stub_greeting(":tmi.twitch.tv 004 somenick :-\r\n"));
        assert!(is_stub_greeting(":tmi.twitch.tv 004 other_nick :-"));
        assert!(!is_stub_greeting(
            ":tmi.twitch.tv 001 somenick :Welcome, GLHF!"
        ));
        assert!(!is_stub_greeting(
            ":irc.libera.chat 004 nick server version modes"
        ));
        assert!(!is_stub_greeting("PING :tmi.twitch.tv"));
    }

    #[tokio::test]
    async fn test_open_chat_requires_token() {
        let mut session = Session::new("client-id");
        session.set_username("viewer");
        let (mut twitch, _) = service_with(session);
        let connector = MockConnector::new();

        let err = open_chat(&mut twitch, &connector, "chan")
            .await
            .unwrap_err();
        assert!(matches!(err, TwitchError::Unauthorized));
        assert!(connector.connects.lock().unwrap().is_empty());
        assert!(connector.filters.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_chat_resolves_identity_and_joins_exactly_once() {
        let (mut twitch, transport) = service_with(authed_session());
        transport.push_json(r#"{"data":[{"id":"77","login":"Viewer_Account"}]}"#);
        let connector = MockConnector::new();

        let waiter = open_chat(&mut twitch, &connector, "SomeChannel")
            .await
            .unwrap();

        // One identity lookup, and the connect carried the resolved name
        assert_eq!(transport.request_count(), 1);
        let connects = connector.connects.lock().unwrap().clone();
        assert_eq!(connects.len(), 1);
        assert_eq!(connects[0].host, "tmi.twitch.tv");
        assert_eq!(connects[0].port, 6667);
        assert_eq!(connects[0].nickname, "viewer_account");
        assert_eq!(connects[0].password, "oauth:token123");

        // Nothing joined until the server reports connected
        assert!(connector.joined().is_empty());

        connector.fire_connected("tmi.twitch.tv");
        waiter.await.unwrap();
        assert_eq!(connector.joined(), vec!["#somechannel"]);

        // The hook released itself: a second signal joins nothing
        connector.fire_connected("tmi.twitch.tv");
        settle().await;
        assert_eq!(connector.joined(), vec!["#somechannel"]);
    }

    #[tokio::test]
    async fn test_open_chat_installs_the_greeting_filter() {
        let mut session = authed_session();
        session.set_username("viewer");
        let (mut twitch, transport) = service_with(session);
        let connector = MockConnector::new();

        let waiter = open_chat(&mut twitch, &connector, "chan").await.unwrap();
        // Username was configured, so no lookup happened
        assert_eq!(transport.request_count(), 0);

        let filters = connector.filters.lock().unwrap();
        assert_eq!(filters.len(), 1);
        assert!(filters[0](":tmi.twitch.tv 004 viewer :-"));
        assert!(!filters[0](":tmi.twitch.tv 372 viewer :You are in a maze"));
        drop(filters);

        connector.fire_connected("tmi.twitch.tv");
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_open_chat_ignores_other_servers() {
        let mut session = authed_session();
        session.set_username("viewer");
        let (mut twitch, _) = service_with(session);
        let connector = MockConnector::new();

        let waiter = open_chat(&mut twitch, &connector, "Chan").await.unwrap();

        connector.fire_connected("irc.example.com");
        settle().await;
        assert!(connector.joined().is_empty());

        // The hook stayed armed and still fires for the right server
        connector.fire_connected("tmi.twitch.tv");
        waiter.await.unwrap();
        assert_eq!(connector.joined(), vec!["#chan"]);
    }

    #[tokio::test]
    async fn test_join_failure_still_releases_the_hook() {
        let mut session = authed_session();
        session.set_username("viewer");
        let (mut twitch, _) = service_with(session);
        let connector = MockConnector::new();
        connector.fail_joins.store(true, Ordering::SeqCst);

        let waiter = open_chat(&mut twitch, &connector, "chan").await.unwrap();

        connector.fire_connected("tmi.twitch.tv");
        waiter.await.unwrap();
        assert_eq!(connector.joined().len(), 1);

        connector.fire_connected("tmi.twitch.tv");
        settle().await;
        assert_eq!(connector.joined().len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_calls_arm_independent_hooks() {
        let mut session = authed_session();
        session.set_username("viewer");
        let (mut twitch, _) = service_with(session);
        let connector = MockConnector::new();

        let first = open_chat(&mut twitch, &connector, "one").await.unwrap();
        let second = open_chat(&mut twitch, &connector, "two").await.unwrap();

        connector.fire_connected("tmi.twitch.tv");
        first.await.unwrap();
        second.await.unwrap();

        let mut joined = connector.joined();
        joined.sort();
        assert_eq!(joined, vec!["#one", "#two"]);
    }

    #[tokio::test]
    async fn test_channel_name_is_normalized() {
        let mut session = authed_session();
        session.set_username("viewer");
        let (mut twitch, _) = service_with(session);
        let connector = MockConnector::new();

        let waiter = open_chat(&mut twitch, &connector, "#MixedCase")
            .await
            .unwrap();
        connector.fire_connected("tmi.twitch.tv");
        waiter.await.unwrap();

        assert_eq!(connector.joined(), vec!["#mixedcase"]);
    }
}
