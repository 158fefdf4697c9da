use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;
use uuid::Uuid;

use super::{ChatEngine, IndexLoader};
use crate::domain::{ports::RagEngine, ChatResponse, Conversation, DomainError, Message, MessageRole};

/// State owned by one user session: the rendered history and the chat engine
/// built for it.
pub struct ChatSession {
    id: Uuid,
    history: Conversation,
    engine: Option<ChatEngine>,
}

impl ChatSession {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            history: Conversation::new(),
            engine: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn messages(&self) -> &[Message] {
        self.history.messages()
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }
}

/// One interaction cycle per call: fetch the cached index, make sure the
/// session has an engine, then run at most one round trip.
pub struct ChatService {
    loader: Arc<IndexLoader>,
    rag: Arc<dyn RagEngine>,
}

impl ChatService {
    pub fn new(loader: Arc<IndexLoader>, rag: Arc<dyn RagEngine>) -> Self {
        Self { loader, rag }
    }

    pub fn loader(&self) -> &Arc<IndexLoader> {
        &self.loader
    }

    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub async fn prepare(&self, session: &mut ChatSession) -> Result<(), DomainError> {
        let index = self.loader.load().await?;
        if session.engine.is_none() {
            session.engine = Some(ChatEngine::new(self.rag.clone(), index));
            tracing::debug!("chat engine created");
        }
        Ok(())
    }

    /// Returns `None` without a round trip when `input` is blank. The user turn
    /// is recorded before the engine is called and stays if the call fails.
    #[instrument(skip(self, session, input), fields(session_id = %session.id))]
    pub async fn submit(
        &self,
        session: &mut ChatSession,
        input: &str,
    ) -> Result<Option<ChatResponse>, DomainError> {
        self.prepare(session).await?;

        if input.trim().is_empty() {
            return Ok(None);
        }

        let engine = session
            .engine
            .as_ref()
            .ok_or_else(|| DomainError::internal("chat engine missing after prepare"))?;

        session.history.add_message(MessageRole::User, input);
        let response = engine.chat(input).await?;
        session
            .history
            .add_message(MessageRole::Assistant, response.response.as_str());

        tracing::info!(
            messages = session.history.len(),
            sources = response.sources.len(),
            "round trip completed"
        );
        Ok(Some(response))
    }

    pub fn clear(&self, session: &mut ChatSession) -> Result<(), DomainError> {
        session.history.clear();
        if let Some(engine) = &session.engine {
            engine.reset()?;
        }
        Ok(())
    }
}

struct SessionEntry {
    session: Arc<Mutex<ChatSession>>,
    last_seen: Instant,
}

/// In-memory sessions, dropped on restart. Ids are always minted here; an id
/// the store does not know is never adopted. Sessions idle for longer than
/// `idle_timeout` are dropped, and the least recently used one makes room
/// once `max_sessions` is reached.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    max_sessions: usize,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(max_sessions: usize, idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            max_sessions: max_sessions.max(1),
            idle_timeout,
        }
    }

    /// Looks up a live session without creating one.
    pub async fn get(&self, id: Option<Uuid>) -> Option<Arc<Mutex<ChatSession>>> {
        let id = id?;
        let mut sessions = self.sessions.write().await;

        if sessions.get(&id)?.last_seen.elapsed() > self.idle_timeout {
            sessions.remove(&id);
            tracing::debug!(session_id = %id, "idle session expired");
            return None;
        }

        let entry = sessions.get_mut(&id)?;
        entry.last_seen = Instant::now();
        Some(entry.session.clone())
    }

    /// Returns the live session for `id`, or a new session under a fresh id.
    pub async fn get_or_create(&self, id: Option<Uuid>) -> (Uuid, Arc<Mutex<ChatSession>>) {
        if let Some(known) = id {
            if let Some(session) = self.get(Some(known)).await {
                return (known, session);
            }
        }

        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(ChatSession::new(id)));

        let mut sessions = self.sessions.write().await;
        self.evict(&mut sessions);
        sessions.insert(
            id,
            SessionEntry {
                session: session.clone(),
                last_seen: Instant::now(),
            },
        );
        tracing::debug!(session_id = %id, sessions = sessions.len(), "session created");
        (id, session)
    }

    fn evict(&self, sessions: &mut HashMap<Uuid, SessionEntry>) {
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen.elapsed() <= self.idle_timeout);

        if sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                sessions.remove(&oldest);
            }
        }

        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, "sessions evicted");
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeRag, StaticReader};

    fn service(reader: StaticReader, rag: FakeRag) -> (ChatService, Arc<StaticReader>, Arc<FakeRag>) {
        let reader = Arc::new(reader);
        let rag = Arc::new(rag);
        let loader = Arc::new(IndexLoader::new(reader.clone(), rag.clone()));
        (ChatService::new(loader, rag.clone()), reader, rag)
    }

    #[tokio::test]
    async fn test_n_inputs_produce_2n_alternating_messages() {
        let (chat, reader, _rag) = service(StaticReader::rows(&["id: 1"]), FakeRag::new());
        let mut session = ChatSession::new(Uuid::new_v4());
        let inputs = ["first?", "second?", "third?", "fourth?"];

        for input in inputs {
            chat.submit(&mut session, input).await.unwrap();
        }

        let messages = session.messages();
        assert_eq!(messages.len(), 2 * inputs.len());
        for (i, pair) in messages.chunks(2).enumerate() {
            assert_eq!(pair[0].role, MessageRole::User);
            assert_eq!(pair[0].content, inputs[i]);
            assert_eq!(pair[1].role, MessageRole::Assistant);
            assert_eq!(pair[1].content, format!("echo: {}", inputs[i]));
        }
        assert_eq!(reader.loads(), 1);
    }

    #[tokio::test]
    async fn test_orders_scenario() {
        let (chat, _reader, _rag) = service(
            StaticReader::rows(&["id: 1"]),
            FakeRag::new().answer("There are 120 rows."),
        );
        let mut session = ChatSession::new(Uuid::new_v4());

        let response = chat
            .submit(&mut session, "How many rows are in the orders table?")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.response, "There are 120 rows.");
        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[0].content, "How many rows are in the orders table?");
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[1].content, "There are 120 rows.");
    }

    #[tokio::test]
    async fn test_loader_failure_builds_nothing() {
        let (chat, _reader, rag) = service(StaticReader::failing(), FakeRag::new());
        let mut session = ChatSession::new(Uuid::new_v4());

        let result = chat.submit(&mut session, "anything?").await;

        assert!(result.is_err());
        assert!(!session.has_engine());
        assert!(session.messages().is_empty());
        assert!(rag.histories().is_empty());
    }

    #[tokio::test]
    async fn test_chat_failure_keeps_user_message() {
        let (chat, _reader, _rag) = service(
            StaticReader::rows(&["id: 1"]),
            FakeRag::new().error("quota exceeded"),
        );
        let mut session = ChatSession::new(Uuid::new_v4());

        let result = chat.submit(&mut session, "How many orders?").await;

        assert!(matches!(result, Err(DomainError::ExternalService(_))));
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].role, MessageRole::User);

        // The next cycle may succeed once the condition clears.
        chat.submit(&mut session, "How many orders?").await.unwrap();
        assert_eq!(session.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_input_skips_round_trip() {
        let (chat, _reader, rag) = service(StaticReader::rows(&["id: 1"]), FakeRag::new());
        let mut session = ChatSession::new(Uuid::new_v4());

        assert!(chat.submit(&mut session, "").await.unwrap().is_none());
        assert!(chat.submit(&mut session, "   ").await.unwrap().is_none());

        assert!(session.messages().is_empty());
        assert!(rag.histories().is_empty());
        assert!(session.has_engine());
    }

    #[tokio::test]
    async fn test_sessions_share_one_index() {
        let (chat, reader, rag) = service(StaticReader::rows(&["id: 1"]), FakeRag::new());
        let mut a = ChatSession::new(Uuid::new_v4());
        let mut b = ChatSession::new(Uuid::new_v4());

        chat.submit(&mut a, "a?").await.unwrap();
        chat.submit(&mut b, "b?").await.unwrap();

        assert_eq!(reader.loads(), 1);
        assert_eq!(rag.builds(), 1);
        // Each session's engine only remembers its own turns.
        assert!(rag.histories().iter().all(|h| h.is_empty()));
    }

    #[tokio::test]
    async fn test_clear_resets_history_and_memory() {
        let (chat, _reader, rag) = service(StaticReader::rows(&["id: 1"]), FakeRag::new());
        let mut session = ChatSession::new(Uuid::new_v4());
        chat.submit(&mut session, "one?").await.unwrap();

        chat.clear(&mut session).unwrap();
        chat.submit(&mut session, "two?").await.unwrap();

        assert_eq!(session.messages().len(), 2);
        assert!(rag.histories()[1].is_empty());
    }

    fn store(max_sessions: usize, idle_timeout: Duration) -> SessionStore {
        SessionStore::new(max_sessions, idle_timeout)
    }

    #[tokio::test]
    async fn test_session_store_reuses_known_ids() {
        let store = store(16, Duration::from_secs(60));
        let (id, first) = store.get_or_create(None).await;
        let (same_id, second) = store.get_or_create(Some(id)).await;

        assert_eq!(id, same_id);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_id_gets_a_fresh_one() {
        let store = store(16, Duration::from_secs(60));
        let supplied = Uuid::new_v4();

        let (id, _) = store.get_or_create(Some(supplied)).await;

        assert_ne!(id, supplied);
        assert!(store.get(Some(supplied)).await.is_none());
        assert!(store.get(Some(id)).await.is_some());
    }

    #[tokio::test]
    async fn test_get_never_creates() {
        let store = store(16, Duration::from_secs(60));

        assert!(store.get(None).await.is_none());
        assert!(store.get(Some(Uuid::new_v4())).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let store = store(16, Duration::from_millis(20));
        let (stale, _) = store.get_or_create(None).await;

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(store.get(Some(stale)).await.is_none());
        let (fresh, _) = store.get_or_create(Some(stale)).await;
        assert_ne!(fresh, stale);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_used() {
        let store = store(2, Duration::from_secs(60));
        let (a, _) = store.get_or_create(None).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let (b, _) = store.get_or_create(None).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        // Touching `a` makes `b` the oldest.
        assert!(store.get(Some(a)).await.is_some());
        tokio::time::sleep(Duration::from_millis(5)).await;

        let (c, _) = store.get_or_create(None).await;

        assert_eq!(store.len().await, 2);
        assert!(store.get(Some(a)).await.is_some());
        assert!(store.get(Some(b)).await.is_none());
        assert!(store.get(Some(c)).await.is_some());
    }
}
