//! In-process fakes for the domain ports.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::domain::{
    ports::{DatabaseReader, EmbeddingService, LlmService, RagEngine},
    ChatResponse, Document, DocumentSource, DomainError, Embedding, Message, VectorIndex,
};

const DIMENSION: usize = 4096;

/// Bag-of-words embedding: each lowercase word is hashed into one dimension.
#[derive(Default)]
pub struct KeywordEmbedding {
    calls: AtomicUsize,
}

impl KeywordEmbedding {
    pub fn vectorize(text: &str) -> Embedding {
        let mut vec = vec![0.0f32; DIMENSION];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            vec[fnv1a(&word.to_lowercase()) % DIMENSION] += 1.0;
        }
        Embedding::new(vec)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn fnv1a(word: &str) -> usize {
    word.bytes().fold(0xcbf29ce484222325u64, |hash, b| {
        (hash ^ b as u64).wrapping_mul(0x100000001b3)
    }) as usize
}

#[async_trait]
impl EmbeddingService for KeywordEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vectorize(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
    }
}

/// Returns queued replies in order and records `(system, prompt)` per call.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<(Option<String>, String)>>,
    failure: Option<String>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new()
        }
    }

    pub fn reply(self, text: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(text.into());
        self
    }

    pub fn calls(&self) -> Vec<(Option<String>, String)> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(&self, system: Option<&str>, prompt: &str) -> Result<String, DomainError> {
        self.calls
            .lock()
            .unwrap()
            .push((system.map(str::to_string), prompt.to_string()));

        if let Some(message) = &self.failure {
            return Err(DomainError::external(message.clone()));
        }
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "ok".to_string()))
    }
}

#[async_trait]
impl LlmService for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        self.respond(None, prompt)
    }

    async fn complete_with_system(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<String, DomainError> {
        self.respond(Some(system), prompt)
    }
}

/// Reader over a fixed set of rows that counts how often it is asked to load.
pub struct StaticReader {
    documents: Vec<Document>,
    fail: bool,
    loads: AtomicUsize,
}

impl StaticReader {
    pub fn rows(rows: &[&str]) -> Self {
        Self {
            documents: rows
                .iter()
                .enumerate()
                .map(|(i, text)| Document::new(*text, DocumentSource::table("orders", i)))
                .collect(),
            fail: false,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::rows(&[])
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatabaseReader for StaticReader {
    async fn load_documents(&self) -> Result<Vec<Document>, DomainError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DomainError::database("unable to open database file"));
        }
        Ok(self.documents.clone())
    }
}

/// RAG engine that answers from a script and records the history it was given.
pub struct FakeRag {
    answers: Mutex<VecDeque<Result<String, String>>>,
    builds: AtomicUsize,
    histories: Mutex<Vec<Vec<Message>>>,
}

impl FakeRag {
    pub fn new() -> Self {
        Self {
            answers: Mutex::new(VecDeque::new()),
            builds: AtomicUsize::new(0),
            histories: Mutex::new(Vec::new()),
        }
    }

    pub fn answer(self, text: impl Into<String>) -> Self {
        self.answers.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    pub fn error(self, message: impl Into<String>) -> Self {
        self.answers.lock().unwrap().push_back(Err(message.into()));
        self
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn histories(&self) -> Vec<Vec<Message>> {
        self.histories.lock().unwrap().clone()
    }
}

#[async_trait]
impl RagEngine for FakeRag {
    async fn build_index(&self, documents: &[Document]) -> Result<VectorIndex, DomainError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(VectorIndex::new(Vec::new(), documents.len()))
    }

    async fn query(
        &self,
        _index: &VectorIndex,
        question: &str,
        history: &[Message],
    ) -> Result<ChatResponse, DomainError> {
        self.histories.lock().unwrap().push(history.to_vec());
        let next = self.answers.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(ChatResponse::new(text, question)),
            Some(Err(message)) => Err(DomainError::external(message)),
            None => Ok(ChatResponse::new(format!("echo: {question}"), question)),
        }
    }
}
