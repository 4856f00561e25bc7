//! Test doubles and fixtures shared by service and server tests.

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use super::chat::ChatModel;
use super::embedding::Embedder;
use crate::error::{ChatError, EmbeddingError};

pub const TEST_DIMENSION: u64 = 8;

/// Write a minimal PDF with one line of Courier text per page.
pub fn write_pdf(path: &Path, pages: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

/// Deterministic bag-of-bytes embedding. Identical texts map to identical vectors.
pub fn fake_vector(text: &str) -> Vec<f32> {
    let dim = TEST_DIMENSION as usize;
    let mut values = vec![0.0f32; dim];
    values[0] = 1.0;
    for (i, byte) in text.bytes().enumerate() {
        values[(i + byte as usize) % dim] += f32::from(byte) / 255.0;
    }
    values
}

/// Embedder that records every text it is asked to embed.
#[derive(Default)]
pub struct FakeEmbedder {
    calls: AtomicUsize,
    texts: Mutex<Vec<String>>,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().unwrap().extend(texts.iter().cloned());
        Ok(texts.iter().map(|t| fake_vector(t)).collect())
    }

    fn model(&self) -> &str {
        "fake-embedding"
    }
}

/// Embedder whose every call fails like an unreachable endpoint.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed_batch(&self, _texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::ServerError(
            "status 401 Unauthorized: bad key".to_string(),
        ))
    }

    fn model(&self) -> &str {
        "failing-embedding"
    }
}

/// Chat model that answers with the user prompt it received.
#[derive(Default)]
pub struct EchoChat {
    prompts: Mutex<Vec<(String, String)>>,
}

impl EchoChat {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(system, user)` pairs in call order.
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for EchoChat {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ChatError> {
        self.prompts
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        Ok(user.to_string())
    }

    fn model(&self) -> &str {
        "echo-chat"
    }
}

pub struct FailingChat;

#[async_trait]
impl ChatModel for FailingChat {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, ChatError> {
        Err(ChatError::ServerError("status 500: boom".to_string()))
    }

    fn model(&self) -> &str {
        "failing-chat"
    }
}
