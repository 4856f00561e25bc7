use std::fmt::Write as FmtWrite;

use crate::models::{IngestSummary, OutputFormat};
use crate::services::IndexInfo;

pub trait Formatter {
    fn format_ingest(&self, summary: &IngestSummary) -> String;
    fn format_answer(&self, answer: &AnswerInfo) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct AnswerInfo {
    pub question: String,
    pub session_id: Option<String>,
    pub answer: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct StatusInfo {
    pub azure_endpoint: Option<String>,
    pub embedding_deployment: String,
    pub chat_deployment: String,
    pub vector_store_driver: String,
    pub index_name: String,
    pub vector_store_connected: bool,
    pub index: Option<IndexInfo>,
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_ingest(&self, summary: &IngestSummary) -> String {
        let mut output = String::new();
        writeln!(output, "{}", summary.message()).unwrap();
        writeln!(output, "  File:        {}", summary.filename).unwrap();
        writeln!(output, "  Session ID:  {}", summary.session_id).unwrap();
        output
    }

    fn format_answer(&self, answer: &AnswerInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Q: {}", answer.question).unwrap();
        match answer.session_id {
            Some(ref session) => writeln!(output, "   (session {})", session).unwrap(),
            None => writeln!(output, "   (no session, default namespace)").unwrap(),
        }
        writeln!(output).unwrap();
        writeln!(output, "{}", answer.answer).unwrap();
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();

        writeln!(
            output,
            "Azure OpenAI:  {}",
            status.azure_endpoint.as_deref().unwrap_or("(not configured)")
        )
        .unwrap();
        writeln!(output, "  Embedding:   {}", status.embedding_deployment).unwrap();
        writeln!(output, "  Chat:        {}", status.chat_deployment).unwrap();
        writeln!(output).unwrap();

        let vector_status = if status.vector_store_connected {
            "[CONNECTED]"
        } else {
            "[DISCONNECTED]"
        };
        writeln!(
            output,
            "Vector Store:  {} ({})",
            status.vector_store_driver, vector_status
        )
        .unwrap();
        writeln!(output, "  Index:       {}", status.index_name).unwrap();
        if status.vector_store_connected {
            match status.index {
                Some(ref info) => {
                    writeln!(output, "  Dimension:   {}", info.dimension).unwrap();
                    writeln!(output, "  Records:     {}", info.record_count).unwrap();
                    if let Some(namespaces) = info.namespace_count {
                        writeln!(output, "  Sessions:    {}", namespaces).unwrap();
                    }
                }
                None => writeln!(output, "  (index not created yet)").unwrap(),
            }
        }

        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render(&self, json: &serde_json::Value) -> String {
        if self.pretty {
            serde_json::to_string_pretty(json).unwrap()
        } else {
            serde_json::to_string(json).unwrap()
        }
    }
}

impl Formatter for JsonFormatter {
    fn format_ingest(&self, summary: &IngestSummary) -> String {
        self.render(&serde_json::json!({
            "message": summary.message(),
            "session_id": summary.session_id,
            "filename": summary.filename,
            "chunks": summary.chunk_count,
        }))
    }

    fn format_answer(&self, answer: &AnswerInfo) -> String {
        self.render(&serde_json::json!({
            "question": answer.question,
            "session_id": answer.session_id,
            "answer": answer.answer,
            "duration_ms": answer.duration_ms,
        }))
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let index = status.index.as_ref().map(|info| {
            serde_json::json!({
                "dimension": info.dimension,
                "records": info.record_count,
                "sessions": info.namespace_count,
            })
        });

        self.render(&serde_json::json!({
            "azure": {
                "endpoint": status.azure_endpoint,
                "embedding_deployment": status.embedding_deployment,
                "chat_deployment": status.chat_deployment,
            },
            "vector_store": {
                "driver": status.vector_store_driver,
                "index": status.index_name,
                "connected": status.vector_store_connected,
                "stats": index,
            }
        }))
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        format!("{}\n", serde_json::json!({"error": error}))
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}
