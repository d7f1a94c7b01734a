//! crates/study_assistant_core/src/gateway.rs
//!
//! The AI generation gateway. Builds prompts and output schemas for each
//! capability, calls the `CompletionService` port, and validates the reply into
//! domain types. Every failure (transport, malformed output, schema violation)
//! is logged and turned into the capability's empty value, so callers never
//! see an error.

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{
    Flashcard, FlashcardStatus, MindMapNode, QuizFilters, QuizQuestion, SectionKind,
    SourceDocument, Summary, SummarySection, SearchResults,
};
use crate::parsing::parse_model_output;
use crate::ports::{Capability, CompletionRequest, CompletionService, PortResult};

/// Transcript prefix sent for summaries, flashcards and mind maps.
pub const MATERIAL_CONTEXT_CHARS: usize = 3500;
/// Transcript prefix sent for a contextual quiz.
pub const QUIZ_CONTEXT_CHARS: usize = 1000;
/// Per-document snippet sent with a search.
pub const SEARCH_SNIPPET_CHARS: usize = 500;
pub const DEFAULT_QUESTION_COUNT: usize = 5;
pub const MAX_QUESTION_COUNT: usize = 20;

const FALLBACK_INSTITUTION: &str = "Geral";
const NOTHING_FOUND: &str = "Nada encontrado.";
const SEARCH_FAILED: &str = "Não foi possível concluir a busca.";

/// Returns at most `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Where a quiz request takes its material from.
#[derive(Debug, Clone, Copy)]
pub enum QuizSource<'a> {
    /// Filter-driven questions with no document context.
    General(&'a QuizFilters),
    /// Questions about a transcript.
    Contextual {
        transcript: &'a str,
        filters: &'a QuizFilters,
    },
}

//=========================================================================================
// Wire Shapes (what the model is asked to return)
//=========================================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSummary {
    title: String,
    topic: String,
    sections: Vec<WireSection>,
    #[serde(default)]
    exam_pearls: Vec<String>,
}

#[derive(Deserialize)]
struct WireSection {
    title: String,
    #[serde(rename = "type")]
    kind: SectionKind,
    #[serde(default)]
    content: Vec<String>,
}

#[derive(Deserialize)]
struct WireCard {
    front: String,
    back: String,
}

#[derive(Deserialize)]
struct WireNode {
    label: String,
    #[serde(default)]
    children: Vec<WireNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireQuestion {
    #[serde(default)]
    category: String,
    #[serde(default)]
    institution: Option<String>,
    question: String,
    options: Vec<String>,
    correct_index: i64,
    #[serde(default)]
    explanation: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSearch {
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    relevant_file_ids: Vec<String>,
}

fn mint_node(node: WireNode) -> MindMapNode {
    let id = Uuid::new_v4().simple().to_string();
    MindMapNode {
        id: format!("mm-{}", &id[..9]),
        label: node.label,
        children: node.children.into_iter().map(mint_node).collect(),
    }
}

//=========================================================================================
// Output Schemas
//=========================================================================================

fn summary_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string" },
            "topic": { "type": "string" },
            "sections": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "type": {
                            "type": "string",
                            "enum": ["concept", "clinical", "diagnosis", "treatment", "warning"]
                        },
                        "content": { "type": "array", "items": { "type": "string" } }
                    },
                    "required": ["title", "type", "content"]
                }
            },
            "examPearls": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["title", "topic", "sections", "examPearls"]
    })
}

fn flashcards_schema() -> serde_json::Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "front": { "type": "string" },
                "back": { "type": "string" }
            },
            "required": ["front", "back"]
        }
    })
}

fn mind_map_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "label": { "type": "string" },
            "children": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "label": { "type": "string" },
                        "children": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": { "label": { "type": "string" } }
                            }
                        }
                    }
                }
            }
        },
        "required": ["label", "children"]
    })
}

fn quiz_schema() -> serde_json::Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "category": { "type": "string" },
                "institution": { "type": "string" },
                "question": { "type": "string" },
                "options": { "type": "array", "items": { "type": "string" } },
                "correctIndex": { "type": "integer" },
                "explanation": { "type": "string" }
            },
            "required": ["category", "question", "options", "correctIndex", "explanation"]
        }
    })
}

fn search_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "explanation": { "type": "string" },
            "relevantFileIds": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["explanation", "relevantFileIds"]
    })
}

//=========================================================================================
// The Gateway
//=========================================================================================

#[derive(Clone)]
pub struct GenerationGateway {
    service: Arc<dyn CompletionService>,
}

impl GenerationGateway {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service }
    }

    /// Sends one request and parses the reply. Failures are logged here.
    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        capability: Capability,
        prompt: String,
        schema: serde_json::Value,
    ) -> Option<T> {
        let request = CompletionRequest {
            capability,
            prompt,
            schema,
        };
        debug!("Requesting {} generation.", capability.as_str());

        let parsed: PortResult<T> = match self.service.complete(&request).await {
            Ok(raw) => parse_model_output(&raw),
            Err(e) => Err(e),
        };
        match parsed {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("{} generation failed: {}", capability.as_str(), e);
                None
            }
        }
    }

    pub async fn summary(&self, transcript: &str) -> Option<Summary> {
        if transcript.trim().is_empty() {
            return None;
        }
        let prompt = format!(
            "Atue como tutor de residência médica. Gere um resumo estruturado em JSON, \
             com seções classificadas e pérolas de prova. Texto: {}",
            truncate_chars(transcript, MATERIAL_CONTEXT_CHARS)
        );
        let wire: WireSummary = self
            .request(Capability::Summary, prompt, summary_schema())
            .await?;

        Some(Summary {
            title: wire.title,
            topic: wire.topic,
            sections: wire
                .sections
                .into_iter()
                .map(|s| SummarySection {
                    kind: s.kind,
                    title: s.title,
                    content: s.content,
                })
                .collect(),
            exam_pearls: wire.exam_pearls,
        })
    }

    pub async fn flashcards(&self, transcript: &str) -> Vec<Flashcard> {
        if transcript.trim().is_empty() {
            return Vec::new();
        }
        let prompt = format!(
            "Crie 5 flashcards difíceis no nível de residência médica. Responda em JSON. Texto: {}",
            truncate_chars(transcript, MATERIAL_CONTEXT_CHARS)
        );
        let cards: Vec<WireCard> = self
            .request(Capability::Flashcards, prompt, flashcards_schema())
            .await
            .unwrap_or_default();

        let stamp = Utc::now().timestamp_millis();
        cards
            .into_iter()
            .enumerate()
            .map(|(i, card)| Flashcard {
                id: format!("fc-{}-{}", stamp, i),
                front: card.front,
                back: card.back,
                status: FlashcardStatus::New,
            })
            .collect()
    }

    pub async fn mind_map(&self, transcript: &str) -> Option<MindMapNode> {
        if transcript.trim().is_empty() {
            return None;
        }
        let prompt = format!(
            "Crie um mapa mental hierárquico em JSON. Texto: {}",
            truncate_chars(transcript, MATERIAL_CONTEXT_CHARS)
        );
        let root: WireNode = self
            .request(Capability::MindMap, prompt, mind_map_schema())
            .await?;
        let map = mint_node(root);
        debug!(
            "Mind map has {} node(s), depth {}.",
            map.node_count(),
            map.depth()
        );
        Some(map)
    }

    pub async fn quiz_questions(&self, source: QuizSource<'_>) -> Vec<QuizQuestion> {
        let filters = match source {
            QuizSource::General(filters) => filters,
            QuizSource::Contextual { filters, .. } => filters,
        };
        let count = match filters.count {
            0 => DEFAULT_QUESTION_COUNT,
            n => n.min(MAX_QUESTION_COUNT),
        };
        let prompt = match source {
            QuizSource::General(filters) => format!(
                "Crie {} questões INÉDITAS de residência médica no estilo da banca {}. \
                 Foco: {}. Dificuldade: {}.",
                count, filters.institution, filters.specialty, filters.difficulty
            ),
            QuizSource::Contextual { transcript, .. } => {
                if transcript.trim().is_empty() {
                    return Vec::new();
                }
                format!(
                    "Crie {} questões baseadas no texto: {}",
                    count,
                    truncate_chars(transcript, QUIZ_CONTEXT_CHARS)
                )
            }
        };

        let wire: Vec<WireQuestion> = self
            .request(Capability::Quiz, prompt, quiz_schema())
            .await
            .unwrap_or_default();

        let default_institution = if filters.institution.trim().is_empty() {
            FALLBACK_INSTITUTION.to_string()
        } else {
            filters.institution.clone()
        };
        let stamp = Utc::now().timestamp_millis();
        let generated = wire.len();
        let questions: Vec<QuizQuestion> = wire
            .into_iter()
            .enumerate()
            .filter_map(|(i, q)| {
                let correct_index = usize::try_from(q.correct_index).ok()?;
                if correct_index >= q.options.len() {
                    return None;
                }
                Some(QuizQuestion {
                    id: format!("qz-{}-{}", stamp, i),
                    category: q.category,
                    institution: Some(
                        q.institution
                            .filter(|s| !s.trim().is_empty())
                            .unwrap_or_else(|| default_institution.clone()),
                    ),
                    question: q.question,
                    options: q.options,
                    correct_index,
                    explanation: q.explanation,
                })
            })
            .collect();

        if questions.len() < generated {
            warn!(
                "Dropped {} generated question(s) with an invalid answer index.",
                generated - questions.len()
            );
        }
        questions
    }

    /// Finds the documents relevant to `query`. Ids outside `documents` are dropped.
    pub async fn search(&self, query: &str, documents: &[SourceDocument]) -> SearchResults {
        let snippets: Vec<serde_json::Value> = documents
            .iter()
            .map(|d| {
                json!({
                    "id": d.id,
                    "name": d.name,
                    "snippet": truncate_chars(&d.transcript, SEARCH_SNIPPET_CHARS),
                })
            })
            .collect();
        let prompt = format!(
            "Busca interna. Query: \"{}\". Conteúdo: {}",
            query,
            serde_json::Value::Array(snippets)
        );

        match self
            .request::<WireSearch>(Capability::Search, prompt, search_schema())
            .await
        {
            Some(wire) => SearchResults {
                explanation: wire
                    .explanation
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| NOTHING_FOUND.to_string()),
                relevant_document_ids: wire
                    .relevant_file_ids
                    .into_iter()
                    .filter(|id| documents.iter().any(|d| &d.id == id))
                    .collect(),
            },
            None => SearchResults {
                explanation: SEARCH_FAILED.to_string(),
                relevant_document_ids: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::MediaType;
    use crate::ports::PortError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies with canned text and records every request it receives.
    pub(crate) struct ScriptedCompletion {
        replies: Mutex<Vec<PortResult<String>>>,
        pub(crate) requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedCompletion {
        pub(crate) fn new(replies: Vec<PortResult<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn replying(text: &str) -> Arc<Self> {
            Self::new(vec![Ok(text.to_string())])
        }

        pub(crate) fn calls(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionService for ScriptedCompletion {
        async fn complete(&self, request: &CompletionRequest) -> PortResult<String> {
            self.requests.lock().unwrap().push(request.clone());
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                return Err(PortError::Unexpected("no scripted reply left".to_string()));
            }
            replies.remove(0)
        }
    }

    pub(crate) const SUMMARY_JSON: &str = r#"{"title":"Crises","topic":"Cardiologia","sections":[{"title":"Emergência","type":"clinical","content":["LOA aguda"]}],"examPearls":["Reduzir 25% da PAM"]}"#;

    pub(crate) const QUIZ_JSON: &str = r#"[{"category":"Cardiologia","question":"Conduta?","options":["A","B","C"],"correctIndex":1,"explanation":"Porque B"}]"#;

    #[test]
    fn truncation_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("ação", 2), "aç");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[tokio::test]
    async fn summary_is_parsed_into_typed_sections() {
        let service = ScriptedCompletion::replying(SUMMARY_JSON);
        let gateway = GenerationGateway::new(service.clone());
        let summary = gateway.summary("transcrição").await.unwrap();
        assert_eq!(summary.sections[0].kind, SectionKind::Clinical);
        assert_eq!(summary.exam_pearls.len(), 1);
        assert_eq!(service.calls()[0].capability, Capability::Summary);
    }

    #[tokio::test]
    async fn unknown_section_kind_is_a_failure() {
        let reply = SUMMARY_JSON.replace("clinical", "gossip");
        let gateway = GenerationGateway::new(ScriptedCompletion::replying(&reply));
        assert!(gateway.summary("transcrição").await.is_none());
    }

    #[tokio::test]
    async fn transport_errors_become_empty_values() {
        let service = ScriptedCompletion::new(vec![Err(PortError::Unexpected("timeout".into()))]);
        let gateway = GenerationGateway::new(service);
        assert!(gateway.flashcards("texto").await.is_empty());
    }

    #[tokio::test]
    async fn empty_transcript_sends_no_request() {
        let service = ScriptedCompletion::new(Vec::new());
        let gateway = GenerationGateway::new(service.clone());
        assert!(gateway.summary("   ").await.is_none());
        assert!(gateway.mind_map("").await.is_none());
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn long_transcripts_are_truncated_before_sending() {
        let service = ScriptedCompletion::replying("[]");
        let gateway = GenerationGateway::new(service.clone());
        let transcript = "#".repeat(MATERIAL_CONTEXT_CHARS + 500);
        gateway.flashcards(&transcript).await;
        let prompt = &service.calls()[0].prompt;
        assert_eq!(prompt.matches('#').count(), MATERIAL_CONTEXT_CHARS);
        assert!(prompt.ends_with(&"#".repeat(MATERIAL_CONTEXT_CHARS)));
    }

    #[tokio::test]
    async fn truncated_flashcards_are_repaired_and_minted() {
        let reply = "```json\n[{\"front\":\"PA?\",\"back\":\"140/90\"},{\"front\":\"Meta?\",\"back\":\"130/80\"";
        let gateway = GenerationGateway::new(ScriptedCompletion::replying(reply));
        let cards = gateway.flashcards("texto").await;
        assert_eq!(cards.len(), 2);
        assert!(cards[0].id.starts_with("fc-"));
        assert_ne!(cards[0].id, cards[1].id);
        assert_eq!(cards[1].status, FlashcardStatus::New);
    }

    #[tokio::test]
    async fn mind_map_nodes_get_fresh_ids() {
        let reply = r#"{"label":"HAS","children":[{"label":"Crise","children":[{"label":"Emergência"}]},{"label":"Crônica"}]}"#;
        let gateway = GenerationGateway::new(ScriptedCompletion::replying(reply));
        let root = gateway.mind_map("texto").await.unwrap();
        assert_eq!(root.node_count(), 4);
        assert_eq!(root.depth(), 3);
        assert_ne!(root.id, root.children[0].id);
        assert!(root.children[1].children.is_empty());
    }

    #[tokio::test]
    async fn questions_with_invalid_answer_index_are_dropped() {
        let reply = r#"[
            {"category":"Pediatria","question":"Q1","options":["a","b"],"correctIndex":1,"explanation":"e"},
            {"category":"Pediatria","question":"Q2","options":["a","b"],"correctIndex":5,"explanation":"e"},
            {"category":"Pediatria","question":"Q3","options":["a"],"correctIndex":-1,"explanation":"e"}
        ]"#;
        let gateway = GenerationGateway::new(ScriptedCompletion::replying(reply));
        let filters = QuizFilters {
            specialty: "Pediatria".into(),
            institution: "USP-SP".into(),
            ..QuizFilters::default()
        };
        let questions = gateway.quiz_questions(QuizSource::General(&filters)).await;
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].institution.as_deref(), Some("USP-SP"));
    }

    #[tokio::test]
    async fn contextual_quiz_defaults_institution_to_general() {
        let service = ScriptedCompletion::replying(QUIZ_JSON);
        let gateway = GenerationGateway::new(service.clone());
        let filters = QuizFilters::default();
        let questions = gateway
            .quiz_questions(QuizSource::Contextual {
                transcript: "Texto da aula",
                filters: &filters,
            })
            .await;
        assert_eq!(questions[0].institution.as_deref(), Some("Geral"));
        assert!(service.calls()[0].prompt.contains("Texto da aula"));
    }

    #[tokio::test]
    async fn search_discards_unknown_ids() {
        let reply = r#"{"explanation":"Veja a aula 1","relevantFileIds":["1","99"]}"#;
        let gateway = GenerationGateway::new(ScriptedCompletion::replying(reply));
        let documents = vec![SourceDocument {
            id: "1".into(),
            name: "HAS".into(),
            subject_area: "Cardiologia".into(),
            media_type: MediaType::Video,
            date: "2023-10-12".into(),
            transcript: "Hipertensão".into(),
        }];
        let results = gateway.search("hipertensão", &documents).await;
        assert_eq!(results.relevant_document_ids, vec!["1".to_string()]);
        assert_eq!(results.explanation, "Veja a aula 1");
    }
}
