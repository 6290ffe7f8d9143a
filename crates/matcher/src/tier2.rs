//! Tier-2 semantic matching (spec §4.3): BM25-style statistical similarity
//! over scenario triggers, via an embedded `tantivy` index. Adapted from the
//! teacher's RAG sparse-search index, with the corpus narrowed from
//! arbitrary documents down to one "document" per scenario (its joined
//! trigger phrases).

use frontdesk_core::{Scenario, ScenarioId};
use parking_lot::RwLock;
use tantivy::{
    collector::TopDocs,
    query::QueryParser,
    schema::{Field, OwnedValue, Schema, TextFieldIndexing, TextOptions, STORED, STRING},
    tokenizer::{Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, TextAnalyzer},
    Index, IndexReader, IndexWriter, TantivyDocument,
};

use crate::MatcherError;

/// A Tier-2 hit: the scenario id and its BM25 score (unbounded above, not
/// normalized to `[0,1]` by tantivy -- callers must min-max or threshold it
/// against the scenario's own `minConfidence` after rescaling, see
/// [`normalize_score`]).
#[derive(Debug, Clone)]
pub struct Tier2Hit {
    pub scenario_id: ScenarioId,
    pub score: f32,
}

/// A small in-RAM index over one tenant's scenario set, rebuilt whenever the
/// tenant's scenario list changes (the config resolver's `invalidate`
/// already signals this upstream; the matcher layer rebuilds on cache miss).
pub struct Tier2Index {
    index: Index,
    reader: IndexReader,
    writer: RwLock<Option<IndexWriter>>,
    id_field: Field,
    text_field: Field,
}

impl Tier2Index {
    pub fn build(scenarios: &[Scenario]) -> Result<Self, MatcherError> {
        let mut schema_builder = Schema::builder();
        let text_options = TextOptions::default()
            .set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer("scenario_triggers")
                    .set_index_option(tantivy::schema::IndexRecordOption::WithFreqsAndPositions),
            )
            .set_stored();

        let id_field = schema_builder.add_text_field("id", STRING | STORED);
        let text_field = schema_builder.add_text_field("triggers", text_options);
        let schema = schema_builder.build();

        let index = Index::create_in_ram(schema.clone());
        index
            .tokenizers()
            .register("scenario_triggers", Self::build_tokenizer());

        let reader = index
            .reader()
            .map_err(|e| MatcherError::Index(e.to_string()))?;
        let mut writer = index
            .writer(15_000_000)
            .map_err(|e| MatcherError::Index(e.to_string()))?;

        for scenario in scenarios {
            if scenario.triggers.is_empty() {
                continue;
            }
            let mut doc = TantivyDocument::default();
            doc.add_text(id_field, scenario.id.as_str());
            doc.add_text(text_field, scenario.triggers.join(" "));
            writer
                .add_document(doc)
                .map_err(|e| MatcherError::Index(e.to_string()))?;
        }
        writer
            .commit()
            .map_err(|e| MatcherError::Index(e.to_string()))?;
        reader
            .reload()
            .map_err(|e| MatcherError::Index(e.to_string()))?;

        Ok(Self {
            index,
            reader,
            writer: RwLock::new(Some(writer)),
            id_field,
            text_field,
        })
    }

    fn build_tokenizer() -> TextAnalyzer {
        TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(RemoveLongFilter::limit(100))
            .filter(LowerCaser)
            .filter(Stemmer::new(Language::English))
            .build()
    }

    pub fn search(&self, text: &str, top_k: usize) -> Result<Vec<Tier2Hit>, MatcherError> {
        let searcher = self.reader.searcher();
        let query_parser = QueryParser::for_index(&self.index, vec![self.text_field]);
        let query = query_parser
            .parse_query(&escape_query(text))
            .map_err(|e| MatcherError::Search(e.to_string()))?;

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(top_k))
            .map_err(|e| MatcherError::Search(e.to_string()))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, addr) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(addr)
                .map_err(|e| MatcherError::Search(e.to_string()))?;
            let id = doc
                .get_first(self.id_field)
                .and_then(|v| match v {
                    OwnedValue::Str(s) => Some(s.clone()),
                    _ => None,
                })
                .unwrap_or_default();
            hits.push(Tier2Hit {
                scenario_id: ScenarioId::from(id.as_str()),
                score,
            });
        }
        Ok(hits)
    }

    #[cfg(test)]
    pub fn doc_count(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

/// Tantivy's query parser treats most punctuation as query syntax; normalized
/// turn text is free-form speech, not a query DSL, so strip the characters
/// that would otherwise throw a parse error.
fn escape_query(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect()
}

/// Rescales a raw BM25 score into `[0,1]` via a fixed saturation point,
/// rather than min-max over the result set -- a single strong match should
/// not need a runner-up to be "confident" against (spec §4.3 "Normalize
/// score to [0,1]").
pub fn normalize_score(raw: f32) -> f32 {
    const SATURATION: f32 = 8.0;
    (raw / SATURATION).min(1.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_core::{FollowUp, ReplyStrategy, ScenarioType, WeightedReply};

    fn scenario(id: &str, triggers: &[&str]) -> Scenario {
        Scenario {
            id: ScenarioId::from(id),
            scenario_type: ScenarioType::Faq,
            triggers: triggers.iter().map(|s| s.to_string()).collect(),
            negative_triggers: vec![],
            min_confidence: 0.6,
            reply_strategy: ReplyStrategy::QuickOnly,
            quick_replies: vec![WeightedReply { text: "ok".into(), weight: 1.0 }],
            full_replies: vec![],
            follow_up: FollowUp::default(),
            priority: 0,
            declaration_order: 0,
            audio_url: None,
        }
    }

    #[test]
    fn indexes_and_searches_scenario_triggers() {
        let scenarios = vec![
            scenario("billing", &["invoice question", "billing issue"]),
            scenario("scheduling", &["reschedule appointment", "change my booking"]),
        ];
        let index = Tier2Index::build(&scenarios).unwrap();
        assert_eq!(index.doc_count(), 2);

        let hits = index.search("i have a question about my invoice", 5).unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].scenario_id, ScenarioId::from("billing"));
    }

    #[test]
    fn empty_trigger_list_is_skipped() {
        let scenarios = vec![scenario("empty", &[])];
        let index = Tier2Index::build(&scenarios).unwrap();
        assert_eq!(index.doc_count(), 0);
    }

    #[test]
    fn normalize_score_saturates_at_one() {
        assert_eq!(normalize_score(100.0), 1.0);
        assert_eq!(normalize_score(0.0), 0.0);
    }
}
