//! Question pool: merging built-in and custom content, authoring, and
//! per-session selection.

mod seed;
mod store;

pub use seed::{builtin_questions, SEED_VERSION};
pub use store::{JsonFileStore, MemoryStore, QuestionStore, StoreError, StoredPool, STORAGE_KEY};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::collections::HashSet;

use crate::types::{
    Difficulty, Question, QuestionId, Region, SuggestedFix, ALL_CATEGORIES,
    QUESTIONS_PER_ROTATION,
};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PoolError {
    #[error("Not enough questions: {available} available, {required} required")]
    InsufficientQuestions { available: usize, required: usize },

    #[error("Question {0} already exists")]
    DuplicateId(QuestionId),

    #[error("Question {0} not found")]
    NotFound(QuestionId),

    #[error("Invalid question: {0}")]
    Invalid(String),
}

/// Tag carried by every question authored at runtime
pub const CUSTOM_TAG: &str = "Custom";

/// Merge built-in and custom questions, dropping any custom question whose id
/// is already taken. Built-ins come first, each list keeps its order.
pub fn build_pool(builtins: Vec<Question>, custom: Vec<Question>) -> Vec<Question> {
    let mut seen = HashSet::new();
    let mut pool = Vec::with_capacity(builtins.len() + custom.len());

    for q in builtins.into_iter().chain(custom) {
        if seen.insert(q.id.clone()) {
            pool.push(q);
        } else {
            tracing::debug!("Dropping duplicate question {}", q.id);
        }
    }
    pool
}

/// Number of questions a session needs so every team gets at least one full rotation
pub fn required_count(num_rounds: u32, team_count: usize) -> usize {
    (num_rounds as usize).max(team_count * QUESTIONS_PER_ROTATION as usize)
}

/// Turn a user-facing category choice into a filter (`None` = every category)
pub fn category_filter(category: &str) -> Option<&str> {
    let trimmed = category.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL_CATEGORIES) {
        None
    } else {
        Some(trimmed)
    }
}

/// Pick `count` questions for a session.
///
/// Filters by category and region, applies a uniform shuffle and truncates.
/// Fails without side effects when the filtered pool is too small.
pub fn select<R: Rng + ?Sized>(
    pool: &[Question],
    category: Option<&str>,
    region: Region,
    count: usize,
    rng: &mut R,
) -> Result<Vec<Question>, PoolError> {
    let mut candidates: Vec<Question> = pool
        .iter()
        .filter(|q| category.map_or(true, |c| q.category == c))
        .filter(|q| region.admits(q))
        .cloned()
        .collect();

    if candidates.len() < count {
        return Err(PoolError::InsufficientQuestions {
            available: candidates.len(),
            required: count,
        });
    }

    candidates.shuffle(rng);
    candidates.truncate(count);
    Ok(candidates)
}

/// Input for authoring a new question
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionDraft {
    #[serde(default)]
    pub category: Option<String>,
    pub difficulty: Difficulty,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub acceptable_answers: Vec<String>,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub region: Region,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub source_name: Option<String>,
}

impl QuestionDraft {
    pub fn into_question(self) -> Result<Question, PoolError> {
        let question = self.question.trim().to_string();
        let answer = self.answer.trim().to_string();
        if question.is_empty() {
            return Err(PoolError::Invalid("question text is required".to_string()));
        }
        if answer.is_empty() {
            return Err(PoolError::Invalid("answer is required".to_string()));
        }

        let category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "General".to_string());
        let region_tag = self.region.tag().unwrap_or("Global");

        Ok(Question {
            id: ulid::Ulid::new().to_string(),
            category,
            difficulty: self.difficulty,
            question,
            answer,
            acceptable_answers: self
                .acceptable_answers
                .into_iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
            explanation: self.explanation,
            tags: vec![CUSTOM_TAG.to_string(), region_tag.to_string()],
            source_url: self.source_url.filter(|s| !s.trim().is_empty()),
            source_name: self.source_name.filter(|s| !s.trim().is_empty()),
        })
    }
}

/// Partial update of a question; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionPatch {
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub question: Option<String>,
    pub answer: Option<String>,
    pub acceptable_answers: Option<Vec<String>>,
    pub explanation: Option<String>,
    pub tags: Option<Vec<String>>,
    pub source_url: Option<String>,
    pub source_name: Option<String>,
}

impl QuestionPatch {
    fn apply_to(self, q: &mut Question) {
        if let Some(category) = self.category {
            q.category = category;
        }
        if let Some(difficulty) = self.difficulty {
            q.difficulty = difficulty;
        }
        if let Some(question) = self.question {
            q.question = question;
        }
        if let Some(answer) = self.answer {
            q.answer = answer;
        }
        if let Some(acceptable) = self.acceptable_answers {
            q.acceptable_answers = acceptable;
        }
        if let Some(explanation) = self.explanation {
            q.explanation = explanation;
        }
        if let Some(tags) = self.tags {
            q.tags = tags;
        }
        if let Some(url) = self.source_url {
            q.source_url = Some(url);
        }
        if let Some(name) = self.source_name {
            q.source_name = Some(name);
        }
    }
}

impl From<&SuggestedFix> for QuestionPatch {
    fn from(fix: &SuggestedFix) -> Self {
        Self {
            question: fix.question.clone(),
            answer: fix.answer.clone(),
            explanation: fix.explanation.clone(),
            ..Default::default()
        }
    }
}

/// The merged set of questions available to sessions
#[derive(Debug, Clone, Default)]
pub struct QuestionPool {
    questions: Vec<Question>,
    categories: Vec<String>,
}

impl QuestionPool {
    pub fn new(questions: Vec<Question>) -> Self {
        let mut pool = Self {
            questions,
            categories: Vec::new(),
        };
        pool.refresh_categories();
        pool
    }

    pub fn from_sources(builtins: Vec<Question>, custom: Vec<Question>) -> Self {
        Self::new(build_pool(builtins, custom))
    }

    /// Load the pool from a store, rebuilding it when the stored copy was
    /// written for a different seed version. On a rebuild only custom
    /// questions are carried over; stored copies of built-ins are discarded.
    ///
    /// Unreadable stored data is an error and the store is not written.
    pub async fn load(
        store: &dyn QuestionStore,
        builtins: Vec<Question>,
    ) -> Result<Self, StoreError> {
        let pool = match store.load(STORAGE_KEY).await? {
            Some(stored) if stored.version == SEED_VERSION => {
                // Stored copy is authoritative (it may hold edited built-ins)
                Self::from_sources(stored.questions, builtins)
            }
            Some(stored) => {
                tracing::info!(
                    "Stored question pool is version {}, current is {}; rebuilding",
                    stored.version,
                    SEED_VERSION
                );
                let custom: Vec<Question> = stored
                    .questions
                    .into_iter()
                    .filter(|q| q.has_tag(CUSTOM_TAG))
                    .collect();
                let pool = Self::from_sources(builtins, custom);
                store.save(STORAGE_KEY, &pool.to_stored()).await?;
                pool
            }
            None => {
                let pool = Self::from_sources(builtins, Vec::new());
                store.save(STORAGE_KEY, &pool.to_stored()).await?;
                pool
            }
        };

        tracing::info!(
            "Question pool loaded: {} questions in {} categories",
            pool.questions.len(),
            pool.categories.len()
        );
        Ok(pool)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Sorted, de-duplicated category names
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn to_stored(&self) -> StoredPool {
        StoredPool {
            version: SEED_VERSION,
            questions: self.questions.clone(),
        }
    }

    /// Append a question. The caller persists afterwards.
    pub fn add(&mut self, question: Question) -> Result<(), PoolError> {
        if self.get(&question.id).is_some() {
            return Err(PoolError::DuplicateId(question.id));
        }
        tracing::info!("Added question {} ({})", question.id, question.category);
        self.questions.push(question);
        self.refresh_categories();
        Ok(())
    }

    /// Replace fields of an existing question in place. The caller persists afterwards.
    pub fn edit(&mut self, id: &str, patch: QuestionPatch) -> Result<Question, PoolError> {
        let slot = self
            .questions
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or_else(|| PoolError::NotFound(id.to_string()))?;

        let mut updated = slot.clone();
        patch.apply_to(&mut updated);
        if updated.question.trim().is_empty() || updated.answer.trim().is_empty() {
            return Err(PoolError::Invalid(
                "question text and answer cannot be empty".to_string(),
            ));
        }

        *slot = updated.clone();
        self.refresh_categories();
        tracing::info!("Edited question {}", id);
        Ok(updated)
    }

    /// Merge a fact-checker's suggested fix into a question
    pub fn apply_fix(&mut self, id: &str, fix: &SuggestedFix) -> Result<Question, PoolError> {
        self.edit(id, QuestionPatch::from(fix))
    }

    fn refresh_categories(&mut self) {
        let mut categories: Vec<String> = self
            .questions
            .iter()
            .map(|q| q.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        self.categories = categories;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn question(id: &str, category: &str, tags: &[&str]) -> Question {
        Question {
            id: id.to_string(),
            category: category.to_string(),
            difficulty: Difficulty::Easy,
            question: format!("Question {id}?"),
            answer: format!("Answer {id}"),
            acceptable_answers: Vec::new(),
            explanation: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            source_url: None,
            source_name: None,
        }
    }

    fn draft(question: &str, answer: &str) -> QuestionDraft {
        QuestionDraft {
            category: None,
            difficulty: Difficulty::Medium,
            question: question.to_string(),
            answer: answer.to_string(),
            acceptable_answers: Vec::new(),
            explanation: String::new(),
            region: Region::Mix,
            source_url: None,
            source_name: None,
        }
    }

    #[test]
    fn test_build_pool_prefers_builtin_on_collision() {
        let builtin = question("q1", "Science", &["Global"]);
        let mut stale = question("q1", "Science", &["Global"]);
        stale.answer = "Stale answer".to_string();
        let custom = question("c1", "Custom", &["Custom"]);

        let pool = build_pool(vec![builtin.clone()], vec![stale, custom.clone()]);

        assert_eq!(pool, vec![builtin, custom]);
    }

    #[test]
    fn test_required_count() {
        assert_eq!(required_count(5, 2), 8);
        assert_eq!(required_count(20, 2), 20);
        assert_eq!(required_count(0, 1), 4);
        assert_eq!(required_count(3, 0), 3);
    }

    #[test]
    fn test_category_filter() {
        assert_eq!(category_filter("All"), None);
        assert_eq!(category_filter("all"), None);
        assert_eq!(category_filter("  "), None);
        assert_eq!(category_filter(" Science "), Some("Science"));
    }

    #[test]
    fn test_select_filters_category() {
        let pool = vec![
            question("s1", "Science", &["Global"]),
            question("h1", "History", &["Global"]),
            question("s2", "Science", &["Global"]),
        ];
        let mut rng = StdRng::seed_from_u64(7);

        let selected = select(&pool, Some("Science"), Region::Mix, 2, &mut rng).unwrap();
        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|q| q.category == "Science"));
    }

    #[test]
    fn test_select_filters_region() {
        let pool = vec![
            question("g", "Geo", &["Global"]),
            question("us", "Geo", &["US"]),
            question("ca", "Geo", &["CA"]),
        ];
        let mut rng = StdRng::seed_from_u64(1);

        let selected = select(&pool, None, Region::Ca, 2, &mut rng).unwrap();
        let mut ids: Vec<_> = selected.iter().map(|q| q.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["ca", "g"]);

        let err = select(&pool, None, Region::Us, 3, &mut rng).unwrap_err();
        assert_eq!(
            err,
            PoolError::InsufficientQuestions {
                available: 2,
                required: 3
            }
        );
    }

    #[test]
    fn test_select_truncates() {
        let pool: Vec<_> = (0..10)
            .map(|i| question(&format!("q{i}"), "General", &["Global"]))
            .collect();
        let mut rng = StdRng::seed_from_u64(3);

        let selected = select(&pool, None, Region::Mix, 4, &mut rng).unwrap();
        assert_eq!(selected.len(), 4);
        let unique: HashSet<_> = selected.iter().map(|q| q.id.clone()).collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn test_select_insufficient() {
        let pool = vec![question("q1", "Science", &["Global"])];
        let mut rng = StdRng::seed_from_u64(0);
        let result = select(&pool, Some("History"), Region::Mix, 1, &mut rng);
        assert_eq!(
            result,
            Err(PoolError::InsufficientQuestions {
                available: 0,
                required: 1
            })
        );
    }

    #[test]
    fn test_select_shuffle_is_roughly_uniform() {
        // Every one of the 6 orderings of 3 items should show up about equally often
        let pool = vec![
            question("a", "General", &["Global"]),
            question("b", "General", &["Global"]),
            question("c", "General", &["Global"]),
        ];
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts: HashMap<String, usize> = HashMap::new();
        let trials = 6000;

        for _ in 0..trials {
            let order: String = select(&pool, None, Region::Mix, 3, &mut rng)
                .unwrap()
                .iter()
                .map(|q| q.id.as_str())
                .collect();
            *counts.entry(order).or_default() += 1;
        }

        assert_eq!(counts.len(), 6);
        for (order, count) in counts {
            assert!(
                (800..=1200).contains(&count),
                "ordering {order} appeared {count} times"
            );
        }
    }

    #[test]
    fn test_add_recomputes_categories() {
        let mut pool = QuestionPool::new(vec![question("q1", "Science", &["Global"])]);
        assert_eq!(pool.categories(), &["Science".to_string()]);

        let mut d = draft("What is 2+2?", "4");
        d.category = Some("Math".to_string());
        pool.add(d.into_question().unwrap()).unwrap();

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.categories(), &["Math".to_string(), "Science".to_string()]);
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let mut pool = QuestionPool::new(vec![question("q1", "Science", &["Global"])]);
        let result = pool.add(question("q1", "Other", &["Custom"]));
        assert_eq!(result, Err(PoolError::DuplicateId("q1".to_string())));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_draft_defaults() {
        let mut d = draft("  Who painted the Mona Lisa? ", " Leonardo da Vinci ");
        d.region = Region::Ca;
        d.acceptable_answers = vec!["da Vinci".to_string(), "  ".to_string()];
        d.source_url = Some("".to_string());

        let q = d.into_question().unwrap();
        assert_eq!(q.category, "General");
        assert_eq!(q.question, "Who painted the Mona Lisa?");
        assert_eq!(q.answer, "Leonardo da Vinci");
        assert_eq!(q.tags, vec!["Custom".to_string(), "CA".to_string()]);
        assert_eq!(q.acceptable_answers, vec!["da Vinci".to_string()]);
        assert!(q.source_url.is_none());
        assert!(!q.id.is_empty());
    }

    #[test]
    fn test_draft_requires_question_and_answer() {
        assert!(matches!(
            draft("", "x").into_question(),
            Err(PoolError::Invalid(_))
        ));
        assert!(matches!(
            draft("Why?", "   ").into_question(),
            Err(PoolError::Invalid(_))
        ));
    }

    #[test]
    fn test_edit_replaces_in_place() {
        let mut pool = QuestionPool::new(vec![
            question("q1", "Science", &["Global"]),
            question("q2", "History", &["Global"]),
        ]);

        let updated = pool
            .edit(
                "q1",
                QuestionPatch {
                    category: Some("Physics".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.category, "Physics");
        assert_eq!(pool.questions()[0].id, "q1");
        assert_eq!(pool.questions()[0].category, "Physics");
        assert_eq!(pool.categories(), &["History".to_string(), "Physics".to_string()]);
    }

    #[test]
    fn test_edit_unknown_id() {
        let mut pool = QuestionPool::default();
        let result = pool.edit("nope", QuestionPatch::default());
        assert_eq!(result, Err(PoolError::NotFound("nope".to_string())));
    }

    #[test]
    fn test_edit_rejects_blank_answer() {
        let mut pool = QuestionPool::new(vec![question("q1", "Science", &["Global"])]);
        let result = pool.edit(
            "q1",
            QuestionPatch {
                answer: Some(" ".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(PoolError::Invalid(_))));
        assert_eq!(pool.get("q1").unwrap().answer, "Answer q1");
    }

    #[test]
    fn test_apply_fix_keeps_absent_fields() {
        let mut pool = QuestionPool::new(vec![question("q1", "Science", &["Global"])]);
        let fix = SuggestedFix {
            question: None,
            answer: Some("Corrected".to_string()),
            explanation: None,
        };

        let updated = pool.apply_fix("q1", &fix).unwrap();
        assert_eq!(updated.answer, "Corrected");
        assert_eq!(updated.question, "Question q1?");
        assert_eq!(updated.explanation, "");
        assert_eq!(updated.category, "Science");
    }

    #[tokio::test]
    async fn test_load_fresh_store_saves_seed() {
        let store = MemoryStore::new();
        let builtins = vec![question("b1", "Science", &["Global"])];

        let pool = QuestionPool::load(&store, builtins.clone()).await.unwrap();

        assert_eq!(pool.questions(), builtins.as_slice());
        let stored = store.load(STORAGE_KEY).await.unwrap().unwrap();
        assert_eq!(stored.version, SEED_VERSION);
        assert_eq!(stored.questions, builtins);
    }

    #[tokio::test]
    async fn test_load_same_version_keeps_edits_and_adds_new_builtins() {
        let store = MemoryStore::new();
        let mut edited = question("b1", "Science", &["Global"]);
        edited.answer = "Edited".to_string();
        let custom = question("c1", "Custom", &["Custom"]);
        store
            .save(
                STORAGE_KEY,
                &StoredPool {
                    version: SEED_VERSION,
                    questions: vec![edited.clone(), custom.clone()],
                },
            )
            .await
            .unwrap();

        let builtins = vec![
            question("b1", "Science", &["Global"]),
            question("b2", "History", &["Global"]),
        ];
        let pool = QuestionPool::load(&store, builtins).await.unwrap();

        let ids: Vec<_> = pool.questions().iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "c1", "b2"]);
        assert_eq!(pool.get("b1").unwrap().answer, "Edited");
    }

    #[tokio::test]
    async fn test_load_version_mismatch_drops_stale_seed_copies() {
        let store = MemoryStore::new();
        let mut stale = question("b1", "Science", &["Global"]);
        stale.answer = "Stale".to_string();
        let custom = question("c1", "Custom", &["Custom"]);
        store
            .save(
                STORAGE_KEY,
                &StoredPool {
                    version: SEED_VERSION + 1,
                    questions: vec![stale, custom],
                },
            )
            .await
            .unwrap();

        let pool = QuestionPool::load(&store, vec![question("b1", "Science", &["Global"])])
            .await
            .unwrap();

        assert_eq!(pool.get("b1").unwrap().answer, "Answer b1");
        assert!(pool.get("c1").is_some());
        let stored = store.load(STORAGE_KEY).await.unwrap().unwrap();
        assert_eq!(stored.version, SEED_VERSION);
        assert_eq!(stored.questions.len(), 2);
    }

    #[tokio::test]
    async fn test_load_version_mismatch_drops_removed_builtins() {
        let store = MemoryStore::new();
        store
            .save(
                STORAGE_KEY,
                &StoredPool {
                    version: SEED_VERSION + 7,
                    questions: vec![
                        question("old-001", "Science", &["Global"]),
                        question("c1", "Custom", &["Custom", "Global"]),
                    ],
                },
            )
            .await
            .unwrap();

        let pool = QuestionPool::load(&store, vec![question("new-001", "Science", &["Global"])])
            .await
            .unwrap();

        let ids: Vec<_> = pool.questions().iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["new-001", "c1"]);
        let stored = store.load(STORAGE_KEY).await.unwrap().unwrap();
        assert!(stored.questions.iter().all(|q| q.id != "old-001"));
    }

    #[tokio::test]
    async fn test_load_corrupt_file_is_error_and_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(format!("{STORAGE_KEY}.json"));
        let damaged = r#"{"version": 1, "questions": [ {"id": "custom-1""#;
        std::fs::write(&path, damaged).unwrap();
        let store = JsonFileStore::new(dir.path());

        let result = QuestionPool::load(&store, vec![question("b1", "Science", &["Global"])]).await;

        assert!(matches!(result, Err(StoreError::Serde(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), damaged);
    }
}
