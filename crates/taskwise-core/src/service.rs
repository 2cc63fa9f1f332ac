//! Classification service: single entry point for turning raw task text
//! into category, priority and due date/time.
//!
//! Two mutually exclusive paths:
//!
//! - **Fallback** (no analyzer configured): heuristic classifier, schedule
//!   estimator and identity cleaner over the raw text. Synchronous and
//!   infallible.
//! - **AI**: clean the text, then ask for category and schedule
//!   concurrently. Each sub-request is bounded by the timeout and falls
//!   back on its own to the local result when it fails.
//!
//! In both paths an explicit user date/time replaces the suggestion for
//! that field.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::ai::{normalize_category_reply, AiError, AiResult, CategoryContext, GroqClient, TaskAnalyzer};
use crate::category::CategorySet;
use crate::classifier::classify;
use crate::cleaner::{clean, normalize_cleaned};
use crate::estimator::{estimate, ScheduleSuggestion};
use crate::storage::AiConfig;
use crate::task::{hhmm, Priority, Task};

/// Default bound on a single AI request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Which path produced a result's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    /// Every AI sub-request succeeded.
    Ai,
    /// Nothing came from the AI (disabled or every sub-request failed).
    Fallback,
    /// Some fields came from the AI, some from the local heuristics.
    Mixed,
}

/// Input for one classification.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRequest<'a> {
    pub raw_text: &'a str,
    /// User-chosen due date; wins over any suggestion.
    pub due_date: Option<NaiveDate>,
    /// User-chosen due time; wins over any suggestion.
    pub due_time: Option<NaiveTime>,
    /// Known categories, including the user's occupation.
    pub categories: &'a CategorySet,
    pub recent_tasks: &'a [Task],
    /// Current local wall-clock time.
    pub now: NaiveDateTime,
}

/// Outcome of a classification, consumed immediately to build a [`Task`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub category: String,
    pub priority: Priority,
    pub suggested_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub suggested_time: NaiveTime,
    pub cleaned_text: String,
    pub source: ResultSource,
}

/// Stateless apart from its optional analyzer: categories, occupation and
/// recent tasks arrive with each request.
#[derive(Debug, Clone)]
pub struct ClassificationService<A = GroqClient> {
    analyzer: Option<A>,
    timeout: Duration,
}

impl ClassificationService<GroqClient> {
    /// Service using Groq when an API key is configured, local heuristics
    /// otherwise.
    pub fn from_config(config: &AiConfig) -> Self {
        Self::new(GroqClient::from_config(config), config.timeout())
    }

    /// Service that never calls out.
    pub fn offline() -> Self {
        Self::new(None, DEFAULT_TIMEOUT)
    }
}

impl<A: TaskAnalyzer> ClassificationService<A> {
    pub fn new(analyzer: Option<A>, timeout: Duration) -> Self {
        Self { analyzer, timeout }
    }

    pub fn with_analyzer(analyzer: A) -> Self {
        Self::new(Some(analyzer), DEFAULT_TIMEOUT)
    }

    pub fn is_ai_enabled(&self) -> bool {
        self.analyzer.is_some()
    }

    /// Classify a new task. Never fails: every AI problem degrades to the
    /// local heuristics.
    pub async fn add_task_classification(
        &self,
        request: &ClassificationRequest<'_>,
    ) -> ClassificationResult {
        match &self.analyzer {
            Some(analyzer) => self.classify_with_ai(analyzer, request).await,
            None => {
                debug!("no AI analyzer configured, using local heuristics");
                fallback_classification(request)
            }
        }
    }

    async fn classify_with_ai(
        &self,
        analyzer: &A,
        request: &ClassificationRequest<'_>,
    ) -> ClassificationResult {
        let raw = request.raw_text;
        let categories = request.categories;

        let cleaned = match self.bounded(analyzer.clean_text(raw)).await {
            Ok(text) => Some(normalize_cleaned(raw, &text)),
            Err(e) => {
                warn!(error = %e, "AI text cleaning failed, keeping raw text");
                None
            }
        };
        let text = cleaned.as_deref().unwrap_or(raw);

        let context = CategoryContext {
            categories,
            recent_tasks: request.recent_tasks,
        };
        let (category, schedule) = tokio::join!(
            self.bounded(analyzer.categorize(text, context)),
            self.bounded(analyzer.suggest_schedule(text, request.now)),
        );

        let category_from_ai = category.is_ok();
        let category = match category {
            Ok(reply) => validate_category(&reply, categories),
            Err(e) => {
                warn!(error = %e, "AI categorization failed, using keyword rules");
                classify(raw, categories.occupation(), categories.custom())
            }
        };

        let schedule_from_ai = schedule.is_ok();
        let schedule = schedule.unwrap_or_else(|e| {
            warn!(error = %e, "AI scheduling failed, using local estimate");
            estimate(raw, request.now)
        });

        let source = match (cleaned.is_some(), category_from_ai, schedule_from_ai) {
            (true, true, true) => ResultSource::Ai,
            (false, false, false) => ResultSource::Fallback,
            _ => ResultSource::Mixed,
        };

        let cleaned_text = cleaned.unwrap_or_else(|| clean(raw));
        build_result(request, category, schedule, cleaned_text, source)
    }

    async fn bounded<T>(&self, call: impl Future<Output = AiResult<T>>) -> AiResult<T> {
        tokio::time::timeout(self.timeout, call)
            .await
            .unwrap_or(Err(AiError::Timeout(self.timeout)))
    }
}

/// Local classification: keyword rules, estimator and identity cleaner over
/// the raw text.
pub fn fallback_classification(request: &ClassificationRequest<'_>) -> ClassificationResult {
    let categories = request.categories;
    let category = classify(request.raw_text, categories.occupation(), categories.custom());
    let schedule = estimate(request.raw_text, request.now);
    build_result(
        request,
        category,
        schedule,
        clean(request.raw_text),
        ResultSource::Fallback,
    )
}

/// Map an AI category reply onto a known category in canonical casing,
/// substituting the occupation default for anything unrecognized.
pub fn validate_category(reply: &str, categories: &CategorySet) -> String {
    let label = normalize_category_reply(reply);
    categories.resolve(&label).unwrap_or_else(|| {
        let default = categories.occupation().default_category();
        debug!(reply = %label, substitute = default, "AI returned an unknown category");
        default.to_string()
    })
}

fn build_result(
    request: &ClassificationRequest<'_>,
    category: String,
    schedule: ScheduleSuggestion,
    cleaned_text: String,
    source: ResultSource,
) -> ClassificationResult {
    ClassificationResult {
        category,
        priority: schedule.priority,
        suggested_date: request.due_date.unwrap_or(schedule.date),
        suggested_time: request.due_time.unwrap_or(schedule.time),
        cleaned_text,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::OccupationType;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted analyzer; `None` entries fail, `delay` stalls every call and
    /// `lookup_delay` stalls only the category and schedule calls.
    #[derive(Default)]
    struct ScriptedAnalyzer {
        cleaned: Option<String>,
        category: Option<String>,
        schedule: Option<ScheduleSuggestion>,
        delay: Option<Duration>,
        lookup_delay: Option<Duration>,
        calls: AtomicUsize,
        seen_text: Mutex<Vec<String>>,
    }

    impl ScriptedAnalyzer {
        async fn respond<T: Clone>(
            &self,
            text: &str,
            value: &Option<T>,
            extra_delay: Option<Duration>,
        ) -> AiResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_text.lock().unwrap().push(text.to_string());
            if let Some(delay) = self.delay.or(extra_delay) {
                tokio::time::sleep(delay).await;
            }
            value
                .clone()
                .ok_or_else(|| AiError::Parse("scripted failure".into()))
        }
    }

    impl TaskAnalyzer for ScriptedAnalyzer {
        async fn clean_text(&self, text: &str) -> AiResult<String> {
            self.respond(text, &self.cleaned, None).await
        }

        async fn categorize(&self, text: &str, _context: CategoryContext<'_>) -> AiResult<String> {
            self.respond(text, &self.category, self.lookup_delay).await
        }

        async fn suggest_schedule(
            &self,
            text: &str,
            _now: NaiveDateTime,
        ) -> AiResult<ScheduleSuggestion> {
            self.respond(text, &self.schedule, self.lookup_delay).await
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn request<'a>(text: &'a str, categories: &'a CategorySet) -> ClassificationRequest<'a> {
        ClassificationRequest {
            raw_text: text,
            due_date: None,
            due_time: None,
            categories,
            recent_tasks: &[],
            now: now(),
        }
    }

    fn ai_schedule() -> ScheduleSuggestion {
        ScheduleSuggestion {
            priority: Priority::Low,
            date: date(2024, 1, 3),
            time: hm(9, 30),
        }
    }

    #[tokio::test]
    async fn offline_service_uses_local_rules() {
        let categories = CategorySet::new(OccupationType::Work, vec![]);
        let result = ClassificationService::offline()
            .add_task_classification(&request("Submit report in 3 hours asap", &categories))
            .await;

        assert_eq!(result.category, "personal");
        assert_eq!(result.priority, Priority::High);
        assert_eq!(result.suggested_date, date(2024, 1, 1));
        assert_eq!(result.suggested_time, hm(13, 0));
        assert_eq!(result.cleaned_text, "Submit report in 3 hours asap");
        assert_eq!(result.source, ResultSource::Fallback);
    }

    #[tokio::test]
    async fn explicit_date_and_time_override_suggestions() {
        let categories = CategorySet::default();
        let mut req = request("call the bank now", &categories);
        req.due_date = Some(date(2024, 6, 30));
        req.due_time = Some(hm(7, 45));

        let result = ClassificationService::offline().add_task_classification(&req).await;
        assert_eq!(result.suggested_date, date(2024, 6, 30));
        assert_eq!(result.suggested_time, hm(7, 45));
        assert_eq!(result.priority, Priority::High);
    }

    #[tokio::test]
    async fn only_missing_fields_are_filled() {
        let categories = CategorySet::default();
        let mut req = request("water plants", &categories);
        req.due_date = Some(date(2024, 6, 30));

        let result = ClassificationService::offline().add_task_classification(&req).await;
        assert_eq!(result.suggested_date, date(2024, 6, 30));
        assert_eq!(result.suggested_time, hm(12, 0));
    }

    #[tokio::test]
    async fn ai_results_are_used_when_every_call_succeeds() {
        let analyzer = ScriptedAnalyzer {
            cleaned: Some("Submit report".into()),
            category: Some("Work".into()),
            schedule: Some(ai_schedule()),
            ..Default::default()
        };
        let categories = CategorySet::new(OccupationType::Work, vec![]);
        let service = ClassificationService::with_analyzer(analyzer);

        let result = service
            .add_task_classification(&request("Submit report in 3 hours", &categories))
            .await;

        assert_eq!(result.cleaned_text, "Submit report");
        assert_eq!(result.category, "work");
        assert_eq!(result.priority, Priority::Low);
        assert_eq!(result.suggested_date, date(2024, 1, 3));
        assert_eq!(result.suggested_time, hm(9, 30));
        assert_eq!(result.source, ResultSource::Ai);

        let analyzer = service.analyzer.as_ref().unwrap();
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 3);
        // category and schedule see the cleaned text
        let seen = analyzer.seen_text.lock().unwrap();
        assert_eq!(seen[0], "Submit report in 3 hours");
        assert!(seen[1..].iter().all(|t| t == "Submit report"));
    }

    #[tokio::test]
    async fn failed_schedule_falls_back_independently() {
        let analyzer = ScriptedAnalyzer {
            cleaned: Some("Submit report".into()),
            category: Some("health".into()),
            schedule: None,
            ..Default::default()
        };
        let categories = CategorySet::new(OccupationType::Work, vec![]);
        let result = ClassificationService::with_analyzer(analyzer)
            .add_task_classification(&request("Submit report in 3 hours", &categories))
            .await;

        assert_eq!(result.category, "health");
        // estimated from the raw text, which still has the timing phrase
        assert_eq!(result.suggested_time, hm(13, 0));
        assert_eq!(result.priority, Priority::Medium);
        assert_eq!(result.source, ResultSource::Mixed);
    }

    #[tokio::test]
    async fn failed_category_falls_back_to_keyword_rules() {
        let analyzer = ScriptedAnalyzer {
            cleaned: None,
            category: None,
            schedule: Some(ai_schedule()),
            ..Default::default()
        };
        let categories = CategorySet::new(OccupationType::Work, vec![]);
        let result = ClassificationService::with_analyzer(analyzer)
            .add_task_classification(&request("go for a run", &categories))
            .await;

        assert_eq!(result.category, "health");
        assert_eq!(result.cleaned_text, "go for a run");
        assert_eq!(result.suggested_date, date(2024, 1, 3));
        assert_eq!(result.source, ResultSource::Mixed);
    }

    #[tokio::test]
    async fn every_call_failing_matches_the_offline_result() {
        let categories = CategorySet::new(OccupationType::School, vec!["Garden".into()]);
        let req = request("weed the garden whenever", &categories);

        let ai = ClassificationService::with_analyzer(ScriptedAnalyzer::default())
            .add_task_classification(&req)
            .await;
        let offline = fallback_classification(&req);

        assert_eq!(ai, offline);
        assert_eq!(ai.category, "Garden");
        assert_eq!(ai.priority, Priority::Low);
    }

    #[tokio::test]
    async fn unknown_ai_category_becomes_occupation_default() {
        let analyzer = ScriptedAnalyzer {
            cleaned: Some("Read a novel".into()),
            category: Some("education".into()),
            schedule: Some(ai_schedule()),
            ..Default::default()
        };
        let categories = CategorySet::new(OccupationType::School, vec![]);
        let result = ClassificationService::with_analyzer(analyzer)
            .add_task_classification(&request("Read a novel", &categories))
            .await;

        assert_eq!(result.category, "school");
        assert_eq!(result.source, ResultSource::Ai);
    }

    #[tokio::test]
    async fn ai_category_uses_stored_custom_casing() {
        let analyzer = ScriptedAnalyzer {
            cleaned: Some("practice scales".into()),
            category: Some("\"band practice\".".into()),
            schedule: Some(ai_schedule()),
            ..Default::default()
        };
        let categories = CategorySet::new(OccupationType::Work, vec!["Band Practice".into()]);
        let result = ClassificationService::with_analyzer(analyzer)
            .add_task_classification(&request("practice scales", &categories))
            .await;

        assert_eq!(result.category, "Band Practice");
    }

    #[tokio::test]
    async fn empty_cleaned_text_keeps_raw_text() {
        let analyzer = ScriptedAnalyzer {
            cleaned: Some("   ".into()),
            category: Some("personal".into()),
            schedule: Some(ai_schedule()),
            ..Default::default()
        };
        let categories = CategorySet::default();
        let result = ClassificationService::with_analyzer(analyzer)
            .add_task_classification(&request("call mom asap", &categories))
            .await;

        assert_eq!(result.cleaned_text, "call mom asap");
    }

    #[tokio::test]
    async fn slow_analyzer_times_out_into_fallback() {
        let analyzer = ScriptedAnalyzer {
            cleaned: Some("buy milk".into()),
            category: Some("health".into()),
            schedule: Some(ai_schedule()),
            delay: Some(Duration::from_secs(30)),
            ..Default::default()
        };
        let categories = CategorySet::new(OccupationType::Work, vec![]);
        let service = ClassificationService::new(Some(analyzer), Duration::from_millis(20));

        let started = std::time::Instant::now();
        let result = service
            .add_task_classification(&request("buy milk", &categories))
            .await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(result.category, "shopping");
        assert_eq!(result.suggested_time, hm(12, 0));
        assert_eq!(result.source, ResultSource::Fallback);
    }

    #[tokio::test(start_paused = true)]
    async fn category_and_schedule_requests_overlap() {
        let lookup = Duration::from_secs(4);
        let analyzer = ScriptedAnalyzer {
            cleaned: Some("Submit report".into()),
            category: Some("work".into()),
            schedule: Some(ai_schedule()),
            lookup_delay: Some(lookup),
            ..Default::default()
        };
        let categories = CategorySet::new(OccupationType::Work, vec![]);
        let service = ClassificationService::new(Some(analyzer), Duration::from_secs(60));

        let started = tokio::time::Instant::now();
        let result = service
            .add_task_classification(&request("Submit report", &categories))
            .await;
        let elapsed = started.elapsed();

        assert_eq!(result.source, ResultSource::Ai);
        assert!(elapsed >= lookup, "{elapsed:?}");
        // one round trip, not two
        assert!(elapsed < lookup * 2, "{elapsed:?}");
    }

    #[test]
    fn validate_category_rejects_virtual_all() {
        let categories = CategorySet::new(OccupationType::Work, vec![]);
        assert_eq!(validate_category("All", &categories), "work");
        assert_eq!(validate_category("", &categories), "work");
        assert_eq!(validate_category("SHOPPING", &categories), "shopping");
    }

    #[test]
    fn from_config_without_key_is_offline() {
        if std::env::var(crate::storage::API_KEY_ENV).is_ok() {
            return;
        }
        let service = ClassificationService::from_config(&AiConfig::default());
        assert!(!service.is_ai_enabled());
        assert!(ClassificationService::from_config(&AiConfig {
            api_key: "gsk_test".into(),
            ..AiConfig::default()
        })
        .is_ai_enabled());
    }

    #[test]
    fn result_serializes_in_camel_case() {
        let categories = CategorySet::default();
        let result = fallback_classification(&request("water plants", &categories));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["suggestedDate"], "2024-01-01");
        assert_eq!(json["suggestedTime"], "12:00");
        assert_eq!(json["cleanedText"], "water plants");
        assert_eq!(json["source"], "fallback");
    }
}
