//! Task list, custom categories and user profile, written through to the
//! key-value table on every change.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::ai::TaskAnalyzer;
use crate::category::{same_category, CategorySet, OccupationType, ALL, PERSONAL};
use crate::error::{Result, ValidationError};
use crate::service::{ClassificationRequest, ClassificationService};
use crate::storage::Database;
use crate::task::Task;

const TODOS_KEY: &str = "todos";
const CUSTOM_CATEGORIES_KEY: &str = "customCategories";
const USER_NAME_KEY: &str = "userName";
const OCCUPATION_KEY: &str = "occupationType";
const ONBOARDED_KEY: &str = "isOnboarded";

/// Number of most recent tasks handed to the AI as categorization examples.
pub const RECENT_TASK_LIMIT: usize = 5;

/// Who the user is. Read by the classifier, never changed by it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub display_name: String,
    pub occupation: OccupationType,
    pub onboarded: bool,
}

/// In-memory view of the persisted state.
pub struct TaskStore {
    db: Database,
    tasks: Vec<Task>,
    categories: CategorySet,
    profile: UserProfile,
}

impl TaskStore {
    /// Open the store backed by the default database file.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or holds
    /// unreadable task data.
    pub fn open() -> Result<Self> {
        Self::load(Database::open()?)
    }

    /// Load state from `db`. Missing keys start empty.
    pub fn load(db: Database) -> Result<Self> {
        let tasks: Vec<Task> = db.get_json(TODOS_KEY)?.unwrap_or_default();
        let custom: Vec<String> = db.get_json(CUSTOM_CATEGORIES_KEY)?.unwrap_or_default();

        let occupation = match db.kv_get(OCCUPATION_KEY)? {
            Some(raw) => raw.parse::<OccupationType>().unwrap_or_else(|e: String| {
                warn!(error = %e, "ignoring stored occupation type");
                OccupationType::default()
            }),
            None => OccupationType::default(),
        };
        let profile = UserProfile {
            display_name: db.kv_get(USER_NAME_KEY)?.unwrap_or_default(),
            occupation,
            onboarded: db.kv_get(ONBOARDED_KEY)?.as_deref() == Some("true"),
        };

        Ok(Self {
            db,
            tasks,
            categories: CategorySet::new(occupation, custom),
            profile,
        })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn category_set(&self) -> &CategorySet {
        &self.categories
    }

    /// Every category for display: `all`, the built-ins, then customs.
    pub fn categories(&self) -> Vec<String> {
        self.categories.display_list()
    }

    /// The last few tasks, oldest first.
    pub fn recent_tasks(&self) -> &[Task] {
        let start = self.tasks.len().saturating_sub(RECENT_TASK_LIMIT);
        &self.tasks[start..]
    }

    /// Classify `text`, store it as a new task and return the task.
    ///
    /// Explicit `due_date`/`due_time` win over the suggested schedule.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyText`] for blank text, or a database
    /// error if the task list cannot be written.
    pub async fn add_task<A: TaskAnalyzer>(
        &mut self,
        text: &str,
        due_date: Option<NaiveDate>,
        due_time: Option<NaiveTime>,
        service: &ClassificationService<A>,
        now: NaiveDateTime,
    ) -> Result<Task> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyText.into());
        }

        let request = ClassificationRequest {
            raw_text: text,
            due_date,
            due_time,
            categories: &self.categories,
            recent_tasks: self.recent_tasks(),
            now,
        };
        let result = service.add_task_classification(&request).await;

        let task = Task {
            id: self.next_id(Utc::now().timestamp_millis()),
            text: result.cleaned_text,
            completed: false,
            category: result.category,
            due_date: result.suggested_date,
            due_time: result.suggested_time,
            priority: result.priority,
        };

        let mut tasks = self.tasks.clone();
        tasks.push(task.clone());
        self.commit_tasks(tasks)?;
        info!(id = %task.id, category = %task.category, source = ?result.source, "task added");
        Ok(task)
    }

    /// Flip a task's completion flag and return the updated task.
    pub fn toggle_task(&mut self, id: &str) -> Result<Task> {
        let index = self.position(id)?;
        let mut tasks = self.tasks.clone();
        tasks[index].completed = !tasks[index].completed;
        let task = tasks[index].clone();
        self.commit_tasks(tasks)?;
        Ok(task)
    }

    /// Remove a task and return it.
    pub fn delete_task(&mut self, id: &str) -> Result<Task> {
        let index = self.position(id)?;
        let mut tasks = self.tasks.clone();
        let task = tasks.remove(index);
        self.commit_tasks(tasks)?;
        Ok(task)
    }

    /// Tasks in `category`; `all` selects every task.
    pub fn tasks_in(&self, category: &str) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| same_category(category, ALL) || same_category(&t.category, category))
            .collect()
    }

    pub fn category_count(&self, category: &str) -> usize {
        self.tasks_in(category).len()
    }

    /// Add a custom category and return its stored name.
    pub fn add_category(&mut self, name: &str) -> Result<String> {
        let mut categories = self.categories.clone();
        let added = categories.add(name)?;
        self.db.set_json(CUSTOM_CATEGORIES_KEY, categories.custom())?;
        self.categories = categories;
        Ok(added)
    }

    /// Remove a custom category, moving its tasks to `personal`.
    /// Returns the number of tasks moved. The category list and the task
    /// list are written in one transaction.
    pub fn remove_category(&mut self, name: &str) -> Result<usize> {
        let mut categories = self.categories.clone();
        let removed = categories.remove(name)?;

        let mut tasks = self.tasks.clone();
        let mut moved = 0;
        for task in tasks.iter_mut().filter(|t| same_category(&t.category, &removed)) {
            task.category = PERSONAL.to_string();
            moved += 1;
        }

        self.db.kv_set_all(&[
            (
                CUSTOM_CATEGORIES_KEY,
                serde_json::to_string(categories.custom())?,
            ),
            (TODOS_KEY, serde_json::to_string(&tasks)?),
        ])?;
        self.categories = categories;
        self.tasks = tasks;
        info!(category = %removed, moved, "category removed");
        Ok(moved)
    }

    /// Record the user's name and occupation and mark onboarding complete.
    pub fn set_profile(&mut self, display_name: &str, occupation: OccupationType) -> Result<()> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "name".to_string(),
                message: "must not be empty".to_string(),
            }
            .into());
        }

        self.db.kv_set_all(&[
            (USER_NAME_KEY, display_name.to_string()),
            (OCCUPATION_KEY, occupation.as_str().to_string()),
            (ONBOARDED_KEY, "true".to_string()),
        ])?;

        self.profile = UserProfile {
            display_name: display_name.to_string(),
            occupation,
            onboarded: true,
        };
        self.categories.set_occupation(occupation);
        Ok(())
    }

    /// Millisecond timestamp id, bumped past the newest existing id so ids
    /// stay unique and creation-ordered.
    fn next_id(&self, now_ms: i64) -> String {
        let newest = self
            .tasks
            .iter()
            .filter_map(|t| t.id.parse::<i64>().ok())
            .max();
        match newest {
            Some(newest) if newest >= now_ms => (newest + 1).to_string(),
            _ => now_ms.to_string(),
        }
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| ValidationError::TaskNotFound(id.to_string()).into())
    }

    /// Persist `tasks`, then make them the in-memory list.
    fn commit_tasks(&mut self, tasks: Vec<Task>) -> Result<()> {
        self.db.set_json(TODOS_KEY, &tasks)?;
        self.tasks = tasks;
        Ok(())
    }
}
