//! # Taskwise Core Library
//!
//! Business logic for the Taskwise task manager. Every operation is
//! available through the standalone `taskwise` CLI, which is a thin layer
//! over this crate.
//!
//! ## Architecture
//!
//! - **Classification**: a single service that asks a language model for
//!   category, priority and due date/time, and falls back field by field to
//!   local keyword rules when the model is unavailable or fails
//! - **Storage**: SQLite key-value state and TOML-based configuration
//! - **Store**: the task list, custom categories and user profile
//!
//! ## Key Components
//!
//! - [`ClassificationService`]: entry point for classifying new tasks
//! - [`TaskAnalyzer`]: trait for language-model backends, see [`GroqClient`]
//! - [`TaskStore`]: persisted tasks, categories and profile
//! - [`Config`]: application configuration management

pub mod ai;
pub mod category;
pub mod classifier;
pub mod cleaner;
pub mod error;
pub mod estimator;
pub mod service;
pub mod storage;
pub mod store;
pub mod task;

pub use ai::{AiError, GroqClient, TaskAnalyzer};
pub use category::{CategorySet, OccupationType};
pub use classifier::classify;
pub use error::{CategoryError, ConfigError, CoreError, DatabaseError, ValidationError};
pub use estimator::{estimate, ScheduleSuggestion};
pub use service::{ClassificationRequest, ClassificationResult, ClassificationService, ResultSource};
pub use storage::{Config, Database};
pub use store::{TaskStore, UserProfile};
pub use task::{Priority, Task};
