//! Prompt templates for the task analyzer.

use chrono::NaiveDateTime;

use super::CategoryContext;

/// Number of recent tasks offered to the model as examples.
const MAX_EXAMPLES: usize = 5;

pub fn clean_prompt(text: &str) -> String {
    format!(
        "Rewrite this task without any scheduling words (times, dates, durations, \
         urgency such as \"asap\" or \"in 3 hours\"). Keep everything else as written.\n\n\
         Task: \"{text}\"\n\n\
         Respond with ONLY the rewritten task text."
    )
}

pub fn category_prompt(text: &str, context: CategoryContext<'_>) -> String {
    let occupation = context.categories.occupation();
    let allowed = context
        .categories
        .display_list()
        .into_iter()
        .skip(1) // "all" is not assignable
        .collect::<Vec<_>>()
        .join(", ");

    let examples = context
        .recent_tasks
        .iter()
        .rev()
        .take(MAX_EXAMPLES)
        .map(|t| format!("- \"{}\" -> {}", t.text, t.category))
        .collect::<Vec<_>>();

    let mut prompt = format!(
        "Categorize this task for a user whose main occupation is {occupation}.\n\
         Choose exactly one of these categories: {allowed}.\n"
    );
    if !examples.is_empty() {
        prompt.push_str("Recently categorized tasks:\n");
        prompt.push_str(&examples.join("\n"));
        prompt.push('\n');
    }
    prompt.push_str(&format!(
        "\nTask: \"{text}\"\n\nRespond with ONLY the category name, no other text."
    ));
    prompt
}

pub fn schedule_prompt(text: &str, now: NaiveDateTime) -> String {
    format!(
        "The current local date and time is {}.\n\
         Estimate the priority and due date/time of this task.\n\n\
         Task: \"{text}\"\n\n\
         Respond with ONLY a JSON object of the form \
         {{\"priority\": \"high|medium|low\", \"suggestedDate\": \"YYYY-MM-DD\", \"suggestedTime\": \"HH:MM\"}}.",
        now.format("%Y-%m-%d %H:%M")
    )
}
