use serde::Serialize;

/// Progress message type
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ProgressType {
    Start,
    Progress,
    Complete,
}

/// Aggregate progress of a batch run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Progress type (start, progress, complete)
    pub progress_type: ProgressType,
    /// Number of finished items, successful or not
    pub completed_tasks: usize,
    /// Number of items picked up by this run
    pub total_tasks: usize,
    /// Progress percentage (0-100)
    pub progress_percentage: usize,
    /// Current status message
    pub status: String,
    /// Name of the item that just finished
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    /// Error of the item that just finished
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Progress {
    /// Create a new Progress instance with basic information
    pub fn new(
        progress_type: ProgressType,
        completed_tasks: usize,
        total_tasks: usize,
        status: &str,
    ) -> Self {
        Self {
            progress_type,
            completed_tasks,
            total_tasks,
            progress_percentage: percentage(completed_tasks, total_tasks),
            status: status.to_string(),
            item_name: None,
            error: None,
        }
    }

    pub fn with_item(mut self, name: &str, error: Option<&str>) -> Self {
        self.item_name = Some(name.to_string());
        self.error = error.map(str::to_string);
        self
    }
}

/// Rounded integer percentage; 0 for an empty run.
pub fn percentage(completed: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    (completed * 100 + total / 2) / total
}
