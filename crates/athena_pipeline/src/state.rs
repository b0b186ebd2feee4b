use serde::Serialize;

use crate::prompts::SummaryKind;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub enum SummaryState {
    Pending,
    InProgress,
    Completed { text: String },
    Failed { message: String },
    Cancelled,
}

impl SummaryState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SummaryState::Completed { .. } | SummaryState::Failed { .. } | SummaryState::Cancelled
        )
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct SummaryStatus {
    pub id: String,
    pub kind: SummaryKind,
    pub state: SummaryState,
}
