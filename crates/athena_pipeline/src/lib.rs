//! Aggregates health, workout and calendar data from device-local stores into
//! snapshots, renders them into prompts and turns those into summaries through
//! a chat-completion client.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod export;
pub mod notifications;
pub mod prompts;
pub mod services;
pub mod sources;
pub mod state;
pub mod store;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_utils;

pub use aggregator::{Aggregator, AggregatorState, FetchPhase};
pub use config::{DayOrder, PipelineConfig};
pub use error::{PipelineError, PipelineResult, SourceError};
pub use export::ExportStore;
pub use prompts::{PromptBuilder, SummaryKind};
pub use services::SummaryService;
pub use state::{SummaryState, SummaryStatus};
pub use store::{CalendarStore, HealthStore, NotificationCenter};
pub use types::{MetricKind, Snapshot};
pub use utils::{Clock, FixedClock, SystemClock};
