use std::time::Duration;

pub const CHAT_REQUESTS_TOTAL: &str = "athena_chat_requests_total";
pub const CHAT_REQUEST_SECONDS: &str = "athena_chat_request_seconds";

/// Outcome label attached to every chat request counter increment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestOutcome {
    Success,
    AuthMissing,
    HttpStatus,
    Network,
    Timeout,
    Decode,
}

impl RequestOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestOutcome::Success => "success",
            RequestOutcome::AuthMissing => "auth_missing",
            RequestOutcome::HttpStatus => "http_status",
            RequestOutcome::Network => "network",
            RequestOutcome::Timeout => "timeout",
            RequestOutcome::Decode => "decode",
        }
    }
}

pub fn record_request(outcome: RequestOutcome, elapsed: Option<Duration>) {
    metrics::counter!(CHAT_REQUESTS_TOTAL, "outcome" => outcome.as_str()).increment(1);
    if let Some(elapsed) = elapsed {
        metrics::histogram!(CHAT_REQUEST_SECONDS).record(elapsed.as_secs_f64());
    }
}
