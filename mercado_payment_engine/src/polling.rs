//! The client-side order-status polling state machine.
//!
//! After the buyer returns from hosted checkout, the storefront polls order-by-id until it can decide between the
//! success and failure screens. The webhook and the buyer's return race each other, so two different patience
//! thresholds apply: "order not found" is the normal state before the webhook lands, but if it persists the payment
//! was almost certainly rejected (a rejected payment never creates the order), so not-found gives up after a short
//! run of consecutive misses while "found but still pending" is given the full attempt budget.
//!
//! This module does no IO. Callers fetch the order however they like and feed observations in; see `mpgtools` for
//! the loop that drives it over HTTP.
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;
pub const DEFAULT_NOT_FOUND_LIMIT: u32 = 6;

#[derive(Debug, Clone, Copy)]
pub struct PollerPolicy {
    /// Delay between polls.
    pub interval: Duration,
    /// Total attempt budget (60 × 5 s ≈ 5 minutes).
    pub max_attempts: u32,
    /// Consecutive not-found responses before assuming the payment failed (6 × 5 s ≈ 30 seconds).
    pub not_found_limit: u32,
}

impl Default for PollerPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            not_found_limit: DEFAULT_NOT_FOUND_LIMIT,
        }
    }
}

/// Terminal classification of a reported status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Paid / shipped / completed, in any of the spellings the backends have used.
    Success,
    /// Rejected, cancelled, refunded, charged back or disputed.
    Failure,
    /// Still waiting on the provider.
    Pending,
    /// Unrecognised. Treated as still-pending rather than guessed at.
    Unknown,
}

/// Normalises a status string, tolerating provider-equivalent synonyms and legacy Spanish spellings.
pub fn classify_status(status: &str) -> StatusClass {
    match status.to_lowercase().as_str() {
        "paid" | "pagado" | "approved" | "completed" | "completado" | "shipped" | "enviado" => StatusClass::Success,
        "rejected" | "cancelled" | "refunded" | "chargedback" | "charged_back" | "indispute" | "in_mediation" => {
            StatusClass::Failure
        },
        "pending" | "pendiente" | "in_process" => StatusClass::Pending,
        _ => StatusClass::Unknown,
    }
}

/// What the caller should do after an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollVerdict {
    /// Keep polling after [`PollerPolicy::interval`].
    Continue,
    /// Terminal success; proceed to the success UI.
    Success,
    /// Terminal failure; proceed to the failure UI.
    Failure,
    /// The attempt budget ran out without a terminal status. Present "unresolved, check back later" — asserting
    /// either success or failure here would be a guess.
    Unresolved,
}

#[derive(Debug, Clone)]
pub struct StatusPoller {
    policy: PollerPolicy,
    attempts: u32,
    consecutive_not_found: u32,
}

impl StatusPoller {
    pub fn new(policy: PollerPolicy) -> Self {
        Self { policy, attempts: 0, consecutive_not_found: 0 }
    }

    pub fn policy(&self) -> &PollerPolicy {
        &self.policy
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Records a 404 from the order read. Not an error; it is the expected state before the webhook has landed.
    pub fn observe_not_found(&mut self) -> PollVerdict {
        self.attempts += 1;
        self.consecutive_not_found += 1;
        if self.consecutive_not_found >= self.policy.not_found_limit {
            return PollVerdict::Failure;
        }
        self.budget_verdict()
    }

    /// Records a successful order read with the given status.
    pub fn observe_status(&mut self, status: &str) -> PollVerdict {
        self.attempts += 1;
        self.consecutive_not_found = 0;
        match classify_status(status) {
            StatusClass::Success => PollVerdict::Success,
            StatusClass::Failure => PollVerdict::Failure,
            StatusClass::Pending | StatusClass::Unknown => self.budget_verdict(),
        }
    }

    fn budget_verdict(&self) -> PollVerdict {
        if self.attempts >= self.policy.max_attempts {
            PollVerdict::Unresolved
        } else {
            PollVerdict::Continue
        }
    }
}
