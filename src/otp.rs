// One-time code handles and the client-side resend cooldown

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Handle for a backend-issued one-time code. The code itself is delivered
/// out of band and only ever compared by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpTicket {
    pub ticket_id: String,
    /// Masked delivery target, e.g. `+966*******21`.
    pub destination: String,
    pub expires_at: DateTime<Utc>,
    pub code_length: usize,
}

impl OtpTicket {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Blocks repeated code requests until a fixed interval has passed.
#[derive(Debug, Clone)]
pub struct ResendCooldown {
    interval: Duration,
    last_sent: Option<Instant>,
}

impl ResendCooldown {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_sent: None,
        }
    }

    /// Time left before another code may be requested; zero when allowed.
    pub fn remaining(&self) -> Duration {
        match self.last_sent {
            Some(sent) => self.interval.saturating_sub(sent.elapsed()),
            None => Duration::ZERO,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.remaining().is_zero()
    }

    pub fn start(&mut self) {
        self.last_sent = Some(Instant::now());
    }

    pub fn clear(&mut self) {
        self.last_sent = None;
    }
}

/// Keeps the first four and last two characters of a phone number or the
/// first character and domain of an email.
pub fn mask_destination(destination: &str) -> String {
    if let Some((local, domain)) = destination.split_once('@') {
        let first: String = local.chars().take(1).collect();
        return format!("{first}***@{domain}");
    }
    let chars: Vec<char> = destination.chars().collect();
    if chars.len() <= 6 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}{}{tail}", "*".repeat(chars.len() - 6))
}
