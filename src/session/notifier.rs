use std::time::{Duration, Instant};

use crate::options::DEFAULT_NOTICE_TTL;

/// Handle for the deferred clear scheduled by [`TransientNotifier::report`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoticeTicket(u64);

#[derive(Debug, Clone)]
struct Notice {
    message: String,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
    ticket: NoticeTicket,
}

/// Holds at most one validation message, cleared automatically after a TTL.
///
/// A new report replaces the visible message and cancels the pending clear
/// of the old one: an expiry for a superseded ticket is ignored.
#[derive(Debug, Clone)]
pub struct TransientNotifier {
    current: Option<Notice>,
    ttl: Duration,
    issued: u64,
}

impl Default for TransientNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTICE_TTL)
    }
}

impl TransientNotifier {
    pub fn new(ttl: Duration) -> Self {
        Self {
            current: None,
            ttl,
            issued: 0,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn report(&mut self, message: impl Into<String>) -> NoticeTicket {
        self.report_at(message, Instant::now())
    }

    /// Show `message` from `now` until `now + ttl`. An empty message clears.
    pub fn report_at(&mut self, message: impl Into<String>, now: Instant) -> NoticeTicket {
        self.issued += 1;
        let ticket = NoticeTicket(self.issued);
        let message = message.into();
        self.current = (!message.is_empty()).then(|| Notice {
            message,
            expires_at: now.checked_add(self.ttl),
            ticket,
        });
        ticket
    }

    /// Visible message, or `""` when there is none.
    pub fn message(&self) -> &str {
        self.current
            .as_ref()
            .map(|notice| notice.message.as_str())
            .unwrap_or("")
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.current.as_ref().and_then(|notice| notice.expires_at)
    }

    /// Ticket of the visible message, for a later [`expire`](Self::expire).
    pub fn ticket(&self) -> Option<NoticeTicket> {
        self.current.as_ref().map(|notice| notice.ticket)
    }

    /// Deferred clear for `ticket`. Returns false when the ticket was superseded.
    pub fn expire(&mut self, ticket: NoticeTicket) -> bool {
        match &self.current {
            Some(notice) if notice.ticket == ticket => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    /// Event-loop hook: drop the message once its deadline has passed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match &self.current {
            Some(Notice {
                expires_at: Some(deadline),
                ..
            }) if now >= *deadline => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
