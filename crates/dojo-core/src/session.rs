//! The timed practice session.
//!
//! One `ExamSession` exists per server process and is shared by handlers via
//! `Arc`. The timer and the flagged-question set sit behind a single mutex so
//! every start/stop/status/flag operation observes one serialized order.
//!
//! There is no background ticker: expiry is noticed by the next `status()`
//! read, which moves the timer back to `Idle` itself.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::SessionError;
use crate::model::{ExamConfig, DEFAULT_DURATION_MINUTES, DEFAULT_WARNING_MINUTES};

/// Remaining time at or below which the timer turns red.
const DANGER_SECS: u64 = 5 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
}

/// How close the running exam is to its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Normal,
    /// Within the exam's configured warning time.
    Warning,
    /// Five minutes or less.
    Danger,
}

#[derive(Debug, Clone)]
struct TimerState {
    phase: TimerPhase,
    /// Monotonic start, used for all countdown arithmetic.
    started: Option<Instant>,
    /// Wall-clock start, for display only.
    started_at: Option<DateTime<Utc>>,
    session_id: Option<Uuid>,
    duration_minutes: u32,
    warning_minutes: u32,
    exam_id: Option<String>,
    exam_name: Option<String>,
    start_question: u32,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            phase: TimerPhase::Idle,
            started: None,
            started_at: None,
            session_id: None,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            warning_minutes: DEFAULT_WARNING_MINUTES,
            exam_id: None,
            exam_name: None,
            start_question: 1,
        }
    }
}

impl TimerState {
    fn total(&self) -> Duration {
        Duration::from_secs(u64::from(self.duration_minutes) * 60)
    }

    fn elapsed(&self, now: Instant) -> Option<Duration> {
        self.started.map(|s| now.saturating_duration_since(s))
    }

    fn snapshot(&mut self, now: Instant) -> TimerSnapshot {
        let total = self.total();
        let (elapsed, remaining) = match (self.phase, self.elapsed(now)) {
            (TimerPhase::Running, Some(elapsed)) => {
                let remaining = total.saturating_sub(elapsed);
                if remaining.is_zero() {
                    tracing::info!(
                        exam_id = self.exam_id.as_deref().unwrap_or("-"),
                        "exam time is up"
                    );
                    self.phase = TimerPhase::Idle;
                }
                (elapsed, remaining)
            }
            _ => (Duration::ZERO, Duration::ZERO),
        };

        let running = self.phase == TimerPhase::Running;
        let remaining_seconds = remaining.as_secs();
        let urgency = if !running {
            Urgency::Normal
        } else if remaining_seconds <= DANGER_SECS {
            Urgency::Danger
        } else if remaining_seconds <= u64::from(self.warning_minutes) * 60 {
            Urgency::Warning
        } else {
            Urgency::Normal
        };

        TimerSnapshot {
            running,
            remaining_seconds,
            elapsed_seconds: elapsed.as_secs(),
            total_seconds: total.as_secs(),
            exam_id: self.exam_id.clone(),
            exam_name: self.exam_name.clone(),
            start_question: self.start_question,
            urgency,
            session_id: self.session_id,
            started_at: self.started_at,
        }
    }
}

/// Point-in-time view of the timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub running: bool,
    pub remaining_seconds: u64,
    pub elapsed_seconds: u64,
    pub total_seconds: u64,
    pub exam_id: Option<String>,
    pub exam_name: Option<String>,
    pub start_question: u32,
    pub urgency: Urgency,
    pub session_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
}

/// What `stop()` leaves behind for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoppedSession {
    /// Whether the timer was still running when stopped.
    pub was_running: bool,
    pub exam_id: Option<String>,
    /// Time since the session started, if one ever did.
    pub elapsed: Option<Duration>,
}

#[derive(Debug, Default)]
struct SessionInner {
    timer: TimerState,
    flags: BTreeSet<String>,
}

/// Timer plus flagged questions for the single active practice session.
#[derive(Debug, Default)]
pub struct ExamSession {
    inner: Mutex<SessionInner>,
}

impl ExamSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        // The state is plain data; a panic elsewhere cannot leave it half-updated.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a session for `config`, replacing any previous one and clearing flags.
    ///
    /// A running session is overwritten rather than rejected (last writer wins).
    pub fn start(&self, config: &ExamConfig, start_question: u32) -> TimerSnapshot {
        let mut inner = self.lock();
        let now = Instant::now();

        if inner.timer.phase == TimerPhase::Running {
            tracing::warn!(
                previous = inner.timer.exam_id.as_deref().unwrap_or("-"),
                next = %config.exam_id,
                "replacing a running exam session"
            );
        }

        inner.timer = TimerState {
            phase: TimerPhase::Running,
            started: Some(now),
            started_at: Some(Utc::now()),
            session_id: Some(Uuid::new_v4()),
            duration_minutes: config.duration_minutes,
            warning_minutes: config.warning_minutes,
            exam_id: Some(config.exam_id.clone()),
            exam_name: Some(config.exam_name.clone()),
            start_question: start_question.max(1),
        };
        inner.flags.clear();

        tracing::info!(
            exam_id = %config.exam_id,
            duration_minutes = config.duration_minutes,
            start_question = inner.timer.start_question,
            "exam session started"
        );

        inner.timer.snapshot(now)
    }

    /// Stop the timer. The start instant and exam id stay readable.
    pub fn stop(&self) -> StoppedSession {
        let mut inner = self.lock();
        let timer = &mut inner.timer;
        let was_running = timer.phase == TimerPhase::Running;
        timer.phase = TimerPhase::Idle;
        if was_running {
            tracing::info!(
                exam_id = timer.exam_id.as_deref().unwrap_or("-"),
                "exam session stopped"
            );
        }

        StoppedSession {
            was_running,
            exam_id: timer.exam_id.clone(),
            elapsed: timer.elapsed(Instant::now()),
        }
    }

    /// Current timer state. Detects expiry and stops the timer when time is up.
    pub fn status(&self) -> TimerSnapshot {
        self.lock().timer.snapshot(Instant::now())
    }

    /// Flag or unflag a question. Returns whether it is flagged afterwards.
    pub fn toggle_flag(&self, question_id: &str) -> Result<bool, SessionError> {
        let question_id = question_id.trim();
        if question_id.is_empty() {
            return Err(SessionError::MissingQuestionId);
        }

        let mut inner = self.lock();
        if inner.flags.remove(question_id) {
            Ok(false)
        } else {
            inner.flags.insert(question_id.to_string());
            Ok(true)
        }
    }

    /// Flagged question ids, sorted.
    pub fn flags(&self) -> Vec<String> {
        self.lock().flags.iter().cloned().collect()
    }
}

/// `M:SS`, minutes unbounded.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}
