//! Campaign phase tracking
//!
//! The phase is resolved from the date against a fixed calendar unless an
//! override is active. The override lives for the process lifetime until it
//! is cleared.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use shared::{component_info, CampaignPhase, Component};
use tokio::sync::RwLock;

use crate::traits::Clock;

fn calendar_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

/// Fixed campaign calendar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignCalendar {
    /// Publication date of the decree; its week gets the BOE-week tone
    pub boe_date: Option<NaiveDate>,
    pub apps_open: NaiveDate,
    pub final_push: NaiveDate,
    /// Last day applications are accepted
    pub deadline: NaiveDate,
    /// Phase used when a date matches no calendar entry
    pub fallback: CampaignPhase,
}

impl Default for CampaignCalendar {
    fn default() -> Self {
        Self {
            boe_date: None,
            apps_open: calendar_date(2026, 4, 1),
            final_push: calendar_date(2026, 6, 1),
            deadline: calendar_date(2026, 6, 30),
            fallback: CampaignPhase::FinalPush,
        }
    }
}

impl CampaignCalendar {
    pub fn with_boe_date(mut self, boe_date: Option<NaiveDate>) -> Self {
        self.boe_date = boe_date;
        self
    }

    /// Date ranges as `[start, end)` in priority order
    pub fn entries(&self) -> Vec<(NaiveDate, NaiveDate, CampaignPhase)> {
        let mut entries = Vec::with_capacity(4);
        if let Some(boe) = self.boe_date {
            entries.push((boe, boe + Duration::days(7), CampaignPhase::BoeWeek));
        }
        entries.push((NaiveDate::MIN, self.apps_open, CampaignPhase::PreBoe));
        entries.push((self.apps_open, self.final_push, CampaignPhase::AppsOpen));
        entries.push((self.final_push, self.deadline + Duration::days(1), CampaignPhase::FinalPush));
        entries
    }

    /// Phase for a date, ignoring any override
    pub fn resolve(&self, date: NaiveDate) -> CampaignPhase {
        self.entries()
            .into_iter()
            .find(|(start, end, _)| *start <= date && date < *end)
            .map(|(_, _, phase)| phase)
            .unwrap_or(self.fallback)
    }

    /// Whole days left until the deadline, zero once it has passed
    pub fn days_to_deadline(&self, date: NaiveDate) -> i64 {
        (self.deadline - date).num_days().max(0)
    }
}

/// Process-wide phase state
pub struct PhaseTracker {
    calendar: CampaignCalendar,
    clock: Arc<dyn Clock>,
    override_phase: RwLock<Option<CampaignPhase>>,
}

impl PhaseTracker {
    pub fn new(calendar: CampaignCalendar, clock: Arc<dyn Clock>) -> Self {
        Self {
            calendar,
            clock,
            override_phase: RwLock::new(None),
        }
    }

    pub fn calendar(&self) -> &CampaignCalendar {
        &self.calendar
    }

    /// Override if set, otherwise the calendar phase for today
    pub async fn current_phase(&self) -> CampaignPhase {
        match *self.override_phase.read().await {
            Some(phase) => phase,
            None => self.date_phase(),
        }
    }

    pub fn date_phase(&self) -> CampaignPhase {
        self.calendar.resolve(self.clock.now().date())
    }

    pub async fn override_phase(&self) -> Option<CampaignPhase> {
        *self.override_phase.read().await
    }

    pub async fn set_override(&self, phase: CampaignPhase) {
        *self.override_phase.write().await = Some(phase);
        component_info!(Component::Bot, "🎯 Phase override set to {}", phase);
    }

    pub async fn clear_override(&self) {
        *self.override_phase.write().await = None;
        component_info!(Component::Bot, "🎯 Phase override cleared, using calendar ({})", self.date_phase());
    }
}
