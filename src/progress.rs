use crate::calculations::durations::days_for_pages;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Allowed gap between the elapsed-time fraction and the completed-page fraction.
pub const DEFAULT_PROGRESS_TOLERANCE: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TalentProgressStatus {
    Complete,
    OnTime,
    AtRisk,
    Behind,
}

/// Page progress of one talent on one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageProgress {
    pub total_pages: i64,
    pub completed_pages: i64,
    pub pages_per_week: i64,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
}

/// Step progress as a whole percentage, clamped to 0..=100.
pub fn progress_percent(completed_pages: i64, total_pages: i64) -> i32 {
    if total_pages <= 0 {
        return 0;
    }
    let completed = i128::from(completed_pages.clamp(0, total_pages));
    let pct = completed * 100 / i128::from(total_pages);
    pct as i32
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressClassifier {
    tolerance: f64,
}

impl Default for ProgressClassifier {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_PROGRESS_TOLERANCE,
        }
    }
}

impl ProgressClassifier {
    pub fn new(tolerance: f64) -> Self {
        let tolerance = if tolerance.is_finite() {
            tolerance.clamp(0.0, 1.0)
        } else {
            DEFAULT_PROGRESS_TOLERANCE
        };
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Rules, first match wins:
    /// 1. every page done: `Complete`
    /// 2. stage not started yet: `OnTime`
    /// 3. remaining pages at the role's weekly rate need more days than remain until
    ///    the due date (the due day counts): `Behind`
    /// 4. completed fraction trails the elapsed fraction by more than the tolerance: `AtRisk`
    /// 5. otherwise `OnTime`
    pub fn classify(&self, progress: &StageProgress, today: NaiveDate) -> TalentProgressStatus {
        let total = progress.total_pages.max(0);
        let completed = progress.completed_pages.clamp(0, total);
        if completed >= total {
            return TalentProgressStatus::Complete;
        }
        if today < progress.start_date {
            return TalentProgressStatus::OnTime;
        }

        let remaining = total - completed;
        let days_needed = days_for_pages(remaining, progress.pages_per_week);
        let days_left = (progress.due_date - today).num_days() + 1;
        if days_left <= 0 || days_needed > days_left {
            return TalentProgressStatus::Behind;
        }

        let window = (progress.due_date - progress.start_date).num_days();
        let expected = if window <= 0 {
            1.0
        } else {
            let elapsed = (today - progress.start_date).num_days();
            (elapsed as f64 / window as f64).clamp(0.0, 1.0)
        };
        let actual = completed as f64 / total as f64;

        if actual + self.tolerance < expected {
            TalentProgressStatus::AtRisk
        } else {
            TalentProgressStatus::OnTime
        }
    }
}
