//! Print and distribution date calculator.
//!
//! Forward mode walks from the date production wraps to the date books are available;
//! backward mode starts from the availability target and mirrors the same steps with
//! subtraction. For identical day counts the two directions are exact inverses.

use crate::error::TimelineError;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => f.write_str("forward"),
            Direction::Backward => f.write_str("backward"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionMethod {
    #[default]
    Distributor,
    Direct,
    Fulfillment,
    Event,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineFormData {
    pub direction: Direction,
    pub distribution_method: DistributionMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
    pub printer_queue_days: i64,
    pub printing_days: i64,
    pub shipping_days: i64,
    pub distributor_processing_days: i64,
    pub fulfillment_processing_days: i64,
}

impl Default for TimelineFormData {
    fn default() -> Self {
        Self {
            direction: Direction::Forward,
            distribution_method: DistributionMethod::Distributor,
            start_date: None,
            target_date: None,
            printer_queue_days: 7,
            printing_days: 14,
            shipping_days: 5,
            distributor_processing_days: 7,
            fulfillment_processing_days: 3,
        }
    }
}

impl TimelineFormData {
    pub fn forward_from(start: NaiveDate) -> Self {
        Self {
            direction: Direction::Forward,
            start_date: Some(start),
            ..Self::default()
        }
    }

    pub fn backward_from(target: NaiveDate) -> Self {
        Self {
            direction: Direction::Backward,
            target_date: Some(target),
            ..Self::default()
        }
    }

    /// Post-shipping days for the selected channel. Direct sales and events add none.
    pub fn channel_processing_days(&self) -> i64 {
        match self.distribution_method {
            DistributionMethod::Distributor => self.distributor_processing_days,
            DistributionMethod::Fulfillment => self.fulfillment_processing_days,
            DistributionMethod::Direct | DistributionMethod::Event => 0,
        }
    }

    fn validate(&self) -> Result<(), TimelineError> {
        let fields = [
            ("printer_queue_days", self.printer_queue_days),
            ("printing_days", self.printing_days),
            ("shipping_days", self.shipping_days),
            (
                "distributor_processing_days",
                self.distributor_processing_days,
            ),
            (
                "fulfillment_processing_days",
                self.fulfillment_processing_days,
            ),
        ];
        for (field, value) in fields {
            if value < 0 {
                return Err(TimelineError::InvalidDuration { field, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineResult {
    pub completion_date: NaiveDate,
    pub printer_queue_date: NaiveDate,
    pub printing_complete_date: NaiveDate,
    pub shipping_arrival_date: NaiveDate,
    pub in_store_date: NaiveDate,
}

impl TimelineResult {
    /// Days between production wrapping and availability.
    pub fn span_days(&self) -> i64 {
        (self.in_store_date - self.completion_date).num_days()
    }
}

fn shift(date: NaiveDate, days: i64, direction: Direction) -> Result<NaiveDate, TimelineError> {
    let delta = Duration::try_days(days).ok_or(TimelineError::DateOutOfRange)?;
    let shifted = match direction {
        Direction::Forward => date.checked_add_signed(delta),
        Direction::Backward => date.checked_sub_signed(delta),
    };
    shifted.ok_or(TimelineError::DateOutOfRange)
}

pub fn calculate_timeline(form: &TimelineFormData) -> Result<TimelineResult, TimelineError> {
    form.validate()?;
    let processing = form.channel_processing_days();

    match form.direction {
        Direction::Forward => {
            let completion_date = form
                .start_date
                .ok_or(TimelineError::MissingAnchorDate(Direction::Forward))?;
            let printer_queue_date =
                shift(completion_date, form.printer_queue_days, Direction::Forward)?;
            let printing_complete_date =
                shift(printer_queue_date, form.printing_days, Direction::Forward)?;
            let shipping_arrival_date =
                shift(printing_complete_date, form.shipping_days, Direction::Forward)?;
            let in_store_date = shift(shipping_arrival_date, processing, Direction::Forward)?;
            Ok(TimelineResult {
                completion_date,
                printer_queue_date,
                printing_complete_date,
                shipping_arrival_date,
                in_store_date,
            })
        }
        Direction::Backward => {
            let in_store_date = form
                .target_date
                .ok_or(TimelineError::MissingAnchorDate(Direction::Backward))?;
            let shipping_arrival_date = shift(in_store_date, processing, Direction::Backward)?;
            let printing_complete_date =
                shift(shipping_arrival_date, form.shipping_days, Direction::Backward)?;
            let printer_queue_date =
                shift(printing_complete_date, form.printing_days, Direction::Backward)?;
            let completion_date =
                shift(printer_queue_date, form.printer_queue_days, Direction::Backward)?;
            Ok(TimelineResult {
                completion_date,
                printer_queue_date,
                printing_complete_date,
                shipping_arrival_date,
                in_store_date,
            })
        }
    }
}
