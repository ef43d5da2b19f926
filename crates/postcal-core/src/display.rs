use std::str::FromStr;

use anyhow::anyhow;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::post::{Post, Status};

pub const DRAFT_LABEL: &str = "Draft";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ClockFormat {
    /// `2:00 PM`
    #[default]
    TwelveHour,
    /// `14:00`
    TwentyFourHour,
}

impl ClockFormat {
    #[must_use]
    pub fn format(self, time: NaiveTime) -> String {
        match self {
            ClockFormat::TwelveHour => time.format("%-I:%M %p").to_string(),
            ClockFormat::TwentyFourHour => time.format("%H:%M").to_string(),
        }
    }
}

impl FromStr for ClockFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "12" | "12h" | "12-hour" => Ok(ClockFormat::TwelveHour),
            "24" | "24h" | "24-hour" => Ok(ClockFormat::TwentyFourHour),
            other => Err(anyhow!("invalid time.format setting: {other}")),
        }
    }
}

/// The time shown next to a post: its scheduled or published time when the
/// status has one, otherwise the `Draft` label.
#[must_use]
pub fn display_time(post: &Post, clock: ClockFormat) -> String {
    let time = match post.status {
        Status::Scheduled => post.scheduled_time,
        Status::Published => post.published_time,
        Status::Draft => None,
    };

    time.map(|time| clock.format(time))
        .unwrap_or_else(|| DRAFT_LABEL.to_string())
}

#[must_use]
pub fn is_past_date(date: NaiveDate, reference_now: NaiveDate) -> bool {
    date < reference_now
}

#[must_use]
pub fn is_past_instant(date: NaiveDateTime, reference_now: NaiveDateTime) -> bool {
    is_past_date(date.date(), reference_now.date())
}

#[must_use]
pub fn status_label(status: Status) -> &'static str {
    match status {
        Status::Draft => "Draft",
        Status::Scheduled => "Scheduled",
        Status::Published => "Published",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusColor {
    Blue,
    Green,
    Yellow,
}

impl StatusColor {
    #[must_use]
    pub fn for_status(status: Status) -> Self {
        match status {
            Status::Scheduled => StatusColor::Blue,
            Status::Published => StatusColor::Green,
            Status::Draft => StatusColor::Yellow,
        }
    }

    #[must_use]
    pub fn ansi_code(self) -> &'static str {
        match self {
            StatusColor::Blue => "34",
            StatusColor::Green => "32",
            StatusColor::Yellow => "33",
        }
    }
}

/// Legend entries in display order.
#[must_use]
pub fn legend() -> [(Status, StatusColor); 3] {
    [Status::Scheduled, Status::Published, Status::Draft]
        .map(|status| (status, StatusColor::for_status(status)))
}

/// "Thursday, June 5, 2025".
#[must_use]
pub fn day_heading(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}
