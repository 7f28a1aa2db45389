//! US equity session indicator, evaluated in New York local time.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::America::New_York;
use serde::Serialize;

const PRE_MARKET_START: u32 = 4 * 60;
const MARKET_OPEN: u32 = 9 * 60 + 30;
const MARKET_CLOSE: u32 = 16 * 60;
const AFTER_HOURS_END: u32 = 20 * 60;
const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketPhase {
    Weekend,
    PreMarketSoon,
    PreMarket,
    Open,
    AfterHours,
    Closed,
}

impl MarketPhase {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Weekend => "Weekend",
            Self::PreMarketSoon => "Pre-market Soon",
            Self::PreMarket => "Pre-market",
            Self::Open => "Market Open",
            Self::AfterHours => "After Hours",
            Self::Closed => "Market Closed",
        }
    }
}

impl Display for MarketPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Time left until the next session event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "unit", content = "value", rename_all = "snake_case")]
pub enum TimeUntil {
    Minutes(u32),
    Days(u32),
}

impl Display for TimeUntil {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Minutes(minutes) => f.write_str(&format_time_until(minutes)),
            Self::Days(1) => f.write_str("in 1 day"),
            Self::Days(days) => write!(f, "in {days} days"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketSession {
    pub phase: MarketPhase,
    pub status: &'static str,
    pub is_open: bool,
    pub next_event: &'static str,
    pub time_until: TimeUntil,
    /// `time_until` rendered for display, e.g. `in 2h 5m`.
    pub time_until_label: String,
}

impl MarketSession {
    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(instant: DateTime<Utc>) -> Self {
        let local = instant.with_timezone(&New_York);
        let weekday = local.weekday().num_days_from_sunday();
        let minute_of_day = local.hour() * 60 + local.minute();

        let (phase, next_event, time_until) = if weekday == 0 || weekday == 6 {
            (
                MarketPhase::Weekend,
                "Market Opens",
                TimeUntil::Days(1 + (7 - weekday) % 7),
            )
        } else if minute_of_day < PRE_MARKET_START {
            (
                MarketPhase::PreMarketSoon,
                "Pre-market",
                TimeUntil::Minutes(PRE_MARKET_START - minute_of_day),
            )
        } else if minute_of_day < MARKET_OPEN {
            (
                MarketPhase::PreMarket,
                "Market Opens",
                TimeUntil::Minutes(MARKET_OPEN - minute_of_day),
            )
        } else if minute_of_day < MARKET_CLOSE {
            (
                MarketPhase::Open,
                "Market Closes",
                TimeUntil::Minutes(MARKET_CLOSE - minute_of_day),
            )
        } else if minute_of_day < AFTER_HOURS_END {
            (
                MarketPhase::AfterHours,
                "Trading Ends",
                TimeUntil::Minutes(AFTER_HOURS_END - minute_of_day),
            )
        } else {
            (
                MarketPhase::Closed,
                "Pre-market",
                TimeUntil::Minutes(MINUTES_PER_DAY - minute_of_day + PRE_MARKET_START),
            )
        };

        Self {
            phase,
            status: phase.label(),
            is_open: phase == MarketPhase::Open,
            next_event,
            time_until,
            time_until_label: time_until.to_string(),
        }
    }
}

/// Renders minutes as `in Xh Ym`, or `in Ym` under an hour.
pub fn format_time_until(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 {
        format!("in {hours}h {mins}m")
    } else {
        format!("in {mins}m")
    }
}
