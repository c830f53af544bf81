//! Activity window calculation.
//!
//! The window ends "now" in the configured time zone and reaches back a
//! number of days. With the default one-day window, a run on Monday reaches
//! back three days so the weekend is covered.
//!
//! [`compute_window`] is pure: the fetch stage and both renderers call it
//! with the same inputs and get the same window, override included.

use chrono::{DateTime, Datelike, Days, Duration, LocalResult, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

/// The day-count the weekend rule applies to.
pub const DEFAULT_WINDOW_DAYS: u32 = 1;

/// Day-count used instead of the default on the first working day.
pub const WEEKEND_EXTENDED_DAYS: u32 = 3;

/// First working day of the week.
pub const FIRST_WORKDAY: Weekday = Weekday::Mon;

/// Inclusive time range `[start, end]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityWindow {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub requested_days: u32,
    pub effective_days: u32,
}

impl ActivityWindow {
    /// Whether `ts` falls in the window (both ends inclusive).
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        let ts = ts.with_timezone(&self.end.timezone());
        self.start <= ts && ts <= self.end
    }

    /// True when the weekend rule widened the window.
    pub fn is_extended(&self) -> bool {
        self.effective_days != self.requested_days
    }

    /// `last 3 days (weekend extended)`, `last 1 day`, `last 2 days`.
    pub fn describe(&self) -> String {
        let n = self.effective_days;
        if self.is_extended() {
            format!("last {} days (weekend extended)", n)
        } else {
            format!("last {} day{}", n, if n == 1 { "" } else { "s" })
        }
    }
}

/// Day-count actually used for a request made on `weekday`.
pub fn effective_days(weekday: Weekday, requested_days: u32) -> u32 {
    if requested_days == DEFAULT_WINDOW_DAYS && weekday == FIRST_WORKDAY {
        WEEKEND_EXTENDED_DAYS
    } else {
        requested_days
    }
}

pub fn compute_window(now: DateTime<Tz>, requested_days: u32) -> ActivityWindow {
    let effective = effective_days(now.weekday(), requested_days);
    if effective != requested_days {
        tracing::debug!(
            days = effective,
            "{} detected - extending window to {} days",
            weekday_name(now.weekday()),
            effective
        );
    }

    ActivityWindow {
        start: days_before(now, effective),
        end: now,
        requested_days,
        effective_days: effective,
    }
}

/// The same wall-clock time `days` calendar days before `now`.
///
/// An ambiguous local time resolves to its earlier instant. A local time
/// skipped by a DST jump is read with the offset in force before the jump.
fn days_before(now: DateTime<Tz>, days: u32) -> DateTime<Tz> {
    let tz = now.timezone();
    let Some(local) = now.naive_local().checked_sub_days(Days::new(u64::from(days))) else {
        return now - Duration::days(i64::from(days));
    };

    match tz.from_local_datetime(&local) {
        LocalResult::Single(start) => start,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => tz
            .from_local_datetime(&(local - Duration::hours(1)))
            .earliest()
            .map(|before| before + Duration::hours(1))
            .unwrap_or_else(|| now - Duration::days(i64::from(days))),
    }
}

/// The weekend day `now` falls on, if any.
pub fn weekend_day(now: &DateTime<Tz>) -> Option<Weekday> {
    match now.weekday() {
        day @ (Weekday::Sat | Weekday::Sun) => Some(day),
        _ => None,
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// `zdigest window`: print the window a run started now would use.
pub fn show_window(now: DateTime<Tz>, requested_days: u32) {
    let window = compute_window(now, requested_days);
    println!("Window:  {}", window.describe());
    println!("Start:   {}", window.start.format("%Y-%m-%d %H:%M:%S %Z"));
    println!("End:     {}", window.end.format("%Y-%m-%d %H:%M:%S %Z"));
    if let Some(day) = weekend_day(&now) {
        println!("Note:    today is {}; runs skip weekends unless SKIP_WEEKENDS=0", weekday_name(day));
    }
}
