//! Countdown computation engine.
//!
//! Pure functions of an event and a reference date. Nothing here touches
//! the database or the clock; callers pass `today` in, so results are
//! never cached or persisted (they would go stale overnight).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Reference leap year used when validating a recurrence day against its
/// month, so Feb 29 is accepted as a valid yearly recurrence.
const LEAP_REFERENCE_YEAR: i32 = 2024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownKind {
    Anniversary,
    Birthday,
    Event,
    Other,
}

impl CountdownKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountdownKind::Anniversary => "anniversary",
            CountdownKind::Birthday => "birthday",
            CountdownKind::Event => "event",
            CountdownKind::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "anniversary" => Some(CountdownKind::Anniversary),
            "birthday" => Some(CountdownKind::Birthday),
            "event" => Some(CountdownKind::Event),
            "other" => Some(CountdownKind::Other),
            _ => None,
        }
    }
}

/// Whether an event counts elapsed time (countup) or remaining time
/// (countdown).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Countup,
    Countdown,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Countup => "countup",
            Direction::Countdown => "countdown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "countup" => Some(Direction::Countup),
            "countdown" => Some(Direction::Countdown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringType {
    Yearly,
    Monthly,
    Daily,
}

impl RecurringType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurringType::Yearly => "yearly",
            RecurringType::Monthly => "monthly",
            RecurringType::Daily => "daily",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "yearly" => Some(RecurringType::Yearly),
            "monthly" => Some(RecurringType::Monthly),
            "daily" => Some(RecurringType::Daily),
            _ => None,
        }
    }
}

/// Coarse urgency label derived from the signed day offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    LongTime,
    Month,
    Recent,
    Today,
    Urgent,
    Soon,
    Upcoming,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::LongTime => "long-time",
            Status::Month => "month",
            Status::Recent => "recent",
            Status::Today => "today",
            Status::Urgent => "urgent",
            Status::Soon => "soon",
            Status::Upcoming => "upcoming",
        }
    }
}

/// A stored countdown event. The derived day offsets and status are never
/// persisted; see [`CountdownSnapshot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownEvent {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub target_date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: CountdownKind,
    pub direction: Direction,
    pub is_recurring: bool,
    pub recurring_type: Option<RecurringType>,
    pub recurring_month: Option<u32>,
    pub recurring_day: Option<u32>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields accepted when creating or replacing an event. Direction may be
/// omitted at creation time and is then inferred from the target date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCountdownEvent {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub target_date: NaiveDate,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: CountdownKind,
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurring_type: Option<RecurringType>,
    #[serde(default)]
    pub recurring_month: Option<u32>,
    #[serde(default)]
    pub recurring_day: Option<u32>,
}

fn default_kind() -> CountdownKind {
    CountdownKind::Other
}

/// Derived view of an event at a reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountdownSnapshot {
    pub days: i64,
    pub absolute_days: i64,
    pub status: Status,
}

/// Signed day offset of `event` relative to `today`.
///
/// Yearly recurring events resolve to the next occurrence of their
/// month/day pair (this year or next, whichever is the earliest date not
/// before `today`), with invalid days clamped to the month's last valid
/// day. Everything else, including monthly/daily recurrence which has no
/// occurrence arithmetic of its own, uses the stored target date; countup
/// events count the anniversary itself as day 1 elapsed.
pub fn signed_days(event: &CountdownEvent, today: NaiveDate) -> i64 {
    if event.is_recurring && event.recurring_type == Some(RecurringType::Yearly) {
        if let (Some(month), Some(day)) = (event.recurring_month, event.recurring_day) {
            let this_year = yearly_occurrence(today.year(), month, day);
            let candidate = if this_year >= today {
                this_year
            } else {
                yearly_occurrence(today.year() + 1, month, day)
            };
            return (candidate - today).num_days();
        }
    }

    let raw = (event.target_date - today).num_days();
    match event.direction {
        Direction::Countup => raw - 1,
        Direction::Countdown => raw,
    }
}

pub fn status(event: &CountdownEvent, today: NaiveDate) -> Status {
    status_for(signed_days(event, today), event.direction)
}

fn status_for(days: i64, direction: Direction) -> Status {
    match direction {
        Direction::Countup => {
            if days <= -365 {
                Status::LongTime
            } else if days <= -30 {
                Status::Month
            } else {
                Status::Recent
            }
        }
        Direction::Countdown => {
            if days <= 0 {
                Status::Today
            } else if days <= 7 {
                Status::Urgent
            } else if days <= 30 {
                Status::Soon
            } else {
                Status::Upcoming
            }
        }
    }
}

/// Compute all derived fields in one pass.
pub fn snapshot(event: &CountdownEvent, today: NaiveDate) -> CountdownSnapshot {
    let days = signed_days(event, today);
    CountdownSnapshot {
        days,
        absolute_days: days.abs(),
        status: status_for(days, event.direction),
    }
}

/// Direction used when the caller omits one at creation time: past dates
/// count up, today and future dates count down.
pub fn infer_direction(target_date: NaiveDate, today: NaiveDate) -> Direction {
    if target_date < today {
        Direction::Countup
    } else {
        Direction::Countdown
    }
}

/// The occurrence of `month`/`day` in `year`, clamping a day the month
/// does not have (Feb 29 in a non-leap year) to its last valid day.
fn yearly_occurrence(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day)
        .or_else(|| NaiveDate::from_ymd_opt(year, month, days_in_month(year, month)))
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, 1, 1).unwrap())
}

fn days_in_month(year: i32, month: u32) -> u32 {
    // The first of the following month, minus one day.
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap()
        .pred_opt()
        .unwrap()
        .day()
}

/// Write-time validation of the recurrence fields.
///
/// Month/day may only be present on a yearly recurring event, and the day
/// must exist in that month in a leap year (so Feb 29 passes). The engine
/// itself never errors: anything that survives this check computes.
pub fn validate_recurrence(
    is_recurring: bool,
    recurring_type: Option<RecurringType>,
    recurring_month: Option<u32>,
    recurring_day: Option<u32>,
) -> Result<()> {
    let yearly = is_recurring && recurring_type == Some(RecurringType::Yearly);

    if !yearly {
        if recurring_month.is_some() {
            return Err(Error::validation(
                "recurring_month",
                "only valid on a yearly recurring event",
            ));
        }
        if recurring_day.is_some() {
            return Err(Error::validation(
                "recurring_day",
                "only valid on a yearly recurring event",
            ));
        }
        return Ok(());
    }

    let month = recurring_month
        .ok_or_else(|| Error::validation("recurring_month", "required for yearly recurrence"))?;
    let day = recurring_day
        .ok_or_else(|| Error::validation("recurring_day", "required for yearly recurrence"))?;

    if !(1..=12).contains(&month) {
        return Err(Error::validation(
            "recurring_month",
            format!("{month} is not a month (expected 1-12)"),
        ));
    }
    let max_day = days_in_month(LEAP_REFERENCE_YEAR, month);
    if !(1..=max_day).contains(&day) {
        return Err(Error::validation(
            "recurring_day",
            format!("{day} is not a day of month {month} (expected 1-{max_day})"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(target: NaiveDate, direction: Direction) -> CountdownEvent {
        CountdownEvent {
            id: 1,
            title: "t".into(),
            description: String::new(),
            target_date: target,
            kind: CountdownKind::Event,
            direction,
            is_recurring: false,
            recurring_type: None,
            recurring_month: None,
            recurring_day: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn yearly(month: u32, day: u32) -> CountdownEvent {
        CountdownEvent {
            is_recurring: true,
            recurring_type: Some(RecurringType::Yearly),
            recurring_month: Some(month),
            recurring_day: Some(day),
            ..event(date(2000, 1, 1), Direction::Countdown)
        }
    }

    #[test]
    fn countdown_days_is_plain_difference() {
        let today = date(2026, 3, 1);
        let e = event(date(2026, 3, 11), Direction::Countdown);
        assert_eq!(signed_days(&e, today), 10);
    }

    #[test]
    fn countup_counts_target_day_as_day_one() {
        let today = date(2026, 3, 1);
        let e = event(date(2026, 2, 1), Direction::Countup);
        assert_eq!(signed_days(&e, today), -29);
    }

    #[test]
    fn countdown_status_boundary_at_seven_days() {
        let today = date(2026, 3, 1);
        let urgent = event(date(2026, 3, 8), Direction::Countdown);
        let soon = event(date(2026, 3, 9), Direction::Countdown);
        assert_eq!(signed_days(&urgent, today), 7);
        assert_eq!(status(&urgent, today), Status::Urgent);
        assert_eq!(signed_days(&soon, today), 8);
        assert_eq!(status(&soon, today), Status::Soon);
    }

    #[test]
    fn countup_status_boundaries() {
        let today = date(2026, 3, 1);
        // raw - 1 == -30 at target 29 days back
        let month = event(today - chrono::Duration::days(29), Direction::Countup);
        assert_eq!(signed_days(&month, today), -30);
        assert_eq!(status(&month, today), Status::Month);

        let long = event(today - chrono::Duration::days(364), Direction::Countup);
        assert_eq!(signed_days(&long, today), -365);
        assert_eq!(status(&long, today), Status::LongTime);

        let recent = event(today - chrono::Duration::days(28), Direction::Countup);
        assert_eq!(status(&recent, today), Status::Recent);
    }

    #[test]
    fn countdown_today_at_zero_or_negative() {
        let today = date(2026, 3, 1);
        assert_eq!(status(&event(today, Direction::Countdown), today), Status::Today);
        assert_eq!(
            status(&event(date(2026, 2, 1), Direction::Countdown), today),
            Status::Today
        );
        assert_eq!(
            status(&event(date(2026, 5, 1), Direction::Countdown), today),
            Status::Upcoming
        );
    }

    #[test]
    fn yearly_feb_29_clamps_in_non_leap_year() {
        // 2026 is not a leap year: the occurrence resolves to Feb 28.
        let today = date(2026, 2, 1);
        let e = yearly(2, 29);
        assert_eq!(signed_days(&e, today), 27);
    }

    #[test]
    fn yearly_rolls_to_next_year_when_passed() {
        let today = date(2026, 6, 1);
        let e = yearly(5, 20);
        // Next occurrence is 2027-05-20.
        assert_eq!(signed_days(&e, today), (date(2027, 5, 20) - today).num_days());
    }

    #[test]
    fn yearly_occurrence_today_counts_as_zero() {
        let today = date(2026, 7, 15);
        let e = yearly(7, 15);
        assert_eq!(signed_days(&e, today), 0);
    }

    #[test]
    fn monthly_recurrence_falls_back_to_fixed_date() {
        let today = date(2026, 3, 1);
        let mut e = event(date(2026, 3, 11), Direction::Countdown);
        e.is_recurring = true;
        e.recurring_type = Some(RecurringType::Monthly);
        assert_eq!(signed_days(&e, today), 10);
    }

    #[test]
    fn direction_inferred_from_target_position() {
        let today = date(2026, 2, 7);
        assert_eq!(infer_direction(date(2025, 1, 1), today), Direction::Countup);
        assert_eq!(infer_direction(today, today), Direction::Countdown);
        assert_eq!(infer_direction(date(2027, 1, 1), today), Direction::Countdown);
    }

    #[test]
    fn anniversary_scenario_with_inferred_direction() {
        let today = date(2026, 2, 7);
        let target = date(2025, 1, 1);
        let direction = infer_direction(target, today);
        assert_eq!(direction, Direction::Countup);

        let e = CountdownEvent {
            kind: CountdownKind::Anniversary,
            ..event(target, direction)
        };
        let snap = snapshot(&e, today);
        assert_eq!(snap.days, -403);
        assert_eq!(snap.absolute_days, 403);
        assert_eq!(snap.status, Status::LongTime);
    }

    #[test]
    fn recurrence_validation_accepts_leap_day() {
        assert!(validate_recurrence(true, Some(RecurringType::Yearly), Some(2), Some(29)).is_ok());
    }

    #[test]
    fn recurrence_validation_rejects_invalid_day() {
        let err =
            validate_recurrence(true, Some(RecurringType::Yearly), Some(2), Some(30)).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "recurring_day", .. }));

        let err =
            validate_recurrence(true, Some(RecurringType::Yearly), Some(13), Some(1)).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "recurring_month", .. }));
    }

    #[test]
    fn recurrence_validation_rejects_fields_on_non_yearly() {
        let err = validate_recurrence(false, None, Some(2), None).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "recurring_month", .. }));

        let err =
            validate_recurrence(true, Some(RecurringType::Monthly), None, Some(5)).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "recurring_day", .. }));
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2026, 2), 28);
        assert_eq!(days_in_month(2026, 12), 31);
        assert_eq!(days_in_month(2026, 4), 30);
    }
}
