//! Focus statistics
//!
//! Pure rollups of session history into daily, weekly, monthly and yearly
//! buckets. Nothing here mutates the history it is given.
//!
//! A session belongs to the local calendar day its start time falls on. Both
//! the bucket filters and the bucket labels derive dates through
//! [`crate::session::local_date`], so a late-night session can never be labelled one day and
//! counted on another.

use chrono::{Datelike, Days, Local, NaiveDate, TimeZone};

use crate::error::{PomodoroError, Result};
use crate::session::SessionRecord;
use pomodoro_core::Locale;

/// Minute thresholds for heatmap levels 1 through 4. A day's level is the
/// number of thresholds its total strictly exceeds.
const INTENSITY_THRESHOLDS: [u32; 4] = [0, 25, 100, 200];

/// Totals for one calendar day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyStats {
    /// `YYYY-MM-DD`
    pub date: String,
    pub total_minutes: u32,
    pub session_count: u32,
}

/// One day of a Monday-first week
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekDay {
    pub label: &'static str,
    pub date: NaiveDate,
    pub minutes: u32,
}

/// One cell of the month heatmap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthDay {
    /// Day of month, starting at 1
    pub day: u32,
    pub minutes: u32,
    /// 0 (nothing) to 4 (more than 200 minutes)
    pub intensity: u8,
}

/// Total focus time for one month of a year
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthTotal {
    pub label: &'static str,
    /// Month index, 0 = January
    pub month: u32,
    pub total_minutes: u32,
}

/// Heatmap level for a day's total minutes
pub fn intensity(minutes: u32) -> u8 {
    INTENSITY_THRESHOLDS.iter().filter(|&&t| minutes > t).count() as u8
}

/// Format a date as a `YYYY-MM-DD` key
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` key
pub fn parse_date_key(key: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(key.trim(), "%Y-%m-%d")
        .map_err(|_| PomodoroError::InvalidDateKey(key.to_string()))
}

/// Parse `YYYY-MM` into a 0-based month index and a year
pub fn parse_month(value: &str) -> Result<(u32, i32)> {
    let invalid = || PomodoroError::InvalidMonth(value.to_string());
    let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((month - 1, year))
}

/// Number of days in a month, or `None` if the month cannot be represented
fn days_in_month(month_index: u32, year: i32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month_index + 1, 1)?;
    let next = if month_index == 11 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month_index + 2, 1)?
    };
    u32::try_from((next - first).num_days()).ok()
}

/// Read-only statistics view over a history snapshot
#[derive(Debug, Clone)]
pub struct Stats<'a, Tz: TimeZone = Local> {
    sessions: &'a [SessionRecord],
    tz: Tz,
    locale: Locale,
}

impl<'a> Stats<'a, Local> {
    pub fn new(sessions: &'a [SessionRecord]) -> Self {
        Self {
            sessions,
            tz: Local,
            locale: Locale::default(),
        }
    }
}

impl<'a, Tz: TimeZone> Stats<'a, Tz> {
    /// Bucket by calendar days of another time zone
    pub fn with_timezone<Z: TimeZone>(self, tz: Z) -> Stats<'a, Z> {
        Stats {
            sessions: self.sessions,
            tz,
            locale: self.locale,
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    fn start_date(&self, session: &SessionRecord) -> Option<NaiveDate> {
        session.start_date(&self.tz)
    }

    /// Totals for a `YYYY-MM-DD` key. A key that is not a valid date matches
    /// nothing and yields zeros.
    pub fn daily(&self, key: &str) -> DailyStats {
        match parse_date_key(key) {
            Ok(date) => self.day(date),
            Err(_) => DailyStats {
                date: key.to_string(),
                total_minutes: 0,
                session_count: 0,
            },
        }
    }

    /// Totals for sessions that started on `date`
    pub fn day(&self, date: NaiveDate) -> DailyStats {
        let (total_minutes, session_count) = self
            .sessions
            .iter()
            .filter(|s| self.start_date(s) == Some(date))
            .fold((0u32, 0u32), |(minutes, count), s| {
                (minutes.saturating_add(s.minutes()), count + 1)
            });

        DailyStats {
            date: date_key(date),
            total_minutes,
            session_count,
        }
    }

    /// Monday through Sunday of the week containing `reference`
    pub fn weekly(&self, reference: NaiveDate) -> Vec<WeekDay> {
        let back = u64::from(reference.weekday().num_days_from_monday());
        let monday = reference.checked_sub_days(Days::new(back)).unwrap_or(reference);

        self.locale
            .weekday_labels()
            .into_iter()
            .zip(monday.iter_days())
            .map(|(label, date)| WeekDay {
                label,
                date,
                minutes: self.day(date).total_minutes,
            })
            .collect()
    }

    /// One cell per day of the month. `month_index` is 0-based; an index
    /// outside 0..=11 yields no cells.
    pub fn monthly(&self, month_index: u32, year: i32) -> Vec<MonthDay> {
        if month_index > 11 {
            return Vec::new();
        }
        let Some(days) = days_in_month(month_index, year) else {
            return Vec::new();
        };

        (1..=days)
            .filter_map(|day| NaiveDate::from_ymd_opt(year, month_index + 1, day))
            .map(|date| {
                let minutes = self.day(date).total_minutes;
                MonthDay {
                    day: date.day(),
                    minutes,
                    intensity: intensity(minutes),
                }
            })
            .collect()
    }

    /// Twelve monthly totals for `year`, summed straight from the sessions
    pub fn yearly(&self, year: i32) -> Vec<MonthTotal> {
        let mut totals = [0u32; 12];
        for session in self.sessions {
            if let Some(date) = self.start_date(session) {
                if date.year() == year {
                    let slot = &mut totals[date.month0() as usize];
                    *slot = slot.saturating_add(session.minutes());
                }
            }
        }

        self.locale
            .month_labels()
            .into_iter()
            .zip(totals)
            .enumerate()
            .map(|(month, (label, total_minutes))| MonthTotal {
                label,
                month: month as u32,
                total_minutes,
            })
            .collect()
    }
}

pub fn daily_stats(history: &[SessionRecord], date_key: &str) -> DailyStats {
    Stats::new(history).daily(date_key)
}

pub fn weekly_stats(history: &[SessionRecord], reference: NaiveDate) -> Vec<WeekDay> {
    Stats::new(history).weekly(reference)
}

pub fn monthly_stats(history: &[SessionRecord], month_index: u32, year: i32) -> Vec<MonthDay> {
    Stats::new(history).monthly(month_index, year)
}

pub fn yearly_stats(history: &[SessionRecord], year: i32) -> Vec<MonthTotal> {
    Stats::new(history).yearly(year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionKind;
    use chrono::FixedOffset;

    fn zone() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
        zone()
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .timestamp_millis()
    }

    fn record(start_time: i64, duration: Option<u32>) -> SessionRecord {
        SessionRecord {
            id: format!("s{start_time}"),
            start_time,
            end_time: start_time + 25 * 60_000,
            duration,
            kind: SessionKind::Work,
            note: String::new(),
            task_id: None,
            commitment: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_late_night_session_stays_on_its_day() {
        // 23:30 at UTC-5 is 04:30 UTC the next day
        let history = vec![record(at(2024, 1, 1, 23, 30), Some(25))];
        let stats = Stats::new(&history).with_timezone(zone());

        let jan1 = stats.daily("2024-01-01");
        assert_eq!(jan1.session_count, 1);
        assert_eq!(jan1.total_minutes, 25);
        assert_eq!(stats.daily("2024-01-02").session_count, 0);

        let week = stats.weekly(date(2024, 1, 1));
        assert_eq!(week[0].minutes, 25);
        assert_eq!(week[1].minutes, 0);
        assert_eq!(stats.monthly(0, 2024)[0].minutes, 25);
    }

    #[test]
    fn test_session_spanning_midnight_counts_on_start_day() {
        let mut session = record(at(2024, 3, 9, 23, 50), Some(25));
        session.end_time = at(2024, 3, 10, 0, 15);
        let history = vec![session];
        let stats = Stats::new(&history).with_timezone(zone());

        assert_eq!(stats.daily("2024-03-09").session_count, 1);
        assert_eq!(stats.daily("2024-03-10").session_count, 0);
    }

    #[test]
    fn test_bad_date_key_yields_zeros() {
        let history = vec![record(at(2024, 1, 1, 9, 0), Some(25))];
        let stats = Stats::new(&history).with_timezone(zone());
        for key in ["", "yesterday", "2024-13-01", "2024-02-30"] {
            let day = stats.daily(key);
            assert_eq!(day.session_count, 0, "{key}");
            assert_eq!(day.total_minutes, 0, "{key}");
        }
    }

    #[test]
    fn test_missing_duration_counts_session_but_no_minutes() {
        let history = vec![
            record(at(2024, 1, 1, 9, 0), None),
            record(at(2024, 1, 1, 10, 0), Some(25)),
        ];
        let day = Stats::new(&history).with_timezone(zone()).daily("2024-01-01");
        assert_eq!(day.session_count, 2);
        assert_eq!(day.total_minutes, 25);
    }

    #[test]
    fn test_week_starts_on_monday() {
        let history = vec![
            record(at(2024, 1, 7, 12, 0), Some(50)),
            record(at(2024, 1, 8, 12, 0), Some(25)),
        ];
        let stats = Stats::new(&history).with_timezone(zone());

        // 2024-01-07 is a Sunday, the last day of the week starting 01-01
        let from_sunday = stats.weekly(date(2024, 1, 7));
        let from_monday = stats.weekly(date(2024, 1, 1));
        let from_thursday = stats.weekly(date(2024, 1, 4));
        assert_eq!(from_sunday, from_monday);
        assert_eq!(from_sunday, from_thursday);

        assert_eq!(from_sunday.len(), 7);
        assert_eq!(from_sunday[0].date, date(2024, 1, 1));
        assert_eq!(from_sunday[6].date, date(2024, 1, 7));
        assert_eq!(from_sunday[6].minutes, 50);

        let labels: Vec<_> = from_sunday.iter().map(|d| d.label).collect();
        assert_eq!(labels, ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]);

        // the Monday after belongs to the next week
        assert_eq!(stats.weekly(date(2024, 1, 8))[0].minutes, 25);
    }

    #[test]
    fn test_week_crossing_month_and_year() {
        let history = vec![record(at(2024, 12, 31, 8, 0), Some(25))];
        let week = Stats::new(&history)
            .with_timezone(zone())
            .weekly(date(2025, 1, 2));
        assert_eq!(week[0].date, date(2024, 12, 30));
        assert_eq!(week[1].minutes, 25);
    }

    #[test]
    fn test_days_in_month() {
        let history: Vec<SessionRecord> = Vec::new();
        let stats = Stats::new(&history);
        assert_eq!(stats.monthly(1, 2024).len(), 29);
        assert_eq!(stats.monthly(1, 2023).len(), 28);
        assert_eq!(stats.monthly(11, 2023).len(), 31);
        assert_eq!(stats.monthly(3, 2023).len(), 30);
        assert!(stats.monthly(12, 2023).is_empty());

        let feb = stats.monthly(1, 2024);
        assert_eq!(feb.first().map(|d| d.day), Some(1));
        assert_eq!(feb.last().map(|d| d.day), Some(29));
    }

    #[test]
    fn test_intensity_thresholds() {
        assert_eq!(intensity(0), 0);
        assert_eq!(intensity(1), 1);
        assert_eq!(intensity(25), 1);
        assert_eq!(intensity(26), 2);
        assert_eq!(intensity(100), 2);
        assert_eq!(intensity(101), 3);
        assert_eq!(intensity(200), 3);
        assert_eq!(intensity(201), 4);
        assert_eq!(intensity(u32::MAX), 4);
    }

    #[test]
    fn test_monthly_cells_carry_intensity() {
        let history = vec![
            record(at(2024, 2, 3, 9, 0), Some(25)),
            record(at(2024, 2, 4, 9, 0), Some(26)),
            record(at(2024, 2, 5, 9, 0), Some(150)),
            record(at(2024, 2, 5, 14, 0), Some(51)),
        ];
        let month = Stats::new(&history).with_timezone(zone()).monthly(1, 2024);
        assert_eq!(month[0].intensity, 0);
        assert_eq!(month[2].intensity, 1);
        assert_eq!(month[3].intensity, 2);
        assert_eq!(month[4].minutes, 201);
        assert_eq!(month[4].intensity, 4);
    }

    #[test]
    fn test_yearly_totals_match_session_sum() {
        let history = vec![
            record(at(2024, 1, 1, 0, 5), Some(25)),
            record(at(2024, 1, 31, 23, 55), Some(30)),
            record(at(2024, 6, 15, 12, 0), Some(45)),
            record(at(2024, 12, 31, 23, 59), Some(50)),
            record(at(2024, 7, 4, 9, 0), None),
            record(at(2023, 12, 31, 23, 59), Some(99)),
            record(at(2025, 1, 1, 0, 0), Some(99)),
        ];
        let stats = Stats::new(&history).with_timezone(zone());
        let year = stats.yearly(2024);

        assert_eq!(year.len(), 12);
        let total: u32 = year.iter().map(|m| m.total_minutes).sum();
        assert_eq!(total, 25 + 30 + 45 + 50);
        assert_eq!(year[0].total_minutes, 55);
        assert_eq!(year[0].label, "Jan");
        assert_eq!(year[11].total_minutes, 50);
        assert_eq!(year[11].month, 11);

        // month heatmaps agree with the yearly totals
        for month in &year {
            let cells: u32 = stats.monthly(month.month, 2024).iter().map(|d| d.minutes).sum();
            assert_eq!(cells, month.total_minutes, "{}", month.label);
        }
    }

    #[test]
    fn test_order_of_history_does_not_matter() {
        let mut history = vec![
            record(at(2024, 5, 1, 9, 0), Some(25)),
            record(at(2024, 5, 1, 11, 0), Some(25)),
            record(at(2024, 5, 2, 9, 0), Some(25)),
        ];
        let before = Stats::new(&history).with_timezone(zone()).yearly(2024);
        history.reverse();
        let after = Stats::new(&history).with_timezone(zone()).yearly(2024);
        assert_eq!(before, after);
    }

    #[test]
    fn test_free_functions_use_local_days() {
        let start = Local
            .with_ymd_and_hms(2024, 3, 5, 12, 0, 0)
            .single()
            .unwrap()
            .timestamp_millis();
        let history = vec![record(start, Some(25)), record(start + 3_600_000, None)];

        let day = daily_stats(&history, "2024-03-05");
        assert_eq!(day.session_count, 2);
        assert_eq!(day.total_minutes, 25);
        assert_eq!(daily_stats(&history, "not a date").session_count, 0);

        // 2024-03-05 is a Tuesday
        let week = weekly_stats(&history, date(2024, 3, 7));
        assert_eq!(week[1].date, date(2024, 3, 5));
        assert_eq!(week[1].minutes, 25);
        assert_eq!(week[1].label, "Tue");

        let march = monthly_stats(&history, 2, 2024);
        assert_eq!(march.len(), 31);
        assert_eq!(march[4].minutes, 25);
        assert_eq!(march[4].intensity, 1);

        let year = yearly_stats(&history, 2024);
        assert_eq!(year[2].total_minutes, 25);
        assert_eq!(year.iter().map(|m| m.total_minutes).sum::<u32>(), 25);
    }

    #[test]
    fn test_turkish_labels() {
        let history: Vec<SessionRecord> = Vec::new();
        let stats = Stats::new(&history).with_locale(Locale::Turkish);
        assert_eq!(stats.weekly(date(2024, 1, 3))[0].label, "Pzt");
        assert_eq!(stats.yearly(2024)[1].label, "Şub");
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_date_key("2024-02-29").unwrap(), date(2024, 2, 29));
        assert!(matches!(
            parse_date_key("2023-02-29"),
            Err(PomodoroError::InvalidDateKey(_))
        ));
        assert_eq!(parse_month("2024-02").unwrap(), (1, 2024));
        assert_eq!(parse_month("2024-12").unwrap(), (11, 2024));
        assert!(matches!(parse_month("2024-13"), Err(PomodoroError::InvalidMonth(_))));
        assert!(parse_month("2024").is_err());
        assert_eq!(date_key(date(2024, 3, 5)), "2024-03-05");
    }
}
