//! Actionable-day selection.
//!
//! A day is actionable when it lies in the past and records a
//! flexible schedule that was never clocked: `in` carries the
//! flexible sentinel, `out` is empty, and the day is neither a
//! holiday nor a weekend.

use jiff::civil::Date;

use crate::model::DiaryEntry;

/// Marker the service writes for a flexible-schedule day with no
/// clock-in.
pub const FLEXIBLE_SENTINEL: &str = "_FlexibleSchedule";

/// Select the entries that still need filling, preserving input order.
///
/// Two stages, both mandatory and in this order:
///
/// 1. temporal: keep entries whose date is strictly before `today`;
///    entries with a missing or unparsable date are dropped, not
///    errored;
/// 2. classification: keep entries with all four classification
///    fields present and matching the flexible-unclocked shape.
///
/// `today` is an explicit parameter, never the wall clock, so the
/// result is a pure function of its inputs.
pub fn actionable(entries: &[DiaryEntry], today: Date) -> Vec<DiaryEntry> {
    tracing::info!("filtering {} diaries, keeping days before {today}", entries.len());

    let before_today: Vec<&DiaryEntry> = entries
        .iter()
        .filter(|entry| is_before(entry, today))
        .collect();
    tracing::info!(
        "{} of {} diaries fall before {today}",
        before_today.len(),
        entries.len()
    );

    let actionable: Vec<DiaryEntry> = before_today
        .into_iter()
        .filter(|entry| is_unfilled_flexible(entry))
        .cloned()
        .collect();
    tracing::info!("{} flexible-schedule days need filling", actionable.len());

    actionable
}

fn is_before(entry: &DiaryEntry, today: Date) -> bool {
    let Some(raw) = entry.date.as_deref() else {
        tracing::warn!("diary entry has no date, skipping");
        return false;
    };

    match raw.parse::<Date>() {
        Ok(date) if date < today => true,
        Ok(date) => {
            tracing::debug!("skipping {date}, not before today");
            false
        }
        Err(e) => {
            tracing::warn!("unparsable diary date {raw:?}: {e}");
            false
        }
    }
}

fn is_unfilled_flexible(entry: &DiaryEntry) -> bool {
    let (Some(check_in), Some(check_out), Some(is_holiday), Some(is_weekend)) = (
        entry.check_in.as_deref(),
        entry.check_out.as_deref(),
        entry.is_holiday,
        entry.is_weekend,
    ) else {
        tracing::warn!(
            "diary entry for {:?} is missing classification fields",
            entry.date
        );
        return false;
    };

    check_in == FLEXIBLE_SENTINEL && check_out.is_empty() && !is_holiday && !is_weekend
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::date;

    fn entry(day: &str) -> DiaryEntry {
        DiaryEntry {
            date: Some(day.to_string()),
            check_in: Some(FLEXIBLE_SENTINEL.to_string()),
            check_out: Some(String::new()),
            is_holiday: Some(false),
            is_weekend: Some(false),
            diary_id: Some(1),
        }
    }

    #[test]
    fn flexible_day_before_today_is_actionable() {
        let entries = vec![entry("2024-01-05")];

        let kept = actionable(&entries, date(2024, 1, 10));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].date.as_deref(), Some("2024-01-05"));
    }

    #[test]
    fn weekend_day_is_not_actionable() {
        let mut weekend = entry("2024-01-05");
        weekend.is_weekend = Some(true);

        assert!(actionable(&[weekend], date(2024, 1, 10)).is_empty());
    }

    #[test]
    fn holiday_is_not_actionable() {
        let mut holiday = entry("2024-01-05");
        holiday.is_holiday = Some(true);

        assert!(actionable(&[holiday], date(2024, 1, 10)).is_empty());
    }

    #[test]
    fn clocked_out_day_is_not_actionable() {
        let mut clocked = entry("2024-01-05");
        clocked.check_out = Some("18:00".to_string());

        assert!(actionable(&[clocked], date(2024, 1, 10)).is_empty());
    }

    #[test]
    fn fixed_schedule_day_is_not_actionable() {
        let mut fixed = entry("2024-01-05");
        fixed.check_in = Some("09:00".to_string());

        assert!(actionable(&[fixed], date(2024, 1, 10)).is_empty());
    }

    #[test]
    fn today_is_excluded_yesterday_is_included() {
        let today = date(2024, 1, 10);
        let entries = vec![entry("2024-01-10"), entry("2024-01-09")];

        let kept = actionable(&entries, today);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].date.as_deref(), Some("2024-01-09"));
    }

    #[test]
    fn future_date_is_excluded() {
        assert!(actionable(&[entry("2024-02-01")], date(2024, 1, 10)).is_empty());
    }

    #[test]
    fn missing_classification_fields_exclude_the_entry() {
        let today = date(2024, 1, 10);

        let mut no_in = entry("2024-01-05");
        no_in.check_in = None;
        let mut no_out = entry("2024-01-05");
        no_out.check_out = None;
        let mut no_holiday = entry("2024-01-05");
        no_holiday.is_holiday = None;
        let mut no_weekend = entry("2024-01-05");
        no_weekend.is_weekend = None;

        for incomplete in [no_in, no_out, no_holiday, no_weekend] {
            assert!(actionable(&[incomplete], today).is_empty());
        }
    }

    #[test]
    fn missing_or_malformed_dates_are_dropped_silently() {
        let mut no_date = entry("2024-01-05");
        no_date.date = None;
        let bad_date = entry("not-a-date");

        assert!(actionable(&[no_date, bad_date], date(2024, 1, 10)).is_empty());
    }

    #[test]
    fn input_order_is_preserved() {
        let entries = vec![entry("2024-01-03"), entry("2024-01-01"), entry("2024-01-02")];

        let kept = actionable(&entries, date(2024, 1, 10));
        let dates: Vec<&str> = kept.iter().filter_map(|e| e.date.as_deref()).collect();
        assert_eq!(dates, ["2024-01-03", "2024-01-01", "2024-01-02"]);
    }

    #[test]
    fn rerunning_yields_identical_output() {
        let today = date(2024, 1, 10);
        let mut entries = vec![entry("2024-01-03"), entry("2024-01-09")];
        entries[0].is_weekend = Some(true);

        let first: Vec<Option<String>> = actionable(&entries, today)
            .into_iter()
            .map(|e| e.date)
            .collect();
        let second: Vec<Option<String>> = actionable(&entries, today)
            .into_iter()
            .map(|e| e.date)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(actionable(&[], date(2024, 1, 10)).is_empty());
    }
}
