use crate::errors::AppError;
use crate::models::{DateRange, RangeQuery};
use chrono::{Datelike, Local, NaiveDate};

/// Earliest date the dashboard lets anyone select.
pub fn earliest_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or(NaiveDate::MIN)
}

pub fn resolve_range(query: &RangeQuery) -> Result<DateRange, AppError> {
    let from = parse_date("from", query.from.as_deref())?;
    let to = parse_date("to", query.to.as_deref())?;
    resolve_range_at(Local::now().date_naive(), from, to)
}

/// Defaults to Jan 1 of `today`'s year through `today`, clamped to
/// `earliest_date()..=today`. A range lying wholly outside that window is
/// rejected rather than collapsed onto one of its edges.
pub fn resolve_range_at(
    today: NaiveDate,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<DateRange, AppError> {
    let earliest = earliest_date();
    if to.is_some_and(|to| to < earliest) || from.is_some_and(|from| from > today) {
        return Err(AppError::out_of_bounds(earliest, today));
    }

    let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
    let from = clamp(from.unwrap_or(year_start), today);
    let to = clamp(to.unwrap_or(today), today);

    if from > to {
        return Err(AppError::inverted_range(from, to));
    }

    Ok(DateRange { from, to })
}

fn clamp(date: NaiveDate, today: NaiveDate) -> NaiveDate {
    date.max(earliest_date()).min(today)
}

fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::invalid_date(field)),
    }
}
