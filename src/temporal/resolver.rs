//! Time expression resolver
//!
//! Resolution order:
//! 1. Absolute dates. The first date pattern that matches decides; if its
//!    numbers do not form a real calendar date, resolution continues with
//!    keywords, never with a weaker date pattern.
//! 2. Keywords. The most specific tier wins, then the longest phrase, then
//!    table order.
//! 3. Composition. A part of the day narrows a day-precision anchor, and a
//!    weekday narrows an explicitly named week.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use regex::Regex;
use std::cmp::Reverse;
use std::sync::LazyLock;

use super::keywords::{Anchor, DayPart, TimeKeyword, TIME_KEYWORDS};
use super::{ResolvedTime, TimeRange, TimeSource};
use crate::text;

#[derive(Debug, Clone, Copy)]
enum DateStyle {
    /// 2025年1月21日
    CjkFull,
    /// 2025-01-21
    Hyphen,
    /// 2025/01/21
    Slash,
    /// 1月21日, also used for 1-21 and 1/21
    MonthDay,
}

struct DatePattern {
    regex: Regex,
    style: DateStyle,
}

static DATE_PATTERNS: LazyLock<Vec<DatePattern>> = LazyLock::new(|| {
    let specs = [
        (
            r"(?:^|[^0-9])(?P<span>(?P<y>[0-9]{4})年(?P<m>[0-9]{1,2})月(?P<d>[0-9]{1,2})[日号]?)",
            DateStyle::CjkFull,
        ),
        (
            r"(?:^|[^0-9])(?P<span>(?P<y>[0-9]{4})-(?P<m>[0-9]{1,2})-(?P<d>[0-9]{1,2}))(?:[^0-9]|$)",
            DateStyle::Hyphen,
        ),
        (
            r"(?:^|[^0-9])(?P<span>(?P<y>[0-9]{4})/(?P<m>[0-9]{1,2})/(?P<d>[0-9]{1,2}))(?:[^0-9]|$)",
            DateStyle::Slash,
        ),
        (
            r"(?:^|[^0-9])(?P<span>(?P<m>[0-9]{1,2})月(?P<d>[0-9]{1,2})[日号]?)",
            DateStyle::MonthDay,
        ),
        (
            r"(?:^|[^0-9/-])(?P<span>(?P<m>[0-9]{1,2})-(?P<d>[0-9]{1,2})[日号]?)(?:[^0-9/-]|$)",
            DateStyle::MonthDay,
        ),
        (
            r"(?:^|[^0-9/-])(?P<span>(?P<m>[0-9]{1,2})/(?P<d>[0-9]{1,2})[日号]?)(?:[^0-9/-]|$)",
            DateStyle::MonthDay,
        ),
    ];

    specs
        .into_iter()
        .map(|(pattern, style)| DatePattern {
            regex: Regex::new(pattern).expect("date pattern must compile"),
            style,
        })
        .collect()
});

/// Resolves time expressions in free text into UTC ranges
///
/// Stateless: every call is a pure function of the text and the reference
/// instant, so one resolver can be shared freely across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeExpressionResolver;

impl TimeExpressionResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve relative to the current instant
    pub fn resolve(&self, text: &str) -> Option<ResolvedTime> {
        self.resolve_at(text, Utc::now())
    }

    /// Resolve relative to `now`
    ///
    /// # Arguments
    /// * `text` - Query text, in any mix of Chinese and English
    /// * `now` - Reference instant; "today" is its UTC calendar date
    ///
    /// # Returns
    /// The best matching range and whether it came from an absolute date, or
    /// `None` when the text carries no usable time expression
    pub fn resolve_at(&self, text: &str, now: DateTime<Utc>) -> Option<ResolvedTime> {
        if text.trim().is_empty() {
            return None;
        }

        let today = now.date_naive();
        let hits = keyword_hits(text);
        let part = best_in(&hits, |a| matches!(a, Anchor::DayPart(_)));

        if let Some((date, label)) = match_absolute_date(text, today) {
            let range = day_range(date, &label, part)?;
            return Some(ResolvedTime {
                range,
                source: TimeSource::Absolute,
            });
        }

        let range = resolve_keywords(&hits, part, now)?;
        Some(ResolvedTime {
            range,
            source: TimeSource::Relative,
        })
    }

    /// Remove every recognized time phrase from `text`
    ///
    /// Date patterns and keyword phrases are blanked out; the result has its
    /// whitespace collapsed.
    pub fn strip(&self, text: &str) -> String {
        let mut ranges = Vec::new();

        for pattern in DATE_PATTERNS.iter() {
            for caps in pattern.regex.captures_iter(text) {
                if let Some(span) = caps.name("span") {
                    ranges.push((span.start(), span.end()));
                }
            }
        }

        for keyword in TIME_KEYWORDS {
            ranges.extend(keyword_spans(text, keyword));
        }

        text::collapse_whitespace(&text::blank_ranges(text, ranges))
    }
}

/// Keywords present in `text`, with their table position
fn keyword_hits(text: &str) -> Vec<(usize, &'static TimeKeyword)> {
    TIME_KEYWORDS
        .iter()
        .enumerate()
        .filter(|(_, keyword)| !keyword_spans(text, keyword).is_empty())
        .collect()
}

/// Byte ranges where `keyword` occurs as a phrase of its own
fn keyword_spans(text: &str, keyword: &TimeKeyword) -> Vec<(usize, usize)> {
    text::find_term(text, keyword.phrase)
        .into_iter()
        .filter(|&(start, end)| {
            keyword.accepts(text[..start].chars().next_back(), text[end..].chars().next())
        })
        .collect()
}

/// Best hit among anchors accepted by `filter`: lowest tier, longest phrase, table order
fn best_in(
    hits: &[(usize, &'static TimeKeyword)],
    filter: impl Fn(&Anchor) -> bool,
) -> Option<&'static TimeKeyword> {
    hits.iter()
        .filter(|(_, keyword)| filter(&keyword.anchor))
        .min_by_key(|(idx, keyword)| {
            (
                keyword.anchor.tier(),
                Reverse(keyword.phrase.chars().count()),
                *idx,
            )
        })
        .map(|(_, keyword)| *keyword)
}

fn match_absolute_date(text: &str, today: NaiveDate) -> Option<(NaiveDate, String)> {
    for pattern in DATE_PATTERNS.iter() {
        let Some(caps) = pattern.regex.captures(text) else {
            continue;
        };

        // This pattern decides, valid or not.
        let month: u32 = caps.name("m")?.as_str().parse().ok()?;
        let day: u32 = caps.name("d")?.as_str().parse().ok()?;

        let date = match caps.name("y") {
            Some(y) => {
                let year: i32 = y.as_str().parse().ok()?;
                NaiveDate::from_ymd_opt(year, month, day)
            }
            None => upcoming_month_day(today, month, day),
        };

        let Some(date) = date else {
            tracing::debug!("Ignoring invalid date '{}'", &caps["span"]);
            return None;
        };

        let label = match pattern.style {
            DateStyle::CjkFull => format!("{}年{}月{}日", date.year(), month, day),
            DateStyle::Hyphen => format!("{}-{:02}-{:02}", date.year(), month, day),
            DateStyle::Slash => format!("{}/{:02}/{:02}", date.year(), month, day),
            DateStyle::MonthDay => format!("{}月{}日", month, day),
        };
        return Some((date, label));
    }

    None
}

/// This year's month/day if it has not passed yet, otherwise the next year
/// that has it (February 29 waits for a leap year)
fn upcoming_month_day(today: NaiveDate, month: u32, day: u32) -> Option<NaiveDate> {
    (today.year()..=today.year() + 4)
        .filter_map(|year| NaiveDate::from_ymd_opt(year, month, day))
        .find(|date| *date >= today)
}

fn resolve_keywords(
    hits: &[(usize, &'static TimeKeyword)],
    part: Option<&'static TimeKeyword>,
    now: DateTime<Utc>,
) -> Option<TimeRange> {
    let today = now.date_naive();

    if let Some(day) = best_in(hits, Anchor::is_day_precision) {
        let week = best_in(hits, |a| matches!(a, Anchor::Week(_)));
        let (date, label) = resolve_day(day, week, now)?;
        return day_range(date, &label, part);
    }

    if part.is_some() {
        return day_range(today, "", part);
    }

    let keyword = best_in(hits, |_| true)?;
    let (start, end) = match keyword.anchor {
        Anchor::Week(offset) => {
            let start = monday_of(today).checked_add_signed(Duration::weeks(offset))?;
            (start, start.checked_add_signed(Duration::days(7))?)
        }
        Anchor::Month(offset) => {
            let start = shift_month(first_of_month(today)?, offset)?;
            (start, shift_month(start, 1)?)
        }
        Anchor::Quarter(quarter) => {
            let start = NaiveDate::from_ymd_opt(today.year(), 3 * (quarter - 1) + 1, 1)?;
            (start, shift_month(start, 3)?)
        }
        Anchor::Year(offset) => {
            let year = today.year().checked_add(offset)?;
            (
                NaiveDate::from_ymd_opt(year, 1, 1)?,
                NaiveDate::from_ymd_opt(year + 1, 1, 1)?,
            )
        }
        Anchor::Recent => (
            today.checked_sub_signed(Duration::days(6))?,
            today.checked_add_signed(Duration::days(1))?,
        ),
        Anchor::Day(_) | Anchor::Weekday(_) | Anchor::DayPart(_) => return None,
    };

    TimeRange::new(midnight(start), midnight(end), keyword.label)
}

/// Calendar day named by a day-precision keyword, with its label
fn resolve_day(
    day: &TimeKeyword,
    week: Option<&'static TimeKeyword>,
    now: DateTime<Utc>,
) -> Option<(NaiveDate, String)> {
    let today = now.date_naive();

    match day.anchor {
        Anchor::Day(offset) => Some((
            today.checked_add_signed(Duration::days(offset))?,
            day.label.to_string(),
        )),
        Anchor::Weekday(weekday) => {
            let target = i64::from(weekday.num_days_from_monday());
            match week {
                Some(TimeKeyword {
                    anchor: Anchor::Week(offset),
                    label: week_label,
                    ..
                }) => {
                    let date = monday_of(today)
                        .checked_add_signed(Duration::weeks(*offset) + Duration::days(target))?;
                    let label = if week_label.is_ascii() {
                        format!("{} {}", day.label, week_label)
                    } else {
                        format!("{}{}", week_label, day.label.trim_start_matches('周'))
                    };
                    Some((date, label))
                }
                _ => {
                    let current = i64::from(today.weekday().num_days_from_monday());
                    let mut ahead = (target - current).rem_euclid(7);
                    // Past noon, the same weekday means next week's
                    if ahead == 0 && now.hour() > 12 {
                        ahead = 7;
                    }
                    Some((
                        today.checked_add_signed(Duration::days(ahead))?,
                        day.label.to_string(),
                    ))
                }
            }
        }
        _ => None,
    }
}

/// Whole day, or the part of it named by `part`
fn day_range(date: NaiveDate, label: &str, part: Option<&TimeKeyword>) -> Option<TimeRange> {
    let start = midnight(date);

    let Some(part_keyword) = part else {
        return TimeRange::new(start, start + Duration::days(1), label);
    };
    let Anchor::DayPart(day_part) = part_keyword.anchor else {
        return TimeRange::new(start, start + Duration::days(1), label);
    };

    let (from, to) = day_part_hours(day_part);
    TimeRange::new(
        start + Duration::hours(from),
        start + Duration::hours(to),
        join_labels(label, part_keyword.label),
    )
}

fn day_part_hours(part: DayPart) -> (i64, i64) {
    let (from, to) = part.hours();
    (i64::from(from), i64::from(to))
}

fn join_labels(first: &str, second: &str) -> String {
    if first.is_empty() {
        second.to_string()
    } else if first.is_ascii() || second.is_ascii() {
        format!("{} {}", first, second)
    } else {
        format!("{}{}", first, second)
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

fn first_of_month(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
}

/// First day of the month `offset` months after the month of `first`
fn shift_month(first: NaiveDate, offset: i32) -> Option<NaiveDate> {
    let index = first.year().checked_mul(12)? + first.month0() as i32 + offset;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // Wednesday, 2025-01-15 10:30 UTC
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn resolve(text: &str) -> Option<ResolvedTime> {
        TimeExpressionResolver::new().resolve_at(text, now())
    }

    fn range(text: &str) -> TimeRange {
        resolve(text)
            .unwrap_or_else(|| panic!("no range for {}", text))
            .range
    }

    #[test]
    fn test_exact_days() {
        let today = range("今天有什么安排");
        assert_eq!(today.start, at(2025, 1, 15, 0));
        assert_eq!(today.end, at(2025, 1, 16, 0));
        assert_eq!(today.label, "今天");

        assert_eq!(range("明天").start, at(2025, 1, 16, 0));
        assert_eq!(range("后天").start, at(2025, 1, 17, 0));
        assert_eq!(range("大后天").start, at(2025, 1, 18, 0));
        assert_eq!(range("昨天").start, at(2025, 1, 14, 0));
        assert_eq!(range("大前天").start, at(2025, 1, 12, 0));
        assert_eq!(range("meetings tomorrow").label, "tomorrow");
        assert_eq!(range("the day after tomorrow").start, at(2025, 1, 17, 0));
    }

    #[test]
    fn test_synonyms_share_labels() {
        assert_eq!(range("今日").label, "今天");
        assert_eq!(range("这周").label, "本周");
        assert_eq!(range("早上").label, "上午");
        assert_eq!(range("本月").label, "这个月");
        assert_eq!(range("最近").label, "近期");
    }

    #[test]
    fn test_day_parts() {
        let afternoon = range("下午开会");
        assert_eq!(afternoon.start, at(2025, 1, 15, 12));
        assert_eq!(afternoon.end, at(2025, 1, 15, 18));

        let evening = range("晚上");
        assert_eq!(evening.end, at(2025, 1, 16, 0));

        let noon = range("noon");
        assert_eq!((noon.start, noon.end), (at(2025, 1, 15, 11), at(2025, 1, 15, 13)));
    }

    #[test]
    fn test_day_part_narrows_day() {
        let r = range("明天下午");
        assert_eq!(r.start, at(2025, 1, 16, 12));
        assert_eq!(r.end, at(2025, 1, 16, 18));
        assert_eq!(r.duration(), Duration::hours(6));
        assert_eq!(r.label, "明天下午");

        assert_eq!(range("tomorrow morning").label, "tomorrow morning");
    }

    #[test]
    fn test_weeks() {
        let this_week = range("本周");
        assert_eq!(this_week.start, at(2025, 1, 13, 0));
        assert_eq!(this_week.end, at(2025, 1, 20, 0));

        assert_eq!(range("上周").start, at(2025, 1, 6, 0));
        assert_eq!(range("next week").start, at(2025, 1, 20, 0));
    }

    #[test]
    fn test_weekdays() {
        // Upcoming occurrence, today included
        assert_eq!(range("周三").start, at(2025, 1, 15, 0));
        assert_eq!(range("周一").start, at(2025, 1, 20, 0));
        assert_eq!(range("friday").start, at(2025, 1, 17, 0));

        let next_monday = range("下周一");
        assert_eq!(next_monday.start, at(2025, 1, 20, 0));
        assert_eq!(next_monday.label, "下周一");

        let last_friday = range("上周五");
        assert_eq!(last_friday.start, at(2025, 1, 10, 0));
    }

    #[test]
    fn test_same_weekday_after_noon_is_next_week() {
        let resolver = TimeExpressionResolver::new();

        let at_noon = resolver.resolve_at("周三", at(2025, 1, 15, 12)).unwrap();
        assert_eq!(at_noon.range.start, at(2025, 1, 15, 0));

        let afternoon = resolver.resolve_at("周三", at(2025, 1, 15, 13)).unwrap();
        assert_eq!(afternoon.range.start, at(2025, 1, 22, 0));

        // An explicit week band is not shifted
        let this_week = resolver.resolve_at("本周三", at(2025, 1, 15, 20)).unwrap();
        assert_eq!(this_week.range.start, at(2025, 1, 15, 0));
    }

    #[test]
    fn test_compound_words_are_not_time_keywords() {
        let this_week = range("本周日程");
        assert_eq!(this_week.label, "本周");
        assert_eq!(this_week.duration(), Duration::days(7));

        let next_week = range("下周日程");
        assert_eq!(next_week.label, "下周");
        assert_eq!(next_week.start, at(2025, 1, 20, 0));

        assert!(resolve("当前日程").is_none());
        assert!(resolve("以后日程").is_none());
        assert!(resolve("目前天气").is_none());
        assert!(resolve("一周一次的例会").is_none());

        // The phrases still work on their own
        assert_eq!(range("本周日开会").label, "本周日");
        assert_eq!(range("前天的会议").start, at(2025, 1, 13, 0));

        let resolver = TimeExpressionResolver::new();
        assert_eq!(resolver.strip("本周日程"), "日程");
    }

    #[test]
    fn test_months_cross_year_boundaries() {
        let last = range("上个月");
        assert_eq!(last.start, at(2024, 12, 1, 0));
        assert_eq!(last.end, at(2025, 1, 1, 0));

        let next = range("下月");
        assert_eq!(next.start, at(2025, 2, 1, 0));
        assert_eq!(next.end, at(2025, 3, 1, 0));
        assert_eq!(next.label, "下个月");
    }

    #[test]
    fn test_quarters_and_years() {
        let q4 = range("第四季度");
        assert_eq!(q4.start, at(2025, 10, 1, 0));
        assert_eq!(q4.end, at(2026, 1, 1, 0));
        assert_eq!(q4.label, "四季度");

        assert_eq!(range("Q2 plans").start, at(2025, 4, 1, 0));

        let last_year = range("去年");
        assert_eq!(last_year.start, at(2024, 1, 1, 0));
        assert_eq!(last_year.end, at(2025, 1, 1, 0));
        assert_eq!(range("大后年").start, at(2028, 1, 1, 0));
    }

    #[test]
    fn test_recent_is_trailing_week() {
        let r = range("最近的笔记");
        assert_eq!(r.start, at(2025, 1, 9, 0));
        assert_eq!(r.end, at(2025, 1, 16, 0));
    }

    #[test]
    fn test_more_specific_tier_wins() {
        // Day beats month
        assert_eq!(range("这个月明天").label, "明天");
        // Week beats recent
        assert_eq!(range("近期本周").label, "本周");
    }

    #[test]
    fn test_absolute_dates() {
        let full = resolve("2025年1月21日的会议").unwrap();
        assert_eq!(full.source, TimeSource::Absolute);
        assert_eq!(full.range.start, at(2025, 1, 21, 0));
        assert_eq!(full.range.duration(), Duration::hours(24));
        assert_eq!(full.range.label, "2025年1月21日");

        assert_eq!(range("2025-01-21").label, "2025-01-21");
        assert_eq!(range("2025/1/21").label, "2025/01/21");
        assert_eq!(range("1月21号").start, at(2025, 1, 21, 0));
        assert_eq!(range("01月25日").start, at(2025, 1, 25, 0));
        assert_eq!(range("meeting 1/21").start, at(2025, 1, 21, 0));
        assert_eq!(range("3-1 deadline").start, at(2025, 3, 1, 0));
    }

    #[test]
    fn test_absolute_date_beats_keywords() {
        assert_eq!(range("明天 2025-02-01").start, at(2025, 2, 1, 0));
    }

    #[test]
    fn test_absolute_date_with_day_part() {
        let r = range("2025年1月21日下午");
        assert_eq!(r.start, at(2025, 1, 21, 12));
        assert_eq!(r.label, "2025年1月21日下午");
    }

    #[test]
    fn test_month_day_rolls_past_dates_to_next_year() {
        assert_eq!(range("12月30日").start, at(2025, 12, 30, 0));
        assert_eq!(range("1月10日").start, at(2026, 1, 10, 0));
        assert_eq!(range("1/10").start, at(2026, 1, 10, 0));
        assert_eq!(range("6月1日").start, at(2025, 6, 1, 0));
        // Today is not past
        assert_eq!(range("1月15日").start, at(2025, 1, 15, 0));

        let leap = TimeExpressionResolver::new()
            .resolve_at("2月29日", at(2025, 3, 1, 9))
            .unwrap();
        assert_eq!(leap.range.start, at(2028, 2, 29, 0));
    }

    #[test]
    fn test_month_day_suffix_after_separator() {
        let resolver = TimeExpressionResolver::new();
        for text in ["1-21号", "1/21日", "01-21日"] {
            let r = resolve(text).unwrap();
            assert_eq!(r.source, TimeSource::Absolute);
            assert_eq!(r.range.start, at(2025, 1, 21, 0));
            assert_eq!(resolver.strip(text), "", "{}", text);
        }
    }

    #[test]
    fn test_invalid_dates() {
        assert!(resolve("2月30日").is_none());
        assert!(resolve("13月1日").is_none());
        assert!(resolve("2025年2月29日").is_none());
        assert!(resolve("2024年2月29日").is_some());
    }

    #[test]
    fn test_invalid_date_falls_through_to_keywords() {
        let r = resolve("明天 2月30日").unwrap();
        assert_eq!(r.source, TimeSource::Relative);
        assert_eq!(r.range.label, "明天");
    }

    #[test]
    fn test_no_time_expression() {
        assert!(resolve("").is_none());
        assert!(resolve("   ").is_none());
        assert!(resolve("关于Python的笔记").is_none());
        assert!(resolve("showcase the android app").is_none());
    }

    #[test]
    fn test_strip() {
        let resolver = TimeExpressionResolver::new();
        assert_eq!(resolver.strip("今天关于Python的笔记"), "关于Python的笔记");
        assert_eq!(resolver.strip("明天下午 开会"), "开会");
        assert_eq!(resolver.strip("2025-01-21 standup notes"), "standup notes");
        assert_eq!(resolver.strip("Tomorrow review"), "review");
    }
}
