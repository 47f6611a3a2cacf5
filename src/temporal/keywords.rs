//! Relative time keyword table
//!
//! Order matters: when two phrases of the same tier and length both match, the
//! one listed first wins.

use chrono::Weekday;

/// Part of a day, as fixed UTC clock hours `[start_hour, end_hour)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPart {
    EarlyMorning,
    Morning,
    Noon,
    Afternoon,
    Evening,
}

impl DayPart {
    pub fn hours(&self) -> (u32, u32) {
        match self {
            Self::EarlyMorning => (0, 6),
            Self::Morning => (0, 12),
            Self::Noon => (11, 13),
            Self::Afternoon => (12, 18),
            Self::Evening => (18, 24),
        }
    }
}

/// What a keyword refers to, relative to the current instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Day offset from today
    Day(i64),
    /// Next occurrence of a weekday, today included until noon is over
    Weekday(Weekday),
    /// A band of hours on some day
    DayPart(DayPart),
    /// Week offset from the current Monday-based week
    Week(i64),
    /// Month offset from the current month
    Month(i32),
    /// Quarter (1-4) of the current year
    Quarter(u32),
    /// Year offset from the current year
    Year(i32),
    /// The trailing seven days, today included
    Recent,
}

impl Anchor {
    /// Specificity tier; lower tiers win over higher ones
    pub fn tier(&self) -> u8 {
        match self {
            Self::Day(_) | Self::Weekday(_) => 0,
            Self::DayPart(_) => 1,
            Self::Week(_) => 2,
            Self::Month(_) => 3,
            Self::Quarter(_) => 4,
            Self::Year(_) => 5,
            Self::Recent => 6,
        }
    }

    /// Whether the anchor names a single calendar day
    pub fn is_day_precision(&self) -> bool {
        matches!(self, Self::Day(_) | Self::Weekday(_))
    }
}

/// One phrase in the keyword table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeKeyword {
    pub phrase: &'static str,
    /// Canonical label shared by synonyms
    pub label: &'static str,
    pub anchor: Anchor,
    /// Characters that may not directly precede the phrase
    pub blocked_before: &'static str,
    /// Characters that may not directly follow the phrase
    pub blocked_after: &'static str,
}

impl TimeKeyword {
    /// Whether an occurrence between `prev` and `next` is the phrase itself
    /// rather than part of a longer word (周日 in 本周日程, 前天 in 当前天气)
    pub fn accepts(&self, prev: Option<char>, next: Option<char>) -> bool {
        !prev.is_some_and(|c| self.blocked_before.contains(c))
            && !next.is_some_and(|c| self.blocked_after.contains(c))
    }
}

const fn kw(phrase: &'static str, label: &'static str, anchor: Anchor) -> TimeKeyword {
    guarded(phrase, label, anchor, "", "")
}

const fn guarded(
    phrase: &'static str,
    label: &'static str,
    anchor: Anchor,
    blocked_before: &'static str,
    blocked_after: &'static str,
) -> TimeKeyword {
    TimeKeyword {
        phrase,
        label,
        anchor,
        blocked_before,
        blocked_after,
    }
}

// 当前, 目前, 之前, 以前, 之后, 以后, 今后
const BEFORE_OR_AFTER_NOW: &str = "当目之以今";

// 日程, 日常, and "N times a week" (一周一次, 每周三次)
const WEEKDAY_COMPOUND: &str = "次";
const SUNDAY_COMPOUND: &str = "程常次";

pub static TIME_KEYWORDS: &[TimeKeyword] = &[
    // Exact days
    kw("今天", "今天", Anchor::Day(0)),
    kw("今日", "今天", Anchor::Day(0)),
    kw("today", "today", Anchor::Day(0)),
    kw("明天", "明天", Anchor::Day(1)),
    kw("明日", "明天", Anchor::Day(1)),
    kw("tomorrow", "tomorrow", Anchor::Day(1)),
    kw("大后天", "大后天", Anchor::Day(3)),
    guarded("后天", "后天", Anchor::Day(2), BEFORE_OR_AFTER_NOW, ""),
    guarded("后日", "后天", Anchor::Day(2), BEFORE_OR_AFTER_NOW, "程"),
    kw("day after tomorrow", "day after tomorrow", Anchor::Day(2)),
    kw("昨天", "昨天", Anchor::Day(-1)),
    kw("昨日", "昨天", Anchor::Day(-1)),
    kw("yesterday", "yesterday", Anchor::Day(-1)),
    kw("大前天", "大前天", Anchor::Day(-3)),
    guarded("前天", "前天", Anchor::Day(-2), BEFORE_OR_AFTER_NOW, ""),
    guarded("前日", "前天", Anchor::Day(-2), BEFORE_OR_AFTER_NOW, "程"),
    kw("day before yesterday", "day before yesterday", Anchor::Day(-2)),
    // Weekdays
    guarded("周一", "周一", Anchor::Weekday(Weekday::Mon), "", WEEKDAY_COMPOUND),
    guarded("周二", "周二", Anchor::Weekday(Weekday::Tue), "", WEEKDAY_COMPOUND),
    guarded("周三", "周三", Anchor::Weekday(Weekday::Wed), "", WEEKDAY_COMPOUND),
    guarded("周四", "周四", Anchor::Weekday(Weekday::Thu), "", WEEKDAY_COMPOUND),
    guarded("周五", "周五", Anchor::Weekday(Weekday::Fri), "", WEEKDAY_COMPOUND),
    guarded("周六", "周六", Anchor::Weekday(Weekday::Sat), "", WEEKDAY_COMPOUND),
    guarded("周日", "周日", Anchor::Weekday(Weekday::Sun), "", SUNDAY_COMPOUND),
    guarded("星期一", "周一", Anchor::Weekday(Weekday::Mon), "", WEEKDAY_COMPOUND),
    guarded("星期二", "周二", Anchor::Weekday(Weekday::Tue), "", WEEKDAY_COMPOUND),
    guarded("星期三", "周三", Anchor::Weekday(Weekday::Wed), "", WEEKDAY_COMPOUND),
    guarded("星期四", "周四", Anchor::Weekday(Weekday::Thu), "", WEEKDAY_COMPOUND),
    guarded("星期五", "周五", Anchor::Weekday(Weekday::Fri), "", WEEKDAY_COMPOUND),
    guarded("星期六", "周六", Anchor::Weekday(Weekday::Sat), "", WEEKDAY_COMPOUND),
    guarded("星期日", "周日", Anchor::Weekday(Weekday::Sun), "", SUNDAY_COMPOUND),
    guarded("星期天", "周日", Anchor::Weekday(Weekday::Sun), "", SUNDAY_COMPOUND),
    kw("monday", "monday", Anchor::Weekday(Weekday::Mon)),
    kw("tuesday", "tuesday", Anchor::Weekday(Weekday::Tue)),
    kw("wednesday", "wednesday", Anchor::Weekday(Weekday::Wed)),
    kw("thursday", "thursday", Anchor::Weekday(Weekday::Thu)),
    kw("friday", "friday", Anchor::Weekday(Weekday::Fri)),
    kw("saturday", "saturday", Anchor::Weekday(Weekday::Sat)),
    kw("sunday", "sunday", Anchor::Weekday(Weekday::Sun)),
    // Parts of the day
    kw("凌晨", "凌晨", Anchor::DayPart(DayPart::EarlyMorning)),
    kw("上午", "上午", Anchor::DayPart(DayPart::Morning)),
    kw("早上", "上午", Anchor::DayPart(DayPart::Morning)),
    kw("morning", "morning", Anchor::DayPart(DayPart::Morning)),
    kw("中午", "中午", Anchor::DayPart(DayPart::Noon)),
    kw("noon", "noon", Anchor::DayPart(DayPart::Noon)),
    kw("下午", "下午", Anchor::DayPart(DayPart::Afternoon)),
    kw("afternoon", "afternoon", Anchor::DayPart(DayPart::Afternoon)),
    kw("晚上", "晚上", Anchor::DayPart(DayPart::Evening)),
    kw("evening", "evening", Anchor::DayPart(DayPart::Evening)),
    kw("tonight", "tonight", Anchor::DayPart(DayPart::Evening)),
    kw("night", "evening", Anchor::DayPart(DayPart::Evening)),
    // Weeks
    kw("本周", "本周", Anchor::Week(0)),
    kw("这周", "本周", Anchor::Week(0)),
    kw("this week", "this week", Anchor::Week(0)),
    kw("上周", "上周", Anchor::Week(-1)),
    kw("last week", "last week", Anchor::Week(-1)),
    kw("下周", "下周", Anchor::Week(1)),
    kw("next week", "next week", Anchor::Week(1)),
    // Months
    kw("这个月", "这个月", Anchor::Month(0)),
    kw("本月", "这个月", Anchor::Month(0)),
    kw("这月", "这个月", Anchor::Month(0)),
    kw("月内", "这个月", Anchor::Month(0)),
    kw("this month", "this month", Anchor::Month(0)),
    kw("上个月", "上个月", Anchor::Month(-1)),
    kw("上月", "上个月", Anchor::Month(-1)),
    kw("last month", "last month", Anchor::Month(-1)),
    kw("下个月", "下个月", Anchor::Month(1)),
    kw("下月", "下个月", Anchor::Month(1)),
    kw("next month", "next month", Anchor::Month(1)),
    // Quarters
    kw("第一季度", "一季度", Anchor::Quarter(1)),
    kw("一季度", "一季度", Anchor::Quarter(1)),
    kw("第二季度", "二季度", Anchor::Quarter(2)),
    kw("二季度", "二季度", Anchor::Quarter(2)),
    kw("第三季度", "三季度", Anchor::Quarter(3)),
    kw("三季度", "三季度", Anchor::Quarter(3)),
    kw("第四季度", "四季度", Anchor::Quarter(4)),
    kw("四季度", "四季度", Anchor::Quarter(4)),
    kw("q1", "q1", Anchor::Quarter(1)),
    kw("q2", "q2", Anchor::Quarter(2)),
    kw("q3", "q3", Anchor::Quarter(3)),
    kw("q4", "q4", Anchor::Quarter(4)),
    // Years
    kw("今年", "今年", Anchor::Year(0)),
    kw("this year", "this year", Anchor::Year(0)),
    kw("明年", "明年", Anchor::Year(1)),
    kw("next year", "next year", Anchor::Year(1)),
    kw("去年", "去年", Anchor::Year(-1)),
    kw("last year", "last year", Anchor::Year(-1)),
    kw("大后年", "大后年", Anchor::Year(3)),
    kw("后年", "后年", Anchor::Year(2)),
    kw("大前年", "大前年", Anchor::Year(-3)),
    kw("前年", "前年", Anchor::Year(-2)),
    // Recent
    kw("近期", "近期", Anchor::Recent),
    kw("最近", "近期", Anchor::Recent),
    kw("这几天", "近期", Anchor::Recent),
    kw("recently", "recent", Anchor::Recent),
    kw("recent", "recent", Anchor::Recent),
    kw("lately", "recent", Anchor::Recent),
    kw("these days", "recent", Anchor::Recent),
];
