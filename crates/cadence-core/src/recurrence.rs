use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::models::SchedulingConfig;

/// Hard ceiling on instances generated from one request unless configured otherwise.
pub const DEFAULT_INSTANCE_CAP: usize = 365;
/// Horizon applied when a request carries no explicit end date.
pub const DEFAULT_HORIZON_MONTHS: u32 = 12;

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

// ============================================================================
// Rule building blocks
// ============================================================================

/// Non-empty set of weekdays. Bit `n` is set for the weekday `n` days from Monday.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Weekday>", into = "Vec<Weekday>")]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub fn new(days: impl IntoIterator<Item = Weekday>) -> Result<Self, CoreError> {
        let mask = days
            .into_iter()
            .fold(0u8, |mask, day| mask | (1 << day.num_days_from_monday()));
        if mask == 0 {
            return Err(CoreError::InvalidRule(
                "weekly recurrence needs at least one weekday".to_string(),
            ));
        }
        Ok(Self(mask))
    }

    /// Builds a set from ISO weekday numbers (1 = Monday .. 7 = Sunday).
    pub fn from_numbers(numbers: &[u8]) -> Result<Self, CoreError> {
        let days = numbers
            .iter()
            .map(|&n| weekday_from_number(n))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(days)
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Never true for a set built through `new`.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterates the selected days, Monday first.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        WEEK.iter().copied().filter(move |day| self.contains(*day))
    }
}

impl fmt::Debug for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl TryFrom<Vec<Weekday>> for WeekdaySet {
    type Error = CoreError;

    fn try_from(days: Vec<Weekday>) -> Result<Self, Self::Error> {
        Self::new(days)
    }
}

impl From<WeekdaySet> for Vec<Weekday> {
    fn from(set: WeekdaySet) -> Self {
        set.iter().collect()
    }
}

/// Calendar day requested for a monthly rule, 1..=31. Clamped to the month length on expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct DayOfMonth(u8);

impl DayOfMonth {
    pub fn new(day: u32) -> Result<Self, CoreError> {
        if (1..=31).contains(&day) {
            Ok(Self(day as u8))
        } else {
            Err(CoreError::InvalidRule(format!(
                "day of month must be between 1 and 31, got {}",
                day
            )))
        }
    }

    pub fn get(&self) -> u32 {
        u32::from(self.0)
    }
}

impl TryFrom<u32> for DayOfMonth {
    type Error = CoreError;

    fn try_from(day: u32) -> Result<Self, Self::Error> {
        Self::new(day)
    }
}

impl From<DayOfMonth> for u32 {
    fn from(day: DayOfMonth) -> Self {
        day.get()
    }
}

/// Which occurrence of a weekday within a month. `Last` is ordinal 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ordinal {
    First,
    Second,
    Third,
    Fourth,
    Last,
}

impl Ordinal {
    pub fn from_number(n: u8) -> Result<Self, CoreError> {
        match n {
            1 => Ok(Ordinal::First),
            2 => Ok(Ordinal::Second),
            3 => Ok(Ordinal::Third),
            4 => Ok(Ordinal::Fourth),
            5 => Ok(Ordinal::Last),
            _ => Err(CoreError::InvalidRule(format!(
                "weekday ordinal must be between 1 and 5, got {}",
                n
            ))),
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Ordinal::First => 1,
            Ordinal::Second => 2,
            Ordinal::Third => 3,
            Ordinal::Fourth => 4,
            Ordinal::Last => 5,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Ordinal::First => "First",
            Ordinal::Second => "Second",
            Ordinal::Third => "Third",
            Ordinal::Fourth => "Fourth",
            Ordinal::Last => "Last",
        }
    }
}

impl FromStr for Ordinal {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "1st" | "first" => Ok(Ordinal::First),
            "2" | "2nd" | "second" => Ok(Ordinal::Second),
            "3" | "3rd" | "third" => Ok(Ordinal::Third),
            "4" | "4th" | "fourth" => Ok(Ordinal::Fourth),
            "5" | "5th" | "last" => Ok(Ordinal::Last),
            _ => Err(CoreError::InvalidRule(format!("unknown ordinal '{}'", s))),
        }
    }
}

/// How a monthly rule picks its single date in each month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum MonthlyRule {
    DayOfMonth { day: DayOfMonth },
    OrdinalWeekday { ordinal: Ordinal, weekday: Weekday },
    LastDayOfMonth,
}

impl MonthlyRule {
    /// Resolves the rule to its date within `year`/`month`.
    pub fn resolve(&self, year: i32, month: u32) -> Option<NaiveDate> {
        match self {
            MonthlyRule::DayOfMonth { day } => {
                let day = day.get().min(days_in_month(year, month));
                NaiveDate::from_ymd_opt(year, month, day)
            }
            MonthlyRule::OrdinalWeekday { ordinal, weekday } => match ordinal {
                Ordinal::Last => last_weekday_of_month(year, month, *weekday),
                _ => NaiveDate::from_weekday_of_month_opt(year, month, *weekday, ordinal.number())
                    .or_else(|| last_weekday_of_month(year, month, *weekday)),
            },
            MonthlyRule::LastDayOfMonth => {
                NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))
            }
        }
    }
}

// ============================================================================
// RecurrenceRule
// ============================================================================

/// How a single program repeats. Invalid rules are unrepresentable: every
/// constructor validates, and deserialisation goes through the same checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecurrenceRule {
    None,
    Daily,
    Weekly { weekdays: WeekdaySet },
    Monthly { rule: MonthlyRule },
}

impl RecurrenceRule {
    pub fn weekly(days: impl IntoIterator<Item = Weekday>) -> Result<Self, CoreError> {
        Ok(RecurrenceRule::Weekly {
            weekdays: WeekdaySet::new(days)?,
        })
    }

    pub fn monthly_on_day(day: u32) -> Result<Self, CoreError> {
        Ok(RecurrenceRule::Monthly {
            rule: MonthlyRule::DayOfMonth {
                day: DayOfMonth::new(day)?,
            },
        })
    }

    /// `ordinal` 1..=4 selects the nth occurrence, 5 the last one.
    pub fn monthly_on_weekday(ordinal: u8, weekday: Weekday) -> Result<Self, CoreError> {
        Ok(RecurrenceRule::Monthly {
            rule: MonthlyRule::OrdinalWeekday {
                ordinal: Ordinal::from_number(ordinal)?,
                weekday,
            },
        })
    }

    pub fn monthly_last_day() -> Self {
        RecurrenceRule::Monthly {
            rule: MonthlyRule::LastDayOfMonth,
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, RecurrenceRule::None)
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecurrenceRule::None => write!(f, "Once"),
            RecurrenceRule::Daily => write!(f, "Daily"),
            RecurrenceRule::Weekly { weekdays } => {
                let days: Vec<String> = weekdays.iter().map(|d| d.to_string()).collect();
                write!(f, "Weekly: {}", days.join(", "))
            }
            RecurrenceRule::Monthly { rule } => match rule {
                MonthlyRule::DayOfMonth { day } => write!(f, "Monthly on day {}", day.get()),
                MonthlyRule::OrdinalWeekday { ordinal, weekday } => write!(
                    f,
                    "{} {} of month",
                    ordinal.label(),
                    weekday_full_name(*weekday)
                ),
                MonthlyRule::LastDayOfMonth => write!(f, "Monthly on last day"),
            },
        }
    }
}

/// Parses the compact rule syntax:
/// `none`, `daily`, `weekdays`, `weekends`, `weekly:mon,wed`,
/// `monthly:day=31`, `monthly:31`, `monthly:2nd-tue`, `monthly:last-fri`, `monthly:last-day`.
impl FromStr for RecurrenceRule {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_lowercase();
        let (head, tail) = match input.split_once(':') {
            Some((head, tail)) => (head.trim(), Some(tail.trim())),
            None => (input.as_str(), None),
        };

        match (head, tail) {
            ("none" | "once", None) => Ok(RecurrenceRule::None),
            ("daily", None) => Ok(RecurrenceRule::Daily),
            ("weekdays", None) => RecurrenceRule::weekly(WEEK[..5].iter().copied()),
            ("weekends", None) => RecurrenceRule::weekly([Weekday::Sat, Weekday::Sun]),
            ("weekly", Some(days)) => {
                let days = days
                    .split(',')
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(parse_weekday)
                    .collect::<Result<Vec<_>, _>>()?;
                RecurrenceRule::weekly(days)
            }
            ("monthly", Some(pattern)) => parse_monthly(pattern),
            _ => Err(CoreError::InvalidRule(format!(
                "unrecognised recurrence '{}'",
                s
            ))),
        }
    }
}

fn parse_monthly(pattern: &str) -> Result<RecurrenceRule, CoreError> {
    if pattern == "last-day" || pattern == "lastday" {
        return Ok(RecurrenceRule::monthly_last_day());
    }
    let day_text = pattern.strip_prefix("day=").unwrap_or(pattern);
    if let Ok(day) = day_text.parse::<u32>() {
        return RecurrenceRule::monthly_on_day(day);
    }
    let (ordinal, weekday) = pattern.split_once('-').ok_or_else(|| {
        CoreError::InvalidRule(format!("unrecognised monthly recurrence '{}'", pattern))
    })?;
    Ok(RecurrenceRule::Monthly {
        rule: MonthlyRule::OrdinalWeekday {
            ordinal: ordinal.parse()?,
            weekday: parse_weekday(weekday)?,
        },
    })
}

fn parse_weekday(s: &str) -> Result<Weekday, CoreError> {
    s.parse::<Weekday>()
        .map_err(|_| CoreError::InvalidRule(format!("unknown weekday '{}'", s)))
}

// ============================================================================
// SeriesRequest
// ============================================================================

/// Input to expansion: where a series starts, how it repeats and how far it may run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRequest {
    anchor: NaiveDate,
    rule: RecurrenceRule,
    end: NaiveDate,
    instance_cap: usize,
}

impl SeriesRequest {
    /// Request with the default horizon (one year) and cap (365).
    pub fn new(anchor: NaiveDate, rule: RecurrenceRule) -> Self {
        Self {
            anchor,
            rule,
            end: default_end(anchor, DEFAULT_HORIZON_MONTHS),
            instance_cap: DEFAULT_INSTANCE_CAP,
        }
    }

    /// Applies configured defaults for whichever bounds the caller left out.
    pub fn from_config(
        anchor: NaiveDate,
        rule: RecurrenceRule,
        end: Option<NaiveDate>,
        instance_cap: Option<usize>,
        config: &SchedulingConfig,
    ) -> Result<Self, CoreError> {
        let request = Self {
            anchor,
            rule,
            end: default_end(anchor, config.default_horizon_months),
            instance_cap: config.default_instance_cap,
        };
        let request = match end {
            Some(end) => request.with_end_date(end)?,
            None => request,
        };
        match instance_cap {
            Some(cap) => request.with_instance_cap(cap),
            None => request.with_instance_cap(config.default_instance_cap),
        }
    }

    pub fn with_end_date(mut self, end: NaiveDate) -> Result<Self, CoreError> {
        if end < self.anchor {
            return Err(CoreError::InvalidInput(format!(
                "end date {} is before anchor date {}",
                end, self.anchor
            )));
        }
        self.end = end;
        Ok(self)
    }

    pub fn with_instance_cap(mut self, cap: usize) -> Result<Self, CoreError> {
        if cap == 0 {
            return Err(CoreError::InvalidInput(
                "instance cap must be at least 1".to_string(),
            ));
        }
        self.instance_cap = cap;
        Ok(self)
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub fn rule(&self) -> &RecurrenceRule {
        &self.rule
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn instance_cap(&self) -> usize {
        self.instance_cap
    }
}

fn default_end(anchor: NaiveDate, horizon_months: u32) -> NaiveDate {
    anchor
        .checked_add_months(Months::new(horizon_months))
        .unwrap_or(NaiveDate::MAX)
}

// ============================================================================
// RecurrenceExpander
// ============================================================================

/// Result of expanding a request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Expansion {
    /// Strictly increasing, within `[anchor, end]`.
    pub dates: Vec<NaiveDate>,
    /// More dates existed before the end date but the instance cap stopped expansion.
    pub truncated: bool,
}

impl Expansion {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// RecurrenceExpander: turns a declarative rule into concrete calendar dates.
///
/// Expansion is pure and synchronous. Malformed rules cannot reach it because
/// `RecurrenceRule` and `SeriesRequest` validate on construction.
pub struct RecurrenceExpander;

impl RecurrenceExpander {
    /// Expands `request` into at most `instance_cap` dates.
    ///
    /// # Behavior
    /// - `None` yields the anchor only
    /// - `Daily` and `Weekly` walk forward one day at a time from the anchor
    /// - `Monthly` resolves one date per month starting at the anchor's month,
    ///   dropping dates outside `[anchor, end]`
    /// - `truncated` is set when the cap cut off dates that were still in range
    pub fn expand(request: &SeriesRequest) -> Expansion {
        let mut occurrences = Self::occurrences(request);
        let dates: Vec<NaiveDate> = occurrences
            .by_ref()
            .take(request.instance_cap())
            .collect();
        let truncated = occurrences.next().is_some();
        Expansion { dates, truncated }
    }

    /// Lazy, uncapped iterator over every date the rule produces up to the end date.
    pub fn occurrences(request: &SeriesRequest) -> Occurrences {
        let cursor = match request.rule() {
            RecurrenceRule::Monthly { .. } => request.anchor().with_day(1),
            _ => Some(request.anchor()),
        };
        Occurrences {
            rule: *request.rule(),
            anchor: request.anchor(),
            end: request.end(),
            cursor,
            last: None,
        }
    }
}

/// Iterator returned by [`RecurrenceExpander::occurrences`].
#[derive(Debug, Clone)]
pub struct Occurrences {
    rule: RecurrenceRule,
    anchor: NaiveDate,
    end: NaiveDate,
    /// Next day to inspect, or the first day of the next month for monthly rules.
    cursor: Option<NaiveDate>,
    last: Option<NaiveDate>,
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        loop {
            let cursor = self.cursor?;
            if cursor > self.end {
                self.cursor = None;
                return None;
            }

            let candidate = match &self.rule {
                RecurrenceRule::None => {
                    self.cursor = None;
                    Some(cursor)
                }
                RecurrenceRule::Daily => {
                    self.cursor = cursor.succ_opt();
                    Some(cursor)
                }
                RecurrenceRule::Weekly { weekdays } => {
                    self.cursor = cursor.succ_opt();
                    weekdays.contains(cursor.weekday()).then_some(cursor)
                }
                RecurrenceRule::Monthly { rule } => {
                    self.cursor = cursor.checked_add_months(Months::new(1));
                    rule.resolve(cursor.year(), cursor.month())
                }
            };

            let Some(date) = candidate else { continue };
            if date < self.anchor || date > self.end {
                continue;
            }
            // Boundary months can resolve to an already emitted date.
            if self.last.is_some_and(|last| date <= last) {
                continue;
            }
            self.last = Some(date);
            return Some(date);
        }
    }
}

// ============================================================================
// Calendar helpers
// ============================================================================

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if NaiveDate::from_ymd_opt(year, 2, 29).is_some() => 29,
        _ => 28,
    }
}

/// Last date in the month falling on `weekday`.
pub fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))?;
    let back = (last.weekday().num_days_from_monday() + 7 - weekday.num_days_from_monday()) % 7;
    last.checked_sub_days(Days::new(u64::from(back)))
}

/// ISO weekday number: 1 = Monday .. 7 = Sunday.
pub fn weekday_from_number(n: u8) -> Result<Weekday, CoreError> {
    match n {
        1..=7 => Ok(WEEK[usize::from(n - 1)]),
        _ => Err(CoreError::InvalidRule(format!(
            "weekday number must be between 1 and 7, got {}",
            n
        ))),
    }
}

pub fn weekday_full_name(day: Weekday) -> &'static str {
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
