//! Rules file parser.
//!
//! ```toml
//! [[rules]]
//! query = 'sum(minecraft_players_online) > 15'
//! action = 1
//!
//! [[schedule]]
//! cron = "0 4 * * *"
//! action = -1
//! if_size = "> 0"
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::Utc;
use cron::Schedule;
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesFile {
    #[serde(default)]
    pub rules: Vec<ScaleRule>,
    #[serde(default)]
    pub schedule: Vec<ScaleSchedule>,
}

/// A metric-driven scaling rule.
///
/// The rule is met when `query` returns a non-empty instant vector.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScaleRule {
    pub query: String,
    /// Steps to move along the size ladder: positive grows, negative shrinks.
    pub action: i32,
}

/// A time-driven scaling entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScaleSchedule {
    /// Cron expression. Five-field expressions use crontab numbering and
    /// fire at second zero.
    pub cron: String,
    pub action: i32,
    /// Only act when the current ladder index satisfies this guard.
    #[serde(default)]
    pub if_size: Option<SizeGuard>,
}

impl ScaleSchedule {
    /// Parsed form of `cron`.
    pub fn schedule(&self) -> Result<Schedule, ConfigError> {
        parse_cron(&self.cron)
    }
}

impl RulesFile {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        content.parse()
    }

    /// Reject entries that would only fail once their timer is armed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for entry in &self.schedule {
            let schedule = entry.schedule()?;
            if schedule.upcoming(Utc).next().is_none() {
                return Err(ConfigError::InvalidCron {
                    expr: entry.cron.clone(),
                    reason: "never fires".to_string(),
                });
            }
        }
        Ok(())
    }
}

impl FromStr for RulesFile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rules: RulesFile = toml::from_str(s)?;
        rules.validate()?;
        Ok(rules)
    }
}

/// Parse a cron expression, accepting the classic five-field form and
/// bare shorthands (`daily` → `@daily`).
///
/// In five-field expressions the day of week counts from Sunday as 0 (7 is
/// also Sunday), as in crontab. Six- and seven-field expressions are passed
/// to the `cron` crate unchanged, where Sunday is 1.
pub fn parse_cron(expr: &str) -> Result<Schedule, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidCron {
        expr: expr.to_string(),
        reason,
    };
    let normalized = normalize_cron(expr).map_err(invalid)?;
    Schedule::from_str(&normalized).map_err(|e| invalid(e.to_string()))
}

fn normalize_cron(expr: &str) -> Result<String, String> {
    let trimmed = expr.trim();
    if !trimmed.is_empty()
        && !trimmed.starts_with('@')
        && trimmed.chars().all(|ch| ch.is_ascii_alphabetic())
    {
        return Ok(format!("@{trimmed}"));
    }
    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    if let [minute, hour, day, month, weekday] = fields[..] {
        let weekday = weekday_names(weekday)?;
        return Ok(format!("0 {minute} {hour} {day} {month} {weekday}"));
    }
    Ok(trimmed.to_string())
}

const WEEKDAYS: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// Rewrite a crontab day-of-week field with day names. Items without
/// digits are already names (or `*`) and pass through.
fn weekday_names(field: &str) -> Result<String, String> {
    let items = field
        .split(',')
        .map(|item| {
            if !item.bytes().any(|b| b.is_ascii_digit()) {
                return Ok(item.to_string());
            }
            let (base, step) = match item.split_once('/') {
                Some((base, step)) => match step.parse::<usize>() {
                    Ok(step) if step > 0 => (base, Some(step)),
                    _ => return Err(format!("invalid day-of-week step in {item:?}")),
                },
                None => (item, None),
            };
            let (first, last) = match (base, base.split_once('-')) {
                ("*" | "?", _) => (0, 6),
                (_, Some((first, last))) => (weekday(first)?, weekday(last)?),
                // `N/step` runs to the end of the week.
                (_, None) if step.is_some() => (weekday(base)?, 6),
                (_, None) => {
                    let day = weekday(base)?;
                    (day, day)
                }
            };
            if first > last {
                return Err(format!("day-of-week range {item:?} runs backwards"));
            }

            let mut days = [false; 7];
            for day in (first..=last).step_by(step.unwrap_or(1)) {
                days[day % 7] = true;
            }
            Ok(WEEKDAYS
                .iter()
                .zip(days)
                .filter_map(|(name, on)| on.then_some(*name))
                .collect::<Vec<_>>()
                .join(","))
        })
        .collect::<Result<Vec<_>, String>>()?;
    Ok(items.join(","))
}

/// A crontab weekday: `0`-`7` (both ends Sunday) or a three-letter name.
fn weekday(token: &str) -> Result<usize, String> {
    if let Ok(day) = token.parse::<usize>() {
        return if day <= 7 {
            Ok(day)
        } else {
            Err(format!("day of week {day} out of range 0-7"))
        };
    }
    WEEKDAYS
        .iter()
        .position(|name| name.eq_ignore_ascii_case(token))
        .ok_or_else(|| format!("unknown day of week {token:?}"))
}

/// Comparison operator of a [`SizeGuard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
}

impl Comparison {
    fn symbol(self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Gt => ">",
            Comparison::Le => "<=",
            Comparison::Ge => ">=",
            Comparison::Eq => "=",
        }
    }
}

impl FromStr for Comparison {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(Comparison::Lt),
            ">" => Ok(Comparison::Gt),
            "<=" => Ok(Comparison::Le),
            ">=" => Ok(Comparison::Ge),
            "=" | "==" => Ok(Comparison::Eq),
            other => Err(format!("unknown operator {other:?}")),
        }
    }
}

/// Condition on the current ladder index, written as `"<op> <operand>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct SizeGuard {
    pub op: Comparison,
    pub operand: i64,
}

impl SizeGuard {
    pub fn matches(&self, current_index: usize) -> bool {
        let current = current_index as i64;
        match self.op {
            Comparison::Lt => current < self.operand,
            Comparison::Gt => current > self.operand,
            Comparison::Le => current <= self.operand,
            Comparison::Ge => current >= self.operand,
            Comparison::Eq => current == self.operand,
        }
    }
}

impl fmt::Display for SizeGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op.symbol(), self.operand)
    }
}

impl FromStr for SizeGuard {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| ConfigError::InvalidGuard {
            guard: s.to_string(),
            reason,
        };
        let (op, operand) = s
            .trim()
            .split_once(' ')
            .ok_or_else(|| invalid("expected \"<op> <operand>\"".to_string()))?;
        let op = op.parse::<Comparison>().map_err(invalid)?;
        let operand = operand
            .trim()
            .parse::<i64>()
            .map_err(|e| invalid(format!("bad operand: {e}")))?;
        Ok(SizeGuard { op, operand })
    }
}

impl TryFrom<String> for SizeGuard {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Weekday};

    #[test]
    fn parse_full_rules_file() {
        let toml_str = r#"
[[rules]]
query = 'sum(minecraft_players_online) > 15'
action = 1

[[rules]]
query = 'sum(minecraft_players_online) < 2'
action = -1

[[schedule]]
cron = "0 4 * * *"
action = -1
if_size = "> 0"
"#;
        let rules: RulesFile = toml_str.parse().unwrap();
        assert_eq!(rules.rules.len(), 2);
        assert_eq!(rules.rules[0].action, 1);
        assert_eq!(rules.rules[1].query, "sum(minecraft_players_online) < 2");
        assert_eq!(rules.schedule.len(), 1);
        assert_eq!(
            rules.schedule[0].if_size,
            Some(SizeGuard {
                op: Comparison::Gt,
                operand: 0
            })
        );
    }

    #[test]
    fn missing_tables_default_to_empty() {
        let rules: RulesFile = "".parse().unwrap();
        assert!(rules.rules.is_empty());
        assert!(rules.schedule.is_empty());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = "[[rules]]\nquery = 'up'\naction = 1\nweight = 3\n"
            .parse::<RulesFile>()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn invalid_guard_fails_at_load() {
        let toml_str = r#"
[[schedule]]
cron = "@daily"
action = -1
if_size = "~ 2"
"#;
        let err = toml_str.parse::<RulesFile>().unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("unknown operator"));
    }

    #[test]
    fn invalid_cron_fails_at_load() {
        let toml_str = r#"
[[schedule]]
cron = "every tuesday-ish"
action = 1
"#;
        let err = toml_str.parse::<RulesFile>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCron { .. }));
    }

    #[test]
    fn from_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.toml");
        std::fs::write(&path, "[[rules]]\nquery = 'up == 0'\naction = -1\n").unwrap();

        let rules = RulesFile::from_file(&path).unwrap();
        assert_eq!(rules.rules[0].action, -1);
    }

    #[test]
    fn from_file_reports_missing_path() {
        let err = RulesFile::from_file(Path::new("/nonexistent/rules.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn five_field_cron_gets_seconds() {
        assert_eq!(normalize_cron("0 4 * * *").unwrap(), "0 0 4 * * *");
        assert_eq!(normalize_cron("0 0 4 * * *").unwrap(), "0 0 4 * * *");
        assert_eq!(normalize_cron("daily").unwrap(), "@daily");
        assert_eq!(normalize_cron("@hourly").unwrap(), "@hourly");
        assert!(parse_cron("30 2 * * *").is_ok());
        assert!(parse_cron("hourly").is_ok());
    }

    /// Weekdays of the next `n` fire times after Saturday 2024-05-04.
    fn fire_days(expr: &str, n: usize) -> Vec<Weekday> {
        let saturday = Utc.with_ymd_and_hms(2024, 5, 4, 12, 0, 0).unwrap();
        parse_cron(expr)
            .unwrap()
            .after(&saturday)
            .take(n)
            .map(|at| at.weekday())
            .collect()
    }

    #[test]
    fn five_field_weekdays_count_from_sunday_zero() {
        use Weekday::*;
        assert_eq!(fire_days("0 4 * * 1", 1), [Mon]);
        assert_eq!(fire_days("0 4 * * 1-5", 6), [Mon, Tue, Wed, Thu, Fri, Mon]);
        assert_eq!(fire_days("0 4 * * 0", 1), [Sun]);
        assert_eq!(fire_days("0 4 * * 7", 1), [Sun]);
        assert_eq!(fire_days("0 4 * * 5-7", 3), [Sun, Fri, Sat]);
        assert_eq!(fire_days("0 4 * * */2", 4), [Sun, Tue, Thu, Sat]);
        assert_eq!(fire_days("0 4 * * 1,3", 2), [Mon, Wed]);
        assert_eq!(fire_days("0 4 * * MON-FRI", 1), [Mon]);
    }

    #[test]
    fn five_field_weekday_rewrite() {
        assert_eq!(normalize_cron("0 4 * * 1-5").unwrap(), "0 0 4 * * MON,TUE,WED,THU,FRI");
        assert_eq!(normalize_cron("0 4 * * 6,0").unwrap(), "0 0 4 * * SAT,SUN");
        assert_eq!(normalize_cron("0 4 * * 1/3").unwrap(), "0 0 4 * * MON,THU");
        assert_eq!(normalize_cron("0 4 * * sat").unwrap(), "0 0 4 * * sat");
        // Six-field expressions keep the crate's numbering.
        assert_eq!(normalize_cron("0 0 4 * * 2").unwrap(), "0 0 4 * * 2");
    }

    #[test]
    fn five_field_rejects_bad_weekdays() {
        for expr in ["0 4 * * 8", "0 4 * * 5-1", "0 4 * * */0", "0 4 * * 1-x"] {
            let err = parse_cron(expr).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidCron { .. }), "{expr}: {err}");
        }
    }

    #[test]
    fn guard_operators() {
        let at = |guard: &str, index: usize| guard.parse::<SizeGuard>().unwrap().matches(index);

        assert!(at("< 2", 1));
        assert!(!at("< 2", 2));
        assert!(at("> 0", 1));
        assert!(!at("> 0", 0));
        assert!(at("<= 2", 2));
        assert!(!at("<= 2", 3));
        assert!(at(">= 1", 1));
        assert!(!at(">= 1", 0));
        assert!(at("= 3", 3));
        assert!(!at("= 3", 2));
    }

    #[test]
    fn double_equals_is_an_alias_for_equals() {
        let single: SizeGuard = "= 1".parse().unwrap();
        let double: SizeGuard = "== 1".parse().unwrap();
        assert_eq!(single, double);
        assert!(double.matches(1));
        assert!(!double.matches(0));
    }

    #[test]
    fn guard_rejects_malformed_input() {
        assert!("<2".parse::<SizeGuard>().is_err());
        assert!("< two".parse::<SizeGuard>().is_err());
        assert!("".parse::<SizeGuard>().is_err());
    }

    #[test]
    fn guard_displays_canonical_form() {
        let guard: SizeGuard = "== 4".parse().unwrap();
        assert_eq!(guard.to_string(), "= 4");
    }
}
