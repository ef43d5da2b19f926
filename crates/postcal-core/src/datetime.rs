use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Datelike,
  Days,
  NaiveDate,
  NaiveDateTime,
  NaiveTime,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use regex::Regex;
use serde::Deserialize;

use crate::calendar::YearMonth;

const TIMEZONE_CONFIG_FILE: &str =
  "postcal-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "POSTCAL_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "POSTCAL_TIME_CONFIG";

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
  timezone: Option<String>,
  time:     Option<TimezoneSection>
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
  timezone: Option<String>
}

/// Timezone every calendar date is
/// computed in. Resolved once per
/// process: `POSTCAL_TIMEZONE`, then
/// `postcal-time.toml`, then UTC.
pub fn project_timezone() -> &'static Tz
{
  static PROJECT_TZ: OnceLock<Tz> =
    OnceLock::new();
  PROJECT_TZ.get_or_init(
    resolve_project_timezone
  )
}

#[must_use]
pub fn to_project_date(
  dt: DateTime<Utc>
) -> NaiveDate {
  dt.with_timezone(project_timezone())
    .date_naive()
}

#[must_use]
pub fn to_project_local(
  dt: DateTime<Utc>
) -> NaiveDateTime {
  dt.with_timezone(project_timezone())
    .naive_local()
}

fn resolve_project_timezone() -> Tz {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) = parse_timezone(
      &raw,
      TIMEZONE_ENV_VAR
    )
  {
    return tz;
  }

  if let Some(path) =
    timezone_config_path()
    && let Some(tz) =
      load_timezone_from_file(&path)
  {
    return tz;
  }

  tracing::debug!(
    "no project timezone configured; \
     using UTC"
  );
  chrono_tz::UTC
}

fn timezone_config_path()
-> Option<PathBuf> {
  if let Ok(raw) = std::env::var(
    TIMEZONE_CONFIG_ENV_VAR
  ) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  std::env::current_dir().ok().map(
    |dir| {
      dir.join(TIMEZONE_CONFIG_FILE)
    }
  )
}

fn load_timezone_from_file(
  path: &PathBuf
) -> Option<Tz> {
  if !path.exists() {
    tracing::debug!(
      file = %path.display(),
      "timezone config file not found"
    );
    return None;
  }

  let raw = match fs::read_to_string(
    path
  ) {
    | Ok(raw) => raw,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed reading timezone config file"
      );
      return None;
    }
  };

  let timezone =
    match timezone_from_toml(&raw) {
      | Ok(timezone) => timezone,
      | Err(err) => {
        tracing::error!(
          file = %path.display(),
          error = %err,
          "failed parsing timezone config file"
        );
        return None;
      }
    };
  let Some(timezone) = timezone else {
    tracing::warn!(
      file = %path.display(),
      "timezone config had no timezone field"
    );
    return None;
  };

  parse_timezone(
    timezone.as_str(),
    &format!("file:{}", path.display())
  )
}

fn timezone_from_toml(
  raw: &str
) -> Result<Option<String>, toml::de::Error>
{
  let parsed =
    toml::from_str::<TimezoneConfig>(
      raw
    )?;
  Ok(parsed.timezone.or_else(|| {
    parsed
      .time
      .and_then(|section| section.timezone)
  }))
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %trimmed,
        "configured project timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

/// Resolves a day argument relative to
/// `today`.
#[tracing::instrument(skip(today))]
pub fn parse_date_arg(
  input: &str,
  today: NaiveDate
) -> anyhow::Result<NaiveDate> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "today" | "now" => {
      return Ok(today);
    }
    | "tomorrow" => {
      return today
        .checked_add_days(Days::new(1))
        .ok_or_else(|| {
          anyhow!(
            "date out of range: \
             tomorrow"
          )
        });
    }
    | "yesterday" => {
      return today
        .checked_sub_days(Days::new(1))
        .ok_or_else(|| {
          anyhow!(
            "date out of range: \
             yesterday"
          )
        });
    }
    | _ => {}
  }

  if let Some(target) =
    parse_weekday_name(&lower)
  {
    return Ok(next_weekday_date(
      today, target
    ));
  }

  let rel_re = Regex::new(
    r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dw])$"
  )
  .map_err(|e| {
    anyhow!(
      "internal regex compile \
       failure: {e}"
    )
  })?;

  if let Some(caps) =
    rel_re.captures(&lower)
  {
    let num: u64 = caps["num"]
      .parse()
      .context(
        "invalid relative number"
      )?;
    let days = match &caps["unit"] {
      | "w" => num.saturating_mul(7),
      | _ => num
    };
    let shifted = if &caps["sign"]
      == "-"
    {
      today.checked_sub_days(Days::new(
        days
      ))
    } else {
      today.checked_add_days(Days::new(
        days
      ))
    };
    return shifted.ok_or_else(|| {
      anyhow!(
        "date out of range: {input}"
      )
    });
  }

  NaiveDate::parse_from_str(
    token, "%Y-%m-%d"
  )
  .with_context(|| {
    format!(
      "unrecognized date: {input} \
       (supported: \
       today/tomorrow/yesterday, \
       weekday names, +Nd/-Nd, \
       +Nw/-Nw, YYYY-MM-DD)"
    )
  })
}

/// Resolves a month argument
/// (`YYYY-MM`, `this`, `next`, `prev`
/// or a month name in the current
/// year).
#[tracing::instrument(skip(today))]
pub fn parse_month_arg(
  input: &str,
  today: NaiveDate
) -> anyhow::Result<YearMonth> {
  let lower =
    input.trim().to_ascii_lowercase();
  let current =
    YearMonth::containing(today);

  match lower.as_str() {
    | "" | "this" | "today" => {
      return Ok(current);
    }
    | "next" => {
      return current
        .shift(1)
        .map_err(anyhow::Error::from);
    }
    | "prev" | "previous" | "last" => {
      return current
        .shift(-1)
        .map_err(anyhow::Error::from);
    }
    | _ => {}
  }

  if let Some(month) =
    parse_month_name(&lower)
  {
    return YearMonth::new(
      today.year(),
      month
    )
    .map_err(anyhow::Error::from);
  }

  let (year, month) = lower
    .split_once('-')
    .ok_or_else(|| {
      anyhow!(
        "unrecognized month: {input} \
         (expected YYYY-MM, a month \
         name, this, next or prev)"
      )
    })?;
  let year: i32 =
    year.parse().with_context(|| {
      format!("invalid year in {input}")
    })?;
  let month: u32 =
    month.parse().with_context(|| {
      format!(
        "invalid month in {input}"
      )
    })?;

  YearMonth::new(year, month)
    .map_err(anyhow::Error::from)
}

fn parse_weekday_name(
  token: &str
) -> Option<Weekday> {
  match token.trim() {
    | "monday" | "mon" => {
      Some(Weekday::Mon)
    }
    | "tuesday" | "tue" | "tues" => {
      Some(Weekday::Tue)
    }
    | "wednesday" | "wed" => {
      Some(Weekday::Wed)
    }
    | "thursday" | "thu" | "thur"
    | "thurs" => Some(Weekday::Thu),
    | "friday" | "fri" => {
      Some(Weekday::Fri)
    }
    | "saturday" | "sat" => {
      Some(Weekday::Sat)
    }
    | "sunday" | "sun" => {
      Some(Weekday::Sun)
    }
    | _ => None
  }
}

fn next_weekday_date(
  from: NaiveDate,
  target: Weekday
) -> NaiveDate {
  let from_idx = from
    .weekday()
    .num_days_from_monday();
  let target_idx =
    target.num_days_from_monday();
  let mut delta =
    (7 + target_idx - from_idx) % 7;
  if delta == 0 {
    delta = 7;
  }
  from
    .checked_add_days(Days::new(
      u64::from(delta)
    ))
    .unwrap_or(from)
}

/// Parses `15:23`, `3:23pm` or
/// `3:23 PM`.
pub fn parse_clock_time(
  token: &str
) -> Option<NaiveTime> {
  let clock_re = Regex::new(
    r"(?i)^(?P<hour>\d{1,2}):(?P<minute>\d{2})(:(?P<second>\d{2}))?\s*(?P<ampm>[ap]m)?$",
  )
  .ok()?;
  let captures =
    clock_re.captures(token.trim())?;

  let raw_hour = captures
    .name("hour")?
    .as_str()
    .parse::<u32>()
    .ok()?;
  let minute = captures
    .name("minute")?
    .as_str()
    .parse::<u32>()
    .ok()?;
  let second = match captures
    .name("second")
  {
    | Some(raw) => {
      raw.as_str().parse::<u32>().ok()?
    }
    | None => 0
  };

  let hour = if let Some(ampm_match) =
    captures.name("ampm")
  {
    if raw_hour == 0 || raw_hour > 12 {
      return None;
    }
    let is_pm = ampm_match
      .as_str()
      .eq_ignore_ascii_case("pm");
    match (is_pm, raw_hour) {
      | (false, 12) => 0,
      | (true, 12) => 12,
      | (false, hour) => hour,
      | (true, hour) => hour + 12
    }
  } else {
    raw_hour
  };

  NaiveTime::from_hms_opt(
    hour, minute, second
  )
}

fn parse_month_name(
  token: &str
) -> Option<u32> {
  match token.trim() {
    | "january" | "jan" => Some(1),
    | "february" | "feb" => Some(2),
    | "march" | "mar" => Some(3),
    | "april" | "apr" => Some(4),
    | "may" => Some(5),
    | "june" | "jun" => Some(6),
    | "july" | "jul" => Some(7),
    | "august" | "aug" => Some(8),
    | "september" | "sep" | "sept" => {
      Some(9)
    }
    | "october" | "oct" => Some(10),
    | "november" | "nov" => Some(11),
    | "december" | "dec" => Some(12),
    | _ => None
  }
}

/// Serde for `HH:MM` times of day.
/// Seconds are accepted on input and
/// written only when non-zero.
pub mod clock_time_serde {
  use chrono::{
    NaiveTime,
    Timelike
  };
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  pub(crate) fn format(
    time: &NaiveTime
  ) -> String {
    if time.second() == 0 {
      time.format("%H:%M").to_string()
    } else {
      time
        .format("%H:%M:%S")
        .to_string()
    }
  }

  pub(crate) fn parse(
    raw: &str
  ) -> Result<NaiveTime, chrono::ParseError>
  {
    NaiveTime::parse_from_str(
      raw, "%H:%M:%S"
    )
    .or_else(|_| {
      NaiveTime::parse_from_str(
        raw, "%H:%M"
      )
    })
  }

  pub fn serialize<S>(
    time: &NaiveTime,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer
      .serialize_str(&format(time))
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<NaiveTime, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = String::deserialize(
      deserializer
    )?;
    parse(raw.trim())
      .map_err(serde::de::Error::custom)
  }

  pub mod option {
    use chrono::NaiveTime;
    use serde::{
      Deserialize,
      Deserializer,
      Serializer
    };

    pub fn serialize<S>(
      time: &Option<NaiveTime>,
      serializer: S
    ) -> Result<S::Ok, S::Error>
    where
      S: Serializer
    {
      match time {
        | Some(value) => {
          super::serialize(
            value, serializer
          )
        }
        | None => {
          serializer.serialize_none()
        }
      }
    }

    pub fn deserialize<'de, D>(
      deserializer: D
    ) -> Result<Option<NaiveTime>, D::Error>
    where
      D: Deserializer<'de>
    {
      let opt =
        Option::<String>::deserialize(
          deserializer
        )?;
      match opt {
        | Some(raw) => {
          super::parse(raw.trim())
            .map(Some)
            .map_err(
              serde::de::Error::custom
            )
        }
        | None => Ok(None)
      }
    }
  }
}
