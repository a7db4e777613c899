use chrono::{
  DateTime,
  NaiveDate,
  Utc
};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::TodoError;

const TIMEZONE_ENV_VAR: &str =
  "TODO_TIMEZONE";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Source of "today". Reconciliation reads it once per pass.
pub trait Clock {
  fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
  tz: Tz
}

impl SystemClock {
  pub fn new(tz: Tz) -> Self {
    Self {
      tz
    }
  }

  pub fn timezone(&self) -> Tz {
    self.tz
  }
}

impl Default for SystemClock {
  fn default() -> Self {
    Self::new(chrono_tz::UTC)
  }
}

impl Clock for SystemClock {
  fn today(&self) -> NaiveDate {
    date_in(Utc::now(), &self.tz)
  }
}

/// Clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
  fn today(&self) -> NaiveDate {
    self.0
  }
}

#[must_use]
pub fn date_in(
  now: DateTime<Utc>,
  tz: &Tz
) -> NaiveDate {
  now.with_timezone(tz).date_naive()
}

#[must_use]
pub fn format_date(
  date: NaiveDate
) -> String {
  date.format(DATE_FORMAT).to_string()
}

/// Strict `YYYY-MM-DD`, the format the
/// date inputs of the dashboard produce.
pub fn parse_deadline(
  raw: &str
) -> Result<NaiveDate, TodoError> {
  let trimmed = raw.trim();
  if trimmed.len() != 10 {
    return Err(TodoError::InvalidDate(
      raw.to_string()
    ));
  }
  NaiveDate::parse_from_str(
    trimmed,
    DATE_FORMAT
  )
  .map_err(|_| {
    TodoError::InvalidDate(
      raw.to_string()
    )
  })
}

/// `$TODO_TIMEZONE` wins over the
/// configured zone; UTC otherwise.
pub fn resolve_timezone(
  configured: Option<&str>
) -> Tz {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) =
      parse_timezone(&raw, TIMEZONE_ENV_VAR)
  {
    return tz;
  }

  if let Some(raw) = configured
    && let Some(tz) =
      parse_timezone(raw, "timezone")
  {
    return tz;
  }

  chrono_tz::UTC
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => Some(tz),
    | Err(error) => {
      warn!(
        source,
        value = trimmed,
        %error,
        "ignoring invalid timezone"
      );
      None
    }
  }
}
