use thiserror::Error;

pub type Result<T, E = CalendarError> =
  std::result::Result<T, E>;

#[derive(
  Clone, Eq, PartialEq, Debug, Hash, Error,
)]
pub enum CalendarError {
  #[error("Invalid input: {0}")]
  InvalidInput(String),
  #[error("Invalid argument: {0}")]
  InvalidArgument(String)
}

impl CalendarError {
  pub(crate) fn month_out_of_range(
    month: u32
  ) -> Self {
    Self::InvalidInput(format!(
      "month must be within 1-12, got \
       {month}"
    ))
  }

  pub(crate) fn day_out_of_range(
    year: i32,
    month: u32,
    day: u32
  ) -> Self {
    Self::InvalidInput(format!(
      "day {day} does not exist in \
       {year:04}-{month:02}"
    ))
  }

  pub(crate) fn year_out_of_range(
    year: i32
  ) -> Self {
    Self::InvalidInput(format!(
      "year {year} is outside the \
       supported calendar range"
    ))
  }
}
