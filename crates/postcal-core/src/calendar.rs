//! Month geometry and date bucketing
//! for the post calendar.
//!
//! Months are one-based (1 = January)
//! and weekdays are numbered from
//! Sunday (0) to Saturday (6).

use std::collections::BTreeMap;
use std::fmt::{
  Display,
  Formatter
};

use chrono::{
  Datelike,
  Days,
  NaiveDate
};

use crate::display::is_past_date;
use crate::error::{
  CalendarError,
  Result
};
use crate::post::Post;

pub const DAYS_PER_WEEK: u32 = 7;

pub const WEEKDAY_LABELS: [&str; 7] = [
  "Sun", "Mon", "Tue", "Wed", "Thu",
  "Fri", "Sat"
];

#[derive(
  Copy,
  Clone,
  Eq,
  PartialEq,
  Ord,
  PartialOrd,
  Debug,
  Hash
)]
pub struct YearMonth {
  first: NaiveDate
}

impl YearMonth {
  pub fn new(
    year: i32,
    month: u32
  ) -> Result<Self> {
    if !(1..=12).contains(&month) {
      return Err(
        CalendarError::month_out_of_range(
          month
        )
      );
    }
    let first =
      NaiveDate::from_ymd_opt(
        year, month, 1
      )
      .ok_or_else(|| {
        CalendarError::year_out_of_range(
          year
        )
      })?;
    Ok(Self {
      first
    })
  }

  #[must_use]
  pub fn containing(
    date: NaiveDate
  ) -> Self {
    Self {
      first: date
        .with_day(1)
        .unwrap_or(date)
    }
  }

  /// Builds a month from a zero-based
  /// month offset that may run past
  /// either end of the year: offset
  /// -1 is December of `year - 1`,
  /// offset 12 is January of
  /// `year + 1`.
  pub fn from_month_offset(
    year: i32,
    month_offset: i64
  ) -> Result<Self> {
    let out_of_range = || {
      CalendarError::InvalidInput(
        format!(
          "month offset \
           {month_offset} from year \
           {year} is out of range"
        )
      )
    };
    let total = i64::from(year)
      .checked_mul(12)
      .and_then(|months| {
        months.checked_add(month_offset)
      })
      .ok_or_else(out_of_range)?;
    let normalized_year = i32::try_from(
      total.div_euclid(12)
    )
    .map_err(|_| out_of_range())?;
    let normalized_month =
      u32::try_from(
        total.rem_euclid(12) + 1
      )
      .map_err(|_| {
        CalendarError::InvalidInput(
          format!(
            "invalid month offset \
             {month_offset}"
          )
        )
      })?;
    Self::new(
      normalized_year,
      normalized_month
    )
  }

  pub fn shift(
    self,
    months: i32
  ) -> Result<Self> {
    Self::from_month_offset(
      self.year(),
      i64::from(self.month()) - 1
        + i64::from(months)
    )
  }

  #[must_use]
  pub fn year(self) -> i32 {
    self.first.year()
  }

  #[must_use]
  pub fn month(self) -> u32 {
    self.first.month()
  }

  #[must_use]
  pub fn first_day(self) -> NaiveDate {
    self.first
  }

  #[must_use]
  pub fn days(self) -> u32 {
    gregorian_month_length(
      self.year(),
      self.month()
    )
  }

  #[must_use]
  pub fn first_weekday(self) -> u32 {
    self
      .first
      .weekday()
      .num_days_from_sunday()
  }

  #[must_use]
  pub fn grid_cell_count(self) -> u32 {
    (self.days() + self.first_weekday())
      .div_ceil(DAYS_PER_WEEK)
      * DAYS_PER_WEEK
  }

  pub fn date(
    self,
    day: u32
  ) -> Result<NaiveDate> {
    if day == 0 || day > self.days() {
      return Err(
        CalendarError::day_out_of_range(
          self.year(),
          self.month(),
          day
        )
      );
    }
    self.first.with_day(day).ok_or_else(
      || {
        CalendarError::day_out_of_range(
          self.year(),
          self.month(),
          day
        )
      }
    )
  }

  #[must_use]
  pub fn contains(
    self,
    date: NaiveDate
  ) -> bool {
    date.year() == self.year()
      && date.month() == self.month()
  }

  /// "June 2025".
  #[must_use]
  pub fn title(self) -> String {
    self.first.format("%B %Y").to_string()
  }
}

impl Display for YearMonth {
  fn fmt(
    &self,
    f: &mut Formatter<'_>
  ) -> std::fmt::Result {
    write!(
      f,
      "{:04}-{:02}",
      self.year(),
      self.month()
    )
  }
}

#[must_use]
pub fn is_leap_year(year: i32) -> bool {
  year % 4 == 0
    && (year % 100 != 0
      || year % 400 == 0)
}

fn gregorian_month_length(
  year: i32,
  month: u32
) -> u32 {
  match month {
    | 2 if is_leap_year(year) => 29,
    | 2 => 28,
    | 4 | 6 | 9 | 11 => 30,
    | _ => 31
  }
}

pub fn days_in_month(
  year: i32,
  month: u32
) -> Result<u32> {
  YearMonth::new(year, month)
    .map(YearMonth::days)
}

pub fn first_weekday_of_month(
  year: i32,
  month: u32
) -> Result<u32> {
  YearMonth::new(year, month)
    .map(YearMonth::first_weekday)
}

pub fn grid_cell_count(
  year: i32,
  month: u32
) -> Result<u32> {
  YearMonth::new(year, month)
    .map(YearMonth::grid_cell_count)
}

/// The date that places `post` on the
/// calendar. The date belonging to the
/// current status wins; if it is
/// missing, the first of draft,
/// scheduled, published that is set.
#[must_use]
pub fn effective_date(
  post: &Post
) -> Option<NaiveDate> {
  post
    .date_for(post.status)
    .or(post.draft_date)
    .or(post.scheduled_date)
    .or(post.published_date)
}

#[derive(Clone, Debug)]
pub struct MonthBuckets<'a> {
  month: YearMonth,
  days:  BTreeMap<u32, Vec<&'a Post>>
}

impl<'a> MonthBuckets<'a> {
  #[tracing::instrument(skip_all, fields(month = %month))]
  pub fn collect<I>(
    month: YearMonth,
    posts: I
  ) -> Self
  where
    I: IntoIterator<Item = &'a Post>
  {
    let mut days: BTreeMap<
      u32,
      Vec<&'a Post>
    > = BTreeMap::new();
    let mut skipped = 0_usize;

    for post in posts {
      match effective_date(post) {
        | Some(date)
          if month.contains(date) =>
        {
          days
            .entry(date.day())
            .or_default()
            .push(post);
        }
        | _ => skipped += 1
      }
    }

    tracing::debug!(
      bucketed_days = days.len(),
      skipped,
      "posts bucketed by day"
    );

    Self {
      month,
      days
    }
  }

  #[must_use]
  pub fn month(&self) -> YearMonth {
    self.month
  }

  /// Posts on `day`, in input order.
  /// Empty for days without posts.
  #[must_use]
  pub fn posts_on(
    &self,
    day: u32
  ) -> &[&'a Post] {
    self
      .days
      .get(&day)
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = (u32, &[&'a Post])>
  {
    self
      .days
      .iter()
      .map(|(day, posts)| {
        (*day, posts.as_slice())
      })
  }

  #[must_use]
  pub fn post_count(&self) -> usize {
    self.days.values().map(Vec::len).sum()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.days.is_empty()
  }
}

pub fn buckets_for_month<'a, I>(
  year: i32,
  month: u32,
  posts: I
) -> Result<MonthBuckets<'a>>
where
  I: IntoIterator<Item = &'a Post>
{
  let month =
    YearMonth::new(year, month)?;
  Ok(MonthBuckets::collect(
    month, posts
  ))
}

pub fn is_today(
  year: i32,
  month: u32,
  day: u32,
  today: NaiveDate
) -> Result<bool> {
  let date =
    YearMonth::new(year, month)?
      .date(day)?;
  Ok(date == today)
}

pub fn is_selected(
  year: i32,
  month: u32,
  day: u32,
  selected: Option<NaiveDate>
) -> Result<bool> {
  let date =
    YearMonth::new(year, month)?
      .date(day)?;
  Ok(selected == Some(date))
}

#[derive(Clone, Debug, Default)]
pub struct GridCell<'a> {
  /// `None` for the blank cells
  /// padding the first and last week.
  pub date:        Option<NaiveDate>,
  pub posts:       Vec<&'a Post>,
  pub is_today:    bool,
  pub is_selected: bool,
  pub is_past:     bool
}

impl GridCell<'_> {
  #[must_use]
  pub fn day(&self) -> Option<u32> {
    self.date.map(|date| date.day())
  }

  /// Past days and blank cells accept
  /// no new posts.
  #[must_use]
  pub fn accepts_new_posts(
    &self
  ) -> bool {
    self.date.is_some() && !self.is_past
  }
}

#[derive(Clone, Debug)]
pub struct MonthGrid<'a> {
  pub month: YearMonth,
  pub cells: Vec<GridCell<'a>>
}

impl<'a> MonthGrid<'a> {
  #[tracing::instrument(skip_all, fields(month = %month))]
  pub fn build<I>(
    month: YearMonth,
    posts: I,
    today: NaiveDate,
    selected: Option<NaiveDate>
  ) -> Self
  where
    I: IntoIterator<Item = &'a Post>
  {
    let buckets =
      MonthBuckets::collect(month, posts);
    let leading = month.first_weekday();
    let days = month.days();

    let cells = (0..month
      .grid_cell_count())
      .map(|index| {
        let Some(day) = index
          .checked_sub(leading)
          .map(|offset| offset + 1)
          .filter(|day| *day <= days)
        else {
          return GridCell::default();
        };
        let Some(date) = month
          .first_day()
          .checked_add_days(Days::new(
            u64::from(day - 1)
          ))
        else {
          return GridCell::default();
        };

        GridCell {
          date: Some(date),
          posts: buckets
            .posts_on(day)
            .to_vec(),
          is_today: date == today,
          is_selected: selected
            == Some(date),
          is_past: is_past_date(
            date, today
          )
        }
      })
      .collect::<Vec<_>>();

    Self {
      month,
      cells
    }
  }

  pub fn weeks(
    &self
  ) -> impl Iterator<Item = &[GridCell<'a>]>
  {
    self.cells.chunks(7)
  }

  pub fn day_cells(
    &self
  ) -> impl Iterator<Item = &GridCell<'a>>
  {
    self
      .cells
      .iter()
      .filter(|cell| cell.date.is_some())
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    NaiveDate,
    NaiveTime,
    TimeZone,
    Utc
  };
  use uuid::Uuid;

  use super::*;
  use crate::post::Status;

  fn day(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  fn sample_post(
    title: &str,
    status: Status
  ) -> Post {
    let created = Utc
      .with_ymd_and_hms(
        2025, 5, 1, 9, 0, 0
      )
      .single()
      .expect("valid now");
    Post {
      id:             Uuid::new_v4(),
      title:          title.to_string(),
      content:        String::new(),
      platform:       "Twitter"
        .to_string(),
      status,
      draft_date:     None,
      draft_time:     None,
      scheduled_date: None,
      scheduled_time: None,
      published_date: None,
      published_time: None,
      created_at:     created,
      updated_at:     created,
      engagement:     None
    }
  }

  fn june_scenario() -> Vec<Post> {
    let mut draft = sample_post(
      "draft",
      Status::Draft
    );
    draft.draft_date =
      Some(day(2025, 6, 5));

    let mut scheduled = sample_post(
      "scheduled",
      Status::Scheduled
    );
    scheduled.scheduled_date =
      Some(day(2025, 6, 5));
    scheduled.scheduled_time =
      NaiveTime::from_hms_opt(14, 0, 0);

    let mut published = sample_post(
      "published",
      Status::Published
    );
    published.published_date =
      Some(day(2025, 7, 1));

    vec![draft, scheduled, published]
  }

  #[test]
  fn month_lengths_follow_gregorian_rules(
  ) {
    assert_eq!(
      days_in_month(2024, 2)
        .expect("feb 2024"),
      29
    );
    assert_eq!(
      days_in_month(2023, 2)
        .expect("feb 2023"),
      28
    );
    assert_eq!(
      days_in_month(2000, 2)
        .expect("feb 2000"),
      29
    );
    assert_eq!(
      days_in_month(1900, 2)
        .expect("feb 1900"),
      28
    );
    assert_eq!(
      days_in_month(2025, 4)
        .expect("april"),
      30
    );
    assert_eq!(
      days_in_month(2025, 12)
        .expect("december"),
      31
    );
  }

  #[test]
  fn rejects_out_of_range_months_and_days(
  ) {
    assert!(matches!(
      days_in_month(2025, 0),
      Err(CalendarError::InvalidInput(_))
    ));
    assert!(matches!(
      days_in_month(2025, 13),
      Err(CalendarError::InvalidInput(_))
    ));
    assert!(matches!(
      is_today(
        2025,
        2,
        29,
        day(2025, 2, 28)
      ),
      Err(CalendarError::InvalidInput(_))
    ));
    let empty: Vec<Post> = Vec::new();
    assert!(
      buckets_for_month(
        2025, 13, &empty
      )
      .is_err()
    );
  }

  #[test]
  fn first_weekday_and_grid_size() {
    // June 2025 starts on a Sunday.
    assert_eq!(
      first_weekday_of_month(2025, 6)
        .expect("june"),
      0
    );
    assert_eq!(
      grid_cell_count(2025, 6)
        .expect("june"),
      35
    );
    // August 2025 starts on a Friday
    // and needs six rows.
    assert_eq!(
      first_weekday_of_month(2025, 8)
        .expect("august"),
      5
    );
    assert_eq!(
      grid_cell_count(2025, 8)
        .expect("august"),
      42
    );
    // February 2015 fills exactly four
    // rows.
    assert_eq!(
      grid_cell_count(2015, 2)
        .expect("feb 2015"),
      28
    );
    assert_eq!(
      first_weekday_of_month(2024, 2)
        .expect("feb 2024"),
      4
    );
  }

  #[test]
  fn month_navigation_rolls_over_years()
  {
    let january = YearMonth::new(2025, 1)
      .expect("month");
    assert_eq!(
      january.shift(-1).expect("prev"),
      YearMonth::new(2024, 12)
        .expect("month")
    );

    let december =
      YearMonth::new(2025, 12)
        .expect("month");
    assert_eq!(
      december.shift(1).expect("next"),
      YearMonth::new(2026, 1)
        .expect("month")
    );

    assert_eq!(
      YearMonth::from_month_offset(
        2025, -1
      )
      .expect("offset -1"),
      YearMonth::new(2024, 12)
        .expect("month")
    );
    assert_eq!(
      YearMonth::from_month_offset(
        2025, 12
      )
      .expect("offset 12"),
      YearMonth::new(2026, 1)
        .expect("month")
    );
    assert_eq!(
      january.shift(-25).expect("far"),
      YearMonth::new(2022, 12)
        .expect("month")
    );
    assert_eq!(
      YearMonth::new(2025, 6)
        .expect("month")
        .title(),
      "June 2025"
    );
  }

  #[test]
  fn huge_month_offsets_are_errors() {
    for offset in [i64::MAX, i64::MIN] {
      assert!(matches!(
        YearMonth::from_month_offset(
          2025, offset
        ),
        Err(CalendarError::InvalidInput(_))
      ));
    }
    let june = YearMonth::new(2025, 6)
      .expect("month");
    assert!(matches!(
      june.shift(i32::MAX),
      Err(CalendarError::InvalidInput(_))
    ));
  }

  #[test]
  fn buckets_june_scenario() {
    let posts = june_scenario();
    let buckets =
      buckets_for_month(2025, 6, &posts)
        .expect("buckets");

    let fifth = buckets.posts_on(5);
    assert_eq!(fifth.len(), 2);
    assert_eq!(fifth[0].title, "draft");
    assert_eq!(
      fifth[1].title,
      "scheduled"
    );
    assert!(buckets.posts_on(1).is_empty());
    assert_eq!(buckets.post_count(), 2);

    let july =
      buckets_for_month(2025, 7, &posts)
        .expect("buckets");
    assert_eq!(july.posts_on(1).len(), 1);
  }

  #[test]
  fn bucket_sizes_never_exceed_input() {
    let posts = june_scenario();
    for month in 1..=12 {
      let buckets = buckets_for_month(
        2025, month, &posts
      )
      .expect("buckets");
      let total: usize = buckets
        .iter()
        .map(|(_, posts)| posts.len())
        .sum();
      assert!(total <= posts.len());
    }

    let june_only = &posts[..2];
    let buckets =
      buckets_for_month(2025, 6, june_only)
        .expect("buckets");
    assert_eq!(
      buckets.post_count(),
      june_only.len()
    );
  }

  #[test]
  fn effective_date_prefers_current_status(
  ) {
    let mut post = sample_post(
      "moved",
      Status::Published
    );
    post.draft_date =
      Some(day(2025, 5, 20));
    post.scheduled_date =
      Some(day(2025, 5, 30));
    post.published_date =
      Some(day(2025, 6, 2));
    assert_eq!(
      effective_date(&post),
      Some(day(2025, 6, 2))
    );

    post.published_date = None;
    assert_eq!(
      effective_date(&post),
      Some(day(2025, 5, 20))
    );

    let mut draft = sample_post(
      "draft",
      Status::Draft
    );
    draft.scheduled_date =
      Some(day(2025, 6, 9));
    assert_eq!(
      effective_date(&draft),
      Some(day(2025, 6, 9))
    );

    let undated = sample_post(
      "undated",
      Status::Scheduled
    );
    assert_eq!(
      effective_date(&undated),
      None
    );
  }

  #[test]
  fn bucketing_is_repeatable() {
    let posts = june_scenario();
    let first =
      buckets_for_month(2025, 6, &posts)
        .expect("buckets");
    let second =
      buckets_for_month(2025, 6, &posts)
        .expect("buckets");
    let ids = |b: &MonthBuckets<'_>| {
      b.iter()
        .flat_map(|(day, posts)| {
          posts
            .iter()
            .map(move |p| (day, p.id))
        })
        .collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));
  }

  #[test]
  fn today_and_selection() {
    assert!(
      is_today(
        2025,
        6,
        5,
        day(2025, 6, 5)
      )
      .expect("today")
    );
    assert!(
      !is_today(
        2025,
        6,
        5,
        day(2025, 6, 6)
      )
      .expect("today")
    );

    assert!(
      is_selected(
        2025,
        6,
        5,
        Some(day(2025, 6, 5))
      )
      .expect("selected")
    );
    assert!(
      !is_selected(
        2025,
        6,
        5,
        Some(day(2024, 6, 5))
      )
      .expect("selected")
    );
    assert!(
      !is_selected(2025, 6, 5, None)
        .expect("selected")
    );
  }

  #[test]
  fn grid_marks_cells() {
    let posts = june_scenario();
    let month = YearMonth::new(2025, 8)
      .expect("month");
    let grid = MonthGrid::build(
      month,
      &posts,
      day(2025, 8, 10),
      Some(day(2025, 8, 12))
    );

    assert_eq!(grid.cells.len(), 42);
    assert_eq!(grid.weeks().count(), 6);
    assert!(
      grid.cells[..5]
        .iter()
        .all(|cell| cell.date.is_none())
    );
    assert_eq!(
      grid.cells[5].day(),
      Some(1)
    );
    assert_eq!(grid.day_cells().count(), 31);

    let today = grid
      .day_cells()
      .find(|cell| cell.is_today)
      .expect("today cell");
    assert_eq!(today.day(), Some(10));
    assert!(today.accepts_new_posts());

    let selected = grid
      .day_cells()
      .find(|cell| cell.is_selected)
      .expect("selected cell");
    assert_eq!(selected.day(), Some(12));

    let past = grid
      .day_cells()
      .filter(|cell| cell.is_past)
      .count();
    assert_eq!(past, 9);
  }

  #[test]
  fn grid_places_posts_on_their_day() {
    let posts = june_scenario();
    let grid = MonthGrid::build(
      YearMonth::new(2025, 6)
        .expect("month"),
      &posts,
      day(2025, 6, 1),
      None
    );

    let fifth = grid
      .day_cells()
      .find(|cell| cell.day() == Some(5))
      .expect("fifth");
    assert_eq!(fifth.posts.len(), 2);
    assert!(grid.day_cells().all(|cell| {
      cell.day() == Some(5)
        || cell.posts.is_empty()
    }));
  }
}
