use std::fmt::{
  Display,
  Formatter
};
use std::str::FromStr;

use tracing::trace;

use crate::error::{
  CalendarError,
  Result
};
use crate::post::{
  Post,
  Status
};

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash
)]
pub enum StatusFilter {
  #[default]
  All,
  Only(Status)
}

impl StatusFilter {
  /// Accepts `all`, `draft`,
  /// `scheduled` or `published` in any
  /// case. Anything else is an
  /// `InvalidArgument`.
  pub fn parse(
    raw: &str
  ) -> Result<Self> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("all")
    {
      return Ok(Self::All);
    }

    trimmed
      .parse::<Status>()
      .map(Self::Only)
      .map_err(|_| {
        CalendarError::InvalidArgument(
          format!(
            "unknown status filter \
             '{raw}' (expected all, \
             draft, scheduled or \
             published)"
          )
        )
      })
  }

  #[must_use]
  pub fn matches(
    self,
    post: &Post
  ) -> bool {
    match self {
      | Self::All => true,
      | Self::Only(status) => {
        post.status == status
      }
    }
  }

  #[tracing::instrument(skip(posts))]
  pub fn apply<'a, I>(
    self,
    posts: I
  ) -> Vec<&'a Post>
  where
    I: IntoIterator<Item = &'a Post>
  {
    let kept = posts
      .into_iter()
      .filter(|post| self.matches(post))
      .collect::<Vec<_>>();
    trace!(
      kept = kept.len(),
      "status filter applied"
    );
    kept
  }

  #[must_use]
  pub fn as_str(self) -> &'static str {
    match self {
      | Self::All => "all",
      | Self::Only(Status::Draft) => {
        "draft"
      }
      | Self::Only(Status::Scheduled) => {
        "scheduled"
      }
      | Self::Only(Status::Published) => {
        "published"
      }
    }
  }
}

impl FromStr for StatusFilter {
  type Err = CalendarError;

  fn from_str(
    s: &str
  ) -> Result<Self> {
    Self::parse(s)
  }
}

impl Display for StatusFilter {
  fn fmt(
    &self,
    f: &mut Formatter<'_>
  ) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

pub fn filter_posts<'a, I>(
  posts: I,
  raw: &str
) -> Result<Vec<&'a Post>>
where
  I: IntoIterator<Item = &'a Post>
{
  Ok(StatusFilter::parse(raw)?
    .apply(posts))
}

#[cfg(test)]
mod tests {
  use chrono::{
    TimeZone,
    Utc
  };

  use super::*;

  fn posts() -> Vec<Post> {
    let now = Utc
      .with_ymd_and_hms(
        2025, 6, 1, 8, 0, 0
      )
      .single()
      .expect("valid now");
    [
      Status::Draft,
      Status::Published,
      Status::Draft,
      Status::Scheduled
    ]
    .into_iter()
    .enumerate()
    .map(|(idx, status)| {
      let mut post = Post::new_draft(
        format!("post {idx}"),
        String::new(),
        "LinkedIn".to_string(),
        now
      );
      post.status = status;
      post
    })
    .collect()
  }

  #[test]
  fn all_keeps_every_post_in_order() {
    let posts = posts();
    let kept = filter_posts(&posts, "all")
      .expect("all");
    assert_eq!(kept.len(), posts.len());
    assert!(
      kept
        .iter()
        .zip(posts.iter())
        .all(|(a, b)| a.id == b.id)
    );
  }

  #[test]
  fn status_filter_is_idempotent() {
    let posts = posts();
    let drafts =
      StatusFilter::parse("draft")
        .expect("draft");
    let once = drafts.apply(&posts);
    assert_eq!(once.len(), 2);
    assert!(
      once
        .iter()
        .all(|post| post.status
          == Status::Draft)
    );

    let twice =
      drafts.apply(once.iter().copied());
    assert_eq!(once, twice);
  }

  #[test]
  fn parses_any_case_and_rejects_unknown(
  ) {
    assert_eq!(
      StatusFilter::parse("PUBLISHED")
        .expect("published"),
      StatusFilter::Only(
        Status::Published
      )
    );
    assert_eq!(
      " All "
        .parse::<StatusFilter>()
        .expect("all"),
      StatusFilter::All
    );
    assert!(matches!(
      StatusFilter::parse("archived"),
      Err(
        CalendarError::InvalidArgument(_)
      )
    ));
    assert!(
      filter_posts(&posts(), "").is_err()
    );
  }

  #[test]
  fn empty_result_is_empty_vec() {
    let drafts_only: Vec<Post> = posts()
      .into_iter()
      .filter(|post| {
        post.status == Status::Draft
      })
      .collect();
    let published = filter_posts(
      &drafts_only,
      "published"
    )
    .expect("published");
    assert!(published.is_empty());
  }
}
