//! Aggregate views over a user's posts: status counts, recent and upcoming
//! posts, drafts, and everything that touches a given day.

use std::cmp::{Ordering, Reverse};

use chrono::NaiveDate;
use serde::Serialize;

use crate::post::{Post, Status};

pub const DEFAULT_RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub draft: usize,
    pub scheduled: usize,
    pub published: usize,
}

impl StatusCounts {
    pub fn tally<'a, I>(posts: I) -> Self
    where
        I: IntoIterator<Item = &'a Post>,
    {
        posts.into_iter().fold(Self::default(), |mut counts, post| {
            counts.total += 1;
            match post.status {
                Status::Draft => counts.draft += 1,
                Status::Scheduled => counts.scheduled += 1,
                Status::Published => counts.published += 1,
            }
            counts
        })
    }

    #[must_use]
    pub fn count(&self, status: Status) -> usize {
        match status {
            Status::Draft => self.draft,
            Status::Scheduled => self.scheduled,
            Status::Published => self.published,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngagementTotals {
    pub posts: usize,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub views: u64,
}

impl EngagementTotals {
    pub fn sum<'a, I>(posts: I) -> Self
    where
        I: IntoIterator<Item = &'a Post>,
    {
        posts
            .into_iter()
            .filter_map(|post| post.engagement)
            .fold(Self::default(), |mut totals, engagement| {
                totals.posts += 1;
                totals.likes = totals.likes.saturating_add(engagement.likes);
                totals.comments = totals.comments.saturating_add(engagement.comments);
                totals.shares = totals.shares.saturating_add(engagement.shares);
                totals.views = totals.views.saturating_add(engagement.views);
                totals
            })
    }
}

/// Newest first by creation time.
pub fn recent_posts<'a, I>(posts: I, limit: usize) -> Vec<&'a Post>
where
    I: IntoIterator<Item = &'a Post>,
{
    let mut posts: Vec<&Post> = posts.into_iter().collect();
    posts.sort_by_key(|post| Reverse(post.created_at));
    posts.truncate(limit);
    posts
}

/// Scheduled posts dated `today` or later, soonest first.
pub fn upcoming_posts<'a, I>(posts: I, today: NaiveDate) -> Vec<&'a Post>
where
    I: IntoIterator<Item = &'a Post>,
{
    let mut upcoming: Vec<&Post> = posts
        .into_iter()
        .filter(|post| post.status == Status::Scheduled)
        .filter(|post| post.scheduled_date.is_some_and(|date| date >= today))
        .collect();
    upcoming.sort_by_key(|post| (post.scheduled_date, post.scheduled_time));
    upcoming
}

/// Drafts, most recent draft date first; undated drafts last.
pub fn draft_posts<'a, I>(posts: I) -> Vec<&'a Post>
where
    I: IntoIterator<Item = &'a Post>,
{
    let mut drafts: Vec<&Post> = posts
        .into_iter()
        .filter(|post| post.status == Status::Draft)
        .collect();
    drafts.sort_by(|a, b| nones_last(b.draft_date, a.draft_date));
    drafts
}

/// Posts with any of their draft, scheduled or published dates on `day`,
/// ordered by scheduled date with unscheduled posts last.
pub fn posts_touching_day<'a, I>(posts: I, day: NaiveDate) -> Vec<&'a Post>
where
    I: IntoIterator<Item = &'a Post>,
{
    let mut touching: Vec<&Post> = posts
        .into_iter()
        .filter(|post| {
            Status::ALL
                .into_iter()
                .any(|status| post.date_for(status) == Some(day))
        })
        .collect();
    touching.sort_by(|a, b| nones_last(a.scheduled_date, b.scheduled_date));
    touching
}

fn nones_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Debug, Clone)]
pub struct DashboardSummary<'a> {
    pub counts: StatusCounts,
    pub engagement: EngagementTotals,
    pub recent: Vec<&'a Post>,
}

impl<'a> DashboardSummary<'a> {
    #[tracing::instrument(skip(posts))]
    pub fn build(posts: &'a [Post], recent_limit: usize) -> Self {
        let summary = Self {
            counts: StatusCounts::tally(posts),
            engagement: EngagementTotals::sum(posts),
            recent: recent_posts(posts, recent_limit),
        };
        tracing::debug!(counts = ?summary.counts, "dashboard summary built");
        summary
    }
}
