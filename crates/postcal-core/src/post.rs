use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::de::{Error, Unexpected};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::datetime::{clock_time_serde, to_project_local};
use crate::error::CalendarError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    Draft,
    Scheduled,
    Published,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Draft, Status::Scheduled, Status::Published];

    /// Canonical upper-case spelling used by the post store.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Draft => "DRAFT",
            Status::Scheduled => "SCHEDULED",
            Status::Published => "PUBLISHED",
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Status::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| CalendarError::InvalidArgument(format!("unknown post status: {s}")))
    }
}

impl Serialize for Status {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|_| Error::invalid_value(Unexpected::Str(&raw), &"DRAFT, SCHEDULED or PUBLISHED"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Engagement {
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub shares: u64,
    #[serde(default)]
    pub views: u64,
}

impl Engagement {
    /// Sets one counter by name (`likes`, `comments`, `shares`, `views`).
    pub fn set(&mut self, metric: &str, value: u64) -> Result<(), CalendarError> {
        let slot = match metric.trim().to_ascii_lowercase().as_str() {
            "likes" => &mut self.likes,
            "comments" => &mut self.comments,
            "shares" => &mut self.shares,
            "views" => &mut self.views,
            _ => {
                return Err(CalendarError::InvalidArgument(format!(
                    "unknown engagement metric: {metric}"
                )));
            }
        };
        *slot = value;
        Ok(())
    }
}

/// Field changes for an existing post; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostEdit {
    pub title: Option<String>,
    pub content: Option<String>,
    pub platform: Option<String>,
}

impl PostEdit {
    pub fn set(&mut self, field: &str, value: String) -> Result<(), CalendarError> {
        match field.trim().to_ascii_lowercase().as_str() {
            "title" if value.trim().is_empty() => Err(CalendarError::InvalidArgument(
                "post title cannot be empty".to_string(),
            )),
            "title" => {
                self.title = Some(value);
                Ok(())
            }
            "content" => {
                self.content = Some(value);
                Ok(())
            }
            "platform" => {
                self.platform = Some(value);
                Ok(())
            }
            _ => Err(CalendarError::InvalidArgument(format!(
                "unknown post field: {field}"
            ))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.platform.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,

    pub title: String,

    #[serde(default)]
    pub content: String,

    pub platform: String,

    pub status: Status,

    #[serde(default)]
    pub draft_date: Option<NaiveDate>,

    #[serde(default, with = "clock_time_serde::option")]
    pub draft_time: Option<NaiveTime>,

    #[serde(default)]
    pub scheduled_date: Option<NaiveDate>,

    #[serde(default, with = "clock_time_serde::option")]
    pub scheduled_time: Option<NaiveTime>,

    #[serde(default)]
    pub published_date: Option<NaiveDate>,

    #[serde(default, with = "clock_time_serde::option")]
    pub published_time: Option<NaiveTime>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub engagement: Option<Engagement>,
}

impl Post {
    pub fn new_draft(title: String, content: String, platform: String, now: DateTime<Utc>) -> Self {
        let local = to_project_local(now);
        Self {
            id: Uuid::new_v4(),
            title,
            content,
            platform,
            status: Status::Draft,
            draft_date: Some(local.date()),
            draft_time: Some(whole_seconds(local.time())),
            scheduled_date: None,
            scheduled_time: None,
            published_date: None,
            published_time: None,
            created_at: now,
            updated_at: now,
            engagement: None,
        }
    }

    pub fn schedule(&mut self, date: NaiveDate, time: Option<NaiveTime>, now: DateTime<Utc>) {
        self.status = Status::Scheduled;
        self.scheduled_date = Some(date);
        self.scheduled_time = time;
        self.updated_at = now;
    }

    pub fn publish(&mut self, now: DateTime<Utc>) {
        let local = to_project_local(now);
        self.status = Status::Published;
        self.published_date = Some(local.date());
        self.published_time = Some(whole_seconds(local.time()));
        self.updated_at = now;
    }

    pub fn apply_edit(&mut self, edit: PostEdit, now: DateTime<Utc>) {
        if let Some(title) = edit.title {
            self.title = title;
        }
        if let Some(content) = edit.content {
            self.content = content;
        }
        if let Some(platform) = edit.platform {
            self.platform = platform;
        }
        self.updated_at = now;
    }

    pub fn record_engagement(&mut self, engagement: Engagement, now: DateTime<Utc>) {
        self.engagement = Some(engagement);
        self.updated_at = now;
    }

    /// The date stored for `status`, whether or not it is the current one.
    pub fn date_for(&self, status: Status) -> Option<NaiveDate> {
        match status {
            Status::Draft => self.draft_date,
            Status::Scheduled => self.scheduled_date,
            Status::Published => self.published_date,
        }
    }

    pub fn time_for(&self, status: Status) -> Option<NaiveTime> {
        match status {
            Status::Draft => self.draft_time,
            Status::Scheduled => self.scheduled_time,
            Status::Published => self.published_time,
        }
    }

    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }
}

/// Stored times keep whole seconds only, matching what the store writes.
fn whole_seconds(time: NaiveTime) -> NaiveTime {
    time.with_nanosecond(0).unwrap_or(time)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, TimeZone, Timelike, Utc};
    use serde_json::json;

    use super::{Engagement, Post, PostEdit, Status};
    use crate::datetime::{to_project_date, to_project_local};

    #[test]
    fn status_parses_any_case() {
        for raw in ["SCHEDULED", "scheduled", " Scheduled "] {
            assert_eq!(raw.parse::<Status>().expect("status"), Status::Scheduled);
        }
        assert!("archived".parse::<Status>().is_err());
    }

    #[test]
    fn deserializes_lowercase_status_and_short_times() {
        let raw = json!({
            "id": "6f1c2d1e-0f4a-4a52-9d2e-7a4b8f0c1d23",
            "title": "Launch teaser",
            "platform": "Twitter",
            "status": "scheduled",
            "scheduled_date": "2025-06-05",
            "scheduled_time": "14:00",
            "created_at": "2025-06-01T08:00:00Z",
            "updated_at": "2025-06-01T08:00:00Z"
        });

        let post: Post = serde_json::from_value(raw).expect("post");
        assert_eq!(post.status, Status::Scheduled);
        assert_eq!(
            post.scheduled_time,
            Some(NaiveTime::from_hms_opt(14, 0, 0).expect("time"))
        );

        let written = serde_json::to_value(&post).expect("serialize");
        assert_eq!(written["status"], "SCHEDULED");
        assert_eq!(written["scheduled_time"], "14:00");
    }

    #[test]
    fn lifecycle_keeps_earlier_dates() {
        let created = Utc
            .with_ymd_and_hms(2025, 6, 1, 9, 30, 0)
            .single()
            .expect("valid now");
        let mut post = Post::new_draft(
            "Behind the scenes".to_string(),
            String::new(),
            "Instagram".to_string(),
            created,
        );
        assert_eq!(post.status, Status::Draft);
        assert_eq!(post.draft_date, Some(to_project_date(created)));

        let day = chrono::NaiveDate::from_ymd_opt(2025, 6, 5).expect("date");
        post.schedule(day, NaiveTime::from_hms_opt(14, 0, 0), created);
        assert_eq!(post.status, Status::Scheduled);
        assert_eq!(post.date_for(Status::Scheduled), Some(day));
        assert!(post.draft_date.is_some());

        let published = Utc
            .with_ymd_and_hms(2025, 6, 5, 14, 0, 0)
            .single()
            .expect("valid now");
        post.publish(published);
        assert_eq!(post.status, Status::Published);
        assert_eq!(post.published_date, Some(to_project_date(published)));
        assert_eq!(post.scheduled_date, Some(day));
        assert_eq!(post.updated_at, published);
    }

    #[test]
    fn stored_times_drop_fractional_seconds() {
        let now = Utc
            .with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
            .single()
            .expect("valid now")
            + chrono::Duration::milliseconds(250);
        let mut post = Post::new_draft("Teaser".to_string(), String::new(), "Twitter".to_string(), now);
        post.publish(now);

        let whole = to_project_local(now).time().with_nanosecond(0);
        assert_eq!(post.draft_time, whole);
        assert_eq!(post.published_time, whole);
        assert_eq!(post.created_at, now);
    }

    #[test]
    fn edits_and_engagement_touch_only_named_fields() {
        let created = Utc
            .with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
            .single()
            .expect("valid now");
        let later = created + chrono::Duration::hours(2);
        let mut post = Post::new_draft("Old".to_string(), "Body".to_string(), "Twitter".to_string(), created);

        let mut edit = PostEdit::default();
        assert!(edit.is_empty());
        edit.set("Title", "New".to_string()).expect("title");
        assert!(edit.set("title", " ".to_string()).is_err());
        assert!(edit.set("status", "DRAFT".to_string()).is_err());
        post.apply_edit(edit, later);
        assert_eq!(post.title, "New");
        assert_eq!(post.content, "Body");
        assert_eq!(post.updated_at, later);

        let mut engagement = post.engagement.unwrap_or_default();
        engagement.set("likes", 42).expect("likes");
        engagement.set("VIEWS", 156).expect("views");
        assert!(engagement.set("reposts", 1).is_err());
        post.record_engagement(engagement, later);
        assert_eq!(
            post.engagement,
            Some(Engagement {
                likes: 42,
                comments: 0,
                shares: 0,
                views: 156,
            })
        );
    }
}
