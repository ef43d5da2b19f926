use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

use crate::post::Post;

pub const POSTS_FILE: &str = "posts.data";

/// One JSON post per line in `posts.data` under the data directory.
#[derive(Debug)]
pub struct DataStore {
    pub data_dir: PathBuf,
    pub posts_path: PathBuf,
}

impl DataStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let posts_path = data_dir.join(POSTS_FILE);
        if !posts_path.exists() {
            fs::write(&posts_path, "")
                .with_context(|| format!("failed to create {}", posts_path.display()))?;
        }

        info!(
            data_dir = %data_dir.display(),
            posts = %posts_path.display(),
            "opened datastore"
        );

        Ok(Self {
            data_dir,
            posts_path,
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn load_posts(&self) -> anyhow::Result<Vec<Post>> {
        load_jsonl(&self.posts_path).with_context(|| format!("failed to load {POSTS_FILE}"))
    }

    #[tracing::instrument(skip(self, posts))]
    pub fn save_posts(&self, posts: &[Post]) -> anyhow::Result<()> {
        save_jsonl_atomic(&self.posts_path, posts)
            .with_context(|| format!("failed to save {POSTS_FILE}"))
    }

    #[tracing::instrument(skip(self, post), fields(id = %post.id))]
    pub fn add_post(&self, post: Post) -> anyhow::Result<Vec<Post>> {
        let mut posts = self.load_posts()?;
        posts.push(post);
        posts.sort_by_key(|p| p.created_at);
        self.save_posts(&posts)?;
        Ok(posts)
    }

    /// Replaces the stored post with the same id.
    #[tracing::instrument(skip(self, post), fields(id = %post.id))]
    pub fn update_post(&self, post: Post) -> anyhow::Result<()> {
        let mut posts = self.load_posts()?;
        let slot = posts
            .iter_mut()
            .find(|p| p.id == post.id)
            .ok_or_else(|| anyhow!("post not found: {}", post.id))?;
        *slot = post;
        self.save_posts(&posts)
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn delete_post(&self, id: Uuid) -> anyhow::Result<Post> {
        let mut posts = self.load_posts()?;
        let idx = posts
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| anyhow!("post not found: {id}"))?;
        let removed = posts.remove(idx);
        self.save_posts(&posts)?;
        info!(remaining = posts.len(), "deleted post");
        Ok(removed)
    }
}

/// Resolves a full id or an unambiguous prefix of its simple (dashless)
/// form.
pub fn find_by_prefix<'a>(posts: &'a [Post], prefix: &str) -> anyhow::Result<&'a Post> {
    if let Ok(id) = Uuid::parse_str(prefix) {
        return posts
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| anyhow!("no post with id {id}"));
    }

    let needle = prefix.trim().replace('-', "").to_ascii_lowercase();
    if needle.is_empty() {
        return Err(anyhow!("post id prefix cannot be empty"));
    }

    let mut matches = posts
        .iter()
        .filter(|p| p.id.simple().to_string().starts_with(&needle));
    match (matches.next(), matches.next()) {
        (Some(post), None) => Ok(post),
        (Some(_), Some(_)) => Err(anyhow!("post id prefix '{prefix}' is ambiguous")),
        (None, _) => Err(anyhow!("no post matches id prefix '{prefix}'")),
    }
}

#[tracing::instrument(skip(path))]
fn load_jsonl(path: &Path) -> anyhow::Result<Vec<Post>> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let post: Post = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(post);
    }

    debug!(count = out.len(), "loaded posts from jsonl");
    Ok(out)
}

#[tracing::instrument(skip(path, posts))]
fn save_jsonl_atomic(path: &Path, posts: &[Post]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = posts.len(), "saving jsonl atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    for post in posts {
        let serialized = serde_json::to_string(post)?;
        writeln!(temp, "{serialized}")?;
    }
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn draft(title: &str) -> Post {
        let now = Utc
            .with_ymd_and_hms(2025, 6, 1, 8, 0, 0)
            .single()
            .expect("valid now");
        Post::new_draft(title.to_string(), String::new(), "Twitter".to_string(), now)
    }

    #[test]
    fn open_creates_empty_posts_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DataStore::open(&dir.path().join("data")).expect("open");
        assert!(store.posts_path.exists());
        assert!(store.load_posts().expect("load").is_empty());
    }

    #[test]
    fn corrupt_line_reports_position() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DataStore::open(dir.path()).expect("open");
        fs::write(&store.posts_path, "\n{not json}\n").expect("write");

        let err = store.load_posts().expect_err("corrupt");
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn update_replaces_by_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DataStore::open(dir.path()).expect("open");
        let post = draft("first");
        store.add_post(post.clone()).expect("add");

        let mut edited = post.clone();
        edited.title = "edited".to_string();
        store.update_post(edited).expect("update");
        assert_eq!(store.load_posts().expect("load")[0].title, "edited");

        assert!(store.update_post(draft("stranger")).is_err());
    }

    #[test]
    fn posts_created_mid_second_load_back_equal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DataStore::open(dir.path()).expect("open");
        let now = Utc
            .with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
            .single()
            .expect("valid now")
            + Duration::milliseconds(250);
        let mut post = Post::new_draft("Teaser".to_string(), String::new(), "Twitter".to_string(), now);
        post.publish(now);

        store.add_post(post.clone()).expect("add");
        assert_eq!(store.load_posts().expect("load"), vec![post]);
    }

    #[test]
    fn delete_removes_only_that_post() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DataStore::open(dir.path()).expect("open");
        let keep = draft("keep");
        let gone = draft("gone");
        store.add_post(keep.clone()).expect("add keep");
        store.add_post(gone.clone()).expect("add gone");

        let removed = store.delete_post(gone.id).expect("delete");
        assert_eq!(removed.title, "gone");
        assert_eq!(store.load_posts().expect("load"), vec![keep]);
        assert!(store.delete_post(gone.id).is_err());
    }

    #[test]
    fn prefix_lookup_requires_unique_match() {
        let posts = vec![draft("a"), draft("b")];
        let full = posts[0].id.to_string();
        assert_eq!(find_by_prefix(&posts, &full).expect("full").title, "a");

        let short = posts[1].short_id();
        assert_eq!(find_by_prefix(&posts, &short).expect("short").title, "b");

        assert!(find_by_prefix(&posts, "").is_err());
        assert!(find_by_prefix(&posts, "zz").is_err());
    }
}
