use anyhow::{Context, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, instrument, warn};

use crate::calendar::{MonthGrid, YearMonth};
use crate::cli::Invocation;
use crate::config::{Config, DEFAULT_UPCOMING_LIMIT};
use crate::dashboard::{
    DEFAULT_RECENT_LIMIT, DashboardSummary, draft_posts, posts_touching_day, upcoming_posts,
};
use crate::datastore::{DataStore, find_by_prefix};
use crate::datetime::{parse_clock_time, parse_date_arg, parse_month_arg, to_project_date};
use crate::display::is_past_date;
use crate::filter::StatusFilter;
use crate::post::{Post, PostEdit};
use crate::render::Renderer;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "calendar", "day", "list", "upcoming", "drafts", "stats", "add", "schedule", "publish",
        "edit", "delete", "engage", "export", "help", "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(store, cfg, renderer, inv))]
pub fn dispatch(
    store: &DataStore,
    cfg: &Config,
    renderer: &mut Renderer,
    inv: Invocation,
) -> anyhow::Result<()> {
    let now = Utc::now();
    let today = to_project_date(now);
    let command = inv.command.as_str();
    let args = inv.command_args.as_slice();

    debug!(command, ?args, %today, "dispatching command");

    match command {
        "calendar" => cmd_calendar(store, renderer, args, today),
        "day" => cmd_day(store, renderer, args, today),
        "list" => cmd_list(store, renderer, args),
        "upcoming" => cmd_upcoming(store, cfg, renderer, today),
        "drafts" => cmd_drafts(store, renderer),
        "stats" => cmd_stats(store, cfg, renderer),
        "add" => cmd_add(store, args, now),
        "schedule" => cmd_schedule(store, args, now, today),
        "publish" => cmd_publish(store, args, now),
        "edit" => cmd_edit(store, args, now),
        "delete" => cmd_delete(store, args),
        "engage" => cmd_engage(store, args, now),
        "export" => cmd_export(store, args),
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct CalendarArgs {
    month: Option<String>,
    select: Option<String>,
}

fn parse_calendar_args(args: &[String]) -> anyhow::Result<CalendarArgs> {
    let mut parsed = CalendarArgs::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if let Some(value) = arg.strip_prefix("--select=") {
            parsed.select = Some(value.to_string());
        } else if arg == "--select" {
            let value = iter
                .next()
                .ok_or_else(|| anyhow!("--select requires a date"))?;
            parsed.select = Some(value.clone());
        } else if parsed.month.is_none() {
            parsed.month = Some(arg.clone());
        } else {
            return Err(anyhow!("unexpected calendar argument: {arg}"));
        }
    }
    Ok(parsed)
}

#[instrument(skip(store, renderer, args))]
fn cmd_calendar(
    store: &DataStore,
    renderer: &mut Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command calendar");

    let parsed = parse_calendar_args(args)?;
    let selected = parsed
        .select
        .as_deref()
        .map(|raw| parse_date_arg(raw, today))
        .transpose()?;
    let month = match (parsed.month.as_deref(), selected) {
        (Some(raw), _) => parse_month_arg(raw, today)?,
        (None, Some(date)) => YearMonth::containing(date),
        (None, None) => YearMonth::containing(today),
    };

    let posts = store.load_posts()?;
    let grid = MonthGrid::build(month, &posts, today, selected);
    renderer.print_month_grid(&grid)?;

    if let Some(date) = selected {
        if !month.contains(date) {
            warn!(%date, %month, "selected day is outside the displayed month");
        }
        println!();
        renderer.print_day_details(date, &posts_touching_day(&posts, date))?;
    }
    Ok(())
}

#[instrument(skip(store, renderer, args))]
fn cmd_day(
    store: &DataStore,
    renderer: &mut Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command day");

    let raw_date = args
        .first()
        .ok_or_else(|| anyhow!("day requires a date"))?;
    let date = parse_date_arg(raw_date, today)?;
    let filter = parse_status_arg(args.get(1))?;

    let posts = store.load_posts()?;
    let rows = filter.apply(posts_touching_day(&posts, date));
    renderer.print_day_details(date, &rows)?;
    Ok(())
}

#[instrument(skip(store, renderer, args))]
fn cmd_list(store: &DataStore, renderer: &mut Renderer, args: &[String]) -> anyhow::Result<()> {
    info!("command list");

    let filter = parse_status_arg(args.first())?;
    let posts = store.load_posts()?;
    let rows = filter.apply(&posts);
    renderer.print_post_table(&rows)?;
    Ok(())
}

#[instrument(skip(store, cfg, renderer))]
fn cmd_upcoming(
    store: &DataStore,
    cfg: &Config,
    renderer: &mut Renderer,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command upcoming");

    let limit = cfg
        .get_usize("upcoming.limit")?
        .unwrap_or(DEFAULT_UPCOMING_LIMIT);
    let posts = store.load_posts()?;
    let mut rows = upcoming_posts(&posts, today);
    rows.truncate(limit);
    renderer.print_post_table(&rows)?;
    Ok(())
}

#[instrument(skip(store, renderer))]
fn cmd_drafts(store: &DataStore, renderer: &mut Renderer) -> anyhow::Result<()> {
    info!("command drafts");

    let posts = store.load_posts()?;
    renderer.print_post_table(&draft_posts(&posts))?;
    Ok(())
}

#[instrument(skip(store, cfg, renderer))]
fn cmd_stats(store: &DataStore, cfg: &Config, renderer: &mut Renderer) -> anyhow::Result<()> {
    info!("command stats");

    let recent_limit = cfg
        .get_usize("recent.limit")?
        .unwrap_or(DEFAULT_RECENT_LIMIT);
    let posts = store.load_posts()?;
    let summary = DashboardSummary::build(&posts, recent_limit);
    renderer.print_stats(&summary)?;
    Ok(())
}

#[instrument(skip(store, args, now))]
fn cmd_add(store: &DataStore, args: &[String], now: DateTime<Utc>) -> anyhow::Result<()> {
    info!("command add");

    let [platform, title, content @ ..] = args else {
        return Err(anyhow!("add requires <platform> <title> [content...]"));
    };
    if title.trim().is_empty() {
        return Err(anyhow!("post title cannot be empty"));
    }

    let post = Post::new_draft(title.clone(), content.join(" "), platform.clone(), now);
    let short_id = post.short_id();
    let posts = store.add_post(post)?;

    debug!(post_count = posts.len(), "post added");
    println!("Created draft {short_id}.");
    Ok(())
}

#[instrument(skip(store, args, now))]
fn cmd_schedule(
    store: &DataStore,
    args: &[String],
    now: DateTime<Utc>,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command schedule");

    let [prefix, raw_date, raw_time] = args else {
        return Err(anyhow!("schedule requires <id-prefix> <date> <HH:MM>"));
    };
    let date = parse_date_arg(raw_date, today)?;
    if is_past_date(date, today) {
        return Err(anyhow!("cannot schedule a post on {date}, which is in the past"));
    }
    let time = parse_clock_time(raw_time)
        .ok_or_else(|| anyhow!("invalid time '{raw_time}', expected HH:MM"))?;

    let posts = store.load_posts()?;
    let mut post = find_by_prefix(&posts, prefix)?.clone();
    post.schedule(date, Some(time), now);
    let short_id = post.short_id();
    store
        .update_post(post)
        .with_context(|| format!("failed to schedule post {short_id}"))?;

    println!("Scheduled {short_id} for {date} {}.", time.format("%H:%M"));
    Ok(())
}

#[instrument(skip(store, args, now))]
fn cmd_publish(store: &DataStore, args: &[String], now: DateTime<Utc>) -> anyhow::Result<()> {
    info!("command publish");

    let [prefix] = args else {
        return Err(anyhow!("publish requires <id-prefix>"));
    };

    let posts = store.load_posts()?;
    let mut post = find_by_prefix(&posts, prefix)?.clone();
    post.publish(now);
    let short_id = post.short_id();
    store
        .update_post(post)
        .with_context(|| format!("failed to publish post {short_id}"))?;

    println!("Published {short_id}.");
    Ok(())
}

#[instrument(skip(store, args, now))]
fn cmd_edit(store: &DataStore, args: &[String], now: DateTime<Utc>) -> anyhow::Result<()> {
    info!("command edit");

    let [prefix, assignments @ ..] = args else {
        return Err(anyhow!("edit requires <id-prefix> field=value..."));
    };

    let mut edit = PostEdit::default();
    for raw in assignments {
        let (field, value) = split_assignment(raw)?;
        edit.set(field, value.to_string())?;
    }
    if edit.is_empty() {
        return Err(anyhow!("edit requires at least one of title=, content=, platform="));
    }

    let posts = store.load_posts()?;
    let mut post = find_by_prefix(&posts, prefix)?.clone();
    post.apply_edit(edit, now);
    let short_id = post.short_id();
    store
        .update_post(post)
        .with_context(|| format!("failed to edit post {short_id}"))?;

    println!("Updated {short_id}.");
    Ok(())
}

#[instrument(skip(store, args))]
fn cmd_delete(store: &DataStore, args: &[String]) -> anyhow::Result<()> {
    info!("command delete");

    let [prefix] = args else {
        return Err(anyhow!("delete requires <id-prefix>"));
    };

    let posts = store.load_posts()?;
    let id = find_by_prefix(&posts, prefix)?.id;
    let removed = store.delete_post(id)?;

    println!("Deleted {} ({}).", removed.short_id(), removed.title);
    Ok(())
}

#[instrument(skip(store, args, now))]
fn cmd_engage(store: &DataStore, args: &[String], now: DateTime<Utc>) -> anyhow::Result<()> {
    info!("command engage");

    let [prefix, metrics @ ..] = args else {
        return Err(anyhow!("engage requires <id-prefix> metric=N..."));
    };
    if metrics.is_empty() {
        return Err(anyhow!("engage requires at least one of likes=, comments=, shares=, views="));
    }

    let posts = store.load_posts()?;
    let mut post = find_by_prefix(&posts, prefix)?.clone();
    let mut engagement = post.engagement.unwrap_or_default();
    for raw in metrics {
        let (metric, value) = split_assignment(raw)?;
        let count = value
            .parse::<u64>()
            .with_context(|| format!("{metric} must be a non-negative integer, got '{value}'"))?;
        engagement.set(metric, count)?;
    }
    post.record_engagement(engagement, now);
    let short_id = post.short_id();
    store
        .update_post(post)
        .with_context(|| format!("failed to record engagement for {short_id}"))?;

    println!("Recorded engagement for {short_id}.");
    Ok(())
}

#[instrument(skip(store, args))]
fn cmd_export(store: &DataStore, args: &[String]) -> anyhow::Result<()> {
    info!("command export");

    let filter = parse_status_arg(args.first())?;
    let posts = store.load_posts()?;
    let rows = filter.apply(&posts);

    let out = serde_json::to_string(&rows)?;
    println!("{out}");
    Ok(())
}

fn cmd_help() -> anyhow::Result<()> {
    println!(
        "Commands: calendar [YYYY-MM] [--select DATE], day <DATE> [status], list [status], upcoming, drafts, stats, add <platform> <title> [content...], schedule <id> <DATE> <HH:MM>, publish <id>, edit <id> field=value..., delete <id>, engage <id> metric=N..., export [status], help, version"
    );
    Ok(())
}

fn split_assignment(raw: &str) -> anyhow::Result<(&str, &str)> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| anyhow!("expected key=value, got: {raw}"))
}

fn parse_status_arg(raw: Option<&String>) -> anyhow::Result<StatusFilter> {
    raw.map_or(Ok(StatusFilter::All), |raw| {
        StatusFilter::parse(raw).map_err(anyhow::Error::from)
    })
}
