use std::io::{self, IsTerminal, Write};

use chrono::NaiveDate;
use unicode_width::UnicodeWidthStr;

use crate::calendar::{GridCell, MonthGrid, WEEKDAY_LABELS, effective_date};
use crate::config::Config;
use crate::dashboard::DashboardSummary;
use crate::display::{ClockFormat, StatusColor, day_heading, display_time, legend, status_label};
use crate::post::Post;

const CELL_WIDTH: usize = 9;
const MAX_DOTS: usize = 3;
const DIM: &str = "2";

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    clock: ClockFormat,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = cfg.get_bool("color")?.unwrap_or(true);

        Ok(Self {
            color: color && io::stdout().is_terminal(),
            clock: cfg.clock_format()?,
        })
    }

    pub fn plain(clock: ClockFormat) -> Self {
        Self {
            color: false,
            clock,
        }
    }

    #[tracing::instrument(skip(self, grid), fields(month = %grid.month))]
    pub fn print_month_grid(&mut self, grid: &MonthGrid<'_>) -> anyhow::Result<()> {
        self.write_month_grid(io::stdout().lock(), grid)
    }

    pub fn write_month_grid<W: Write>(&self, mut out: W, grid: &MonthGrid<'_>) -> anyhow::Result<()> {
        writeln!(out, "{}", grid.month.title())?;
        for label in WEEKDAY_LABELS {
            write!(out, "{label:<CELL_WIDTH$}")?;
        }
        writeln!(out)?;

        for week in grid.weeks() {
            let line = week
                .iter()
                .map(|cell| pad(&self.grid_cell(cell), CELL_WIDTH))
                .collect::<String>();
            writeln!(out, "{}", line.trim_end())?;
        }

        writeln!(out)?;
        self.write_legend(&mut out)?;
        Ok(())
    }

    fn grid_cell(&self, cell: &GridCell<'_>) -> String {
        let Some(day) = cell.day() else {
            return String::new();
        };

        let mut label = day.to_string();
        if cell.is_today {
            label.push('*');
        }
        if cell.is_selected {
            label = format!("[{label}]");
        }
        if cell.is_past && cell.posts.is_empty() {
            label = self.paint(&label, DIM);
        }

        let dots = cell
            .posts
            .iter()
            .take(MAX_DOTS)
            .map(|post| self.paint("o", StatusColor::for_status(post.status).ansi_code()))
            .collect::<String>();
        let overflow = cell.posts.len().saturating_sub(MAX_DOTS);
        if overflow > 0 {
            format!("{label} {dots}+{overflow}")
        } else if dots.is_empty() {
            label
        } else {
            format!("{label} {dots}")
        }
    }

    pub fn write_legend<W: Write>(&self, mut out: W) -> anyhow::Result<()> {
        let entries = legend()
            .iter()
            .map(|(status, color)| format!("{} {}", self.paint("o", color.ansi_code()), status_label(*status)))
            .collect::<Vec<_>>()
            .join("   ");
        writeln!(out, "{entries}")?;
        Ok(())
    }

    #[tracing::instrument(skip(self, posts), fields(count = posts.len()))]
    pub fn print_post_table(&mut self, posts: &[&Post]) -> anyhow::Result<()> {
        self.write_post_table(io::stdout().lock(), posts)
    }

    pub fn write_post_table<W: Write>(&self, out: W, posts: &[&Post]) -> anyhow::Result<()> {
        let headers = ["ID", "Date", "Time", "Status", "Platform", "Title"]
            .map(str::to_string)
            .to_vec();

        let rows = posts
            .iter()
            .map(|post| {
                let date = effective_date(post)
                    .map(|date| date.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                let status = self.paint(
                    status_label(post.status),
                    StatusColor::for_status(post.status).ansi_code(),
                );
                vec![
                    post.short_id(),
                    date,
                    display_time(post, self.clock),
                    status,
                    post.platform.clone(),
                    post.title.clone(),
                ]
            })
            .collect();

        write_table(out, headers, rows)
    }

    #[tracing::instrument(skip(self, posts), fields(count = posts.len()))]
    pub fn print_day_details(&mut self, date: NaiveDate, posts: &[&Post]) -> anyhow::Result<()> {
        self.write_day_details(io::stdout().lock(), date, posts)
    }

    pub fn write_day_details<W: Write>(
        &self,
        mut out: W,
        date: NaiveDate,
        posts: &[&Post],
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", day_heading(date))?;
        if posts.is_empty() {
            writeln!(out, "No posts for this day")?;
            return Ok(());
        }

        for post in posts {
            let status = self.paint(
                status_label(post.status),
                StatusColor::for_status(post.status).ansi_code(),
            );
            writeln!(
                out,
                "  {:>8}  {}  {}  {}",
                display_time(post, self.clock),
                status,
                post.platform,
                post.title
            )?;
            if !post.content.is_empty() {
                writeln!(out, "            {}", post.content)?;
            }
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, summary))]
    pub fn print_stats(&mut self, summary: &DashboardSummary<'_>) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let counts = summary.counts;
        writeln!(out, "Total posts  {}", counts.total)?;
        for (status, color) in legend() {
            let label = self.paint(status_label(status), color.ansi_code());
            writeln!(out, "{}{}", pad(&label, 13), counts.count(status))?;
        }

        let engagement = summary.engagement;
        if engagement.posts > 0 {
            writeln!(out)?;
            writeln!(
                out,
                "Engagement over {} posts: {} likes, {} comments, {} shares, {} views",
                engagement.posts, engagement.likes, engagement.comments, engagement.shares, engagement.views
            )?;
        }

        if !summary.recent.is_empty() {
            writeln!(out)?;
            writeln!(out, "Recent posts")?;
            self.write_post_table(&mut out, &summary.recent)?;
        }
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn pad(cell: &str, width: usize) -> String {
    let visible = UnicodeWidthStr::width(strip_ansi(cell).as_str());
    format!("{cell}{}", " ".repeat(width.saturating_sub(visible).max(1)))
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let mut widths = headers
        .iter()
        .map(|header| UnicodeWidthStr::width(header.as_str()))
        .collect::<Vec<_>>();

    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (header, &width) in headers.iter().zip(&widths) {
        write!(writer, "{header:width$} ")?;
    }
    writeln!(writer)?;

    for &width in &widths {
        write!(writer, "{:-<width$} ", "")?;
    }
    writeln!(writer)?;

    for row in rows {
        for (cell, &width) in row.iter().zip(&widths) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
