use std::io::{IsTerminal, Write};

use anyhow::anyhow;
use chrono::NaiveDate;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::dashboard::{Notice, NoticeLevel};
use crate::filter::TodoFilter;
use crate::reconcile::ReconcileReport;
use crate::stats::Stats;
use crate::todo::{Priority, Status, Todo};

const DESCRIPTION_WIDTH: usize = 40;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => std::io::stdout().is_terminal(),
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn print_stats<W: Write>(&self, out: &mut W, stats: Stats) -> anyhow::Result<()> {
        writeln!(
            out,
            "{} Done   {} Pending   {} Missed",
            self.paint(&stats.done.to_string(), "32"),
            self.paint(&stats.pending.to_string(), "33"),
            self.paint(&stats.missed.to_string(), "31"),
        )?;
        Ok(())
    }

    #[tracing::instrument(skip(self, out, todos))]
    pub fn print_todo_table<W: Write>(
        &self,
        out: &mut W,
        todos: &[&Todo],
        filter: TodoFilter,
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        if !filter.status.is_all() || !filter.priority.is_all() {
            writeln!(out, "status: {}  priority: {}", filter.status, filter.priority)?;
        }

        if todos.is_empty() {
            writeln!(out, "No tasks found")?;
            return Ok(());
        }

        let headers = ["ID", "Deadline", "Priority", "Status", "Title", "Description"]
            .map(String::from)
            .to_vec();

        let rows = todos
            .iter()
            .map(|todo| {
                let deadline = todo.deadline.clone().unwrap_or_default();
                let deadline = if todo.is_overdue(today) && todo.status.is_pending() {
                    self.paint(&deadline, "31")
                } else {
                    deadline
                };
                vec![
                    self.paint(&todo.id.to_string(), "33"),
                    deadline,
                    self.paint_priority(todo.priority),
                    self.paint_status(todo.status),
                    todo.title.clone(),
                    truncate(&todo.description, DESCRIPTION_WIDTH),
                ]
            })
            .collect();

        write_table(out, headers, rows)
    }

    pub fn print_notices<W: Write>(&self, out: &mut W, notices: &[Notice]) -> anyhow::Result<()> {
        for notice in notices {
            let label = match notice.level {
                NoticeLevel::Blocking => self.paint("blocked:", "35"),
                NoticeLevel::Warning => self.paint("warning:", "33"),
                NoticeLevel::Error => self.paint("error:", "31"),
            };
            writeln!(out, "{label} {}", notice.message)?;
        }
        Ok(())
    }

    pub fn print_report<W: Write>(&self, out: &mut W, report: &ReconcileReport) -> anyhow::Result<()> {
        if report.is_noop() {
            writeln!(out, "No overdue todos.")?;
            return Ok(());
        }
        for id in &report.missed {
            writeln!(out, "{} {id}", self.paint("MISSED", "31"))?;
        }
        for (id, error) in &report.failed {
            writeln!(out, "{} {id}: {error}", self.paint("FAILED", "35"))?;
        }
        writeln!(
            out,
            "Marked {} of {} overdue todo(s) as missed.",
            report.missed.len(),
            report.attempted
        )?;
        Ok(())
    }

    fn paint_status(&self, status: Status) -> String {
        let code = match status {
            Status::Done => "32",
            Status::Missed => "31",
            Status::InProgress => "36",
            Status::NotStarted => "0",
        };
        self.paint(status.as_str(), code)
    }

    fn paint_priority(&self, priority: Priority) -> String {
        let code = match priority {
            Priority::Urgent => "1;31",
            Priority::Normal => "0",
            Priority::Later => "2",
        };
        self.paint(priority.as_str(), code)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn truncate(text: &str, max: usize) -> String {
    let flat = text.replace(['\n', '\r'], " ");
    if UnicodeWidthStr::width(flat.as_str()) <= max {
        return flat;
    }
    let mut out = String::new();
    let mut width = 0;
    for ch in flat.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + w + 1 > max {
            break;
        }
        width += w;
        out.push(ch);
    }
    out.push('…');
    out
}

fn write_table<W: Write>(
    writer: &mut W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|h| UnicodeWidthStr::width(h.as_str()))
        .collect();

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    let mut write_row = |cells: &[String]| -> anyhow::Result<()> {
        let mut line = String::new();
        for (idx, cell) in cells.iter().enumerate().take(column_count) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            line.push_str(cell);
            line.push_str(&" ".repeat(widths[idx].saturating_sub(visible_width) + 1));
        }
        writeln!(writer, "{}", line.trim_end())?;
        Ok(())
    };

    write_row(headers.as_slice())?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_row(rule.as_slice())?;
    for row in &rows {
        write_row(row.as_slice())?;
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

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::{Renderer, strip_ansi, truncate};
    use crate::filter::{Selector, TodoFilter};
    use crate::stats::Stats;
    use crate::todo::{Status, Todo};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date")
    }

    fn render(todos: &[Todo], filter: TodoFilter) -> String {
        let refs: Vec<&Todo> = todos.iter().collect();
        let mut out = Vec::new();
        Renderer::plain()
            .print_todo_table(&mut out, &refs, filter, today())
            .expect("render");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn table_lists_columns_aligned() {
        let todos: Vec<Todo> = serde_json::from_value(json!([
            {"id": 1, "title": "Pay rent", "description": "bank", "deadline": "2026-03-05",
             "priority": "URGENT", "status": "NOT_STARTED"},
            {"id": 22, "title": "Gym", "description": "legs", "deadline": "2026-02-01",
             "priority": "LATER", "status": "MISSED"}
        ]))
        .expect("decode todos");

        let text = render(&todos, TodoFilter::default());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ID Deadline   Priority Status"));
        assert!(lines[2].starts_with("1  2026-03-05 URGENT   NOT_STARTED Pay rent"));
        assert!(lines[3].contains("MISSED"));
    }

    #[test]
    fn empty_view_says_so_and_names_filter() {
        let filter = TodoFilter::new(Selector::Only(Status::Done), Selector::All);
        let text = render(&[], filter);
        assert_eq!(text, "status: DONE  priority: ALL\nNo tasks found\n");
    }

    #[test]
    fn stats_line_in_card_order() {
        let mut out = Vec::new();
        Renderer::plain()
            .print_stats(
                &mut out,
                Stats {
                    done: 1,
                    pending: 2,
                    missed: 3,
                    total: 6,
                },
            )
            .expect("render");
        assert_eq!(String::from_utf8(out).expect("utf8"), "1 Done   2 Pending   3 Missed\n");
    }

    #[test]
    fn long_descriptions_are_shortened() {
        let short = truncate("line one\nline two", 40);
        assert_eq!(short, "line one line two");
        let long = truncate(&"x".repeat(60), 10);
        assert_eq!(long.chars().count(), 10);
        assert!(long.ends_with('…'));
        assert_eq!(strip_ansi("\x1b[31mred\x1b[0m"), "red");
    }
}
