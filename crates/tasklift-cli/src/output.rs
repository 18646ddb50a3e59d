//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};
use tasklift_domain::{EmailThread, MeetingMinutes, StakeholderSummary, Task};
use tasklift_extractor::{RunOutput, RunStats, HIGH_CONFIDENCE};

const EMPTY_CELL: &str = "-";

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the result of an extraction run.
    pub fn format_run(&self, output: &RunOutput) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(output)?),
            OutputFormat::Quiet => Ok(self.format_tasks_quiet(&output.tasks)),
            OutputFormat::Table => Ok(self.format_run_table(output)),
        }
    }

    /// Format a reconstructed email thread.
    pub fn format_thread(&self, thread: &EmailThread) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(thread)?),
            OutputFormat::Quiet => Ok(thread
                .messages
                .iter()
                .map(|m| m.message_id.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => Ok(self.format_thread_table(thread)),
        }
    }

    fn format_run_table(&self, output: &RunOutput) -> String {
        let mut sections = vec![self.format_tasks_table(&output.tasks)];

        if !output.summary.is_empty() {
            sections.push(self.format_summary(&output.summary));
        }
        if let Some(minutes) = &output.meeting_minutes {
            sections.push(self.format_minutes(minutes));
        }
        sections.push(self.format_stats(&output.run_id, &output.stats));

        sections.join("\n\n")
    }

    /// Format tasks as a table.
    fn format_tasks_table(&self, tasks: &[Task]) -> String {
        if tasks.is_empty() {
            return self.colorize("No tasks found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Title", "Owner", "Due", "Priority", "Confidence"]);

        for task in tasks {
            let due = match (&task.due_date_iso, &task.due_date_raw) {
                (Some(iso), _) => iso.format("%Y-%m-%d %H:%M UTC").to_string(),
                (None, Some(raw)) => format!("{} (unresolved)", raw),
                (None, None) => EMPTY_CELL.to_string(),
            };
            let priority = task.priority.map(|p| p.as_str()).unwrap_or(EMPTY_CELL);
            let confidence = format!("{:.2}", task.confidence);
            builder.push_record([
                task.title.as_str(),
                task.owner_raw.as_deref().unwrap_or(EMPTY_CELL),
                due.as_str(),
                priority,
                confidence.as_str(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format tasks in quiet mode (titles only).
    fn format_tasks_quiet(&self, tasks: &[Task]) -> String {
        tasks
            .iter()
            .map(|t| t.title.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn format_summary(&self, summary: &StakeholderSummary) -> String {
        let mut lines = vec![self.colorize("Summary", "cyan")];
        for (heading, items) in [
            ("Decisions", &summary.decisions),
            ("Risks", &summary.risks),
            ("Asks", &summary.asks),
            ("Key points", &summary.key_points),
        ] {
            push_list(&mut lines, heading, items);
        }
        lines.join("\n")
    }

    fn format_minutes(&self, minutes: &MeetingMinutes) -> String {
        let mut lines = vec![self.colorize("Meeting minutes", "cyan")];
        if let Some(title) = &minutes.title {
            lines.push(format!("  Title: {}", title));
        }
        if let Some(date) = &minutes.date {
            lines.push(format!("  Date: {}", date.format("%Y-%m-%d")));
        }
        if !minutes.participants.is_empty() {
            lines.push(format!("  Participants: {}", minutes.participants.join(", ")));
        }
        push_list(&mut lines, "Agenda", &minutes.agenda);
        if let Some(notes) = &minutes.notes {
            lines.push(format!("  Notes: {}", notes));
        }
        push_list(&mut lines, "Next steps", &minutes.next_steps);
        lines.join("\n")
    }

    fn format_stats(&self, run_id: &str, stats: &RunStats) -> String {
        let line = format!(
            "Run {}: {} task(s) from {} candidate(s) in {} chunk(s), {} high confidence (>= {:.1}), {} merged, {} model call(s), {} ms",
            run_id,
            stats.final_task_count,
            stats.candidate_count,
            stats.chunk_count,
            stats.high_confidence_count,
            HIGH_CONFIDENCE,
            stats.merged_count,
            stats.model_call_count,
            stats.wall_clock_ms,
        );
        self.info(&line)
    }

    fn format_thread_table(&self, thread: &EmailThread) -> String {
        let mut lines = vec![
            self.colorize(&thread.subject, "cyan"),
            format!(
                "{} message(s), {} participant(s), threading {}",
                thread.message_count,
                thread.participants.len(),
                if thread.metadata.threading_complete { "complete" } else { "incomplete" }
            ),
        ];
        if !thread.metadata.orphaned_messages.is_empty() {
            lines.push(self.warning(&format!(
                "Orphaned: {}",
                thread.metadata.orphaned_messages.join(", ")
            )));
        }

        let mut builder = Builder::default();
        builder.push_record(["#", "Date", "From", "Subject", "Depth"]);
        for (i, message) in thread.messages.iter().enumerate() {
            let date = message
                .date
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| EMPTY_CELL.to_string());
            builder.push_record([
                (i + 1).to_string(),
                date,
                message.from.display_name().to_string(),
                message.subject.clone(),
                message.depth.to_string(),
            ]);
        }
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        lines.push(table.to_string());

        lines.join("\n")
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn push_list(lines: &mut Vec<String>, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    lines.push(format!("  {}:", heading));
    lines.extend(items.iter().map(|item| format!("    - {}", item)));
}
