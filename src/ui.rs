use colored::*;
use jiff::{civil::Date, tz::TimeZone};

use crate::models::{
    countdown::{Countdown, Urgency},
    hackathon::{Attendance, Hackathon},
    stage::{Stage, StageStatus, stage_label},
    streak::StreakRecord,
};

/// Get the terminal width, defaulting to 80 if unavailable
fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// First 8 characters of an id, enough to refer to it on the command line
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Format a deadline for display (e.g., "Mar 10, 2025")
pub fn format_deadline(date: Date) -> String {
    date.strftime("%b %d, %Y").to_string()
}

/// Get the appropriate glyph for how close a deadline is
pub fn get_urgency_glyph(countdown: Countdown) -> ColoredString {
    match countdown.urgency() {
        Urgency::Over => "✓".dimmed(),
        Urgency::Urgent => "●".yellow(),
        Urgency::OnTrack => "○".normal(),
    }
}

pub fn get_stage_glyph(stage: &Stage) -> ColoredString {
    match stage.status {
        StageStatus::Done => "✓".dimmed(),
        StageStatus::InProgress => "◐".yellow(),
        StageStatus::Todo => "○".normal(),
    }
}

pub fn format_stage_status(status: StageStatus) -> &'static str {
    match status {
        StageStatus::Todo => "to do",
        StageStatus::InProgress => "in progress",
        StageStatus::Done => "done",
    }
}

/// "Ended", "Due today", "3 days left"
pub fn format_countdown(countdown: Countdown) -> ColoredString {
    let text = match countdown.days_remaining {
        d if d < 0 => "Ended".to_string(),
        0 => "Due today".to_string(),
        1 => "1 day left".to_string(),
        d => format!("{d} days left"),
    };

    match countdown.urgency() {
        Urgency::Over => text.dimmed(),
        Urgency::Urgent => text.yellow().bold(),
        Urgency::OnTrack => text.green(),
    }
}

/// Platform plus where it happens, e.g. "Devpost · virtual"
pub fn get_hackathon_context(hackathon: &Hackathon) -> String {
    let platform = if hackathon.platform.trim().is_empty() {
        "Unspecified platform"
    } else {
        hackathon.platform.as_str()
    };
    let attendance = match hackathon.kind {
        Attendance::InPerson => "in person",
        Attendance::Virtual => "virtual",
    };
    format!("{platform} · {attendance}")
}

/// Links are stored as typed; show them with a scheme
pub fn format_link(link: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        link.to_string()
    } else {
        format!("https://{link}")
    }
}

/// Render a single hackathon line with id, glyph, name, and right-aligned countdown
pub fn render_hackathon_line(hackathon: &Hackathon, today: Date) {
    let terminal_width = get_terminal_width();
    let countdown = Countdown::new(hackathon.deadline(), today);

    let id_str = short_id(&hackathon.id);
    let glyph = get_urgency_glyph(countdown);
    let name = &hackathon.name;

    let left_section = format!("  {}  {}  {}", id_str.dimmed(), glyph, name);
    let styled_left = if countdown.is_over() {
        left_section.dimmed()
    } else {
        left_section.bold()
    };

    let deadline = format_deadline(hackathon.deadline());
    let countdown_text = format_countdown(countdown);
    let right_visible_len = deadline.chars().count() + 3 + countdown_text.chars().count();
    let left_visible_len = format!("  {}  {}  {}", id_str, " ", name).chars().count();

    let total_content = left_visible_len + right_visible_len;
    if total_content + 4 < terminal_width {
        let padding = terminal_width - total_content - 2;
        println!(
            "{}{}{}  {}",
            styled_left,
            " ".repeat(padding),
            deadline.dimmed(),
            countdown_text
        );
    } else {
        // Not enough space for right alignment, just print normally
        println!("{}", styled_left);
        println!("              {}  {}", deadline.dimmed(), countdown_text);
    }

    let mut meta_parts = vec![get_hackathon_context(hackathon)];
    if let Some(active) = hackathon.active_stage() {
        meta_parts.push(format!("{}: {}", stage_label(hackathon.stages()), active.name));
    }
    println!("              {}", meta_parts.join(" • ").dimmed());
}

/// Render every field of a hackathon plus its stages
pub fn render_hackathon_details(hackathon: &Hackathon, today: Date) {
    let countdown = Countdown::new(hackathon.deadline(), today);

    println!();
    print!("  {}", hackathon.name.cyan().bold());
    if countdown.is_urgent() {
        print!("  {}", " URGENT ".black().on_yellow().bold());
    }
    println!("\n");

    println!("    {:<10}{}", "Id".dimmed(), hackathon.id);
    println!(
        "    {:<10}{}  {}",
        "Deadline".dimmed(),
        format_deadline(hackathon.deadline()),
        format_countdown(countdown)
    );
    println!("    {:<10}{}", "Where".dimmed(), get_hackathon_context(hackathon));
    if !hackathon.link.trim().is_empty() {
        println!("    {:<10}{}", "Link".dimmed(), format_link(&hackathon.link).blue());
    }

    if hackathon.is_multistage() {
        render_section_header(&stage_label(hackathon.stages()));
        let active_id = hackathon.active_stage().map(|s| s.id.as_str());
        for stage in hackathon.stages() {
            let line = format!(
                "  {}  {}  {}  {}",
                short_id(&stage.id).dimmed(),
                get_stage_glyph(stage),
                stage.name,
                format_deadline(stage.end_date).dimmed()
            );
            if Some(stage.id.as_str()) == active_id && !stage.completed {
                println!("{}  {}", line.bold(), "← active".yellow());
            } else if stage.completed {
                println!("{}", line.dimmed());
            } else {
                println!("{}", line);
            }
        }
    }
    println!();
}

pub fn render_streak(record: &StreakRecord, tz: &TimeZone) {
    let last = record
        .last_login_day(tz)
        .map(format_deadline)
        .unwrap_or_else(|| "Never".to_string());
    let day_word = if record.count == 1 { "day" } else { "days" };

    println!(
        "\n  {} {} {}   {} {}\n",
        "🔥".normal(),
        record.count.to_string().bold(),
        day_word.bold(),
        "last check-in".dimmed(),
        last
    );
}

/// Render a view header with title and count
pub fn render_view_header(title: &str, count: usize) {
    let word = if count == 1 { "hackathon" } else { "hackathons" };
    println!("\n  {} ({} {})\n", title.cyan().bold(), count, word);
}

/// Render a section header (e.g., "Stage 2 of 3")
pub fn render_section_header(title: &str) {
    println!("\n  ─── {} ───\n", title.bold());
}
