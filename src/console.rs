//! Colorful console output for the server and the benchmark.

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::time::Duration;

use crate::config::ServerConfig;
use crate::domain::TimetableSnapshot;
use crate::index::RoomScope;

/// ASCII art banner for server startup.
pub fn print_banner() {
    let banner = r#"
  _____ _                _        _     _
 |_   _(_)_ __ ___   ___| |_ __ _| |__ | | ___
   | | | | '_ ` _ \ / _ \ __/ _` | '_ \| |/ _ \
   | | | | | | | | |  __/ || (_| | |_) | |  __/
   |_| |_|_| |_| |_|\___|\__\__,_|_.__/|_|\___|
"#;
    println!("{}", banner.cyan().bold());
    println!(
        "  {} {}\n",
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black(),
        "Timetable Scheduling".bright_cyan()
    );
}

/// Prints the effective configuration.
pub fn print_config(config: &ServerConfig) {
    let scope = match config.policy.room_scope {
        RoomScope::DayAndBlock => "day-block",
        RoomScope::Period => "period",
    };
    println!(
        "{} {} {} listening on {}, room scope ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Server]".bright_cyan(),
        format!("http://{}:{}", config.host, config.port).yellow(),
        scope.white().bold()
    );
}

/// Prints collection sizes of a snapshot.
pub fn print_snapshot_summary(label: &str, snapshot: &TimetableSnapshot) {
    println!(
        "{} {} {} {}: teachers ({}), rooms ({}), groups ({}), blocks ({}), availabilities ({}), entries ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Snapshot]".bright_cyan(),
        label.white().bold(),
        snapshot.teachers.len().to_formatted_string(&Locale::en).bright_yellow(),
        snapshot.rooms.len().to_formatted_string(&Locale::en).bright_yellow(),
        snapshot.groups.len().to_formatted_string(&Locale::en).bright_yellow(),
        snapshot.blocks.len().to_formatted_string(&Locale::en).bright_yellow(),
        snapshot.availabilities.len().to_formatted_string(&Locale::en).bright_yellow(),
        snapshot.entries.len().to_formatted_string(&Locale::en).bright_yellow(),
    );
}

/// Prints one benchmark result line.
pub fn print_throughput(name: &str, calls: u64, elapsed: Duration) {
    let per_sec = if elapsed.as_secs_f64() > 0.0 {
        (calls as f64 / elapsed.as_secs_f64()) as u64
    } else {
        0
    };
    println!(
        "    {} {:<22} │ {:>10} calls │ {} │ {}/sec",
        "→".bright_blue(),
        name.white(),
        calls.to_formatted_string(&Locale::en),
        format!("{:>8}", format_duration(elapsed)).bright_black(),
        per_sec.to_formatted_string(&Locale::en).bright_magenta().bold()
    );
}

fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1000 {
        format!("{}ms", ms)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S%.3f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    }
}
