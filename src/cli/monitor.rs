//! Live monitoring of the verification audit log.
//!
//! Reads `logs/auth.log` and prints entries colorized by level keyword:
//! red for errors, yellow for warnings, green for successful verifications.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::time::Duration;

const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// Pick a color by the line's level keyword.
pub fn colorize(line: &str) -> String {
    let color = if line.contains("ERROR") || line.contains("CRITICAL") {
        RED
    } else if line.contains("WARNING") {
        YELLOW
    } else if line.contains("INFO") || line.contains("SUCCESS") {
        GREEN
    } else {
        return line.to_string();
    };
    format!("{color}{line}{RESET}")
}

/// Show the last `tail` entries, then optionally keep following the file.
pub fn monitor_auth(log_path: &Path, tail: usize, follow: bool) -> io::Result<()> {
    let mut file = File::open(log_path)?;

    let reader = BufReader::new(&mut file);
    let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;

    println!("Showing last {} log entries:\n", tail);
    for line in lines.iter().rev().take(tail).rev() {
        println!("{}", colorize(line));
    }

    if !follow {
        return Ok(());
    }

    println!("\nMonitoring for new auth events... (Ctrl+C to stop)\n");

    let mut position = file.seek(SeekFrom::End(0))?;
    let mut pending = String::new();
    loop {
        let len = file.metadata()?.len();
        if len > position {
            file.seek(SeekFrom::Start(position))?;
            let mut chunk = String::new();
            file.read_to_string(&mut chunk)?;
            position = file.seek(SeekFrom::Current(0))?;

            pending.push_str(&chunk);
            while let Some(newline) = pending.find('\n') {
                let line: String = pending.drain(..=newline).collect();
                println!("{}", colorize(line.trim_end()));
            }
        }
        std::thread::sleep(Duration::from_millis(100));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_lines_are_red() {
        let line = "[2025-03-14T09:26:53Z] ERROR Invalid credential presented - IP: 1.2.3.4";
        assert!(colorize(line).starts_with(RED));
    }

    #[test]
    fn test_warning_lines_are_yellow() {
        let line = "[2025-03-14T09:26:53Z] WARNING Unrecognized login attempt - IP: 1.2.3.4";
        assert!(colorize(line).starts_with(YELLOW));
    }

    #[test]
    fn test_info_lines_are_green() {
        let line = "[2025-03-14T09:26:53Z] INFO Successful user verification - IP: 1.2.3.4";
        assert!(colorize(line).starts_with(GREEN));
    }

    #[test]
    fn test_unleveled_lines_pass_through() {
        let line = "plain text";
        assert_eq!(colorize(line), line);
    }
}
