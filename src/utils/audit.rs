//! Audit trail for verification attempts.
//!
//! Every verification attempt (success or failure) emits exactly one audit
//! record. The record stream is an append-only contract consumed by
//! `rollcall-cli monitor-auth`, which parses lines by level keyword
//! (ERROR/WARNING/INFO) for colorized display. The line format is stable.
//!
//! The sink is injected through [`crate::state::AppState`] rather than being
//! a process-global, so its destination and lifecycle are owned by whoever
//! builds the state (a file in production, a memory buffer in tests).

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditLevel {
    Info,
    Warning,
    Error,
}

impl AuditLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditLevel::Info => "INFO",
            AuditLevel::Warning => "WARNING",
            AuditLevel::Error => "ERROR",
        }
    }
}

/// One verification attempt's inputs and outcome.
#[derive(Debug, Clone)]
pub struct AuditRecord<'a> {
    pub level: AuditLevel,
    pub message: &'a str,
    /// Email as supplied by the caller (unverified on the email-only path).
    pub email: &'a str,
    pub ip: &'a str,
    pub user_agent: &'a str,
    /// Resolved role, when known.
    pub role: Option<&'a str>,
}

/// Shared in-memory buffer, used as a sink in tests.
pub type MemoryBuffer = Arc<Mutex<Vec<u8>>>;

struct MemorySink(MemoryBuffer);

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Append-only audit sink with a configured destination.
#[derive(Clone)]
pub struct AuditLog {
    sink: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuditLog")
    }
}

impl AuditLog {
    /// Open (or create) `<dir>/auth.log` for appending.
    pub fn to_file(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("auth.log"))?;
        Ok(Self::to_writer(Box::new(file)))
    }

    pub fn to_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Arc::new(Mutex::new(writer)),
        }
    }

    /// Sink into a shared memory buffer; returns the buffer for inspection.
    pub fn to_memory() -> (Self, MemoryBuffer) {
        let buffer: MemoryBuffer = Arc::new(Mutex::new(Vec::new()));
        (Self::to_writer(Box::new(MemorySink(buffer.clone()))), buffer)
    }

    pub fn record(&self, record: &AuditRecord<'_>) {
        let line = format_line(Utc::now(), record);

        {
            let mut sink = self.sink.lock().unwrap();
            let _ = writeln!(sink, "{}", line);
            let _ = sink.flush();
        }

        // Mirror to the tracing pipeline for console visibility.
        match record.level {
            AuditLevel::Info => info!(
                email = %record.email,
                ip = %record.ip,
                role = record.role.unwrap_or("-"),
                "{}", record.message
            ),
            AuditLevel::Warning => warn!(
                email = %record.email,
                ip = %record.ip,
                "{}", record.message
            ),
            AuditLevel::Error => error!(
                email = %record.email,
                ip = %record.ip,
                "{}", record.message
            ),
        }
    }
}

/// Stable line format: `[timestamp] LEVEL message - IP: .. Email: .. UA: ..`
/// with ` Role: ..` appended when the role is known.
fn format_line(now: DateTime<Utc>, record: &AuditRecord<'_>) -> String {
    let mut line = format!(
        "[{}] {} {} - IP: {} Email: {} UA: {}",
        now.to_rfc3339_opts(SecondsFormat::Secs, true),
        record.level.as_str(),
        record.message,
        record.ip,
        record.email,
        record.user_agent,
    );
    if let Some(role) = record.role {
        line.push_str(&format!(" Role: {}", role));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_record(level: AuditLevel) -> AuditRecord<'static> {
        AuditRecord {
            level,
            message: "Successful user verification",
            email: "teacher@inst.hcpss.org",
            ip: "127.0.0.1",
            user_agent: "Mozilla/5.0",
            role: Some("teacher"),
        }
    }

    #[test]
    fn test_line_format_is_stable() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        let line = format_line(now, &sample_record(AuditLevel::Info));
        assert_eq!(
            line,
            "[2025-03-14T09:26:53Z] INFO Successful user verification \
             - IP: 127.0.0.1 Email: teacher@inst.hcpss.org UA: Mozilla/5.0 Role: teacher"
        );
    }

    #[test]
    fn test_level_keyword_is_parseable() {
        let now = Utc::now();
        for (level, keyword) in [
            (AuditLevel::Info, "INFO"),
            (AuditLevel::Warning, "WARNING"),
            (AuditLevel::Error, "ERROR"),
        ] {
            let line = format_line(now, &sample_record(level));
            assert!(line.contains(keyword));
        }
    }

    #[test]
    fn test_role_omitted_when_unknown() {
        let mut record = sample_record(AuditLevel::Warning);
        record.role = None;
        let line = format_line(Utc::now(), &record);
        assert!(!line.contains("Role:"));
    }

    #[test]
    fn test_memory_sink_accumulates_lines() {
        let (audit, buffer) = AuditLog::to_memory();
        audit.record(&sample_record(AuditLevel::Info));
        audit.record(&sample_record(AuditLevel::Warning));

        let contents = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("INFO"));
        assert!(contents.contains("WARNING"));
    }
}
