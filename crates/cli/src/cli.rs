use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

/// Operator tool for the weekly Friday order window.
#[derive(Parser, Debug)]
#[command(name = "friday-cli", version, about = "Operator tool for the weekly Friday order window")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the current cycle, window state and countdown.
    Status(StatusArgs),

    /// Re-render the status on a fixed interval.
    Watch {
        #[command(flatten)]
        source: SourceArgs,

        /// Refresh interval in seconds (defaults to FRIDAY_POLL_INTERVAL_SECS).
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Validate an ordering window the way the admin form does.
    CheckWindow {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },

    /// Summarize a cycle's orders and render the restaurant message.
    Summary {
        /// JSON file holding an array of orders.
        #[arg(long)]
        orders: String,

        /// JSON file holding an array of user profiles; lists members who have not ordered.
        #[arg(long)]
        users: Option<String>,

        /// Evaluate at this RFC 3339 instant instead of now.
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<Utc>>,

        /// Contact phone appended to the message.
        #[arg(long, env = "FRIDAY_CONTACT_PHONE")]
        phone: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Evaluate at this RFC 3339 instant instead of now.
    #[arg(long, value_parser = parse_instant)]
    pub at: Option<DateTime<Utc>>,

    /// Include this member's order for the cycle.
    #[arg(long)]
    pub user: Option<String>,

    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Stored settings and orders, as they would come out of storage.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Window start (HH:MM); default 09:00 when absent or malformed.
    #[arg(long, env = "ORDERING_START_TIME")]
    pub start: Option<String>,

    /// Window end (HH:MM); default 12:30 when absent or malformed.
    #[arg(long, env = "ORDERING_END_TIME")]
    pub end: Option<String>,

    /// JSON file holding an array of orders. A locked record locks its cycle.
    #[arg(long)]
    pub orders: Option<String>,
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected RFC 3339 timestamp: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_instant() {
        let t = parse_instant("2026-10-16T10:00:00+02:00").unwrap();
        assert_eq!(t.to_rfc3339(), "2026-10-16T08:00:00+00:00");
        assert!(parse_instant("friday").is_err());
    }

    #[test]
    fn test_status_args() {
        let args = CliArgs::try_parse_from([
            "friday-cli", "status", "--at", "2026-10-16T10:00:00+02:00", "--start", "09:30", "--orders",
            "orders.json", "--user", "u1",
        ])
        .unwrap();
        match args.command {
            Command::Status(s) => {
                assert_eq!(s.source.start.as_deref(), Some("09:30"));
                assert_eq!(s.source.orders.as_deref(), Some("orders.json"));
                assert_eq!(s.user.as_deref(), Some("u1"));
                assert!(s.at.is_some());
                assert!(!s.json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_locked_flag_is_gone() {
        assert!(CliArgs::try_parse_from(["friday-cli", "status", "--locked"]).is_err());
    }

    #[test]
    fn test_summary_args() {
        let args = CliArgs::try_parse_from([
            "friday-cli", "summary", "--orders", "orders.json", "--users", "users.json",
        ])
        .unwrap();
        match args.command {
            Command::Summary { orders, users, at, .. } => {
                assert_eq!(orders, "orders.json");
                assert_eq!(users.as_deref(), Some("users.json"));
                assert!(at.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
