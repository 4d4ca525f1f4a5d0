use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rota_core::types::ScheduleId;

/// Answers who is on call from a file of rotation definitions.
#[derive(Parser, Debug)]
#[command(name = "rota", version, about)]
pub struct Cli {
    /// Schedule document (JSON); overrides `schedules.path` from the config.
    #[arg(long, global = true)]
    pub schedules: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the users on call at an instant.
    Who {
        /// RFC 3339 instant; defaults to now.
        #[arg(long)]
        at: Option<DateTime<Utc>>,

        /// Schedules to query; defaults to every schedule in the document.
        #[arg(long = "schedule")]
        schedule_ids: Vec<ScheduleId>,
    },

    /// Print stretches of constant on-call sets over a range.
    Timeline {
        #[arg(long)]
        from: Option<DateTime<Utc>>,

        #[arg(long)]
        until: Option<DateTime<Utc>>,

        #[arg(long = "schedule")]
        schedule_ids: Vec<ScheduleId>,
    },

    /// List every occurrence of one schedule's shifts over a range.
    Duties {
        #[arg(long = "schedule")]
        schedule_id: ScheduleId,

        #[arg(long)]
        from: Option<DateTime<Utc>>,

        #[arg(long)]
        until: Option<DateTime<Utc>>,
    },

    /// Print one schedule as an iCalendar document.
    Export {
        #[arg(long = "schedule")]
        schedule_id: ScheduleId,
    },
}
