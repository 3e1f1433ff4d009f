use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Parser)]
#[command(name = "gym-pulse")]
#[command(about = "Membership status, expiry reminders and broadcasts for gym owners")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "gym-pulse.toml", global = true)]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Pin "today" (YYYY-MM-DD) instead of reading the system clock
    #[arg(long, global = true)]
    pub today: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Member counts by status
    Dashboard,
    /// Members expiring soon or recently expired, most urgent first
    Expiring,
    /// Send one expiry reminder (at most once per membership period)
    Remind {
        #[arg(long)]
        member_id: u64,
    },
    /// Send scheduled reminders to everyone due today
    Sweep,
    /// Clear reminder history after a renewal and confirm it to the member
    Renew {
        #[arg(long)]
        member_id: u64,
    },
    /// Forget the reminder sent in the current period so it can be sent again
    ResetReminder {
        #[arg(long)]
        member_id: u64,
    },
    /// Send a message to every active member
    Broadcast {
        #[arg(short, long)]
        message: String,
    },
    /// Greet a newly registered member
    Welcome {
        #[arg(long)]
        member_id: u64,
    },
    /// Confirm plan and validity to a member
    Confirm {
        #[arg(long)]
        member_id: u64,
    },
    /// Remind a member about a pending payment
    PaymentReminder {
        #[arg(long)]
        member_id: u64,
        /// Outstanding amount; defaults to the member's recorded amount
        #[arg(long)]
        amount: Option<Decimal>,
    },
    /// Recently sent messages, newest first
    History {
        #[arg(long)]
        member_id: Option<u64>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Validate the configuration file and exit
    CheckConfig,
}
