use clap::Parser;
use gym_pulse::adapters::{FileMemberStore, JsonFileMessageLog, JsonFileReminderStore};
use gym_pulse::config::{build_clock, build_sink};
use gym_pulse::utils::error::ErrorSeverity;
use gym_pulse::utils::{logger, validation::Validate};
use gym_pulse::{CliArgs, Command, GymConfig, GymError, LifecycleEngine};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    if let Err(e) = run(args).await {
        tracing::error!(
            "❌ gym-pulse failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

fn load_config(path: &str) -> Result<GymConfig, GymError> {
    if Path::new(path).exists() {
        tracing::info!("📁 Loading configuration from: {}", path);
        GymConfig::from_file(path)
    } else {
        tracing::warn!("Config file '{}' not found, using defaults", path);
        Ok(GymConfig::default())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), GymError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(args: CliArgs) -> Result<(), GymError> {
    let config = load_config(&args.config)?;
    config.validate()?;
    if args.verbose {
        tracing::debug!("Config: {:?}", config);
    }

    if let Command::CheckConfig = args.command {
        println!("✅ Configuration is valid");
        print_json(&config)?;
        return Ok(());
    }

    let store = FileMemberStore::from_path(&config.storage.members_path);
    let clock = build_clock(&config, args.today)?;
    let sink = build_sink(&config)?;
    let reminders = JsonFileReminderStore::open(&config.storage.reminders_path).await?;
    let message_log = JsonFileMessageLog::new(&config.storage.message_log_path);
    let engine = LifecycleEngine::new(store, clock, sink, reminders, config.engine_settings())
        .with_message_log(Arc::new(message_log));

    tracing::info!("Running {:?} for {}", args.command, engine.today());

    match args.command {
        Command::Dashboard => print_json(&engine.dashboard().await?),
        Command::Expiring => print_json(&engine.expiring().await?),
        Command::Remind { member_id } => print_json(&engine.send_reminder(member_id).await?),
        Command::Sweep => print_json(&engine.run_reminder_sweep().await?),
        Command::Renew { member_id } => print_json(&engine.record_renewal(member_id).await?),
        Command::ResetReminder { member_id } => {
            engine.clear_reminder(member_id).await?;
            println!("✅ Reminder history cleared for member {}", member_id);
            Ok(())
        }
        Command::Welcome { member_id } => print_json(&engine.send_welcome(member_id).await?),
        Command::Confirm { member_id } => {
            print_json(&engine.send_membership_confirmation(member_id).await?)
        }
        Command::PaymentReminder { member_id, amount } => {
            print_json(&engine.send_payment_reminder(member_id, amount).await?)
        }
        Command::History { member_id, limit } => {
            print_json(&engine.message_history(member_id, limit).await?)
        }
        Command::Broadcast { message } => {
            let report = engine.broadcast(&message).await?;
            println!(
                "📣 Broadcast delivered to {}/{} active members ({:.1}%)",
                report.sent_count,
                report.attempted,
                report.success_rate()
            );
            print_json(&report)
        }
        Command::CheckConfig => Ok(()),
    }
}
