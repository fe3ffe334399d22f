//! `clantimer` command-line host.
//!
//! # Responsibility
//! - Resolve configuration, open the SQLite store, and dispatch commands.
//! - Translate user-facing names into stable ids at this boundary.
//!
//! Every invocation reconciles elapsed timers once before running the
//! command; completions are announced on stderr.

mod render;

use anyhow::{bail, Context, Result};
use clantimer_core::ticker;
use clantimer_core::{
    init_logging, AccountId, AppConfig, Clock, EditOutcome, SqliteSnapshotStore, SystemClock,
    TimerDuration, TimerId, TimerService,
};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

type Service = TimerService<SqliteSnapshotStore>;

#[derive(Parser)]
#[command(
    name = "clantimer",
    version,
    about = "Track builder and laboratory timers across game accounts"
)]
struct Cli {
    /// JSON config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// SQLite data file; overrides the config file.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Directory for rolling log files; overrides the config file.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    /// trace|debug|info|warn|error; overrides the config file.
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List accounts, most available timers first.
    Accounts,
    /// List one account's timers, soonest available first.
    Timers { account: String },
    /// Create an account with the preset timers.
    AddAccount { name: String },
    RenameAccount { account: String, new_name: String },
    DeleteAccount { account: String },
    AddTimer { account: String, name: String },
    RenameTimer {
        account: String,
        timer: String,
        new_name: String,
    },
    RemoveTimer { account: String, timer: String },
    /// Start a countdown, e.g. `start Main "Builder 1" 1d4h` or `--hours 2 --minutes 30`.
    ///
    /// A zero duration clears the timer.
    Start {
        account: String,
        timer: String,
        /// Compact duration such as `2h 30m` or `1d4h`.
        duration: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        hours: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        minutes: Option<String>,
    },
    /// Mark a timer available now.
    Clear { account: String, timer: String },
    /// Write all accounts as pretty-printed JSON.
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Append accounts from an exported JSON file.
    Import { file: PathBuf },
    /// Keep reconciling on an interval and redraw the list.
    Watch {
        /// Show one account's timers instead of the account list.
        account: Option<String>,
        /// Stop after this many ticks.
        #[arg(long)]
        ticks: Option<u32>,
        /// Override the refresh interval.
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    if let Some(log_dir) = &config.log_dir {
        let log_dir = std::path::absolute(log_dir)
            .with_context(|| format!("cannot resolve log dir `{}`", log_dir.display()))?;
        init_logging(&config.log_level, &log_dir)?;
    }

    let store = SqliteSnapshotStore::open(&config.data_path)
        .with_context(|| format!("cannot open data file `{}`", config.data_path.display()))?;
    let mut service = TimerService::open(store).context("cannot load timers")?;

    let clock = SystemClock;
    let report = service.tick(clock.now_epoch_ms())?;
    for completed in &report.completed {
        eprintln!("{}", render::completion(completed));
    }

    run(cli.command, service, &config, &clock)
}

fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.data_path = db.clone();
    }
    if let Some(log_dir) = &cli.log_dir {
        config.log_dir = Some(log_dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

fn run(
    command: Command,
    mut service: Service,
    config: &AppConfig,
    clock: &SystemClock,
) -> Result<()> {
    let now = clock.now_epoch_ms();
    match command {
        Command::Accounts => print!("{}", render::account_list(&service.account_summaries(now))),
        Command::Timers { account } => {
            let account_id = resolve_account(&service, &account)?;
            print_timers(&service, account_id, now)?;
        }
        Command::AddAccount { name } => {
            service.create_account(&name)?;
            println!("Added account `{}`", name.trim());
        }
        Command::RenameAccount { account, new_name } => {
            let account_id = resolve_account(&service, &account)?;
            report(service.rename_account(account_id, &new_name)?);
        }
        Command::DeleteAccount { account } => {
            let account_id = resolve_account(&service, &account)?;
            report(service.delete_account(account_id)?);
        }
        Command::AddTimer { account, name } => {
            let account_id = resolve_account(&service, &account)?;
            match service.add_timer(account_id, &name)? {
                Some(_) => println!("Added timer `{}`", name.trim()),
                None => report(EditOutcome::NotFound),
            }
        }
        Command::RenameTimer {
            account,
            timer,
            new_name,
        } => {
            let (account_id, timer_id) = resolve_timer(&service, &account, &timer)?;
            report(service.rename_timer(account_id, timer_id, &new_name)?);
        }
        Command::RemoveTimer { account, timer } => {
            let (account_id, timer_id) = resolve_timer(&service, &account, &timer)?;
            report(service.remove_timer(account_id, timer_id)?);
        }
        Command::Start {
            account,
            timer,
            duration,
            hours,
            minutes,
        } => {
            let (account_id, timer_id) = resolve_timer(&service, &account, &timer)?;
            let duration = match duration {
                Some(text) => TimerDuration::parse(&text)?,
                None if hours.is_none() && minutes.is_none() => {
                    bail!("give a duration such as `2h 30m`, or --hours/--minutes")
                }
                None => TimerDuration::from_form(
                    hours.as_deref().unwrap_or(""),
                    minutes.as_deref().unwrap_or(""),
                )?,
            };
            report(service.set_timer(account_id, timer_id, duration, now)?);
            print_timers(&service, account_id, now)?;
        }
        Command::Clear { account, timer } => {
            let (account_id, timer_id) = resolve_timer(&service, &account, &timer)?;
            report(service.clear_timer(account_id, timer_id)?);
        }
        Command::Export { output } => {
            let json = service.export_json()?;
            match output {
                Some(path) => std::fs::write(&path, json + "\n")
                    .with_context(|| format!("cannot write `{}`", path.display()))?,
                None => println!("{json}"),
            }
        }
        Command::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("cannot read `{}`", file.display()))?;
            let added = service.import_json(&text)?;
            println!("Imported {added} account(s)");
        }
        Command::Watch {
            account,
            ticks,
            interval_secs,
        } => watch(service, config, account, ticks, interval_secs)?,
    }
    Ok(())
}

fn watch(
    service: Service,
    config: &AppConfig,
    account: Option<String>,
    ticks: Option<u32>,
    interval_secs: Option<u64>,
) -> Result<()> {
    let account_id = account
        .as_deref()
        .map(|name| resolve_account(&service, name))
        .transpose()?;
    let interval = match (interval_secs, account_id) {
        (Some(secs), _) => Duration::from_secs(secs.max(1)),
        (None, Some(_)) => config.timer_refresh_interval(),
        (None, None) => config.account_refresh_interval(),
    };

    let shared = ticker::shared(service);
    let draw = |service: &Service, now: i64| -> Result<()> {
        match account_id {
            Some(account_id) => print_timers(service, account_id, now),
            None => {
                print!("{}", render::account_list(&service.account_summaries(now)));
                Ok(())
            }
        }
    };

    {
        let guard = shared
            .lock()
            .map_err(|_| anyhow::anyhow!("timer service lock poisoned"))?;
        draw(&guard, SystemClock.now_epoch_ms())?;
    }

    let (tx, rx) = mpsc::channel();
    let handle = ticker::start(shared.clone(), SystemClock, interval, move |result| {
        let _ = tx.send(result);
    })
    .context("cannot start tick loop")?;
    info!(
        "event=watch module=cli status=start interval_ms={}",
        interval.as_millis()
    );

    let mut seen = 0u32;
    while ticks.map_or(true, |limit| seen < limit) {
        let Ok(result) = rx.recv() else { break };
        seen += 1;
        match result {
            Ok(report) => {
                for completed in &report.completed {
                    eprintln!("{}", render::completion(completed));
                }
            }
            Err(err) => eprintln!("warning: {err}"),
        }
        let guard = shared
            .lock()
            .map_err(|_| anyhow::anyhow!("timer service lock poisoned"))?;
        println!();
        draw(&guard, SystemClock.now_epoch_ms())?;
    }

    handle.stop();
    Ok(())
}

fn print_timers(service: &Service, account_id: AccountId, now: i64) -> Result<()> {
    let Some(account) = service.snapshot().account(account_id) else {
        bail!("account no longer exists");
    };
    let views = service.timer_views(account_id, now).unwrap_or_default();
    print!("{}", render::timer_list(&account.name, &views));
    Ok(())
}

fn resolve_account(service: &Service, name: &str) -> Result<AccountId> {
    match service.find_account(name) {
        Some(account) => Ok(account.id),
        None => bail!("no account named `{}`", name.trim()),
    }
}

fn resolve_timer(service: &Service, account: &str, timer: &str) -> Result<(AccountId, TimerId)> {
    let account_id = resolve_account(service, account)?;
    match service.find_timer(account_id, timer) {
        Some(found) => Ok((account_id, found.id)),
        None => bail!("no timer named `{}` in `{}`", timer.trim(), account.trim()),
    }
}

fn report(outcome: EditOutcome) {
    match outcome {
        EditOutcome::Applied => println!("Saved"),
        EditOutcome::NotFound => eprintln!("Nothing changed: the item no longer exists"),
    }
}
