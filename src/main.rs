// Event Countdown Application
// Main entry point

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use tokio::runtime::Handle;

use event_countdown::models::event::{Event, EventId};
use event_countdown::models::offset::{NotificationOffset, OffsetSelection};
use event_countdown::models::settings::AppConfig;
use event_countdown::services::countdown::EventStore;
use event_countdown::services::notification::{
    AlertCenter, DesktopAlertCenter, InMemoryAlertCenter, NotificationScheduler,
};
use event_countdown::services::settings::{resolve_data_dir, ConfigService};
use event_countdown::services::storage::{
    open_store, open_store_read_only, BlobStore, MemoryBlobStore,
};
use event_countdown::services::widget::WidgetProvider;
use event_countdown::utils::clock::SystemClock;
use event_countdown::utils::date::{format_short_date_time, parse_date_time};

#[derive(Parser)]
#[command(name = "event-countdown")]
#[command(about = "Count down to upcoming events and get reminded before they start")]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config.toml with the default settings
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
    /// List upcoming events, soonest first
    List {
        /// Also show each event's reminders
        #[arg(short, long)]
        reminders: bool,
    },
    /// Show the countdown to the next event
    Next,
    Add {
        title: String,

        /// Event date/time (RFC 3339, or local "2025-03-20T15:00")
        #[arg(short, long)]
        at: String,

        /// Reminder offsets in seconds before the event (defaults to the full catalog)
        #[arg(short, long, value_delimiter = ',')]
        offsets: Option<Vec<u64>>,

        /// Extra reminder at an absolute time; may be repeated
        #[arg(long)]
        remind_at: Vec<String>,
    },
    Edit {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        at: Option<String>,

        /// Replace the reminder offsets (seconds before the event)
        #[arg(short, long, value_delimiter = ',')]
        offsets: Option<Vec<u64>>,

        /// Extra reminder at an absolute time; may be repeated
        #[arg(long)]
        remind_at: Vec<String>,

        /// Drop a reminder offset (seconds); may be repeated
        #[arg(long)]
        drop_offset: Vec<u64>,
    },
    Remove {
        id: String,
    },
    /// Print what the widget would show
    Widget,
    /// Keep running and deliver desktop reminders for all upcoming events
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config_service = match cli.config {
        Some(path) => ConfigService::new(path),
        None => ConfigService::with_default_path(),
    };
    let config = config_service.load()?;

    log::info!("Starting Event Countdown");

    match cli.command {
        Commands::Init { force } => {
            if config_service.path().exists() && !force {
                bail!(
                    "{} already exists; pass --force to overwrite",
                    config_service.path().display()
                );
            }
            config_service.save(&AppConfig::default())?;
            println!("Wrote {}", config_service.path().display());
            Ok(())
        }
        Commands::Widget => run_widget(&config),
        Commands::List { reminders } => {
            let store = open_event_store(&config, false)?;
            for event in store.list_events() {
                print_event(&event, &store);
                if reminders {
                    print_reminders(&event);
                }
            }
            Ok(())
        }
        Commands::Next => {
            let store = open_event_store(&config, false)?;
            match store.next_event() {
                Some(event) => {
                    print_event(event, &store);
                    print_reminders(event);
                }
                None => println!("No upcoming events"),
            }
            Ok(())
        }
        Commands::Add {
            title,
            at,
            offsets,
            remind_at,
        } => {
            let mut store = open_event_store(&config, false)?;
            store.request_authorization().await;

            let date = parse_date_time(&at).map_err(|e| anyhow!(e))?;
            let selection = match offsets {
                Some(seconds) => OffsetSelection::new(to_offsets(seconds)),
                None => OffsetSelection::default(),
            };
            let selection = with_custom_reminders(selection, date, &remind_at, store.now())?;

            let event = Event::with_offsets(title, date, selection.into_offsets());
            event.validate().map_err(|e| anyhow!(e))?;

            println!("Added {}", event.id);
            store.add(event);
            Ok(())
        }
        Commands::Edit {
            id,
            title,
            at,
            offsets,
            remind_at,
            drop_offset,
        } => {
            let mut store = open_event_store(&config, false)?;
            store.request_authorization().await;

            let id = parse_id(&id)?;
            let mut event = store
                .get(id)
                .cloned()
                .ok_or_else(|| anyhow!("No upcoming event with id {}", id))?;
            if let Some(title) = title {
                event.title = title;
            }
            if let Some(at) = at {
                event.date = parse_date_time(&at).map_err(|e| anyhow!(e))?;
            }

            let mut selection = OffsetSelection::new(match offsets {
                Some(seconds) => to_offsets(seconds),
                None => event.notification_offsets.clone(),
            });
            for seconds in drop_offset {
                selection.remove(NotificationOffset::from_seconds(seconds));
            }
            let selection = with_custom_reminders(selection, event.date, &remind_at, store.now())?;
            event.notification_offsets = selection.into_offsets();
            event.validate().map_err(|e| anyhow!(e))?;

            store.update(event);
            Ok(())
        }
        Commands::Remove { id } => {
            let mut store = open_event_store(&config, false)?;
            let id = parse_id(&id)?;
            if !store.remove(id) {
                bail!("No upcoming event with id {}", id);
            }
            Ok(())
        }
        Commands::Watch => {
            let mut store = open_event_store(&config, true)?;
            if !store.request_authorization().await {
                log::warn!("Notifications are disabled; nothing will be delivered");
            }
            store.reschedule_all();
            println!("Watching {} event(s); press Ctrl-C to stop", store.len());

            // add/edit/remove run as separate processes and only touch the blob
            let mut ticker = tokio::time::interval(StdDuration::from_secs(
                config.notifications.refresh_interval_seconds,
            ));
            ticker.tick().await;

            let shutdown = tokio::signal::ctrl_c();
            tokio::pin!(shutdown);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        store.refresh();
                    }
                    result = &mut shutdown => {
                        result.context("Failed to listen for Ctrl-C")?;
                        log::info!("Stopping watch");
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Only `watch` stays alive long enough to deliver desktop alerts; one-shot
/// commands record what they would have scheduled.
fn open_event_store(config: &AppConfig, deliver_alerts: bool) -> Result<EventStore> {
    let data_dir = resolve_data_dir(config);
    let storage = open_store(config.storage.backend, &data_dir)
        .with_context(|| format!("Failed to open storage in {}", data_dir.display()))?;

    let center: Arc<dyn AlertCenter> = if deliver_alerts {
        Arc::new(DesktopAlertCenter::new(
            Handle::current(),
            config.notifications.enabled,
        ))
    } else {
        Arc::new(InMemoryAlertCenter::authorized())
    };

    Ok(EventStore::open(
        storage,
        config.storage.key.clone(),
        Arc::new(NotificationScheduler::new(center)),
        Arc::new(SystemClock),
    ))
}

fn run_widget(config: &AppConfig) -> Result<()> {
    let data_dir = resolve_data_dir(config);
    let storage: Box<dyn BlobStore> = match open_store_read_only(config.storage.backend, &data_dir)
    {
        Ok(storage) => storage,
        Err(e) => {
            log::warn!("Widget storage unavailable, showing no events: {:#}", e);
            Box::new(MemoryBlobStore::new())
        }
    };
    let provider = WidgetProvider::new(storage, config);

    let now = Utc::now();
    let entry = provider.snapshot(now);
    println!("{}", entry.title);
    println!("{}h {}m", entry.hours, entry.minutes);

    let timeline = provider.timeline(now);
    if let Some(last) = timeline.entries.last() {
        println!(
            "{} timeline entries until {}",
            timeline.entries.len(),
            format_short_date_time(&last.date.with_timezone(&Local))
        );
    }
    Ok(())
}

fn print_event(event: &Event, store: &EventStore) {
    println!(
        "{}  {:<24} {:>10}  {}",
        event.id,
        event.title,
        event.time_remaining(store.now()).to_string(),
        format_short_date_time(&event.date.with_timezone(&Local))
    );
}

fn print_reminders(event: &Event) {
    for offset in &event.notification_offsets {
        println!("    - {}", offset.label_for(event.date));
    }
}

fn with_custom_reminders(
    mut selection: OffsetSelection,
    event_date: DateTime<Utc>,
    remind_at: &[String],
    now: DateTime<Utc>,
) -> Result<OffsetSelection> {
    for input in remind_at {
        let reminder = parse_date_time(input).map_err(|e| anyhow!(e))?;
        selection
            .add_custom(event_date, reminder, now)
            .with_context(|| format!("Cannot remind at {}", input))?;
    }
    Ok(selection)
}

fn parse_id(input: &str) -> Result<EventId> {
    input
        .parse()
        .with_context(|| format!("'{}' is not a valid event id", input))
}

fn to_offsets(seconds: Vec<u64>) -> Vec<NotificationOffset> {
    seconds.into_iter().map(NotificationOffset::from_seconds).collect()
}
