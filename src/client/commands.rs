//! CLI subcommands acting as the UI client

use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};

use crate::{
    config::{Command, Config},
    services::MocoClient,
    settings::Credentials,
    state::{NewActivity, StartTimer, TimeEntry, TimerSnapshot},
    storage::FileStore,
};

use super::{
    catalog::{active_projects, entries_on, format_activity},
    engine_client::EngineClient,
    submit::{book_activity, submit_entry, validate, Submitted},
    watcher::{format_elapsed, Display, ElapsedWatcher},
};

/// Refresh period of the live display
const DISPLAY_REFRESH: Duration = Duration::from_secs(1);

/// Run a client subcommand against the daemon described by `config`
pub async fn run(command: Command, config: &Config) -> Result<()> {
    let engine = EngineClient::new(config.server_url());

    match command {
        Command::Serve => bail!("serve is handled by the daemon entry point"),
        Command::Start {
            project_id,
            task_id,
            project_name,
            task_name,
            note,
        } => {
            let snapshot = engine
                .start(StartTimer {
                    project_id,
                    task_id,
                    project_name,
                    task_name,
                    note,
                })
                .await?;
            println!("{}", describe(&snapshot));
        }
        Command::Stop { submit } => {
            // Resolve the account first so a missing setup never loses the entry
            let moco = if submit { Some(moco_client(config).await?) } else { None };

            let Some(entry) = engine.stop().await? else {
                println!("No timer running.");
                return Ok(());
            };
            println!("{}", describe_entry(&entry));

            if let Some(moco) = moco {
                match submit_entry(&moco, &entry).await {
                    Ok(submitted) => report_booking(&submitted),
                    Err(e) => {
                        eprintln!("{:#}", e);
                        eprintln!("{}", unbooked(&entry));
                        return Err(e);
                    }
                }
            }
        }
        Command::Status => {
            let snapshot = engine.query().await?;
            println!("{}", describe(&snapshot));
            let badge = engine.badge().await?;
            println!("Indicator: {} {}", badge.text, badge.title);
        }
        Command::Watch => watch(engine).await?,
        Command::Entries { date } => {
            let moco = moco_client(config).await?;
            let day = date.unwrap_or_else(today);
            let entries = entries_on(&moco, day).await?;
            if entries.is_empty() {
                println!("No entries for {}.", day);
            } else {
                for activity in &entries {
                    println!("{}", format_activity(activity));
                }
                let total: f64 = entries.iter().map(|a| a.hours).sum();
                println!("Total {:.2} hours on {}", total, day);
            }
        }
        Command::Projects { tasks, assigned } => {
            let moco = moco_client(config).await?;
            for project in active_projects(&moco, assigned, tasks).await? {
                println!("{:>8}  {}", project.id, project.name);
                for task in &project.tasks {
                    println!("{:>8}    {}", task.id, task.name);
                }
            }
        }
        Command::Book {
            project_id,
            task_id,
            hours,
            date,
            note,
        } => {
            let activity = NewActivity {
                date: date.unwrap_or_else(today),
                hours,
                project_id,
                task_id,
                description: note,
            };
            validate(&activity)?;
            let moco = moco_client(config).await?;
            let submitted = book_activity(&moco, &activity).await?;
            report_booking(&submitted);
        }
        Command::Configure {
            domain,
            api_key,
            test,
            clear,
        } => configure(config, domain, api_key, test, clear).await?,
    }

    Ok(())
}

async fn watch(engine: EngineClient) -> Result<()> {
    let watcher = ElapsedWatcher::spawn(Arc::new(engine), DISPLAY_REFRESH);
    let mut rx = watcher.subscribe();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let display = rx.borrow_and_update().clone();
                match display {
                    Display::Pending => {}
                    Display::Running { elapsed, project_name, task_name } => {
                        println!("{}  {} / {}", elapsed, project_name, task_name);
                    }
                    Display::Idle => {
                        println!("No timer running.");
                        break;
                    }
                }
            }
            _ = &mut ctrl_c => break,
        }
    }

    watcher.cancel();
    Ok(())
}

async fn configure(
    config: &Config,
    domain: Option<String>,
    api_key: Option<String>,
    test: bool,
    clear: bool,
) -> Result<()> {
    let store = FileStore::open(config.state_file()).await?;

    if clear {
        Credentials::clear(&store).await?;
        println!("Credentials removed.");
        return Ok(());
    }

    let (Some(domain), Some(api_key)) = (domain, api_key) else {
        bail!("Both --domain and --api-key are required");
    };
    let (domain, api_key) = (domain.trim(), api_key.trim());
    if domain.is_empty() || api_key.is_empty() {
        bail!("Both --domain and --api-key are required");
    }

    if test {
        let user = MocoClient::new(domain, api_key)
            .test_connection()
            .await
            .context("Connection test failed")?;
        println!("Connected as {} {}", user.firstname, user.lastname);
    }

    Credentials::save(&store, domain, api_key).await?;
    println!("Credentials saved to {}", store.path().display());
    Ok(())
}

/// MOCO client from flags, environment or stored credentials
async fn moco_client(config: &Config) -> Result<MocoClient> {
    let store = FileStore::open(config.state_file()).await?;
    let credentials = config.credentials().or(Credentials::load(&store).await?);

    match credentials.complete() {
        Some((domain, api_key)) => Ok(MocoClient::new(domain, api_key)),
        None => bail!("MOCO is not configured; run `moco-timer configure` first"),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn report_booking(submitted: &Submitted) {
    println!("Booked as activity {}.", submitted.activity.id);
    if let Some(advisory) = &submitted.advisory {
        println!("Note: {}", advisory.message());
    }
}

/// What to tell the user when a stopped entry could not be booked
fn unbooked(entry: &TimeEntry) -> String {
    match entry.to_activity() {
        Ok(activity) => format!(
            "Unbooked entry, retry with: moco-timer book --project-id {} --task-id {} --hours {} --date {} --note {:?}",
            activity.project_id, activity.task_id, activity.hours, activity.date, activity.description
        ),
        Err(_) => format!(
            "Unbooked entry: {}",
            serde_json::to_string(entry).unwrap_or_else(|_| format!("{:?}", entry))
        ),
    }
}

fn describe(snapshot: &TimerSnapshot) -> String {
    if !snapshot.state.is_running {
        return "No timer running.".to_string();
    }

    let mut line = format!(
        "Running {} on {} / {} (project {}, task {})",
        format_elapsed(snapshot.elapsed_ms.unwrap_or_default()),
        snapshot.state.project_name,
        snapshot.state.task_name,
        snapshot.state.project_id.unwrap_or_default(),
        snapshot.state.task_id.unwrap_or_default(),
    );
    if !snapshot.state.note.is_empty() {
        line.push_str(&format!(": {}", snapshot.state.note));
    }
    line
}

fn describe_entry(entry: &TimeEntry) -> String {
    let day = entry
        .date()
        .map_or_else(|_| "an unknown day".to_string(), |d| d.to_string());
    format!(
        "Stopped {} / {}: {:.2} hours on {}",
        entry.project_name, entry.task_name, entry.hours, day
    )
}
