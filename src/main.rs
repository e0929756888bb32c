//! Nexus CLI
//!
//! Command-line front-end for the dashboard:
//! - Chat with another user over the live channel
//! - Show, search, seed and export analytics
//! - Manage the record table through the API
//! - Dump scene frames
//! - Print a default config file

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use nexus::analytics::{initial_data, AnalyticsService, FileStore};
use nexus::chat::{ChatEvent, ConnectionManager, Direction, HttpChatApi, TranscriptEntry, WsConnector};
use nexus::config::{generate_default_config, Config};
use nexus::dashboard::{
    ActionOutcome, DashboardController, DashboardView, DatePreset, ExportFormat, Exporter, Panel,
};
use nexus::records::Record;
use nexus::scene::{Scene, SceneConfig};

#[derive(Parser)]
#[command(name = "nexus")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Admin dashboard: chat, analytics and records")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: first of ~/.config/nexus, /etc/nexus, ./config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chat with another user; each stdin line is sent, `/quit` leaves
    Chat {
        /// Your user id
        user_id: i64,
        /// The user to talk to
        #[arg(short, long)]
        with: i64,
    },

    /// Analytics dashboard
    Analytics {
        #[command(subcommand)]
        command: AnalyticsCommand,
    },

    /// Record table on the API server
    Records {
        #[command(subcommand)]
        command: RecordsCommand,
    },

    /// Print scene frames as JSON lines
    Scene {
        /// Number of frames
        #[arg(short = 'n', long, default_value = "1")]
        frames: u64,
        /// Seconds between frames
        #[arg(long, default_value = "0.016")]
        interval: f64,
        /// Random seed for the layout
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum AnalyticsCommand {
    /// Show the dashboard for a date window
    Show {
        /// Preset (today, yesterday, last-7-days, last-30-days, this-month, last-month)
        #[arg(short, long)]
        preset: Option<String>,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
    },

    /// Filter top pages and traffic sources
    Search {
        query: String,
        #[arg(short, long)]
        preset: Option<String>,
    },

    /// Store a freshly generated baseline snapshot
    Seed {
        /// Random seed (default: entropy)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Export a panel (revenue, demographics, traffic-sources, top-pages)
    Export {
        panel: String,
        /// json or csv (tables only)
        #[arg(long, default_value = "json")]
        as_format: String,
    },
}

#[derive(Subcommand)]
pub enum RecordsCommand {
    /// List records
    List {
        /// All, Active or Inactive
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Add a record
    Add { name: String, role: String },
    /// Edit name and role
    Edit { id: u64, name: String, role: String },
    /// Delete every record with the id
    Delete { id: u64 },
    /// Download the table as CSV
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    // Logs go to stderr so table/JSON output stays clean
    if let Err(e) = nexus::logging::init(&config.logging) {
        eprintln!("Logging disabled: {}", e);
    }

    match cli.command {
        Commands::Chat { user_id, with } => run_chat(&config, user_id, with).await?,
        Commands::Analytics { command } => run_analytics(&config, command, &cli.format)?,
        Commands::Records { command } => run_records(&config, command, &cli.format).await?,
        Commands::Scene {
            frames,
            interval,
            seed,
        } => {
            let scene = Scene::generate(SceneConfig::default(), &mut StdRng::seed_from_u64(seed));
            for n in 0..frames {
                println!("{}", serde_json::to_string(&scene.frame(n, n as f64 * interval))?);
            }
        }
        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Config written to {}", path.display());
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

fn print_entry(entry: &TranscriptEntry) {
    let who = match entry.direction {
        Direction::Sent => "you".to_string(),
        Direction::Received => format!("user {}", entry.sender_id),
    };
    println!(
        "[{}] {}: {}",
        entry.timestamp.format("%H:%M"),
        who,
        entry.content
    );
}

async fn run_chat(config: &Config, user_id: i64, counterpart: i64) -> Result<()> {
    let api = HttpChatApi::new(config.chat.api_url.clone(), config.chat.request_timeout())?;
    let (manager, mut events) = ConnectionManager::start(
        &config.chat,
        user_id,
        Arc::new(WsConnector),
        Arc::new(api),
    );

    match manager.select_conversation(counterpart).await {
        Ok(_) => {
            for entry in manager.transcript().await {
                print_entry(&entry);
            }
        }
        Err(e) => eprintln!("Could not load history: {}", e),
    }

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                ChatEvent::MessageAppended(entry) if entry.direction == Direction::Received => {
                    print_entry(&entry)
                }
                ChatEvent::PreviewUpdated { sender_id, preview } if sender_id != counterpart => {
                    println!("(new message from user {}: {})", sender_id, preview.content)
                }
                ChatEvent::ReconnectScheduled { attempt, delay } => {
                    eprintln!("(disconnected, retry #{} in {:?})", attempt, delay)
                }
                _ => {}
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == "/quit" {
            break;
        }
        if let Err(e) = manager.send(&line).await {
            eprintln!("Not sent: {}", e);
        }
    }

    manager.shutdown().await;
    printer.abort();
    Ok(())
}

fn parse_preset(preset: Option<&str>) -> Result<Option<DatePreset>> {
    Ok(preset.map(str::parse::<DatePreset>).transpose()?)
}

fn run_analytics(config: &Config, command: AnalyticsCommand, format: &str) -> Result<()> {
    let store = FileStore::new(&config.storage.data_dir, &config.analytics.storage_key)?;
    let service = AnalyticsService::new(Arc::new(store));
    let today = Utc::now().date_naive();
    let mut controller = DashboardController::new(
        service.clone(),
        Exporter::new(&config.analytics.export_dir),
        today,
    );

    match command {
        AnalyticsCommand::Show { preset, start, end } => {
            let view = match (parse_preset(preset.as_deref())?, start, end) {
                (Some(preset), _, _) => controller.apply_preset(preset, today)?,
                (None, Some(start), Some(end)) => controller.set_date_range(start, end)?,
                (None, None, None) => controller.load()?,
                _ => bail!("--start and --end must be given together"),
            };
            print_view(&view, format)?;
        }
        AnalyticsCommand::Search { query, preset } => {
            if let Some(preset) = parse_preset(preset.as_deref())? {
                controller.apply_preset(preset, today)?;
            }
            print_view(&controller.search(&query)?, format)?;
        }
        AnalyticsCommand::Seed { seed } => {
            let snapshot = match seed {
                Some(seed) => initial_data(Utc::now(), &mut StdRng::seed_from_u64(seed)),
                None => initial_data(Utc::now(), &mut rand::thread_rng()),
            };
            let stored = service.update_analytics(snapshot)?;
            println!("Stored snapshot with {} points", stored.revenue_data.len());
        }
        AnalyticsCommand::Export { panel, as_format } => {
            let panel = match panel.as_str() {
                "revenue" | "revenueChart" => Panel::RevenueChart,
                "demographics" | "demographicsChart" => Panel::DemographicsChart,
                "traffic-sources" => Panel::TrafficSources,
                "top-pages" => Panel::TopPages,
                other => bail!("Unknown panel: {}", other),
            };
            let format: ExportFormat = as_format.parse()?;

            controller.load()?;
            match controller.download(panel, format)? {
                ActionOutcome::Exported(path) => println!("Exported {}", path.display()),
                ActionOutcome::NothingToExport => {
                    println!("Nothing to export (run `nexus analytics seed` first)")
                }
                _ => {}
            }
        }
    }

    Ok(())
}

fn print_view(view: &DashboardView, format: &str) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }

    for card in &view.kpis {
        println!("{:<18} {:>12}  ({:?} {})", card.title, card.value, card.trend, card.trend_label);
    }

    println!();
    println!("Traffic sources:");
    for row in &view.traffic_sources {
        println!("  {:<16} {:>8}  {:>5}%", row.name, row.value, row.percentage);
    }

    println!();
    println!("{:<16} {:>8} {:>8} {:>8}", "Page", "Views", "Avg", "Bounce");
    for row in &view.top_pages {
        println!(
            "{:<16} {:>8} {:>8} {:>7}%",
            row.url, row.views, row.avg_time, row.bounce_rate
        );
    }

    let points = view.revenue_chart.first().map(|s| s.points.len()).unwrap_or(0);
    println!();
    println!("{} revenue points in range", points);
    Ok(())
}

async fn run_records(config: &Config, command: RecordsCommand, format: &str) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(config.chat.request_timeout())
        .build()?;
    let base = format!("{}/api/records", config.chat.api_url.trim_end_matches('/'));

    let response = match &command {
        RecordsCommand::List { status } => {
            let mut request = client.get(&base);
            if let Some(status) = status {
                request = request.query(&[("status", status)]);
            }
            request.send().await?
        }
        RecordsCommand::Add { name, role } => {
            client
                .post(&base)
                .json(&serde_json::json!({ "name": name, "role": role }))
                .send()
                .await?
        }
        RecordsCommand::Edit { id, name, role } => {
            client
                .put(format!("{}/{}", base, id))
                .json(&serde_json::json!({ "name": name, "role": role }))
                .send()
                .await?
        }
        RecordsCommand::Delete { id } => client.delete(format!("{}/{}", base, id)).send().await?,
        RecordsCommand::Export { .. } => client.get(format!("{}/export", base)).send().await?,
    };

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        bail!("Request failed ({}): {}", status, text);
    }

    match command {
        RecordsCommand::List { .. } => {
            let body: serde_json::Value = response.json().await?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                let records: Vec<Record> = serde_json::from_value(body["records"].clone())?;
                println!("{:<4} {:<20} {:<20} {}", "ID", "Name", "Role", "Status");
                for r in records {
                    println!("{:<4} {:<20} {:<20} {}", r.id, r.name, r.role, r.status);
                }
            }
        }
        RecordsCommand::Add { .. } | RecordsCommand::Edit { .. } => {
            let record: Record = response.json().await?;
            println!("{} {} ({}) {}", record.id, record.name, record.role, record.status);
        }
        RecordsCommand::Delete { id } => {
            let body: serde_json::Value = response.json().await?;
            println!("Removed {} record(s) with id {}", body["removed"], id);
        }
        RecordsCommand::Export { output } => {
            let csv = response.text().await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, csv)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Exported to {}", path.display());
                }
                None => print!("{}", csv),
            }
        }
    }

    Ok(())
}
