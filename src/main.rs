use anyhow::Result;
use clap::{Parser, Subcommand};

use healthsync::cli;

#[derive(Debug, Parser)]
#[command(name = "healthsync")]
#[command(about = "Resilient data client for the health dashboard service")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load the dashboard: demo data first, then live data if the service answers in time
    Dashboard {
        /// Date range: 24hours, 7days, 30days, 90days
        #[arg(long)]
        range: Option<String>,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Check service reachability, config, and pending activities
    Health,
    /// Log one user activity (fire-and-forget)
    Log {
        /// Activity type, e.g. tab_change
        kind: String,
        /// Activity payload as JSON
        #[arg(long)]
        data: Option<String>,
    },
    /// Show or clear activities that failed to deliver
    Pending {
        /// Discard all pending activities
        #[arg(long)]
        clear: bool,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Manage health goals
    Goals {
        #[command(subcommand)]
        action: GoalsAction,
    },
    /// Show preferences, or replace them with --set
    Preferences {
        /// New preferences document as a JSON object
        #[arg(long)]
        set: Option<String>,
    },
    /// Show the user profile
    Profile,
    /// Run the local development service
    Serve {
        /// Listen address (default from config: 127.0.0.1:9747)
        #[arg(long)]
        addr: Option<String>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum GoalsAction {
    /// List goals
    List {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Create a goal
    Add {
        title: String,
        /// Target value
        #[arg(long)]
        target: f64,
        /// Unit of the target, e.g. steps
        #[arg(long, default_value = "")]
        unit: String,
        #[arg(long, default_value = "general")]
        category: String,
        /// low | medium | high
        #[arg(long)]
        priority: Option<String>,
    },
    /// Record progress toward a goal
    Progress { id: String, value: f64 },
    /// Delete a goal
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default global config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print config file locations
    Path,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Dashboard { range, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_dashboard(range, fmt)
        }
        Commands::Health => cli::run_health(),
        Commands::Log { kind, data } => cli::run_log(&kind, data.as_deref()),
        Commands::Pending { clear, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_pending(clear, fmt)
        }
        Commands::Goals { action } => match action {
            GoalsAction::List { format } => {
                cli::run_goals_list(cli::OutputFormat::from_str_opt(Some(&format)))
            }
            GoalsAction::Add {
                title,
                target,
                unit,
                category,
                priority,
            } => cli::run_goals_add(title, target, unit, category, priority),
            GoalsAction::Progress { id, value } => cli::run_goals_progress(&id, value),
            GoalsAction::Delete { id } => cli::run_goals_delete(&id),
        },
        Commands::Preferences { set } => cli::run_preferences(set.as_deref()),
        Commands::Profile => cli::run_profile(),
        Commands::Serve { addr } => cli::run_serve(addr),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Path => cli::run_config_path(),
        },
    }
}
