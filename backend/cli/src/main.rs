mod account_cmd;
mod chat_cmd;
mod config;
mod doctor_cmd;
mod points_cmd;
mod profile_cmd;
mod status_cmd;
mod terminal_output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use logging::LogOutput;
use reelforge_core::{AgentKind, Page};
use reelforge_tui::{AppOptions, Services};

use config::CliContext;

#[derive(Parser)]
#[command(name = "reelforge")]
#[command(about = "ReelForge — short-video content assistant in your terminal")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.reelforge/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Mirror logs to the console
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive terminal UI
    Ui,
    /// Send one chat message to an agent
    Chat {
        #[arg(value_enum)]
        agent: AgentArg,
        text: String,
        /// Script template letter (A-F); sends guide-mode options
        #[arg(long)]
        template: Option<String>,
        /// Script duration in seconds (15, 30 or 60)
        #[arg(long)]
        duration: Option<u32>,
    },
    /// One-click generation from a theme (billed in points)
    Generate {
        #[arg(value_enum)]
        agent: AgentArg,
        theme: String,
        #[arg(long, default_value = "A")]
        template: String,
        #[arg(long, default_value_t = 30)]
        duration: u32,
    },
    /// Show the positioning profile; `--set field=value` edits and saves it
    Profile {
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,
    },
    /// Show saved notes for an agent
    Notes {
        #[arg(value_enum)]
        agent: AgentArg,
    },
    /// Show the points balance
    Wallet,
    /// List point packs
    Packs,
    /// List subscription plans
    Plans,
    /// Buy a point pack
    Buy { pack_id: u32 },
    /// Sign in with an account id
    Login { account_id: String },
    /// Sign out
    Logout,
    /// Show client configuration and account status
    Status,
    /// Diagnose configuration and backend connectivity
    Doctor,
}

#[derive(Clone, Copy, ValueEnum)]
enum AgentArg {
    Positioning,
    Topics,
    Script,
}

impl AgentArg {
    fn kind(self) -> AgentKind {
        match self {
            AgentArg::Positioning => AgentKind::Positioning,
            AgentArg::Topics => AgentKind::Topics,
            AgentArg::Script => AgentKind::Script,
        }
    }

    fn page(self) -> Page {
        match self {
            AgentArg::Positioning => Page::Positioning,
            AgentArg::Topics => Page::Topics,
            AgentArg::Script => Page::Script,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_output = match (&cli.command, cli.verbose) {
        (Commands::Ui, _) | (_, false) => LogOutput::FileOnly,
        (_, true) => LogOutput::FileAndConsole,
    };
    let mut ctx = CliContext::load(cli.config, log_output).await?;

    match cli.command {
        Commands::Ui => run_ui(ctx).await,
        Commands::Chat { agent, text, template, duration } => {
            chat_cmd::chat(&ctx, agent.kind(), &text, template, duration).await
        }
        Commands::Generate { agent, theme, template, duration } => {
            chat_cmd::generate(&ctx, agent.kind(), agent.page(), &theme, template, duration).await
        }
        Commands::Profile { set } => profile_cmd::profile(&ctx, &set).await,
        Commands::Notes { agent } => profile_cmd::notes(&ctx, agent.kind()).await,
        Commands::Wallet => points_cmd::wallet(&ctx).await,
        Commands::Packs => points_cmd::packs(&ctx).await,
        Commands::Plans => points_cmd::plans(&ctx).await,
        Commands::Buy { pack_id } => points_cmd::buy(&ctx, pack_id).await,
        Commands::Login { account_id } => account_cmd::login(&mut ctx, &account_id).await,
        Commands::Logout => account_cmd::logout(&mut ctx).await,
        Commands::Status => status_cmd::run(&ctx).await,
        Commands::Doctor => doctor_cmd::run(&ctx).await,
    }
}

async fn run_ui(ctx: CliContext) -> Result<()> {
    let options = AppOptions {
        points_enabled: ctx.config.points_enabled(),
        settings: ctx.points_settings(),
        thresholds: ctx.thresholds(),
    };
    let services = Services::new(
        ctx.agents(),
        ctx.api.clone(),
        ctx.state.account_id(),
        ctx.state_path.clone(),
    );
    reelforge_tui::run(services, options).await
}
