use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;

mod api;
mod app;
mod config;
mod handler;
mod providers;
mod server;
mod tui;
mod ui;

use api::BackendClient;
use app::App;
use config::Config;

#[derive(Parser)]
#[command(name = "brampton")]
#[command(about = "Brampton, a finance AI assistant: terminal chat client and backend service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat window (the default)
    Chat {
        /// Backend base URL, e.g. http://localhost:8000
        #[arg(long)]
        backend: Option<String>,
    },
    /// Ask a single question and print the reply
    Ask {
        /// Your question
        question: String,
        /// Backend base URL, e.g. http://localhost:8000
        #[arg(long)]
        backend: Option<String>,
    },
    /// Run the backend service that answers chat requests
    Serve,
    /// Check whether the backend is reachable
    Status {
        /// Backend base URL, e.g. http://localhost:8000
        #[arg(long)]
        backend: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load().unwrap_or_else(|_| Config::new());

    match cli.command.unwrap_or(Commands::Chat { backend: None }) {
        Commands::Chat { backend } => run_chat(&config, backend).await,
        Commands::Ask { question, backend } => ask_once(&config, &question, backend).await,
        Commands::Serve => {
            init_tracing();
            server::serve(config).await
        }
        Commands::Status { backend } => check_status(&config, backend).await,
    }
}

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "brampton=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn backend_client(config: &Config, backend_override: Option<String>) -> BackendClient {
    let url = backend_override.unwrap_or_else(|| config.backend_url());
    BackendClient::new(&url)
}

async fn run_chat(config: &Config, backend_override: Option<String>) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut app = App::new(backend_client(config, backend_override));
    let result = run_loop(&mut terminal, &mut app).await;

    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = tui::EventHandler::new();

    while !app.should_quit {
        app.poll_reply().await;
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }

    Ok(())
}

async fn ask_once(config: &Config, question: &str, backend_override: Option<String>) -> Result<()> {
    let client = backend_client(config, backend_override);

    println!("{} {}", "You:".cyan().bold(), question);

    match client.chat(question).await {
        Ok(reply) => {
            println!("\n{}", "Brampton:".yellow().bold());
            println!("{}", reply);
        }
        Err(e) => {
            println!("{}: {}", "Error contacting the backend".red(), e);
            println!("Start it with: {}", "brampton serve".bold());
        }
    }

    Ok(())
}

async fn check_status(config: &Config, backend_override: Option<String>) -> Result<()> {
    let client = backend_client(config, backend_override);

    match client.status().await {
        Ok(message) => {
            println!("{} {}", "●".green(), message);
        }
        Err(e) => {
            println!(
                "{} No backend at {}: {}",
                "●".red(),
                client.base_url().bold(),
                e
            );
            println!("Start it with: {}", "brampton serve".bold());
        }
    }

    Ok(())
}
