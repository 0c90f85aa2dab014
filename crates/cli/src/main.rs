mod config;
mod error;
mod shell;

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};
use runtime::{Backend, OpenAiBackend, Session, ToolGateway, ToolServer};
use steplog::StepStore;
use tokio::io::BufReader;
use tracing::{Instrument, info, info_span};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use config::{CONFIG_FILE, Config};
use error::{Error, Result};

#[derive(Parser)]
#[command(name = "mcp-chat")]
#[command(about = "Chat with a model that can call MCP server tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Servers JSON file; SERVER then names an entry in it
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Server script (.py, .js) or, with --config, a server name or `default`
    server: Option<String>,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return;
        }
    };

    let Some(server) = cli.server else {
        let _ = Cli::command().print_help();
        return;
    };

    if let Err(e) = run(cli.config.as_deref(), &server).await {
        report(&e, &mut std::io::stderr());
    }
}

/// Print a failure once, for the user.
fn report(error: &Error, out: &mut impl Write) {
    let _ = writeln!(out, "Error: {error}");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run(servers_file: Option<&Path>, server: &str) -> Result<()> {
    let settings = Config::load_or_default(CONFIG_FILE)?
        .with_env(|name| std::env::var(name).ok())
        .settings()?;

    let launch = config::launch(servers_file, server, |name| std::env::var(name).ok())?;
    let description = launch.server.description.clone();

    let steps = match &settings.trace_dir {
        Some(dir) => StepStore::open(dir)?,
        None => StepStore::disabled(),
    };

    let backend = OpenAiBackend::builder(settings.api_key)
        .model(settings.model)
        .base_url(settings.base_url)
        .build();
    info!(backend = %backend, "backend ready");

    let server = runtime::connect(launch.server).await?;
    let tools = ToolGateway::discover(server).await?;

    let mut session = Session::new(backend, tools, steps);
    if let Some(system) = launch.system {
        session = session.with_system(system);
    }

    chat(session, description.as_deref()).await
}

async fn chat<B: Backend, S: ToolServer>(
    mut session: Session<B, S>,
    description: Option<&str>,
) -> Result<()> {
    let span = info_span!("session", session_id = %session.id);

    println!(
        "{}",
        shell::banner(
            session.tools().server().name(),
            description,
            session.tools().tools(),
            session.backend().model()
        )
    );

    let outcome = async {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = std::io::stdout();
        tokio::select! {
            result = shell::run(&mut session, stdin, &mut stdout) => result,
            _ = tokio::signal::ctrl_c() => {
                println!();
                info!("interrupted");
                Ok(())
            }
        }
    }
    .instrument(span.clone())
    .await;

    session.close().instrument(span).await;
    println!("Goodbye.");

    outcome?;
    Ok(())
}
