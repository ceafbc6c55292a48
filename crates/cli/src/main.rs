use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chatgate")]
#[command(about = "Auth gate and LangGraph API gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config.json.
    Init {
        /// Config file path (default: CHATGATE_CONFIG_PATH or ~/.chatgate/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the gateway: auth gate in front of the /api proxy to LangGraph.
    #[command(alias = "gateway")]
    Serve {
        /// Config file path (default: CHATGATE_CONFIG_PATH or ~/.chatgate/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 3000)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Print the mock-auth roster as JSON.
    Users {
        /// Config file path (default: CHATGATE_CONFIG_PATH or ~/.chatgate/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("chatgate {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Users { config }) => {
            if let Err(e) = run_users(config) {
                log::error!("users failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(chatgate::config::default_config_path);
    let dir = chatgate::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = chatgate::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!(
        "starting gateway on {}:{} (config {})",
        config.gateway.bind,
        config.gateway.port,
        path.display()
    );
    chatgate::gateway::run_gateway(config).await
}

fn run_users(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let (config, _) = chatgate::config::load_config(config_path)?;
    let gate = chatgate::auth::AuthGate::from_config(&config.auth);
    println!("{}", serde_json::to_string_pretty(gate.roster().users())?);
    Ok(())
}
