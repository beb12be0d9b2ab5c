//! Command-line interface parsing and handling
//!
//! Every command first runs the startup sequence (open the store, reconcile
//! it, restart when asked to) and then reads or edits the reconciled state.

pub mod model_list;
pub mod session_list;
pub mod settings;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::model_list::{list_models, print_cost_estimate};
use crate::cli::session_list::list_sessions;
use crate::cli::settings::{apply_setting, clear_setting, print_settings};
use crate::core::catalog::ModelId;
use crate::core::config::Config;
use crate::core::navigation::{LaunchNavigator, Navigator};
use crate::core::reconcile::{reconcile, ReconcileOutcome};
use crate::core::storage::{FileStore, KeyValueStore, MemoryStore};
use crate::core::store::Store;
use crate::utils::location::Location;

/// Log filter used when neither `RUST_LOG` nor the config file sets one.
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Parser, Debug)]
#[command(name = "chatdeck", version)]
#[command(about = "Manage chat sessions and model settings for an LLM chat client")]
#[command(
    long_about = "Chatdeck keeps the conversation history, default generation settings and \
provider credential of an LLM chat client, and repairs or migrates them on startup.\n\n\
Launch links:\n\
  --open 'chatdeck://chat?apiKey=sk-...' stores the credential from the link, strips it \
from the link, and restarts startup so nothing keeps the previous credential.\n\n\
Environment Variables:\n\
  RUST_LOG          Log filter (overrides log_filter in config.toml)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Launch location, e.g. chatdeck://chat?apiKey=sk-...
    #[arg(long, global = true, value_name = "URL")]
    pub open: Option<String>,

    /// Use this store file instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Keep all state in memory for this run
    #[arg(long, global = true, conflicts_with = "store")]
    pub ephemeral: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show a summary of the stored state (default)
    Status,
    /// List supported models with token limits and pricing
    Models,
    /// List stored chat sessions
    Sessions,
    /// Start a new chat session from the current defaults
    New {
        /// Session title (defaults to "New Chat")
        #[arg(long)]
        title: Option<String>,
        /// Folder to file the session under
        #[arg(long)]
        folder: Option<String>,
    },
    /// Make the session with the given number (as listed by `sessions`) current
    Select {
        number: usize,
    },
    /// Set a default setting, or list all settings when no key is given
    Set {
        /// Setting key (theme, credential, system-message, default-model,
        /// max-tokens, temperature, top-p, presence-penalty, frequency-penalty)
        key: Option<String>,
        /// Value to set (multiple words are joined with spaces)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Reset a default setting to its built-in value
    Unset {
        key: String,
    },
    /// Estimate the cost of one exchange
    Cost {
        model: ModelId,
        prompt_tokens: u64,
        completion_tokens: u64,
    },
    /// Print or edit the configuration file values
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Set a configuration value (store-path, log-filter)
    Set { key: String, value: String },
    /// Clear a configuration value
    Unset { key: String },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config = Config::load()?;
    init_tracing(&config);

    match args.command.clone().unwrap_or(Commands::Status) {
        Commands::Config { command: None } => {
            config.print_all();
            Ok(())
        }
        Commands::Config {
            command: Some(command),
        } => edit_config(config, command),
        Commands::Cost {
            model,
            prompt_tokens,
            completion_tokens,
        } => {
            print_cost_estimate(model, prompt_tokens, completion_tokens);
            Ok(())
        }
        Commands::Status => {
            let store = start(&args, &config)?;
            print_status(&store);
            Ok(())
        }
        Commands::Models => {
            let store = start(&args, &config)?;
            list_models(store.default_generation_config().model);
            Ok(())
        }
        Commands::Sessions => {
            let store = start(&args, &config)?;
            list_sessions(&store);
            Ok(())
        }
        Commands::New { title, folder } => {
            let mut store = start(&args, &config)?;
            let session = store.start_new_session(title, folder)?;
            println!("✅ Started session '{}' ({})", session.title, session.id);
            Ok(())
        }
        Commands::Select { number } => {
            let mut store = start(&args, &config)?;
            let selected = match number.checked_sub(1) {
                Some(index) => store.select_session(index)?,
                None => false,
            };
            if !selected {
                return Err(format!(
                    "No session number {number}. Run 'chatdeck sessions' to list sessions."
                )
                .into());
            }
            println!("✅ Selected session {number}");
            Ok(())
        }
        Commands::Set { key: None, .. } => {
            let store = start(&args, &config)?;
            print_settings(store.state());
            Ok(())
        }
        Commands::Set {
            key: Some(key),
            value,
        } => {
            let mut store = start(&args, &config)?;
            let message = apply_setting(&mut store, &key, &value)?;
            println!("✅ {message}");
            Ok(())
        }
        Commands::Unset { key } => {
            let mut store = start(&args, &config)?;
            let message = clear_setting(&mut store, &key)?;
            println!("✅ {message}");
            Ok(())
        }
    }
}

fn edit_config(mut config: Config, command: ConfigCommands) -> Result<(), Box<dyn Error>> {
    let (key, message) = match &command {
        ConfigCommands::Set { key, value } => {
            config.set_value(key, Some(value))?;
            (key, format!("Set {key} to: {value}"))
        }
        ConfigCommands::Unset { key } => {
            config.set_value(key, None)?;
            (key, format!("Unset {key}"))
        }
    };
    config.save()?;
    info!(%key, "updated config");
    println!("✅ {message}");
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(config.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER))
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn open_backend(args: &Args, config: &Config) -> Result<Box<dyn KeyValueStore>, Box<dyn Error>> {
    if args.ephemeral {
        return Ok(Box::new(MemoryStore::new()));
    }
    let path = match &args.store {
        Some(path) => path.clone(),
        None => config.resolve_store_path()?,
    };
    Ok(Box::new(FileStore::open(path)?))
}

/// Open and reconcile the store, repeating startup whenever reconciliation
/// asks for a restart.
pub fn start(
    args: &Args,
    config: &Config,
) -> Result<Store<Box<dyn KeyValueStore>>, Box<dyn Error>> {
    let location = args.open.as_deref().map(Location::parse).unwrap_or_default();
    let mut navigator = LaunchNavigator::new(location);
    let mut backend = open_backend(args, config)?;

    loop {
        let mut store = Store::open(backend)?;
        match reconcile(&mut store, &mut navigator)? {
            ReconcileOutcome::Restart => {
                info!(location = %navigator.location(), "restarting startup");
                backend = store.into_backend();
            }
            ReconcileOutcome::Ready { .. } => return Ok(store),
        }
    }
}

fn print_status<B: KeyValueStore>(store: &Store<B>) {
    let defaults = store.default_generation_config();
    println!("Sessions: {}", store.sessions().len());
    if let Some(session) = store.current_session() {
        println!(
            "Current: {}. {}",
            store.current_index() + 1,
            session.title
        );
    }
    println!("Theme: {}", store.theme());
    match store.credential() {
        Some(_) => println!("Credential: set"),
        None => println!("Credential: (unset)"),
    }
    println!(
        "Default model: {} (max-tokens {}, temperature {}, top-p {})",
        defaults.model, defaults.max_tokens, defaults.temperature, defaults.top_p
    );
    if store.default_system_message().is_empty() {
        println!("System message: (none)");
    } else {
        let first_line = store.default_system_message().lines().next().unwrap_or("");
        println!("System message: {first_line}");
    }
}
