use agentkit::config::{DEFAULT_TIMEOUT, Environment};
use agentkit::error::Error;
use agentkit::invocation::{self, InvocationArgs};
use agentkit::output::{self, OutputFormat};
use agentkit::resolver::CliOverrides;
use agentkit::schema;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "agentkit",
    version,
    about = "Run AI agents defined through YAML configuration"
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run an agent with the given configuration and input query
    Run {
        /// Path to the agent YAML configuration file
        config: PathBuf,

        /// Input query for the agent
        #[arg(short, long)]
        input: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Provider override: anthropic, bedrock, goose
        #[arg(long)]
        provider: Option<String>,

        /// Model override
        #[arg(long)]
        model: Option<String>,

        /// AWS region override (bedrock only)
        #[arg(long)]
        region: Option<String>,

        /// Comma-separated tool identifiers, replacing the configured list
        #[arg(long, value_delimiter = ',')]
        tools: Option<Vec<String>>,

        /// Maximum tokens to generate
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_tokens: Option<u32>,

        /// Request timeout in seconds
        #[arg(
            long,
            default_value_t = DEFAULT_TIMEOUT.as_secs(),
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        timeout: u64,
    },

    /// Validate a configuration file without calling any provider
    Validate {
        /// Path to the agent YAML configuration file
        config: PathBuf,
    },

    /// List providers and their known models
    Models,

    /// Print an example agent configuration
    Example,
}

fn init_logging(verbose: bool, debug: bool) {
    let default_filter = if debug {
        "agentkit=debug"
    } else if verbose {
        "agentkit=info"
    } else {
        "agentkit=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    init_logging(cli.verbose, cli.debug);

    match execute(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", e.category());
            ExitCode::FAILURE
        }
    }
}

async fn execute(command: Command) -> Result<(), Error> {
    match command {
        Command::Run {
            config,
            input,
            format,
            provider,
            model,
            region,
            tools,
            max_tokens,
            timeout,
        } => {
            let args = InvocationArgs {
                input,
                overrides: CliOverrides {
                    provider,
                    model,
                    region,
                    tools: tools.map(clean_tools),
                    max_tokens,
                },
                timeout: Duration::from_secs(timeout),
            };
            let env = Environment::from_env();
            let result = invocation::run(&config, &args, &env).await?;
            let rendered = output::render_result(&result, format)
                .map_err(|e| Error::parse(format!("render output: {e}")))?;
            println!("{rendered}");
            Ok(())
        }
        Command::Validate { config } => {
            let config = invocation::load_config(&config)?;
            print!("{}", output::render_config_summary(&config));
            Ok(())
        }
        Command::Models => {
            print!("{}", output::render_models());
            Ok(())
        }
        Command::Example => {
            print!("{}", schema::EXAMPLE_CONFIG);
            Ok(())
        }
    }
}

fn clean_tools(tools: Vec<String>) -> Vec<String> {
    tools
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
