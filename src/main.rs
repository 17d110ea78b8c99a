use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use pkgci::{
    commands::{self, config::Config},
    http::{HttpClient, RetryPolicy},
    input::{ActionArgs, Input},
    runtime::{RealRuntime, Runtime},
    store::Endpoints,
    ui::{Console, Mode},
};
use std::path::PathBuf;

/// pkgci - package repository resource for CI pipelines
///
/// Publishes, downloads and prunes packages in a Cloudsmith repository.
///
/// Concourse commands (check, in, out) read their configuration as JSON on
/// stdin. The action command reads GitHub Actions INPUT_* variables.
#[derive(Parser, Debug)]
#[command(author, version = env!("PKGCI_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Upload service URL (defaults to https://upload.cloudsmith.io)
    #[arg(long = "upload-url", env = "PKGCI_UPLOAD_URL", value_name = "URL", global = true)]
    pub upload_url: Option<String>,

    /// Package API URL (defaults to https://api-prd.cloudsmith.io)
    #[arg(long = "api-url", env = "PKGCI_API_URL", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Package search URL (defaults to https://api.cloudsmith.io)
    #[arg(long = "search-url", env = "PKGCI_SEARCH_URL", value_name = "URL", global = true)]
    pub search_url: Option<String>,
}

impl Cli {
    fn endpoints(&self) -> Endpoints {
        let defaults = Endpoints::default();
        Endpoints {
            upload: self.upload_url.clone().unwrap_or(defaults.upload),
            api: self.api_url.clone().unwrap_or(defaults.api),
            search: self.search_url.clone().unwrap_or(defaults.search),
        }
    }
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List versions newer than or equal to the current one
    Check,

    /// Download the files of a version into DIR
    In {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },

    /// Upload the files of DIR, or purge old versions when params.delete is set
    Out {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },

    /// Run a GitHub Actions step configured by INPUT_* variables
    Action(ActionArgs),

    /// Check outbound connectivity
    Test {
        #[arg(long, value_name = "URL", default_value = commands::DEFAULT_CONNECTIVITY_URL)]
        url: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let endpoints = cli.endpoints();
    let runtime = RealRuntime;

    match cli.command {
        Commands::Check => {
            let input = read_input(&runtime)?;
            let config = Config::new(runtime, &input, endpoints, Console::new(Mode::Concourse))?;
            commands::check(&config, &input).await?;
        }
        Commands::In { dir } => {
            let input = read_input(&runtime)?;
            let config = Config::new(runtime, &input, endpoints, Console::new(Mode::Concourse))?;
            commands::get(&config, &input, &dir).await?;
        }
        Commands::Out { dir } => {
            let input = read_input(&runtime)?;
            let config = Config::new(runtime, &input, endpoints, Console::new(Mode::Concourse))?;
            commands::out(&config, &input, &dir).await?;
        }
        Commands::Action(args) => {
            let action = args.action()?;
            let input = Input::try_from(args)?;
            let config = Config::new(
                runtime,
                &input,
                endpoints,
                Console::new(Mode::GitHubActions),
            )?;
            commands::run_action(&config, &input, action).await?;
        }
        Commands::Test { url } => {
            let client = reqwest::Client::builder()
                .user_agent(concat!("pkgci/", env!("PKGCI_VERSION")))
                .build()
                .context("Failed to create HTTP client")?;
            let client = HttpClient::new(client, RetryPolicy::default());
            commands::check_connectivity(&client, &Console::new(Mode::GitHubActions), &url).await?;
        }
    }
    Ok(())
}

fn read_input<R: Runtime>(runtime: &R) -> Result<Input> {
    let json = runtime.read_stdin()?;
    debug!("Read {} bytes of input", json.len());
    Input::from_json(&json)
}
