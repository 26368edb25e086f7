use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use unilogin_core::{logging, Config, LoginService, ProviderId};

#[derive(Parser, Debug)]
#[command(name = "unilogin")]
#[command(about = "Third-party OAuth2 login helper", long_about = None)]
struct Args {
    /// Configuration file (YAML, TOML or JSON)
    #[arg(long, env = "UNILOGIN_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List providers and whether they are usable
    Providers,

    /// Print the authorization URL for a provider
    Redirect {
        /// Provider name or numeric code (e.g. github, 3)
        #[arg(long)]
        provider: ProviderId,
    },

    /// Exchange an authorization code and print the user profile as JSON
    Userinfo {
        #[arg(long)]
        provider: ProviderId,

        /// Code received on the redirect URL
        #[arg(long)]
        code: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load configuration
    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;

    // 3. Build the login service
    let service = LoginService::from_config(&config)?;
    info!(providers = ?config.oauth2.configured_providers(), "unilogin ready");

    match args.command {
        Command::Providers => {
            for provider in ProviderId::ALL {
                let status = match service.new_server(provider) {
                    Ok(_) => "ready".to_string(),
                    Err(e) => e.to_string(),
                };
                println!("{:>2}  {:<9} {status}", provider.code(), provider.as_str());
            }
        }
        Command::Redirect { provider } => {
            let request = service.new_server(provider)?.authorization()?;
            println!("{}", request.url);
            if let Some(state) = request.state {
                eprintln!("state: {state}");
            }
        }
        Command::Userinfo { provider, code } => {
            let userinfo = service.new_server(provider)?.get_userinfo(&code).await?;
            println!("{}", serde_json::to_string_pretty(&userinfo)?);
        }
    }

    Ok(())
}
