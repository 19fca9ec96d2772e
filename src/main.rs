use anyhow::Result;
use clap::Parser;
use tracing::{debug, error};

use weblocation::config::{Args, Command, StaticConfig, get_config, init_config};
use weblocation::runtime::modes;
use weblocation::system::logging::init_logging;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    if args.command() == &Command::ConfigGen {
        println!("{}", StaticConfig::generate_sample_config());
        return Ok(());
    }

    init_config(args.config.as_deref());
    let config = get_config();
    let _guard = init_logging(&config.logging)?;
    debug!("Running command {:?}", args.command());

    let result = match args.command() {
        Command::Serve => modes::run_server().await,
        Command::Refresh { category } => modes::run_refresh(category.as_deref()).await,
        Command::Lookup { ip } => modes::run_lookup(ip).await,
        Command::ConfigGen => Ok(()),
    };

    if let Err(ref e) = result {
        match e.downcast_ref::<weblocation::errors::WeblocationError>() {
            Some(err) => eprintln!("{}", err.format_colored()),
            None => error!("{:#}", e),
        }
    }
    result
}
