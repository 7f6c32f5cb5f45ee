use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use assetshelf::app::AppContext;
use assetshelf::cli::commands::{self, ManualEdit};
use assetshelf::cli::{strategy, Cli, Commands, ConfigAction};
use assetshelf::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Configuration commands work without a database.
    if let Commands::Config { action } = &cli.command {
        match action {
            ConfigAction::SetApiKey { key } => commands::set_api_key(key)?,
            ConfigAction::Path => commands::print_config_path()?,
        }
        return Ok(());
    }

    let config = Config::load()?;
    let ctx = AppContext::new(config, cli.db)?;

    match cli.command {
        Commands::List { dir, verbose } => {
            commands::list_directory(&ctx, dir.as_deref(), verbose)?;
        }
        Commands::Register { path, name } => {
            commands::register(&ctx, &path, name.as_deref())?;
        }
        Commands::Show { path } => {
            commands::show(&ctx, &path)?;
        }
        Commands::Parent { path } => {
            commands::parent(&ctx, &path)?;
        }
        Commands::Update {
            path,
            url,
            image,
            shop,
            tags,
            clear_tags,
        } => {
            let edit = ManualEdit {
                url,
                image,
                shop,
                tags,
                clear_tags,
            };
            commands::update(&ctx, &path, edit)?;
        }
        Commands::Search { name } => {
            commands::search(&ctx, &name).await?;
        }
        Commands::Image { url } => {
            commands::inspect_image(&ctx, &url).await?;
        }
        Commands::Resolve {
            paths,
            ai,
            ai_fallback,
        } => {
            commands::resolve(&ctx, paths, strategy(ai, ai_fallback), cli.workers).await?;
        }
        Commands::Open { path } => {
            commands::open_product(&ctx, &path)?;
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}
