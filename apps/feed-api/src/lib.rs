pub mod routes;
pub mod state;

use std::{
	net::SocketAddr,
	path::{Path, PathBuf},
};

use clap::Parser;
use color_eyre::eyre;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;
use feed_config::Config;

#[derive(Debug, Parser)]
#[command(
	version = feed_cli::VERSION,
	rename_all = "kebab",
	styles = feed_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Overrides `snapshot.path` from the config file.
	#[arg(long, short = 's', value_name = "FILE")]
	pub snapshot: Option<PathBuf>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = feed_config::load(&args.config)?;

	init_tracing(&config)?;

	let http_addr: SocketAddr = config.service.http_bind.parse()?;
	let snapshot = match args.snapshot {
		Some(path) => path,
		None => snapshot_path(&args.config, &config)?,
	};
	let store = state::load_store(&config, &snapshot)?;
	let state = AppState::new(&config, store)?;
	let app = routes::router(state);
	let listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, "HTTP server listening.");

	axum::serve(listener, app).await?;

	Ok(())
}

/// Relative snapshot paths resolve against the config file's directory.
fn snapshot_path(config_path: &Path, config: &Config) -> color_eyre::Result<PathBuf> {
	let Some(snapshot) = config.snapshot.as_ref() else {
		return Err(eyre::eyre!("snapshot.path must be set when --snapshot is not given."));
	};

	if snapshot.path.is_absolute() {
		return Ok(snapshot.path.clone());
	}

	Ok(config_path
		.parent()
		.map(|dir| dir.join(&snapshot.path))
		.unwrap_or_else(|| snapshot.path.clone()))
}

fn init_tracing(config: &Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	Ok(())
}
