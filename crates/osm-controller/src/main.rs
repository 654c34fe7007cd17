// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, Result};
use clap::Parser;
use osm_controller::{shutdown_signal, Controller, ControllerConfig};
use osm_observability::{init_tracing_with_config, LogFormat};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "osm-controller")]
#[command(version, about = "OSM control plane controller")]
#[command(
    long_about = "Runs the OSM control plane metrics store and serves it for Prometheus scraping.
Settings come from an optional TOML file, then OSM_* environment variables, then flags."
)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log filter directive (e.g. "info", "osm_metrics=debug")
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,

    /// Log format (pretty|compact|json)
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    /// Port for the metrics endpoint
    #[arg(long, value_name = "PORT")]
    metrics_port: Option<u16>,
}

impl Cli {
    fn apply(&self, config: &mut ControllerConfig) {
        if let Some(level) = &self.log_level {
            config.logging.level = Some(level.clone());
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if let Some(port) = self.metrics_port {
            config.metrics.port = port;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ControllerConfig::load(cli.config.as_deref())?;
    config.apply_env_overrides()?;
    cli.apply(&mut config);
    config.validate()?;

    init_tracing_with_config(config.logging.to_log_config())
        .context("Failed to initialize logging")?;
    tracing::info!("Starting osm-controller {}", env!("CARGO_PKG_VERSION"));

    let controller = Controller::new(config)?;
    controller.run(shutdown_signal()).await
}
