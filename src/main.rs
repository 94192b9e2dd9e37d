//! NM Education Choropleth - county map & coordinated bar chart
//!
//! Joins a county education table to county boundaries, classifies the
//! selected attribute into natural-breaks classes and shows it as a
//! choropleth beside a sorted bar chart.

mod charts;
mod config;
mod data;
mod gui;
mod stats;

use anyhow::{Context, Result};
use charts::{ChoroplethData, MapLayout, StaticChartRenderer};
use clap::{Parser, Subcommand};
use config::MapConfig;
use data::{Attribute, DataLoader, Joiner, LoadedData};
use eframe::egui;
use gui::ChoroplethApp;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "edu_choropleth", about = "New Mexico education choropleth")]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Education CSV table
    #[arg(long, global = true)]
    csv: Option<PathBuf>,

    /// County boundaries (TopoJSON or GeoJSON)
    #[arg(long, global = true)]
    counties: Option<PathBuf>,

    /// Background boundaries (TopoJSON or GeoJSON)
    #[arg(long, global = true)]
    background: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive map window
    View {
        #[arg(long)]
        attribute: Option<Attribute>,
    },
    /// Save map and bar chart as PNG
    Render {
        /// Output file, or output directory with `--all`
        #[arg(long)]
        out: PathBuf,
        #[arg(long, conflicts_with = "all")]
        attribute: Option<Attribute>,
        /// One PNG per attribute
        #[arg(long)]
        all: bool,
    },
    /// Print class breaks and summary statistics
    Classify {
        /// Classify a single attribute instead of all six
        #[arg(long)]
        attribute: Option<Attribute>,
        #[arg(long)]
        json: bool,
    },
}

fn init_logger() {
    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();
}

fn main() -> Result<()> {
    init_logger();
    let cli = Cli::parse();

    let mut config = MapConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(csv) = cli.csv {
        config.data.csv = csv;
    }
    if let Some(counties) = cli.counties {
        config.data.counties = counties;
    }
    if let Some(background) = cli.background {
        config.data.background = background;
    }

    match cli.command.unwrap_or(Commands::View { attribute: None }) {
        Commands::View { attribute } => {
            if let Some(attribute) = attribute {
                config.initial_attribute = attribute;
            }
            run_viewer(config)
        }
        Commands::Render {
            out,
            attribute,
            all,
        } => {
            let attributes = if all {
                Attribute::ALL.to_vec()
            } else {
                vec![attribute.unwrap_or(config.initial_attribute)]
            };
            render(&config, &attributes, &out, all)
        }
        Commands::Classify { attribute, json } => classify(&config, attribute, json),
    }
}

fn run_viewer(config: MapConfig) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([1000.0, 600.0])
            .with_title("New Mexico Education"),
        ..Default::default()
    };

    eframe::run_native(
        "New Mexico Education",
        options,
        Box::new(move |cc| Ok(Box::new(ChoroplethApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("Viewer failed: {e}"))
}

fn load(config: &MapConfig) -> Result<LoadedData> {
    DataLoader::load_all(&config.data, &config.keys).with_context(|| {
        format!(
            "Failed to load {} with {} and {}",
            config.data.csv.display(),
            config.data.counties.display(),
            config.data.background.display()
        )
    })
}

fn render(config: &MapConfig, attributes: &[Attribute], out: &Path, into_dir: bool) -> Result<()> {
    let Some((&first, rest)) = attributes.split_first() else {
        return Ok(());
    };
    let (mut data, report) = ChoroplethData::from_loaded(load(config)?, first, config.class_rule);
    log::info!("{} of {} counties matched", report.matched, data.counties.len());

    let [width, height] = config.map_size;
    let layout = MapLayout::new(
        &data.counties,
        &data.background,
        &config.projection,
        width,
        height,
    );

    if into_dir {
        std::fs::create_dir_all(out)
            .with_context(|| format!("Failed to create {}", out.display()))?;
    }

    for &attribute in std::iter::once(&first).chain(rest) {
        data.select(attribute);
        let path = if into_dir {
            out.join(format!("{}.png", attribute.column_name().replace(' ', "_")))
        } else {
            out.to_path_buf()
        };
        StaticChartRenderer::render_report_png(&data, &layout, config.chart_size, &path)
            .with_context(|| format!("Failed to render {attribute}"))?;
    }
    Ok(())
}

fn classify(config: &MapConfig, attribute: Option<Attribute>, json: bool) -> Result<()> {
    let loaded = load(config)?;
    let (counties, _) = Joiner::join(loaded.counties, &loaded.records);

    let summaries = match attribute {
        Some(attribute) => {
            let classification = stats::build_classification(&counties, attribute, config.class_rule);
            vec![stats::ClassificationSummary::new(&counties, &classification)]
        }
        None => stats::classify_all(&counties, config.class_rule),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for summary in &summaries {
            println!("{summary}\n");
        }
    }
    Ok(())
}
