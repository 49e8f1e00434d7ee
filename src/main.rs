pub mod compose;
pub mod config;
pub mod fetch;
pub mod geometry;
pub mod layers;
pub mod render;
pub mod types;

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration; built-in defaults are used when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Output image path, overriding the configured one
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut app_config = match &cli.config {
        Some(path) => config::AppConfig::load_from_file(path)?,
        None => config::AppConfig::default(),
    };
    if let Some(output) = cli.output {
        app_config.output.path = output;
    }
    app_config.validate()?;

    let agent = ureq::AgentBuilder::new()
        .user_agent(concat!("islemap/", env!("CARGO_PKG_VERSION")))
        .build();

    println!("Fetching coastline for {:?}...", app_config.query.bbox);
    let raw_lines = fetch::fetch_coastline(&agent, &app_config.query.endpoint, &app_config.query.bbox)?;
    println!("Fetched {} coastline ways", raw_lines.0.len());

    let islands = geometry::process(&raw_lines, &app_config.query.bbox)?;
    println!("Assembled {} island polygons", islands.0.len());

    let markers = layers::build_markers(&app_config.points_of_interest, &app_config.reference_site);
    let main_figure = render::render_main_map(&app_config, &islands, &markers);

    println!(
        "Fetching {} outline at {} resolution...",
        app_config.inset.country, app_config.inset.resolution
    );
    let country = fetch::fetch_country_outline(
        &agent,
        &app_config.inset.countries_url,
        &app_config.inset.country,
        &app_config.inset.resolution,
    )?;
    let inset_figure = render::render_inset(&app_config, &country);

    let document = compose::compose(&main_figure, &inset_figure, &app_config.inset.position);
    compose::write_figure(&document, &app_config.output.path)?;
    println!("Wrote map to {:?}", app_config.output.path);

    Ok(())
}
