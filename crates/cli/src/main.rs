//! yieldmap CLI - boundaries, yield predictions and scenario comparison

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use yieldmap_cloud::blocking::ApiClientBlocking;
use yieldmap_cloud::overlay::failed_layer;
use yieldmap_cloud::{
    policy_layer, prediction_layer, simulation_request, ClientOptions, CloudError,
    PredictionRequest, Region,
};
use yieldmap_colormap::{color_scale, legend_entries, Ramp};
use yieldmap_core::{
    distinct_vertices, BoundaryDrawer, CommittedBoundary, FeatureCollection, LayerRegistry,
    LayerType, MapLayer,
};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "yieldmap")]
#[command(author, version, about = "Crop yield predictions over urban growth boundaries", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Service root (overrides YIELDMAP_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a boundary polygon from clicked points and print it as GeoJSON
    Boundary {
        /// Points as 'lat,lng;lat,lng;...' in drawing order
        #[arg(short, long)]
        points: String,
        /// Write the feature collection to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Request a yield prediction and wait for it
    Predict {
        /// Urban expansion dataset id
        #[arg(long)]
        urban: String,
        /// Temperature dataset id
        #[arg(long)]
        temperature: String,
        /// Precipitation dataset id
        #[arg(long)]
        precipitation: String,
        /// Historical yields dataset id
        #[arg(long)]
        historical: Option<String>,
        /// Target year
        #[arg(short, long)]
        year: i32,
        /// Restrict to a boundary (GeoJSON feature collection file)
        #[arg(short, long)]
        boundary: Option<PathBuf>,
        /// Region name used with --boundary
        #[arg(long, default_value = "Custom region")]
        region_name: String,
    },
    /// Simulate a growth-boundary policy
    Simulate {
        /// Policy name
        #[arg(short, long)]
        name: String,
        /// Boundary points as 'lat,lng;lat,lng;...'
        #[arg(short, long, conflicts_with = "boundary")]
        points: Option<String>,
        /// Boundary GeoJSON feature collection file
        #[arg(short, long)]
        boundary: Option<PathBuf>,
    },
    /// Compare two or more scenarios
    Compare {
        /// Scenario ids
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },
    /// List scenarios
    Scenarios,
    /// Show model metrics
    Metrics,
    /// Show analytics for a region
    Region {
        /// Region id
        id: String,
    },
    /// Print legend ramps for every layer type
    Legend {
        /// Also print an N-step blue-to-red value scale
        #[arg(short, long)]
        steps: Option<usize>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn connect(api_url: Option<String>) -> Result<ApiClientBlocking> {
    let mut options = ClientOptions::from_env();
    if let Some(url) = api_url {
        options = options.with_base_url(url);
    }
    info!("Service: {}", options.base_url);
    ApiClientBlocking::new(options).context("Failed to create service client")
}

fn parse_points(s: &str) -> Result<Vec<(f64, f64)>> {
    s.split(';')
        .filter(|pair| !pair.trim().is_empty())
        .map(|pair| {
            let parts: Vec<&str> = pair.trim().split(',').collect();
            if parts.len() != 2 {
                anyhow::bail!("Point must be 'lat,lng', got: {}", pair);
            }
            let lat: f64 = parts[0].trim().parse().context("Invalid latitude")?;
            let lng: f64 = parts[1].trim().parse().context("Invalid longitude")?;
            Ok((lat, lng))
        })
        .collect()
}

/// Replay clicks through the drawing machine, as the map would.
fn draw_boundary(points: &[(f64, f64)]) -> Result<CommittedBoundary> {
    let mut emitted: Option<FeatureCollection> = None;
    let mut drawer = BoundaryDrawer::new(|fc: Option<&FeatureCollection>| emitted = fc.cloned());
    drawer.start();
    for &(lat, lng) in points {
        drawer.click(lat, lng);
    }
    let accepted = distinct_vertices(drawer.state().preview());
    if !drawer.finish() {
        anyhow::bail!(
            "A boundary needs at least 3 distinct valid points, got {} of {}",
            accepted,
            points.len()
        );
    }
    drop(drawer);

    let fc = emitted.context("Boundary was not emitted")?;
    CommittedBoundary::from_feature_collection(&fc).context("Invalid boundary")
}

fn read_boundary(path: &PathBuf) -> Result<CommittedBoundary> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let fc = FeatureCollection::from_json_str(&text).context("Failed to parse GeoJSON")?;
    CommittedBoundary::from_feature_collection(&fc).context("Invalid boundary")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_layers(registry: &LayerRegistry) {
    println!("\nLayers:");
    for layer in registry.iter() {
        println!(
            "  {:<24} {:<14} visible={:<5} opacity={:.2} {:?}",
            layer.id(),
            layer.layer_type,
            layer.visible,
            layer.opacity,
            layer.status
        );
    }
}

fn done(name: &str, elapsed: std::time::Duration) {
    println!("{} finished in {:.2?}", name, elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Boundary ─────────────────────────────────────────────────
        Commands::Boundary { points, output } => {
            let points = parse_points(&points)?;
            let boundary = draw_boundary(&points)?;
            let json = boundary.to_feature_collection().to_json_string()?;

            let b = boundary.bounds();
            info!(
                "Vertices: {}, area: {:.3} km², bounds N{:.5} S{:.5} E{:.5} W{:.5}",
                boundary.vertices().len(),
                boundary.area_km2(),
                b.north,
                b.south,
                b.east,
                b.west
            );
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Boundary saved to: {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        // ── Predict ──────────────────────────────────────────────────
        Commands::Predict {
            urban,
            temperature,
            precipitation,
            historical,
            year,
            boundary,
            region_name,
        } => {
            let region = boundary
                .as_ref()
                .map(read_boundary)
                .transpose()?
                .map(|b| Region::from_boundary(region_name, &b));
            let request = PredictionRequest {
                urban_data_id: urban,
                temperature_data_id: temperature,
                precipitation_data_id: precipitation,
                historical_yield_data_id: historical,
                year,
                region,
            };

            let api = connect(cli.api_url)?;
            let start = Instant::now();
            let pb = spinner("Submitting prediction...");
            let outcome = api.predict(&request, |status| {
                pb.set_message(format!("Prediction {}...", status));
            });
            pb.finish_and_clear();

            let mut registry = LayerRegistry::new();
            match outcome {
                Ok(prediction) => {
                    println!("Prediction {}: {}", prediction.id, prediction.status);
                    if let Some(m) = prediction.metrics {
                        println!("  MAE:  {:.4}", m.mae);
                        println!("  RMSE: {:.4}", m.rmse);
                        println!("  MSE:  {:.4}", m.mse);
                    }
                    if let Some(c) = prediction.confidence {
                        println!("  Confidence: {:.1}%", c * 100.0);
                    }
                    registry.upsert(prediction_layer(&prediction));
                }
                Err(e @ (CloudError::PredictionFailed { .. } | CloudError::Timeout { .. })) => {
                    eprintln!("Prediction did not complete: {}", e);
                    registry.upsert(failed_layer(
                        yieldmap_cloud::overlay::PREDICTION_LAYER_ID,
                        "Predicted Crop Yield",
                        &e,
                    ));
                }
                Err(e) => return Err(e).context("Prediction request failed"),
            }
            print_layers(&registry);
            done("Prediction", start.elapsed());
        }

        // ── Simulate ─────────────────────────────────────────────────
        Commands::Simulate {
            name,
            points,
            boundary,
        } => {
            let boundary = match (points, boundary) {
                (Some(points), _) => draw_boundary(&parse_points(&points)?)?,
                (None, Some(path)) => read_boundary(&path)?,
                (None, None) => anyhow::bail!("Provide --points or --boundary"),
            };
            info!("Boundary area: {:.3} km²", boundary.area_km2());

            let api = connect(cli.api_url)?;
            let pb = spinner("Simulating policy...");
            let sim = api
                .simulate_policy(&simulation_request(name, &boundary))
                .context("Policy simulation failed")?;
            pb.finish_and_clear();

            println!("Simulation {} ({})", sim.id, sim.name);
            if let Some(impact) = &sim.impact_metrics {
                if let Some(loss) = impact.yield_loss_percentage {
                    println!("  Yield loss: {:.2}%", loss);
                }
                if let Some(area) = impact.affected_area {
                    println!("  Affected area: {:.2} km²", area);
                }
                if !impact.priority_areas.is_empty() {
                    println!("  Priority areas: {}", impact.priority_areas.join(", "));
                }
            }
            let mut registry = LayerRegistry::new();
            if let Some(layer) = policy_layer(&sim) {
                registry.upsert(layer);
            }
            print_layers(&registry);
        }

        // ── Compare ──────────────────────────────────────────────────
        Commands::Compare { ids } => {
            let mut distinct = ids.clone();
            distinct.sort();
            distinct.dedup();
            if distinct.len() < 2 {
                anyhow::bail!(
                    "Select at least 2 different scenarios to compare, got {}",
                    distinct.len()
                );
            }
            let api = connect(cli.api_url)?;
            let start = Instant::now();
            let pb = spinner("Comparing scenarios...");
            let result = api.compare(&ids);
            pb.finish_and_clear();

            println!("Scenarios:");
            for s in &result.scenarios {
                let name = s.name.as_deref().unwrap_or("-");
                match s.metrics {
                    Some(m) => println!(
                        "  {:<12} {:<24} {:?} rmse={:.4}",
                        s.id, name, s.status, m.rmse
                    ),
                    None => println!("  {:<12} {:<24} {:?}", s.id, name, s.status),
                }
            }

            let mut registry = LayerRegistry::new();
            result.apply_to(&mut registry);
            print_layers(&registry);

            println!("\nDifferences:");
            match &result.differences_error {
                Some(err) => println!("  unavailable: {}", err),
                None => print_json(&result.differences)?,
            }
            done("Comparison", start.elapsed());
        }

        // ── Scenarios ────────────────────────────────────────────────
        Commands::Scenarios => {
            let api = connect(cli.api_url)?;
            let scenarios = api.list_scenarios().context("Failed to list scenarios")?;
            if scenarios.is_empty() {
                println!("No scenarios");
            }
            for s in &scenarios {
                let latest = s
                    .latest()
                    .map(|p| p.status.to_string())
                    .unwrap_or_else(|| "no prediction".to_string());
                println!(
                    "{:<38} {:<24} predictions={} latest={}",
                    s.id,
                    s.name,
                    s.predictions.len(),
                    latest
                );
            }
        }

        // ── Metrics ──────────────────────────────────────────────────
        Commands::Metrics => {
            let api = connect(cli.api_url)?;
            let m = api.model_metrics().context("Failed to fetch metrics")?;
            println!("Model metrics:");
            println!("  MAE:  {:.4}", m.mae);
            println!("  RMSE: {:.4}", m.rmse);
            println!("  MSE:  {:.4}", m.mse);
            if let Some(acc) = m.accuracy {
                println!("  Accuracy: {:.1}%", acc * 100.0);
            }
        }

        // ── Region ───────────────────────────────────────────────────
        Commands::Region { id } => {
            let api = connect(cli.api_url)?;
            let data = api
                .region_analytics(&id)
                .with_context(|| format!("Failed to fetch analytics for region {}", id))?;
            let stats = &data.regional_stats;
            println!("Region: {}", data.region_id);
            println!("  Average yield: {:.3}", stats.average_yield);
            println!("  Total urban extent: {:.3}", stats.total_urban_extent);
            println!("  Yield trend: {:?}", stats.yield_trend);
            println!("\n  Year   Yield   Urban extent");
            for p in &data.time_series {
                println!("  {:<6} {:<7.3} {:.3}", p.year, p.crop_yield, p.urban_extent);
            }
        }

        // ── Legend ───────────────────────────────────────────────────
        Commands::Legend { steps } => {
            let registry: LayerRegistry = LayerType::ALL
                .iter()
                .map(|t| MapLayer::new(t.as_str(), t.clone()))
                .collect();
            for row in legend_entries(&registry) {
                let colors: Vec<String> = row.colors.iter().map(|c| c.to_hex()).collect();
                println!(
                    "{:<16} {:<14} {} → {}  [{}]",
                    row.title,
                    row.ramp,
                    row.min_label,
                    row.max_label,
                    colors.join(" ")
                );
            }
            let (lo, hi) = Ramp::Generic.labels();
            println!("{:<16} {:<14} {} → {}", "(other)", Ramp::Generic.name(), lo, hi);

            if let Some(n) = steps {
                let scale: Vec<String> = color_scale(n).iter().map(|c| c.to_hex()).collect();
                println!("\nValue scale ({} steps): {}", n, scale.join(" "));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_point_list() {
        let pts = parse_points("10,10; 10,20;20,20 ;").unwrap();
        assert_eq!(pts, vec![(10.0, 10.0), (10.0, 20.0), (20.0, 20.0)]);
        assert!(parse_points("10;20").is_err());
        assert!(parse_points("a,b").is_err());
    }

    #[test]
    fn draws_boundary_in_lng_lat_order() {
        let boundary =
            draw_boundary(&[(10.0, 10.0), (10.0, 20.0), (20.0, 20.0), (20.0, 10.0)]).unwrap();
        assert_eq!(
            boundary.ring(),
            vec![[10.0, 10.0], [20.0, 10.0], [20.0, 20.0], [10.0, 20.0], [10.0, 10.0]]
        );
    }

    #[test]
    fn too_few_valid_points_is_an_error() {
        let err = draw_boundary(&[(10.0, 10.0), (95.0, 20.0), (20.0, 20.0)]).unwrap_err();
        assert!(err.to_string().contains("2 of 3"));
    }

    #[test]
    fn backtracked_points_are_an_error() {
        let err = draw_boundary(&[(0.0, 0.0), (1.0, 1.0), (0.0, 0.0)]).unwrap_err();
        assert!(err.to_string().contains("2 of 3"));
        let err = draw_boundary(&[(5.0, 5.0); 3]).unwrap_err();
        assert!(err.to_string().contains("1 of 3"));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
