//! Raster inspector.
//!
//! Command-line front end to the validation dashboard's raster pipeline:
//! upsample a raster file, prepare the map-panel view for a region, list
//! a dataset's issue dates, or shape zonal statistics for the charts.

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use raster_processor::{BoundingBox, CogRequest, Dataset, DisplayMode};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use commands::ClipTarget;
use config::InspectorConfig;

#[derive(Parser, Debug)]
#[command(name = "raster-inspector")]
#[command(about = "Upsample, clip, and inspect validation rasters")]
struct Args {
    /// Configuration file path (defaults to environment variables)
    #[arg(short, long, env = "INSPECTOR_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upsample a raster file to a finer resolution
    Resample {
        /// Raster JSON file
        input: PathBuf,

        /// Target resolution (default: from config)
        #[arg(short, long)]
        resolution: Option<f64>,

        /// COD-AB GeoJSON layer to clip the result to
        #[arg(long, requires = "pcode")]
        region: Option<PathBuf>,

        /// Admin level of the region layer
        #[arg(long, default_value_t = 1)]
        admin_level: u8,

        /// Pcode of the region to clip to
        #[arg(long, requires = "region")]
        pcode: Option<String>,

        /// Rectangle to clip to instead of a region: minx,miny,maxx,maxy
        #[arg(long, conflicts_with = "region", value_parser = BoundingBox::parse)]
        bbox: Option<BoundingBox>,

        /// Keep every pixel the region touches
        #[arg(long)]
        all_touched: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Prepare the map-panel raster for a region and issue date
    View {
        #[arg(long)]
        dataset: Dataset,

        #[arg(long)]
        iso3: String,

        #[arg(long, default_value_t = 1)]
        admin_level: u8,

        #[arg(long)]
        pcode: String,

        /// Issue date (SEAS5) or valid date (Floodscan), YYYY-MM-DD
        #[arg(long)]
        date: String,

        /// Floodscan band (SFED or MFED)
        #[arg(long)]
        band: Option<String>,

        /// original or upsampled
        #[arg(long, default_value = "original")]
        display: DisplayMode,

        /// Override the configured data directory
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List a dataset's issue dates, newest first
    Dates {
        #[arg(long)]
        dataset: Dataset,

        /// Reference date, YYYY-MM-DD (default: today)
        #[arg(long)]
        today: Option<String>,
    },

    /// Shape zonal-statistics rows for the time-series chart
    Stats {
        #[arg(long)]
        dataset: Dataset,

        /// JSON array of statistics rows
        #[arg(long)]
        rows: PathBuf,

        /// Issue date (SEAS5) or valid date (Floodscan), YYYY-MM-DD
        #[arg(long)]
        date: String,

        /// Floodscan band (SFED or MFED)
        #[arg(long)]
        band: Option<String>,

        /// Days of Floodscan history ending at the date
        #[arg(long, default_value_t = commands::DEFAULT_HISTORY_DAYS)]
        days: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.config {
        Some(path) => InspectorConfig::from_yaml(path)?,
        None => InspectorConfig::from_env(),
    };
    info!(
        data_dir = %config.data_dir.display(),
        resolution = config.resample.target_resolution,
        "Loaded configuration"
    );

    match args.command {
        Command::Resample {
            input,
            resolution,
            region,
            admin_level,
            pcode,
            bbox,
            all_touched,
            output,
        } => {
            let clip = region
                .zip(pcode)
                .map(|(path, pcode)| ClipTarget::Region {
                    path,
                    admin_level,
                    pcode,
                })
                .or(bbox.map(ClipTarget::Bbox));
            let raster =
                commands::resample(&config, &input, resolution, clip.as_ref(), all_touched)
                    .await?;
            commands::write_raster(&raster, output.as_deref()).await?;
        }

        Command::View {
            dataset,
            iso3,
            admin_level,
            pcode,
            date,
            band,
            display,
            data_dir,
            output,
        } => {
            let mut config = config;
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            let request = CogRequest {
                dataset,
                iso3,
                admin_level,
                pcode,
                issue_date: date,
                band,
                display,
            };
            let raster = commands::view(&config, &request).await?;
            commands::write_raster(&raster, output.as_deref()).await?;
        }

        Command::Dates { dataset, today } => {
            let dates = commands::issue_dates(dataset, today.as_deref())?;
            info!(dataset = %dataset, count = dates.len(), "Listing issue dates");
            for date in dates {
                println!("{}", date);
            }
        }

        Command::Stats {
            dataset,
            rows,
            date,
            band,
            days,
        } => {
            let value =
                commands::stats(dataset, &rows, &date, band.as_deref(), days).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_view_args() {
        let args = Args::try_parse_from([
            "raster-inspector",
            "view",
            "--dataset",
            "floodscan",
            "--iso3",
            "som",
            "--pcode",
            "SO11",
            "--date",
            "2024-05-10",
            "--display",
            "upsampled",
        ])
        .unwrap();

        match args.command {
            Command::View {
                dataset,
                admin_level,
                display,
                band,
                ..
            } => {
                assert_eq!(dataset, Dataset::Floodscan);
                assert_eq!(admin_level, 1);
                assert_eq!(display, DisplayMode::Upsampled);
                assert!(band.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_region_requires_pcode() {
        let result = Args::try_parse_from([
            "raster-inspector",
            "resample",
            "in.json",
            "--region",
            "som_adm1.geojson",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_bbox_arg() {
        let args = Args::try_parse_from([
            "raster-inspector",
            "resample",
            "in.json",
            "--bbox",
            "45,2,46,3",
        ])
        .unwrap();
        match args.command {
            Command::Resample { bbox, region, .. } => {
                assert_eq!(bbox, Some(BoundingBox::new(45.0, 2.0, 46.0, 3.0)));
                assert!(region.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(Args::try_parse_from(["raster-inspector", "resample", "in.json", "--bbox", "45,2"])
            .is_err());
    }

    #[test]
    fn test_parse_stats_args() {
        let args = Args::try_parse_from([
            "raster-inspector",
            "stats",
            "--dataset",
            "floodscan",
            "--rows",
            "rows.json",
            "--date",
            "2024-05-10",
        ])
        .unwrap();
        match args.command {
            Command::Stats {
                dataset, band, days, ..
            } => {
                assert_eq!(dataset, Dataset::Floodscan);
                assert!(band.is_none());
                assert_eq!(days, commands::DEFAULT_HISTORY_DAYS);
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(Args::try_parse_from(["raster-inspector", "stats", "--dataset", "seas5"]).is_err());
    }

    #[test]
    fn test_unknown_dataset_rejected() {
        let result =
            Args::try_parse_from(["raster-inspector", "dates", "--dataset", "era5"]);
        assert!(result.is_err());
    }
}
