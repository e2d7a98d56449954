#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command line front end for the collision map engine.
//!
//! Reads the collision, school, and neighborhood tables from disk, runs
//! the spatial joins, and prints the resulting tables as text or JSON.
//!
//! Uses `indicatif-log-bridge` (via [`collision_map_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod error;
mod files;
mod report;

use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::str::FromStr as _;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use collision_map_analytics::breakdown::{
    DEFAULT_AGE_BIN_WIDTH, EventField, hourly_counts, location_hotspots, monthly_counts,
    top_values, victim_age_bins, victim_sex_counts, yearly_counts,
};
use collision_map_analytics::ranking::polygon_ids_named;
use collision_map_analytics::{
    SchoolFilter, YearRange, aggregate_by_polygon, events_in_polygons, filter_by_years,
    polygon_counts, rank_polygons, school_safety,
};
use collision_map_cli_utils::{MultiProgress, SchoolJoinBar};
use collision_map_collision_models::{CollisionEvent, PointOfInterest, SafetyRating};
use collision_map_spatial::progress::{ProgressCallback, null_progress};
use collision_map_spatial::{assign_polygon, associate};
use collision_map_store::config::DatasetConfig;

use crate::error::CliError;
use crate::report::StatsReport;

#[derive(Parser)]
#[command(
    name = "collision_map",
    about = "Traffic collision proximity and neighborhood analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every analysis command.
#[derive(Args)]
struct CommonArgs {
    /// Collision table (CSV)
    #[arg(long)]
    collisions: PathBuf,
    /// Dataset column mapping (TOML). Defaults to the embedded Los Angeles mapping.
    #[arg(long)]
    config: Option<PathBuf>,
    /// First year to include
    #[arg(long)]
    from_year: Option<i32>,
    /// Last year to include
    #[arg(long)]
    to_year: Option<i32>,
    /// Print JSON instead of a text table
    #[arg(long)]
    json: bool,
    /// Hide progress bars and informational log lines
    #[arg(long)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank neighborhoods by collision count
    Neighborhoods {
        #[command(flatten)]
        common: CommonArgs,
        /// Neighborhood boundaries (`GeoJSON` `FeatureCollection`)
        #[arg(long)]
        neighborhoods: PathBuf,
        /// Number of neighborhoods to show
        #[arg(long, default_value = "10")]
        top: usize,
        /// Neighborhood to always include, by name
        #[arg(long)]
        select: Option<String>,
    },
    /// Rate schools by the annual number of collisions nearby
    Schools {
        #[command(flatten)]
        common: CommonArgs,
        /// School table (CSV)
        #[arg(long)]
        schools: PathBuf,
        /// Search radius in miles (defaults to the dataset config)
        #[arg(long)]
        radius: Option<f64>,
        /// Only schools in this primary category
        #[arg(long)]
        category: Option<String>,
        /// Only schools in this secondary category
        #[arg(long)]
        subcategory: Option<String>,
        /// Only schools whose name contains this text
        #[arg(long)]
        name: Option<String>,
        /// Only schools with this rating (Excellent, Good, Fair, Poor)
        #[arg(long)]
        rating: Option<String>,
    },
    /// Write every collision within the radius of each school as CSV
    Nearby {
        #[command(flatten)]
        common: CommonArgs,
        /// School table (CSV)
        #[arg(long)]
        schools: PathBuf,
        /// Search radius in miles (defaults to the dataset config)
        #[arg(long)]
        radius: Option<f64>,
        /// Output file. Defaults to stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Temporal, victim, and location breakdowns
    Stats {
        #[command(flatten)]
        common: CommonArgs,
        /// Neighborhood boundaries, required with `--neighborhood`
        #[arg(long)]
        neighborhoods: Option<PathBuf>,
        /// Restrict to collisions inside this neighborhood
        #[arg(long, conflicts_with = "school")]
        neighborhood: Option<String>,
        /// School table, required with `--school`
        #[arg(long)]
        schools: Option<PathBuf>,
        /// Restrict to collisions near schools whose name contains this text
        #[arg(long)]
        school: Option<String>,
        /// Search radius in miles for `--school`
        #[arg(long)]
        radius: Option<f64>,
        /// Number of entries in each top list
        #[arg(long, default_value = "10")]
        top: usize,
        /// Decimal places used to group hotspot locations
        #[arg(long, default_value = "4")]
        decimals: u8,
    },
    /// Print the dataset column mapping as TOML
    Config {
        /// Dataset column mapping (TOML). Defaults to the embedded Los Angeles mapping.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl CommonArgs {
    fn dataset(&self) -> Result<DatasetConfig, CliError> {
        files::load_config(self.config.as_deref())
    }

    fn events(&self, config: &DatasetConfig) -> Result<Vec<CollisionEvent>, CliError> {
        files::load_events(&self.collisions, config)
    }

    /// The year range given on the command line, if any. A missing end is
    /// completed the same way as [`Self::resolved_range`].
    fn explicit_range(&self, events: &[CollisionEvent]) -> Result<Option<YearRange>, CliError> {
        if self.from_year.is_none() && self.to_year.is_none() {
            return Ok(None);
        }
        self.resolved_range(events).map(Some)
    }

    /// The year range given on the command line, completed from the
    /// years present in `events`. A completed end never crosses the given
    /// one, and with no dated events a single flag stands for that one year.
    fn resolved_range(&self, events: &[CollisionEvent]) -> Result<YearRange, CliError> {
        let covering = YearRange::covering(events);
        let start = self
            .from_year
            .or_else(|| covering.map(|r| self.to_year.map_or(r.start(), |to| r.start().min(to))));
        let end = self
            .to_year
            .or_else(|| covering.map(|r| self.from_year.map_or(r.end(), |from| r.end().max(from))));
        match (start.or(end), end.or(start)) {
            (Some(start), Some(end)) => Ok(YearRange::new(start, end)?),
            _ => Err(CliError::Usage(
                "No collision has a valid date; pass --from-year and --to-year".to_string(),
            )),
        }
    }

    fn progress(&self, multi: &MultiProgress, radius_miles: f64) -> Arc<dyn ProgressCallback> {
        if self.quiet {
            null_progress()
        } else {
            SchoolJoinBar::new(multi, radius_miles)
        }
    }
}

impl Commands {
    const fn quiet(&self) -> bool {
        match self {
            Self::Neighborhoods { common, .. }
            | Self::Schools { common, .. }
            | Self::Nearby { common, .. }
            | Self::Stats { common, .. } => common.quiet,
            Self::Config { .. } => false,
        }
    }
}

/// Collisions inside `range`, or all of them when no range was given.
fn in_range(events: &[CollisionEvent], range: Option<YearRange>) -> Vec<&CollisionEvent> {
    match range {
        Some(range) => {
            let filtered = filter_by_years(events, range);
            if filtered.undated > 0 {
                log::info!(
                    "Excluded {} collisions without a valid date",
                    filtered.undated
                );
            }
            filtered.events
        }
        None => events.iter().collect(),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn radius_or_default(radius: Option<f64>, config: &DatasetConfig) -> f64 {
    radius.unwrap_or(config.proximity.radius_miles)
}

fn matching_schools(schools: &[PointOfInterest], name: &str) -> Vec<PointOfInterest> {
    let filter = SchoolFilter {
        name_contains: Some(name.to_string()),
        ..SchoolFilter::default()
    };
    schools
        .iter()
        .filter(|s| filter.matches(s))
        .cloned()
        .collect()
}

fn run_neighborhoods(
    common: &CommonArgs,
    neighborhoods: &Path,
    top: usize,
    select: Option<&str>,
) -> Result<(), CliError> {
    let config = common.dataset()?;
    let events = common.events(&config)?;
    let polygons = files::load_neighborhoods(neighborhoods, &config)?;

    let selected = match select {
        Some(name) => Some(
            polygon_ids_named(&polygons, name)
                .into_iter()
                .next()
                .ok_or_else(|| CliError::Usage(format!("Unknown neighborhood: {name}")))?,
        ),
        None => None,
    };

    let association = assign_polygon(&events, &polygons)?;
    let filtered = in_range(&events, common.explicit_range(&events)?);
    let counts = aggregate_by_polygon(filtered.iter().copied(), &association, &polygons);
    let ranked = rank_polygons(&polygon_counts(&counts, &polygons), top, selected);

    if common.json {
        print_json(&ranked)
    } else {
        report::print_neighborhoods(&ranked, selected);
        Ok(())
    }
}

fn run_schools(
    multi: &MultiProgress,
    common: &CommonArgs,
    schools: &Path,
    radius: Option<f64>,
    mut filter: SchoolFilter,
    rating: Option<&str>,
) -> Result<(), CliError> {
    filter.rating = rating
        .map(|r| {
            SafetyRating::from_str(r)
                .map_err(|_| CliError::Usage(format!("Unknown rating: {r}")))
        })
        .transpose()?;

    let config = common.dataset()?;
    let events = common.events(&config)?;
    let pois = files::load_schools(schools, &config)?;
    let range = common.resolved_range(&events)?;

    let radius_miles = radius_or_default(radius, &config);
    let progress = common.progress(multi, radius_miles);
    let associations = associate(
        &events,
        &pois,
        radius_miles,
        progress.as_ref(),
    )?;
    let table = school_safety(&pois, &associations, &events, range, &filter);

    if common.json {
        print_json(&table)
    } else {
        report::print_school_safety(&table);
        Ok(())
    }
}

fn run_nearby(
    multi: &MultiProgress,
    common: &CommonArgs,
    schools: &Path,
    radius: Option<f64>,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let config = common.dataset()?;
    let events = common.events(&config)?;
    let pois = files::load_schools(schools, &config)?;

    let events: Vec<CollisionEvent> = in_range(&events, common.explicit_range(&events)?)
        .into_iter()
        .cloned()
        .collect();

    let radius_miles = radius_or_default(radius, &config);
    let progress = common.progress(multi, radius_miles);
    let associations = associate(
        &events,
        &pois,
        radius_miles,
        progress.as_ref(),
    )?;

    let csv_error = |source| CliError::Csv {
        path: output.map_or_else(|| "stdout".to_string(), |p| p.display().to_string()),
        source,
    };
    let written = match output {
        Some(path) => {
            let file = File::create(path).map_err(|source| CliError::Io {
                path: path.display().to_string(),
                source,
            })?;
            report::write_nearby_csv(BufWriter::new(file), &associations, &events, &pois)
                .map_err(csv_error)?
        }
        None => report::write_nearby_csv(std::io::stdout().lock(), &associations, &events, &pois)
            .map_err(csv_error)?,
    };

    log::info!("Wrote {written} school/collision pairs");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_stats(
    multi: &MultiProgress,
    common: &CommonArgs,
    neighborhoods: Option<&Path>,
    neighborhood: Option<&str>,
    schools: Option<&Path>,
    school: Option<&str>,
    radius: Option<f64>,
    top: usize,
    decimals: u8,
) -> Result<(), CliError> {
    let config = common.dataset()?;
    let events = common.events(&config)?;
    let filtered = in_range(&events, common.explicit_range(&events)?);

    let (label, subset): (String, Vec<&CollisionEvent>) = if let Some(name) = neighborhood {
        let path = neighborhoods.ok_or_else(|| {
            CliError::Usage("--neighborhood requires --neighborhoods".to_string())
        })?;
        let polygons = files::load_neighborhoods(path, &config)?;
        let ids = polygon_ids_named(&polygons, name);
        if ids.is_empty() {
            return Err(CliError::Usage(format!("Unknown neighborhood: {name}")));
        }
        let association = assign_polygon(&events, &polygons)?;
        (
            name.to_string(),
            events_in_polygons(filtered, &association, &ids),
        )
    } else if let Some(name) = school {
        let path = schools
            .ok_or_else(|| CliError::Usage("--school requires --schools".to_string()))?;
        let matched = matching_schools(&files::load_schools(path, &config)?, name);
        if matched.is_empty() {
            return Err(CliError::Usage(format!("No school matches: {name}")));
        }
        let radius_miles = radius_or_default(radius, &config);
        let progress = common.progress(multi, radius_miles);
        let associations = associate(
            &events,
            &matched,
            radius_miles,
            progress.as_ref(),
        )?;
        let nearby: HashSet<&str> = associations.iter().map(|a| a.event_id.as_str()).collect();
        let names: BTreeSet<&str> = matched.iter().map(|s| s.name.as_str()).collect();
        (
            names.into_iter().collect::<Vec<_>>().join(", "),
            filtered
                .into_iter()
                .filter(|e| nearby.contains(e.id.as_str()))
                .collect(),
        )
    } else {
        (config.name.clone(), filtered)
    };

    let stats = StatsReport {
        label,
        total: subset.len(),
        hourly: hourly_counts(subset.iter().copied()),
        monthly: monthly_counts(subset.iter().copied()),
        yearly: yearly_counts(subset.iter().copied()),
        victim_ages: victim_age_bins(subset.iter().copied(), DEFAULT_AGE_BIN_WIDTH)?,
        victim_sex: victim_sex_counts(subset.iter().copied()),
        premises: top_values(subset.iter().copied(), EventField::Premise, top),
        crimes: top_values(subset.iter().copied(), EventField::Crime, top),
        areas: top_values(subset.iter().copied(), EventField::Area, top),
        hotspots: location_hotspots(subset.iter().copied(), decimals, top),
    };

    if common.json {
        print_json(&stats)
    } else {
        report::print_stats(&stats);
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let multi = collision_map_cli_utils::init_logger(cli.command.quiet());

    match cli.command {
        Commands::Neighborhoods {
            common,
            neighborhoods,
            top,
            select,
        } => run_neighborhoods(&common, &neighborhoods, top, select.as_deref())?,
        Commands::Schools {
            common,
            schools,
            radius,
            category,
            subcategory,
            name,
            rating,
        } => {
            let filter = SchoolFilter {
                category_primary: category,
                category_secondary: subcategory,
                name_contains: name,
                rating: None,
            };
            run_schools(
                &multi,
                &common,
                &schools,
                radius,
                filter,
                rating.as_deref(),
            )?;
        }
        Commands::Nearby {
            common,
            schools,
            radius,
            output,
        } => run_nearby(&multi, &common, &schools, radius, output.as_deref())?,
        Commands::Stats {
            common,
            neighborhoods,
            neighborhood,
            schools,
            school,
            radius,
            top,
            decimals,
        } => run_stats(
            &multi,
            &common,
            neighborhoods.as_deref(),
            neighborhood.as_deref(),
            schools.as_deref(),
            school.as_deref(),
            radius,
            top,
            decimals,
        )?,
        Commands::Config { config } => {
            let config = files::load_config(config.as_deref())?;
            print!("{}", toml::to_string(&config).map_err(CliError::from)?);
        }
    }

    Ok(())
}
