//! Body State Tool
//!
//! Builds a solar system hierarchy, advances it to an instant and prints the
//! state of every body as seen from an observer body.
//!
//! Usage:
//!   cargo run --bin body_state -- [--jd 2451545.0 | --date 2024-04-08T18:00:00Z]
//!                                 [--config system.json] [--observer Earth]
//!                                 [--algorithm Mueller_1893] [--sequential]

use std::time::Instant;

use chrono::{DateTime, Utc};
use clap::{ArgAction, Parser};
use log::info;
use orrery::framelib::{Ecliptic, Equatorial, InertialFrame};
use orrery::{BodyHierarchy, MagnitudeAlgorithm, PlanetType, SystemConfig, Time, Timescale};

/// Type alias for the error type used throughout this module
type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Body State Tool
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Prints positions, phases, magnitudes and orientations of solar system bodies",
    long_about = None
)]
struct Args {
    /// Civil (UT) Julian date
    #[arg(long, conflicts_with = "date")]
    jd: Option<f64>,

    /// UTC instant in RFC 3339 form, e.g. 2024-04-08T18:00:00Z
    #[arg(long)]
    date: Option<String>,

    /// System configuration file (JSON); the built-in solar system by default
    #[arg(short, long)]
    config: Option<String>,

    /// Body the quantities are measured from
    #[arg(short, long, default_value = "Earth")]
    observer: String,

    /// Magnitude algorithm, overriding the configured one
    #[arg(short, long)]
    algorithm: Option<String>,

    /// Evaluate bodies on a single thread
    #[arg(long, action = ArgAction::SetTrue)]
    sequential: bool,
}

/// Prints a section header with a title and separator line
fn print_section_header(title: &str) {
    println!("\n{}:", title);
    println!("-------------------------------------------------------");
}

fn resolve_time(args: &Args) -> Result<Time> {
    let timescale = Timescale::default();
    if let Some(jd) = args.jd {
        return Ok(timescale.ut_jd(jd));
    }
    let instant = match &args.date {
        Some(date) => DateTime::parse_from_rfc3339(date)?.with_timezone(&Utc),
        None => Utc::now(),
    };
    Ok(timescale.from_datetime(instant))
}

fn load_config(args: &Args) -> Result<SystemConfig> {
    let mut config = match &args.config {
        Some(path) => SystemConfig::from_file(path)?,
        None => SystemConfig::solar_system()?,
    };
    if let Some(name) = &args.algorithm {
        config.settings.magnitude_algorithm = name.parse::<MagnitudeAlgorithm>()?;
    }
    if args.sequential {
        config.settings.parallel = false;
    }
    Ok(config)
}

fn display_bodies(system: &BodyHierarchy, observer_name: &str) -> Result<()> {
    let observer_id = system.id_of(observer_name)?;
    let observer = system.heliocentric_ecliptic_pos(observer_id)?;

    print_section_header(&format!("Bodies seen from {}", observer_name));
    println!(
        "{:<22} {:>12} {:>12} {:>12} {:>9} {:>9} {:>9} {:>9} {:>12} {:>8} {:>7} {:>7} {:>10} {:>8}",
        "Body",
        "X (AU)",
        "Y (AU)",
        "Z (AU)",
        "Lon",
        "Lat",
        "RA",
        "Dec",
        "Dist (AU)",
        "Phase",
        "Illum",
        "Mag",
        "Size (\")",
        "W (deg)"
    );
    println!("-------------------------------------------------------");

    for (id, body) in system.iter() {
        if id == observer_id || body.kind() == PlanetType::Observer {
            continue;
        }
        let position = body.heliocentric_ecliptic_pos();
        let ecliptic = Ecliptic::from_vector(&(position - observer));
        let equatorial = Equatorial::from_vector(&system.j2000_equatorial_pos(id, observer_id)?);
        let magnitude = system
            .v_magnitude(id, &observer)
            .map(|m| format!("{:7.2}", m))
            .unwrap_or_else(|_| format!("{:>7}", "-"));
        println!(
            "{:<22} {:>12.6} {:>12.6} {:>12.6} {:>9.4} {:>9.4} {:>9.4} {:>9.4} \
             {:>12.6} {:>8.2} {:>7.3} {} {:>10.2} {:>8.3}",
            body.name(),
            position.x,
            position.y,
            position.z,
            ecliptic.lon_degrees(),
            ecliptic.lat_degrees(),
            equatorial.ra_degrees(),
            equatorial.dec_degrees(),
            body.distance_to(&observer),
            body.phase_angle(&observer).to_degrees(),
            body.phase(&observer),
            magnitude,
            body.angular_size(&observer) * 3600.0,
            body.axis_rotation(),
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let time = resolve_time(&args)?;
    println!("Time: {} (JD {:.6}, JDE {:.6})", time, time.jd(), time.jde());

    let config = load_config(&args)?;
    let start_time = Instant::now();
    let mut system = config.build();
    for rejected in system.rejected() {
        println!("Skipped {}: {}", rejected.name, rejected.reason);
    }

    system.advance_to(&time)?;
    info!("advanced {} bodies in {:.2?}", system.len(), start_time.elapsed());

    display_bodies(&system, &args.observer)?;
    Ok(())
}
