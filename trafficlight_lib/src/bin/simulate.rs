extern crate trafficlight_lib;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Local, SecondsFormat};
use clap::{ArgAction, Parser};
use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use tracing_subscriber::EnvFilter;

use trafficlight_lib::config::LightConfig;
use trafficlight_lib::core::Phase;
use trafficlight_lib::light::TrafficLight;

/// Runs a traffic light and prints its phase changes.
#[derive(Parser, Debug)]
#[command(name = "simulate", version)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for the cycle lengths, overrides the configuration file
    #[arg(short, long)]
    seed: Option<u64>,

    /// Stop after this many phase changes
    #[arg(short = 'n', long, default_value_t = 6)]
    cycles: u64,

    /// Stop at the first switch to green
    #[arg(long)]
    until_green: bool,

    /// Print one JSON object per phase change
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct Event {
    transition: u64,
    phase: Phase,
    at: String,
}

fn init_logging(verbosity: u8) {
    let directive = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_env("TRAFFICLIGHT_LOG").unwrap_or_else(|_| EnvFilter::new(directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn print_event(out: &mut StandardStream, event: &Event, json: bool) -> io::Result<()> {
    if json {
        let line = serde_json::to_string(event).map_err(io::Error::from)?;
        return writeln!(out, "{}", line);
    }
    let color = match event.phase {
        Phase::Red => Color::Red,
        Phase::Green => Color::Green,
    };
    write!(out, "{} #{} ", event.at, event.transition)?;
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(out, "{}", event.phase)?;
    out.reset()?;
    writeln!(out)
}

fn now() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Millis, false)
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => LightConfig::load(path)?,
        None => LightConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let choice = if args.json {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let mut out = StandardStream::stdout(choice);

    let mut light = TrafficLight::with_config(config);
    light.start()?;

    if args.until_green {
        light.wait_for_green()?;
        let event = Event {
            transition: 1,
            phase: Phase::Green,
            at: now(),
        };
        print_event(&mut out, &event, args.json)?;
    } else {
        for transition in 1..=args.cycles {
            let phase = light.next_transition()?;
            let event = Event {
                transition,
                phase,
                at: now(),
            };
            print_event(&mut out, &event, args.json)?;
        }
    }

    light.stop();
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
