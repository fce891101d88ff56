use clap::Parser;
use meetpoint::{
    load_people, sdk::meetpoint::DestinationInput, sdk::util::log::init_logging, MeetpointConfig,
    MeetpointRequest,
};
use std::{error::Error, fs::File, io::Write, path::PathBuf};

/// Finds the place where a group of people should meet
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// CSV file with a `lat,lng,transport` header, one row per person
    #[arg(short, long)]
    people: PathBuf,

    /// [Optional] Latitude of a shared destination after the meeting
    #[arg(long, requires = "dest_lng")]
    dest_lat: Option<f64>,

    /// [Optional] Longitude of a shared destination after the meeting
    #[arg(long, requires = "dest_lat")]
    dest_lng: Option<f64>,

    /// Transport mode used to reach the destination (e.g. "car", "walking")
    #[arg(long)]
    dest_transport: Option<String>,

    /// Ranking criterion: minisum or minimax
    #[arg(short, long, default_value = "minisum")]
    criterion: String,

    /// Fail instead of falling back to the geometric median
    #[arg(long)]
    strict: bool,

    /// Keep the computed point instead of moving it to a transit stop
    #[arg(long)]
    no_snap: bool,

    /// [Optional] Write the result JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = MeetpointConfig::from_env();
    config.strict |= cli.strict;
    if cli.no_snap {
        config.snap_enabled = false;
    }

    let people = load_people(&cli.people)?;
    log::info!("Loaded {} participants from {}", people.len(), cli.people.display());

    let destination = match (cli.dest_lat, cli.dest_lng) {
        (Some(lat), Some(lng)) => Some(DestinationInput {
            lat,
            lng,
            transport_mode: cli.dest_transport,
        }),
        _ => None,
    };
    let request = MeetpointRequest {
        people,
        destination,
        criterion: cli.criterion,
    };

    let service = config.build_service()?;
    let result = service.compute_best_meetpoint(&request)?;

    let json_output = serde_json::to_string_pretty(&result)?;
    match cli.output {
        Some(path) => {
            let mut file = File::create(&path)?;
            file.write_all(json_output.as_bytes())?;
            log::info!("Meet point written to {}", path.display());
        }
        None => println!("{}", json_output),
    }

    Ok(())
}
