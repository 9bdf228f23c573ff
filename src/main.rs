use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use metanet_core::{
    Config,
    network::{
        document, packet, CaptureRecord, CancelFlag, LogProgress, Packet, PacketClassifier, SampleGenerator,
    },
    utils::{format_timestamp, generate_run_id, parse_datetime},
};

fn main() -> anyhow::Result<()> {
    let matches = Command::new("metanet")
        .version("0.1.0")
        .about("Synthetic traffic samples and domain/resource classification of connection metadata")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .global(true)
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue)
                .global(true)
        )
        .subcommand(
            Command::new("generate")
                .about("Generate a synthetic packet sample")
                .arg(
                    Arg::new("from")
                        .long("from")
                        .value_name("DATETIME")
                        .help("Window start (UTC), e.g. 2020-01-01 or 2020-01-01T08:00:00")
                        .required(true)
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .value_name("DATETIME")
                        .help("Window end (UTC, exclusive)")
                        .required(true)
                )
                .arg(
                    Arg::new("density")
                        .long("density")
                        .value_name("PACKETS_PER_SECOND")
                        .help("Desired packet density")
                        .value_parser(clap::value_parser!(f64))
                        .default_value("0.02")
                )
                .arg(
                    Arg::new("interval-gen-range")
                        .long("interval-gen-range")
                        .value_names(["MIN", "MAX"])
                        .help("Batch interval range in seconds [default: 60 600]")
                        .value_parser(clap::value_parser!(u32))
                        .num_args(2)
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_name("N")
                        .help("Seed for reproducible samples")
                        .value_parser(clap::value_parser!(u64))
                )
                .arg(
                    Arg::new("classify")
                        .long("classify")
                        .help("Classify the generated packets")
                        .action(ArgAction::SetTrue)
                )
                .arg(documents_arg())
                .arg(output_arg())
        )
        .subcommand(
            Command::new("classify")
                .about("Classify packets read from a JSON file")
                .arg(input_arg())
                .arg(
                    Arg::new("records")
                        .long("records")
                        .help("Input holds flat capture records instead of packets")
                        .action(ArgAction::SetTrue)
                )
                .arg(documents_arg())
                .arg(output_arg())
        )
        .subcommand(
            Command::new("summary")
                .about("Summarize packets per destination hostname")
                .arg(input_arg())
        )
        .subcommand(
            Command::new("config")
                .about("Write the default configuration")
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Destination file")
                        .default_value("config/default.json")
                )
        )
        .get_matches();

    let config = match matches.get_one::<String>("config") {
        Some(path) => Config::from_file(path).with_context(|| format!("loading config {}", path))?,
        None => Config::default(),
    };

    let level = if matches.get_flag("verbose") { "debug" } else { config.logging.level.as_str() };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let run_id = generate_run_id();
    info!("metanet run {}", run_id);

    match matches.subcommand() {
        Some(("generate", sub_matches)) => run_generate_mode(sub_matches, config)?,
        Some(("classify", sub_matches)) => run_classify_mode(sub_matches, &config)?,
        Some(("summary", sub_matches)) => run_summary_mode(sub_matches)?,
        Some(("config", sub_matches)) => run_config_mode(sub_matches, &config)?,
        _ => {
            eprintln!("No subcommand provided. Use --help for usage information.");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn input_arg() -> Arg {
    Arg::new("input")
        .short('i')
        .long("input")
        .value_name("FILE")
        .help("JSON file with packets")
        .required(true)
}

fn output_arg() -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .value_name("FILE")
        .help("Write JSON here instead of stdout")
}

fn documents_arg() -> Arg {
    Arg::new("documents")
        .long("documents")
        .help("Emit packets as search index documents")
        .action(ArgAction::SetTrue)
}

fn run_generate_mode(matches: &ArgMatches, mut config: Config) -> anyhow::Result<()> {
    let from = required(matches, "from")?;
    let to = required(matches, "to")?;
    let from_timestamp = parse_datetime(from)?;
    let to_timestamp = parse_datetime(to)?;
    let density = matches.get_one::<f64>("density").copied().unwrap_or(0.02);
    let seed = matches.get_one::<u64>("seed").copied();

    if let Some(range) = matches.get_many::<u32>("interval-gen-range") {
        let range: Vec<u32> = range.copied().collect();
        if let [min, max] = range[..] {
            config.generator = config.generator.with_interval_range(min, max);
        }
    }

    info!(
        "Generating sample from {} to {} at {} packets/s",
        format_timestamp(from_timestamp),
        format_timestamp(to_timestamp),
        density
    );

    let cancel: CancelFlag = Arc::new(AtomicBool::new(false));
    let cancel_handler = Arc::clone(&cancel);
    if let Err(e) = ctrlc::set_handler(move || cancel_handler.store(true, Ordering::Relaxed)) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    let generator = SampleGenerator::new(config.generator.clone())?.with_cancel_flag(cancel);
    let mut sample = generator.generate_sample(from_timestamp, to_timestamp, density, seed)?;
    info!(
        "Sample: {} packets over {}s (density {:.5})",
        sample.packets.len(),
        sample.window(),
        sample.density
    );

    if matches.get_flag("classify") {
        let classifier = PacketClassifier::from_config(&config.classifier)?;
        let summary = classifier.classify_with_progress(&mut sample.packets, &mut LogProgress::new("Classifying", 10));
        info!(
            "Resource types: {} asset, {} ads, {} other",
            summary.assets, summary.ads, summary.other
        );
    }

    let json = if matches.get_flag("documents") {
        serde_json::to_string_pretty(&document::to_documents(&sample.packets))?
    } else {
        serde_json::to_string_pretty(&sample)?
    };

    write_output(matches.get_one::<String>("output"), &json)
}

fn run_classify_mode(matches: &ArgMatches, config: &Config) -> anyhow::Result<()> {
    let input = required(matches, "input")?;
    let content = std::fs::read_to_string(input).with_context(|| format!("reading {}", input))?;

    let mut packets: Vec<Packet> = if matches.get_flag("records") {
        let records: Vec<CaptureRecord> = serde_json::from_str(&content)?;
        packet::packets_from_records(records)?
    } else {
        serde_json::from_str(&content)?
    };

    let classifier = PacketClassifier::from_config(&config.classifier)?;
    let summary = classifier.classify_with_progress(&mut packets, &mut LogProgress::new("Classifying", 10));
    info!(
        "Classified {} packets: {} resolved, {} unresolved, {} skipped endpoints",
        summary.packets, summary.resolved, summary.unresolved, summary.skipped
    );

    let json = if matches.get_flag("documents") {
        serde_json::to_string_pretty(&document::to_documents(&packets))?
    } else {
        serde_json::to_string_pretty(&packets)?
    };

    write_output(matches.get_one::<String>("output"), &json)
}

fn run_summary_mode(matches: &ArgMatches) -> anyhow::Result<()> {
    let input = required(matches, "input")?;
    let content = std::fs::read_to_string(input).with_context(|| format!("reading {}", input))?;

    // Accept either a generated sample or a bare packet list
    let packets: Vec<Packet> = match serde_json::from_str::<metanet_core::network::Sample>(&content) {
        Ok(sample) => sample.packets,
        Err(_) => serde_json::from_str(&content)?,
    };

    let groups = packet::group_by_destination(&packets);

    println!("\n=== DESTINATION SUMMARY ===");
    println!("Packets: {}", packets.len());
    println!("Destinations: {}", groups.len());
    println!();
    for group in &groups {
        println!("{}: {} packets", group.hostname, group.timestamps.len());
        if let (Some(first), Some(last)) = (group.first_seen(), group.last_seen()) {
            println!("  First seen: {}", format_timestamp(first));
            println!("  Last seen:  {}", format_timestamp(last));
        }
    }

    Ok(())
}

fn run_config_mode(matches: &ArgMatches, config: &Config) -> anyhow::Result<()> {
    let output = required(matches, "output")?;
    if let Some(parent) = std::path::Path::new(output).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    config.to_file(output)?;

    info!("Configuration written to: {}", output);
    Ok(())
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> anyhow::Result<&'a String> {
    matches
        .get_one::<String>(name)
        .with_context(|| format!("missing --{}", name))
}

fn write_output(output: Option<&String>, json: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {}", path))?;
            info!("Results saved to: {}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
