use std::process::exit;

use anyhow::{Context, Result};
use clap::Parser;

use dfplayer::logging::init_logging_with_level;
use dfplayer::{DeviceSelector, DfPlayer, PlayerConfig};

#[derive(Parser, Debug)]
#[command(name = "dfplayer-demo", about = "Reset a DFPlayer Mini and play a track")]
struct Args {
    /// Serial port the module is wired to (e.g., /dev/ttyUSB0)
    port: String,
    /// Volume, 0-30
    #[arg(long, default_value_t = 20)]
    volume: u8,
    /// Folder number
    #[arg(long, default_value_t = 1)]
    folder: u8,
    /// Track number inside the folder
    #[arg(long, default_value_t = 1)]
    track: u8,
    /// Storage source used for queries: usb, tf, flash
    #[arg(long, default_value = "tf")]
    device: DeviceSelector,
    /// TX-only wiring: never read replies
    #[arg(long)]
    no_receive: bool,
    /// Log level (overrides DFPLAYER_LOG / RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    init_logging_with_level(args.log_level.as_deref());

    let config = PlayerConfig::default()
        .with_device(args.device)
        .with_no_receive(args.no_receive);
    let mut player = DfPlayer::new(config);

    println!("Connecting to DFPlayer on {}...", args.port);
    player
        .open_serial(&args.port)
        .with_context(|| format!("Failed to open DFPlayer on {}", args.port))?;

    println!("Setting volume to {}", args.volume);
    player.set_volume(args.volume)?;

    println!("Playing track {} in folder {}", args.track, args.folder);
    match player.play_track_from_dir(args.track, args.folder, !args.no_receive) {
        Ok(Some(track)) => println!("Physical track: {track}"),
        Ok(None) => println!("Physical track: not queried"),
        Err(e) => println!("Physical track: unknown ({e})"),
    }

    Ok(())
}
