//! Peerwire Demo Client - Cellular Dish Viewer
//!
//! Connects, sends the bootstrap `[rows, cols, ratio]`, then answers every
//! generation with an empty "advance" payload until the server goes away.
//!
//! Usage:
//!   cargo run --release --bin peerwire-client -- 16 32 4 [--host 127.0.0.1] [--port 11000]

use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::Parser;
use peerwire::{
    Client, ConnectionOutcome, DisconnectReason, Event, NetworkContext, DEFAULT_PORT,
};

/// Demo client: watches a cellular dish evolve on the server.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Grid rows
    #[arg(value_parser = clap::value_parser!(u8).range(1..))]
    rows: u8,

    /// Grid columns
    #[arg(value_parser = clap::value_parser!(u8).range(1..))]
    cols: u8,

    /// About one live cell out of `ratio` at birth
    #[arg(value_parser = clap::value_parser!(u8).range(1..))]
    ratio: u8,

    /// Server address (IP literal)
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Stop after this many generations (0 = run until disconnected)
    #[arg(short, long, default_value_t = 0)]
    generations: u64,

    /// Print every generation as a grid
    #[arg(short, long)]
    show: bool,
}

fn render(cells: &[u8], cols: usize) -> String {
    cells
        .chunks(cols)
        .map(|row| {
            row.iter()
                .map(|&cell| if cell != 0 { '█' } else { '·' })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    println!("🔭 PEERWIRE DISH CLIENT");
    println!("=======================\n");

    let _network = match NetworkContext::startup() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("❌ Network initialisation failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut client: Client = Client::new();
    if let Err(e) = client.connect(&cli.host, cli.port) {
        eprintln!("❌ Connect to {}:{} failed: {}", cli.host, cli.port, e);
        return ExitCode::FAILURE;
    }
    println!("📡 Connecting to {}:{}...", cli.host, cli.port);

    let mut received = 0u64;
    // No connect timeout: a peer that never answers keeps us in Connecting
    loop {
        let mut idle = true;
        while let Some(event) = client.process() {
            idle = false;
            match event {
                Event::Connection(ConnectionOutcome::Succeeded) => {
                    println!("✅ Connected, bootstrapping {}x{} dish", cli.rows, cli.cols);
                    if let Err(e) = client.send(&[cli.rows, cli.cols, cli.ratio]) {
                        eprintln!("⚠️ Sending failed: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
                Event::Connection(ConnectionOutcome::Failed) => {
                    eprintln!("❌ Connection failed");
                    return ExitCode::FAILURE;
                }
                Event::Payload(cells) => {
                    let alive = cells.iter().filter(|&&cell| cell != 0).count();
                    log::debug!("generation {}: {} cells, {} alive", received, cells.len(), alive);
                    if cli.show {
                        println!("\n🧫 Generation {} ({} alive)", received, alive);
                        println!("{}", render(&cells, cli.cols as usize));
                    }
                    received += 1;

                    if cli.generations > 0 && received >= cli.generations {
                        println!("🏁 {} generations received", received);
                        client.disconnect();
                        return ExitCode::SUCCESS;
                    }
                    if let Err(e) = client.send(&[]) {
                        eprintln!("⚠️ Sending failed: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
                Event::Disconnection(reason) => {
                    println!("👋 Disconnected ({}) after {} generations", reason, received);
                    return match reason {
                        DisconnectReason::PeerClosed => ExitCode::SUCCESS,
                        DisconnectReason::Lost => ExitCode::FAILURE,
                    };
                }
            }
        }

        if idle {
            thread::sleep(Duration::from_micros(100));
        }
    }
}
