//! Peerwire Demo Server - Cellular Dishes over Framed TCP
//!
//! Setiap session mendapat satu "dish" (grid sel) sendiri:
//! - Payload pertama `[rows, cols, ratio]` membuat dish dan membalas generasi 0
//! - Payload berikutnya (advance) menghitung generasi berikut dan membalasnya
//! - Disconnection menghapus dish
//!
//! Usage:
//!   cargo run --release --bin peerwire-server -- [--port 11000] [--accept-burst 64]

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use peerwire::{Event, NetworkContext, Server, ServerConfig, SessionId, DEFAULT_PORT};

/// Demo server: one cellular dish per connected peer.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Listening port on all interfaces
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Max connections accepted per tick (0 = unbounded)
    #[arg(long, default_value_t = 64)]
    accept_burst: usize,

    /// Idle sleep between ticks, in microseconds
    #[arg(long, default_value_t = 100)]
    idle_us: u64,
}

/// Toroidal grid of live/dead cells, one byte per cell
struct Dish {
    rows: usize,
    cols: usize,
    cells: Vec<u8>,
    generation: u64,
}

impl Dish {
    /// Roughly one live cell out of `ratio`, seeded per session.
    fn new(rows: u8, cols: u8, ratio: u8, seed: u64) -> Self {
        let rows = rows as usize;
        let cols = cols as usize;
        let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
        let cells = (0..rows * cols)
            .map(|_| {
                // xorshift64
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                u8::from(state % ratio as u64 == 0)
            })
            .collect();

        Self {
            rows,
            cols,
            cells,
            generation: 0,
        }
    }

    fn live_neighbours(&self, row: usize, col: usize) -> usize {
        let mut count = 0;
        for dr in [self.rows - 1, 0, 1] {
            for dc in [self.cols - 1, 0, 1] {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let r = (row + dr) % self.rows;
                let c = (col + dc) % self.cols;
                count += self.cells[r * self.cols + c] as usize;
            }
        }
        count
    }

    /// Advance one generation (B3/S23).
    fn live(&mut self) {
        let next = (0..self.rows * self.cols)
            .map(|i| {
                let alive = self.cells[i] != 0;
                match (alive, self.live_neighbours(i / self.cols, i % self.cols)) {
                    (true, 2) | (_, 3) => 1,
                    _ => 0,
                }
            })
            .collect();
        self.cells = next;
        self.generation += 1;
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    println!("🧫 PEERWIRE DISH SERVER");
    println!("=======================\n");

    let _network = match NetworkContext::startup() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("❌ Network initialisation failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = ServerConfig {
        accept_burst: NonZeroUsize::new(cli.accept_burst),
        ..ServerConfig::with_port(cli.port)
    };
    let mut server: Server = Server::new(config);
    if let Err(e) = server.startup(cli.port) {
        eprintln!("❌ Server startup failed on port {}: {}", cli.port, e);
        return ExitCode::FAILURE;
    }
    println!("🔌 Listening on port {}", cli.port);
    println!("📡 Waiting for peers...\n");

    let mut dishes: BTreeMap<SessionId, Option<Dish>> = BTreeMap::new();
    let mut events = BTreeMap::new();
    let mut last_report = Instant::now();
    let idle = Duration::from_micros(cli.idle_us);

    loop {
        server.process_into(&mut events);

        for (&id, event) in events.iter_mut() {
            match event {
                Event::Connection(_) => {
                    if dishes.insert(id, None).is_some() {
                        log::warn!("[{}] dish already booked", id);
                    }
                    println!("✅ [{}] Dish booked", id);
                }
                Event::Disconnection(reason) => match dishes.remove(&id) {
                    Some(_) => println!("💀 [{}] Dish dies ({})", id, reason),
                    None => log::warn!("[{}] no dish to die for", id),
                },
                Event::Payload(packet) => {
                    let Some(slot) = dishes.get_mut(&id) else {
                        log::warn!("[{}] no dish to live for", id);
                        continue;
                    };

                    let dish = match slot {
                        Some(dish) => {
                            dish.live();
                            dish
                        }
                        None => match packet.as_slice() {
                            &[rows, cols, ratio] if rows > 0 && cols > 0 && ratio > 0 => {
                                println!("🌱 [{}] Dish born: {}x{} (1/{})", id, rows, cols, ratio);
                                slot.insert(Dish::new(rows, cols, ratio, id.as_u64()))
                            }
                            _ => {
                                eprintln!("⚠️ [{}] Bad bootstrap payload: {:?}", id, packet);
                                if let Err(e) = server.disconnect(id) {
                                    log::warn!("[{}] disconnect failed: {}", id, e);
                                }
                                dishes.remove(&id);
                                continue;
                            }
                        },
                    };

                    log::debug!("[{}] generation {}", id, dish.generation);
                    if let Err(e) = server.send(id, &dish.cells) {
                        eprintln!("⚠️ [{}] Sending failed: {}", id, e);
                    }
                }
            }
        }

        if last_report.elapsed() >= Duration::from_secs(10) {
            let generations: u64 = dishes.values().flatten().map(|d| d.generation).sum();
            println!(
                "📊 Sessions: {}  Generations served: {}",
                server.session_count(),
                generations
            );
            last_report = Instant::now();
        }

        if events.is_empty() {
            thread::sleep(idle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blinker_oscillates() {
        let mut dish = Dish::new(5, 5, 1, 0);
        dish.cells = vec![0; 25];
        for c in 1..4 {
            dish.cells[2 * 5 + c] = 1;
        }
        let horizontal = dish.cells.clone();

        dish.live();
        let vertical: Vec<usize> = (0..25).filter(|&i| dish.cells[i] == 1).collect();
        assert_eq!(vertical, vec![7, 12, 17]);

        dish.live();
        assert_eq!(dish.cells, horizontal);
        assert_eq!(dish.generation, 2);
    }

    #[test]
    fn test_ratio_one_fills_grid() {
        let dish = Dish::new(3, 3, 1, 42);
        assert_eq!(dish.cells, vec![1; 9]);
    }
}
