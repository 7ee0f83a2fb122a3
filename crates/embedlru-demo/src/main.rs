//! embedlru demo - exercises every cache mode end to end

mod scenario;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use embedlru::{FixedLru, LruCache};
use tracing::info;

use crate::scenario::{Harness, KEY_WIDTH, VALUE_WIDTH};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cache capacity (number of entries)
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..=254))]
    capacity: u16,

    /// Cache mode to exercise
    #[arg(short, long, value_enum, default_value_t = Mode::All)]
    mode: Mode,

    /// Print cache statistics after each run
    #[arg(long)]
    stats: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Typed `LruCache<u8, u32>`
    Typed,
    /// Byte cache owning its storage
    Owned,
    /// Byte cache over buffers allocated here
    Borrowed,
    /// All of the above
    All,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Starting embedlru demo v{}", env!("CARGO_PKG_VERSION"));
    info!("Cache capacity: {}", args.capacity);

    run_mode(args.mode, &args)?;

    info!("All scenarios passed");
    Ok(())
}

fn run_mode(mode: Mode, args: &Args) -> Result<()> {
    let result = match mode {
        Mode::Typed => {
            let mut cache: LruCache<u8, u32> =
                LruCache::new(args.capacity as usize).context("creating typed cache")?;
            exercise(&mut cache, args)
        }
        Mode::Owned => {
            let mut cache = FixedLru::new(args.capacity, KEY_WIDTH, VALUE_WIDTH)
                .context("creating byte cache")?;
            exercise(&mut cache, args)
        }
        Mode::Borrowed => {
            let slots = args.capacity as usize + 1;
            let mut keys = vec![0u8; slots * KEY_WIDTH as usize];
            let mut values = vec![0u8; slots * VALUE_WIDTH as usize];
            let mut cache = FixedLru::with_buffers(
                args.capacity,
                KEY_WIDTH,
                VALUE_WIDTH,
                &mut keys,
                &mut values,
            )
            .context("creating byte cache over borrowed buffers")?;
            exercise(&mut cache, args)
        }
        Mode::All => {
            for mode in [Mode::Typed, Mode::Owned, Mode::Borrowed] {
                run_mode(mode, args)?;
            }
            return Ok(());
        }
    };

    result.with_context(|| format!("{:?} scenario failed", mode))?;
    info!(?mode, "scenario passed");
    Ok(())
}

fn exercise<H: Harness>(cache: &mut H, args: &Args) -> Result<()> {
    scenario::run(cache, args.capacity)?;

    if args.stats {
        let stats = cache.stats();
        println!(
            "hits={} misses={} hit_ratio={:.2} inserts={} updates={} evictions={} removals={}",
            stats.hits(),
            stats.misses(),
            stats.hit_ratio(),
            stats.inserts(),
            stats.updates(),
            stats.evictions(),
            stats.removals()
        );
    }
    Ok(())
}
