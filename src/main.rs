//! cmdring demo - game logic thread -> render thread
//!
//! Producer mensimulasikan game loop yang mengirim draw command per frame,
//! consumer mensimulasikan renderer. Di akhir frame producer menunggu
//! renderer "almost empty" sebelum frame berikutnya, seperti double
//! buffering pada command list GPU.
//!
//! Usage:
//!   cargo run --release -- --frames 600 --commands 2000

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use bytemuck::NoUninit;
use clap::Parser;
use tracing::{debug, info, warn};

use cmdring::{CommandQueue, Condition, HexDump, QueueConfig};

#[derive(Parser, Debug)]
#[command(name = "cmdring")]
#[command(about = "SPSC command queue demo: game logic producer, render consumer")]
struct Args {
    /// Jumlah slot di ring
    #[arg(short, long, default_value_t = 32 * 1024)]
    slots: usize,

    /// Jumlah frame yang disimulasikan
    #[arg(short, long, default_value_t = 600)]
    frames: u32,

    /// Draw command per frame
    #[arg(short, long, default_value_t = 2000)]
    commands: u32,

    /// Timeout untuk setiap wait (ms)
    #[arg(long, default_value_t = 100)]
    wait_ms: u64,

    #[arg(long, default_value_t = 10)]
    almost_empty: usize,

    #[arg(long, default_value_t = 100)]
    alloc_ok: usize,

    /// Pre-fault backing storage
    #[arg(long)]
    prefault: bool,

    /// Hex dump seluruh ring ke stdout setelah selesai
    #[arg(long)]
    dump: bool,
}

/// Draw command packet (32 bytes)
#[repr(C)]
#[derive(Clone, Copy, Default, Debug, NoUninit)]
#[allow(dead_code)] // Geometry fields hanya dibawa, tidak di-render
struct DrawCommand {
    frame: u32,
    index: u32,
    opcode: u32,
    texture_id: u32,
    x: f32,
    y: f32,
    issued_ns: u64,
}

/// Statistik producer
#[derive(Default)]
struct GameStats {
    sent: u64,
    full_waits: u64,
    frame_waits: u64,
    frame_wait_timeouts: u64,
}

/// Statistik consumer
#[derive(Default)]
struct RenderStats {
    received: u64,
    idle_waits: u64,
    total_latency_ns: u64,
    max_latency_ns: u64,
    opcodes: [u64; 8],
    last_frame: u32,
}

fn game_loop(
    producer: &mut cmdring::Producer<DrawCommand>,
    args: &Args,
    epoch: Instant,
) -> GameStats {
    let timeout = Duration::from_millis(args.wait_ms);
    let mut stats = GameStats::default();

    for frame in 0..args.frames {
        for index in 0..args.commands {
            loop {
                if let Some(mut slot) = producer.reserve_slot() {
                    *slot = DrawCommand {
                        frame,
                        index,
                        opcode: index % 8,
                        texture_id: frame.wrapping_mul(31).wrapping_add(index) % 256,
                        x: (index % 1920) as f32,
                        y: (frame % 1080) as f32,
                        issued_ns: epoch.elapsed().as_nanos() as u64,
                    };
                    slot.commit();
                    stats.sent += 1;
                    break;
                }

                stats.full_waits += 1;
                producer.wait(Condition::AllocOk, timeout);
            }
        }

        // End of frame: jangan biarkan game logic lari lebih dari satu frame
        stats.frame_waits += 1;
        if !producer.wait(Condition::AlmostEmpty, timeout) {
            stats.frame_wait_timeouts += 1;
            debug!(frame, usage = producer.usage_ratio(), "frame wait timed out");
        }
    }

    // Tunggu renderer selesai sebelum keluar
    while !producer.wait(Condition::Empty, timeout) {
        warn!(usage = producer.usage_ratio(), "renderer still draining");
    }

    stats
}

fn render_loop(
    mut consumer: cmdring::Consumer<DrawCommand>,
    expected: u64,
    timeout: Duration,
    epoch: Instant,
) -> RenderStats {
    let mut stats = RenderStats::default();

    while stats.received < expected {
        match consumer.dequeue().map(|cmd| *cmd) {
            Some(cmd) => {
                let latency = (epoch.elapsed().as_nanos() as u64).saturating_sub(cmd.issued_ns);
                stats.total_latency_ns += latency;
                stats.max_latency_ns = stats.max_latency_ns.max(latency);
                stats.opcodes[(cmd.opcode % 8) as usize] += 1;
                stats.last_frame = cmd.frame;
                stats.received += 1;
            }
            None => {
                stats.idle_waits += 1;
                consumer.wait(Condition::NonEmpty, timeout);
            }
        }
    }

    stats
}

fn print_report(game: &GameStats, render: &RenderStats, allocations: usize, elapsed: Duration) {
    let avg_latency = if render.received > 0 {
        render.total_latency_ns / render.received
    } else {
        0
    };

    println!("\n📊 Command Queue Demo");
    println!("=====================");
    println!("  Duration:        {:.2} ms", elapsed.as_secs_f64() * 1000.0);
    println!("  Sent:            {}", game.sent);
    println!("  Received:        {}", render.received);
    println!("  Allocations:     {}", allocations);
    println!(
        "  Throughput:      {:.2} M cmds/sec",
        render.received as f64 / elapsed.as_secs_f64() / 1_000_000.0
    );
    println!("\nProducer:");
    println!("  Full waits:      {}", game.full_waits);
    println!(
        "  Frame waits:     {} ({} timed out)",
        game.frame_waits, game.frame_wait_timeouts
    );
    println!("\nConsumer:");
    println!("  Idle waits:      {}", render.idle_waits);
    println!("  Last frame:      {}", render.last_frame);
    println!("  Opcode mix:      {:?}", render.opcodes);
    println!("  Avg latency:     {:.2} μs", avg_latency as f64 / 1000.0);
    println!(
        "  Max latency:     {:.2} μs",
        render.max_latency_ns as f64 / 1000.0
    );
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = QueueConfig::with_slots::<DrawCommand>(args.slots)
        .almost_empty_threshold(args.almost_empty)
        .alloc_ok_threshold(args.alloc_ok)
        .prefault(args.prefault);

    let queue = CommandQueue::<DrawCommand>::with_config(&config)
        .with_context(|| format!("failed to create command queue slots={}", args.slots))?;
    let monitor = queue.monitor();
    let (mut producer, consumer) = queue.split();

    info!(
        slots = monitor.capacity(),
        frames = args.frames,
        commands = args.commands,
        "starting demo"
    );

    let expected = args.frames as u64 * args.commands as u64;
    let timeout = Duration::from_millis(args.wait_ms);
    let epoch = Instant::now();

    let render_handle = thread::Builder::new()
        .name("render".into())
        .spawn(move || render_loop(consumer, expected, timeout, epoch))
        .context("failed to spawn render thread")?;

    let game_stats = game_loop(&mut producer, &args, epoch);
    let render_stats = render_handle
        .join()
        .map_err(|_| anyhow::anyhow!("render thread panicked"))?;

    print_report(
        &game_stats,
        &render_stats,
        monitor.allocation_count(),
        epoch.elapsed(),
    );

    if args.dump {
        let mut sink = HexDump::new(std::io::stdout().lock());
        producer.dump(&mut sink).context("queue dump failed")?;
    }

    Ok(())
}
