//! Symphony demos.
//!
//! ```bash
//! # Train on Pendulum from scratch, checkpointing to ./checkpoints
//! cargo run --release -- pendulum
//!
//! # Resume from the last checkpoint in ./checkpoints
//! cargo run --release -- pendulum-resume
//!
//! # Shorter smoke run (small explore phase, 30 episodes)
//! cargo run --release -- pendulum-quick
//! ```
//!
//! Set `RUST_LOG=debug` for per-update losses.

mod pendulum;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "pendulum" => pendulum::run(pendulum::Mode::Full)?,
            "pendulum-resume" => pendulum::run(pendulum::Mode::Resume)?,
            "pendulum-quick" => pendulum::run(pendulum::Mode::Quick)?,
            _ => {
                println!("Unknown demo: {}", args[1]);
                println!();
                print_usage();
            }
        }
    } else {
        print_usage();
    }
    Ok(())
}

fn print_usage() {
    println!("Usage: cargo run --release -- <demo>");
    println!();
    println!("  pendulum          Pendulum swing-up, full schedule, checkpoints in ./checkpoints");
    println!("  pendulum-resume   Same, resuming from ./checkpoints if present");
    println!("  pendulum-quick    30 short episodes, no checkpoints");
    println!();
    println!("  Metrics are printed per episode and written to pendulum.csv.");
}
