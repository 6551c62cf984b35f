//! Symphony on Pendulum swing-up.
//!
//! - Observation: [cos(θ), sin(θ), θ_dot] (3D)
//! - Action: torque in [-2.0, 2.0] (1D continuous)
//! - Reward: -θ² - 0.1*θ_dot² - 0.001*torque²

use anyhow::Context;
use burn::backend::Autodiff;

use symphony_rl::{
    CSVLogger, Checkpointer, CheckpointerConfig, ConsoleLogger, ContinuousEnv, ExperienceStore,
    MultiLogger, Pendulum, Symphony, SymphonyConfig, TrainingLoop, TrainingLoopConfig,
};

// ============================================================================
// Backend Type
// ============================================================================

#[cfg(not(feature = "wgpu"))]
type B = Autodiff<burn::backend::NdArray<f32>>;

#[cfg(feature = "wgpu")]
type B = Autodiff<burn::backend::wgpu::Wgpu>;

const CHECKPOINT_DIR: &str = "./checkpoints";
const CSV_PATH: &str = "pendulum.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Full,
    Resume,
    Quick,
}

pub fn run(mode: Mode) -> anyhow::Result<()> {
    println!("=== Symphony (Pendulum) ===");

    let mut env = Pendulum::new(None);
    let mut eval_env = Pendulum::new(None);

    let agent_config = SymphonyConfig::for_env(&env);
    let loop_config = match mode {
        Mode::Full | Mode::Resume => TrainingLoopConfig::new().with_num_episodes(1_000),
        Mode::Quick => TrainingLoopConfig::new()
            .with_explore_time(1_000)
            .with_num_episodes(30)
            .with_evaluation(20, 10, 3, 200),
    };

    println!("Configuration:");
    println!(
        "  state_dim={} action_dim={} max_action={:?}",
        env.state_dim(),
        env.action_dim(),
        agent_config.max_action
    );
    println!(
        "  hidden_dim={} capacity={} fade_factor={} stall_penalty={}",
        agent_config.hidden_dim,
        agent_config.capacity,
        agent_config.fade_factor,
        agent_config.stall_penalty
    );
    println!(
        "  explore_time={} train_between_episodes={} train_per_step={}",
        loop_config.explore_time, loop_config.train_between_episodes, loop_config.train_per_step
    );
    println!();

    let device = Default::default();
    let agent = Symphony::<B>::new(agent_config.clone(), &device)?;
    let store = ExperienceStore::from_config(&agent_config)?;
    let mut runner = TrainingLoop::new(loop_config, agent, store)?;

    if mode != Mode::Quick {
        let checkpointer = Checkpointer::new(CheckpointerConfig::new(CHECKPOINT_DIR))
            .with_context(|| format!("creating checkpoint directory {}", CHECKPOINT_DIR))?;
        runner = runner.with_checkpointer(checkpointer);
    }
    if mode == Mode::Resume && runner.resume()? {
        println!("Resumed at episode {}", runner.history().episodes());
        runner.evaluate(&mut eval_env, 10)?;
    }

    let mut logger = MultiLogger::new()
        .add(ConsoleLogger::new(1))
        .add(CSVLogger::new(CSV_PATH).with_context(|| format!("opening {}", CSV_PATH))?);

    let summary = runner.run(&mut env, &mut eval_env, &mut logger)?;

    println!();
    println!(
        "Done: {} episodes, {} transitions, average return (last 100) {:.2}",
        summary.episodes, summary.total_added, summary.avg_return_100
    );
    if let Some(eval) = summary.last_evaluation {
        println!("Last evaluation: {:.2}", eval);
    }
    Ok(())
}
