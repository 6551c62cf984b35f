//! Learner checkpointing.
//!
//! A checkpoint is a directory holding the three network records plus a
//! JSON snapshot of everything else training needs to resume: exploration
//! state, the actor-loss baseline, the experience store and the episode
//! history.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithms::symphony::{ExplorationNoise, Symphony, SymphonyConfig};
use crate::buffers::{BufferSnapshot, ExperienceStore};
use crate::metrics::EpisodeHistory;

const ACTOR_FILE: &str = "actor.bin";
const CRITIC_FILE: &str = "critic.bin";
const CRITIC_TARGET_FILE: &str = "critic_target.bin";
const SNAPSHOT_FILE: &str = "snapshot.json";

/// Configuration for the checkpointer.
#[derive(Debug, Clone)]
pub struct CheckpointerConfig {
    /// Directory to store the checkpoint in.
    pub checkpoint_dir: PathBuf,
    /// Persist the experience store with the networks.
    pub save_buffer: bool,
}

impl Default for CheckpointerConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: PathBuf::from("./checkpoints"),
            save_buffer: true,
        }
    }
}

impl CheckpointerConfig {
    /// Create a new config with specified checkpoint directory.
    pub fn new(checkpoint_dir: impl Into<PathBuf>) -> Self {
        Self {
            checkpoint_dir: checkpoint_dir.into(),
            ..Default::default()
        }
    }

    /// Enable or disable persisting the experience store.
    pub fn with_save_buffer(mut self, save_buffer: bool) -> Self {
        self.save_buffer = save_buffer;
        self
    }
}

/// Error type for checkpointing operations.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// IO error during save/load.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Burn recorder error.
    #[error("Recorder error: {0}")]
    Recorder(String),
    /// Snapshot (de)serialization error.
    #[error("Snapshot error: {0}")]
    Serde(#[from] serde_json::Error),
    /// No checkpoint found.
    #[error("No checkpoint found in {0}")]
    NoCheckpoints(PathBuf),
    /// Checkpoint was written for a differently shaped agent.
    #[error("Incompatible checkpoint: {0}")]
    Incompatible(String),
}

/// Non-network training state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSnapshot {
    /// Agent configuration at save time.
    pub config: SymphonyConfig,
    /// Exploration schedule, including its phase clock.
    pub exploration: ExplorationNoise,
    /// Actor-loss baseline.
    pub q_old_policy: f32,
    /// Whether the exploration-only phase was over.
    #[serde(default)]
    pub learning: bool,
    /// Experience store contents, when persisted.
    pub buffer: Option<BufferSnapshot>,
    /// Per-episode returns and lengths.
    #[serde(flatten)]
    pub history: EpisodeHistory,
}

/// Driver state handed back by [`Checkpointer::load`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingProgress {
    /// Per-episode returns and lengths.
    pub history: EpisodeHistory,
    /// Whether the exploration-only phase was over.
    pub learning: bool,
}

impl TrainingSnapshot {
    /// Exploration phase clock.
    pub fn phase(&self) -> f64 {
        self.exploration.phase()
    }
}

/// Saves and restores a Symphony learner to a checkpoint directory.
pub struct Checkpointer {
    config: CheckpointerConfig,
}

impl Checkpointer {
    /// Create a new checkpointer.
    ///
    /// Creates the checkpoint directory if it doesn't exist.
    pub fn new(config: CheckpointerConfig) -> Result<Self, CheckpointError> {
        fs::create_dir_all(&config.checkpoint_dir)?;
        Ok(Self { config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &CheckpointerConfig {
        &self.config
    }

    /// Whether a complete snapshot is present.
    pub fn exists(&self) -> bool {
        self.path(SNAPSHOT_FILE).exists()
    }

    fn path(&self, file: &str) -> PathBuf {
        self.config.checkpoint_dir.join(file)
    }

    /// Save networks, exploration state, store, history and learning flag.
    ///
    /// Returns the checkpoint directory.
    pub fn save<B: AutodiffBackend>(
        &self,
        agent: &Symphony<B>,
        store: &ExperienceStore,
        history: &EpisodeHistory,
        learning: bool,
    ) -> Result<PathBuf, CheckpointError> {
        let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
        save_module::<B, _>(agent.actor().net(), &self.path(ACTOR_FILE), &recorder)?;
        save_module::<B, _>(agent.critic(), &self.path(CRITIC_FILE), &recorder)?;
        save_module::<B, _>(agent.critic_target(), &self.path(CRITIC_TARGET_FILE), &recorder)?;

        let snapshot = TrainingSnapshot {
            config: agent.config().clone(),
            exploration: *agent.exploration(),
            q_old_policy: agent.q_old_policy(),
            learning,
            buffer: self.config.save_buffer.then(|| store.snapshot()),
            history: history.clone(),
        };

        // Written last so `exists` only reports complete checkpoints.
        let mut writer = BufWriter::new(File::create(self.path(SNAPSHOT_FILE))?);
        serde_json::to_writer(&mut writer, &snapshot)?;
        writer.flush()?;

        log::info!(
            "Saved checkpoint to {} ({} transitions, {} episodes)",
            self.config.checkpoint_dir.display(),
            snapshot.buffer.as_ref().map_or(0, |b| b.idx),
            snapshot.history.episodes()
        );
        Ok(self.config.checkpoint_dir.clone())
    }

    /// Read the JSON snapshot without touching any network.
    pub fn load_snapshot(&self) -> Result<TrainingSnapshot, CheckpointError> {
        let path = self.path(SNAPSHOT_FILE);
        if !path.exists() {
            return Err(CheckpointError::NoCheckpoints(self.config.checkpoint_dir.clone()));
        }
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Restore a checkpoint into an existing agent and store.
    ///
    /// The agent must have been built with the same state/action/hidden
    /// dimensions. Returns the saved history and learning flag.
    pub fn load<B: AutodiffBackend>(
        &self,
        agent: &mut Symphony<B>,
        store: &mut ExperienceStore,
    ) -> crate::error::Result<TrainingProgress> {
        let snapshot = self.load_snapshot()?;
        check_compatible(agent.config(), &snapshot.config)?;

        let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
        let device = agent.device().clone();
        let actor = load_module::<B, _>(agent.actor().net().clone(), &self.path(ACTOR_FILE), &recorder, &device)?;
        let critic = load_module::<B, _>(agent.critic().clone(), &self.path(CRITIC_FILE), &recorder, &device)?;
        let critic_target = load_module::<B, _>(
            agent.critic_target().clone(),
            &self.path(CRITIC_TARGET_FILE),
            &recorder,
            &device,
        )?;

        if let Some(buffer) = snapshot.buffer {
            store.restore(buffer)?;
        }
        agent.set_actor_net(actor);
        agent.set_critic(critic);
        agent.set_critic_target(critic_target);
        agent.set_exploration(snapshot.exploration);
        agent.set_q_old_policy(snapshot.q_old_policy);

        log::info!(
            "Loaded checkpoint from {} ({} transitions, {} episodes)",
            self.config.checkpoint_dir.display(),
            store.total_added(),
            snapshot.history.episodes()
        );
        Ok(TrainingProgress {
            history: snapshot.history,
            learning: snapshot.learning,
        })
    }
}

fn check_compatible(current: &SymphonyConfig, saved: &SymphonyConfig) -> Result<(), CheckpointError> {
    let shape = |c: &SymphonyConfig| (c.state_dim, c.action_dim, c.hidden_dim);
    if shape(current) != shape(saved) {
        return Err(CheckpointError::Incompatible(format!(
            "saved (state, action, hidden) = {:?}, agent has {:?}",
            shape(saved),
            shape(current)
        )));
    }
    Ok(())
}

fn save_module<B: AutodiffBackend, M: Module<B>>(
    module: &M,
    path: &Path,
    recorder: &BinFileRecorder<FullPrecisionSettings>,
) -> Result<(), CheckpointError> {
    module
        .clone()
        .save_file(path, recorder)
        .map_err(|e| CheckpointError::Recorder(e.to_string()))
}

fn load_module<B: AutodiffBackend, M: Module<B>>(
    template: M,
    path: &Path,
    recorder: &BinFileRecorder<FullPrecisionSettings>,
    device: &B::Device,
) -> Result<M, CheckpointError> {
    template
        .load_file(path, recorder, device)
        .map_err(|e| CheckpointError::Recorder(e.to_string()))
}
