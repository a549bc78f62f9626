pub mod dataset;
pub mod encode;

use crate::{
    dataset::StateValueDataset,
    encode::{encode_states, encode_values},
};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use nn::{
    model::{ValueNetwork, ValueNetworkConfig},
    value_optimizer::{ValueOptimizer, ValueOptimizerConfig},
};
use rand::{seq::SliceRandom, thread_rng};
use std::path::Path;
use tch::{
    nn::{Sgd, VarStore},
    Device, TchError,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrainerBuildError {
    #[error("failed to build value network optimizer: {0}")]
    TchError(#[from] TchError),
}

#[derive(Debug, Clone, PartialEq)]
/// Configuration for the trainer.
pub struct TrainerConfig {
    /// Device to run the value network on.
    pub device: Device,
    /// Value network configuration.
    pub value_network_config: ValueNetworkConfig,
    /// Value network optimizer configuration.
    pub value_optimizer_config: ValueOptimizerConfig,
    /// Number of passes over the dataset.
    pub epochs: usize,
    /// Number of state-value pairs per minibatch.
    pub batch_size: usize,
}

/// A trainer fitting a value network to a state-value dataset.
pub struct Trainer {
    /// Trainer configuration.
    config: TrainerConfig,
    /// VarStore for the value network.
    vs: VarStore,
    /// Value network that is being trained, with its optimizer.
    value_optimizer: ValueOptimizer<ValueNetwork>,
}

impl Trainer {
    /// Creates a new trainer.
    pub fn new(config: TrainerConfig) -> Result<Self, TrainerBuildError> {
        let vs = VarStore::new(config.device);
        let network = ValueNetwork::new(&vs.root(), config.value_network_config.clone());
        let value_optimizer = ValueOptimizer::new(
            config.value_optimizer_config.clone(),
            &vs,
            network,
            Sgd {
                momentum: 0.9,
                ..Default::default()
            },
        )?;

        Ok(Self {
            config,
            vs,
            value_optimizer,
        })
    }

    /// Returns a reference to the VarStore.
    pub fn vs(&self) -> &VarStore {
        &self.vs
    }

    /// Returns a reference to the value network.
    pub fn network(&self) -> &ValueNetwork {
        self.value_optimizer.model()
    }

    /// Runs minibatch gradient descent over the dataset.
    /// Returns the accumulated loss of every epoch.
    pub fn train(&mut self, dataset: &StateValueDataset) -> Vec<f32> {
        let mut rng = thread_rng();
        let mut epoch_losses = Vec::with_capacity(self.config.epochs);
        let batch_count = dataset.len().div_ceil(self.config.batch_size);

        for epoch in 0..self.config.epochs {
            let mut indices = (0..dataset.len()).collect::<Vec<_>>();
            indices.shuffle(&mut rng);

            let progress_bar = ProgressBar::new(batch_count as u64);
            progress_bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.white} [{bar:40.green/white}] {pos:>7}/{len:7}")
                    .unwrap()
                    .progress_chars("#>-"),
            );
            progress_bar.tick();

            let mut epoch_loss = 0f32;

            for batch in indices.chunks(self.config.batch_size) {
                let states = encode_states(
                    self.config.device,
                    batch.len(),
                    batch.iter().map(|&index| &dataset[index]),
                );
                let values = encode_values(
                    self.config.device,
                    batch.len(),
                    batch.iter().map(|&index| &dataset[index]),
                );

                epoch_loss += self.value_optimizer.step(batch.len(), &states, &values);

                progress_bar.inc(1);
            }

            progress_bar.finish();

            info!(
                "(epoch={}/{}) loss={:.4} (lr={:.6})",
                epoch + 1,
                self.config.epochs,
                epoch_loss,
                self.value_optimizer.lr()
            );

            epoch_losses.push(epoch_loss);
        }

        epoch_losses
    }

    /// Saves the value network weights.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TchError> {
        self.vs.save(path)
    }
}
