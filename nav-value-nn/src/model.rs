use std::borrow::Borrow;
use tch::{
    nn::{linear, Linear, Module, Path},
    Tensor,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueNetworkConfig {
    /// Width of a single state vector.
    pub state_dim: usize,
    /// Widths of the hidden fully connected layers.
    pub fc_layers: Vec<usize>,
}

/// A fully connected network estimating the value of a joint state.
/// Hidden layers use ReLU; the value head is linear.
#[derive(Debug)]
pub struct ValueNetwork {
    config: ValueNetworkConfig,
    hidden: Vec<Linear>,
    value_head: Linear,
}

impl ValueNetwork {
    pub fn new<'a>(vs: impl Borrow<Path<'a>>, config: ValueNetworkConfig) -> Self {
        let vs = vs.borrow();
        let mut hidden = Vec::with_capacity(config.fc_layers.len());
        let mut in_dim = config.state_dim as i64;

        for &channels in &config.fc_layers {
            hidden.push(linear(vs, in_dim, channels as i64, Default::default()));
            in_dim = channels as i64;
        }

        let value_head = linear(vs, in_dim, 1, Default::default());

        Self {
            config,
            hidden,
            value_head,
        }
    }

    pub fn config(&self) -> &ValueNetworkConfig {
        &self.config
    }
}

impl Module for ValueNetwork {
    fn forward(&self, xs: &Tensor) -> Tensor {
        let mut xs = xs.view([-1, self.config.state_dim as i64]);

        for layer in &self.hidden {
            xs = xs.apply(layer).relu();
        }

        xs.apply(&self.value_head)
    }
}
