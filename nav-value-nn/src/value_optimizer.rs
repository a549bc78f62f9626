use tch::{
    nn::{Module, Optimizer, OptimizerConfig, VarStore},
    Kind, Reduction, TchError, Tensor,
};

#[derive(Debug, Clone, PartialEq)]
/// Configuration for the value network optimizer.
pub struct ValueOptimizerConfig {
    /// The initial learning rate.
    pub lr: f64,
    /// Factor applied to the learning rate on every decay.
    pub lr_decay: f64,
    /// Number of training steps between learning-rate decays.
    pub lr_decay_interval: usize,
}

/// An optimizer for a value network, together with its step-decay
/// learning-rate schedule.
pub struct ValueOptimizer<M>
where
    M: Module,
{
    config: ValueOptimizerConfig,
    model: M,
    optimizer: Optimizer,
    lr: f64,
    step_count: usize,
}

impl<M> ValueOptimizer<M>
where
    M: Module,
{
    /// Creates a new optimizer for the given model. The model's parameters
    /// must live in `vs`.
    pub fn new(
        config: ValueOptimizerConfig,
        vs: &VarStore,
        model: M,
        optimizer: impl OptimizerConfig,
    ) -> Result<Self, TchError> {
        let optimizer = optimizer.build(vs, config.lr)?;
        let lr = config.lr;

        Ok(Self {
            config,
            model,
            optimizer,
            lr,
            step_count: 0,
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Returns the learning rate currently applied to the optimizer.
    pub fn lr(&self) -> f64 {
        self.lr
    }

    /// Performs a single training step on one minibatch.
    /// Returns the mean absolute error against the target values.
    pub fn step(&mut self, batch_size: usize, states: &Tensor, values: &Tensor) -> f32 {
        if batch_size == 0 {
            return 0f32;
        }

        self.advance_lr_schedule();
        self.optimizer.zero_grad();

        let outputs = self.model.forward(states);
        let values = values.view([-1, 1]).to_kind(Kind::Float);
        let loss = outputs.l1_loss(&values, Reduction::Mean);

        loss.backward();
        self.optimizer.step();

        f32::try_from(loss).unwrap()
    }

    /// The schedule advances once per training step, ahead of the optimizer
    /// update.
    fn advance_lr_schedule(&mut self) {
        self.step_count += 1;

        if self.step_count % self.config.lr_decay_interval == 0 {
            self.lr *= self.config.lr_decay;
            self.optimizer.set_lr(self.lr);
        }
    }
}
