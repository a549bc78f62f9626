use log::info;
use nn::{model::ValueNetworkConfig, value_optimizer::ValueOptimizerConfig};
use tch::Device;
use traj::{parser::TrajectoryLog, STATE_DIM};
use train::{dataset::StateValueDataset, Trainer, TrainerConfig};

const TRAJ_FILE: &str = "data/twoagents.txt";
const WEIGHTS_FILE: &str = "data/value-network.ot";

fn main() {
    env_logger::init();

    let device = if tch::Cuda::is_available() {
        info!("CUDA is available, using CUDA");
        Device::cuda_if_available()
    } else if tch::utils::has_mps() {
        info!("MPS is available, using MPS");
        Device::Mps
    } else {
        info!("no accelerator available, using CPU");
        Device::Cpu
    };

    let gamma = 0.9;
    let step_duration = 4.0;

    let trajectory_log = TrajectoryLog::from_file(TRAJ_FILE).unwrap();
    let (forward, swapped) = trajectory_log.trajectories(gamma, step_duration);

    let mut pairs = forward.state_value_pairs().unwrap();
    pairs.extend(swapped.state_value_pairs().unwrap());

    info!("total number of state-value pairs: {}", pairs.len());

    let dataset = StateValueDataset::new(pairs);

    let mut trainer = Trainer::new(TrainerConfig {
        device,
        value_network_config: ValueNetworkConfig {
            state_dim: STATE_DIM,
            fc_layers: vec![150, 100, 100],
        },
        value_optimizer_config: ValueOptimizerConfig {
            lr: 0.01,
            lr_decay: 0.1,
            lr_decay_interval: 100,
        },
        epochs: 25,
        batch_size: 10,
    })
    .unwrap();

    trainer.train(&dataset);
    trainer.save(WEIGHTS_FILE).unwrap();

    info!(
        "finished initializing the value network, weights saved to {}",
        WEIGHTS_FILE
    );
}
