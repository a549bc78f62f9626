use tch::{Device, Tensor};
use traj::{StateValuePair, STATE_DIM};

/// Encodes the joint states of the given batch into a flat input tensor.
pub fn encode_states<'p>(
    device: Device,
    batch_size: usize,
    pair_iter: impl Iterator<Item = &'p StateValuePair>,
) -> Tensor {
    let mut input = vec![0f32; batch_size * STATE_DIM];

    for (index, pair) in pair_iter.enumerate() {
        input[index * STATE_DIM..(index + 1) * STATE_DIM]
            .copy_from_slice(&pair.state.to_array());
    }

    Tensor::from_slice(&input).to(device)
}

/// Encodes the target values of the given batch.
pub fn encode_values<'p>(
    device: Device,
    batch_size: usize,
    pair_iter: impl Iterator<Item = &'p StateValuePair>,
) -> Tensor {
    let mut values = vec![0f32; batch_size];

    for (index, pair) in pair_iter.enumerate() {
        values[index] = pair.value;
    }

    Tensor::from_slice(&values).to(device)
}
