//! Description of one channel-shuffle request.

use serde::{Deserialize, Serialize};
use tessera_core::TensorDesc;

/// Which way the group transpose runs.
///
/// `Backward` undoes a `Forward` shuffle with the same group size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShuffleDirection {
    Forward,
    Backward,
}

/// Axis, grouping and direction of a shuffle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShuffleParams {
    /// Axis to shuffle along. Only the channel axis (1) is dispatchable.
    pub axis: usize,
    pub group_size: usize,
    pub direction: ShuffleDirection,
}

impl ShuffleParams {
    pub fn forward(group_size: usize) -> Self {
        Self {
            axis: 1,
            group_size,
            direction: ShuffleDirection::Forward,
        }
    }

    pub fn backward(group_size: usize) -> Self {
        Self {
            axis: 1,
            group_size,
            direction: ShuffleDirection::Backward,
        }
    }
}

/// Everything a shuffle primitive needs to know at init time.
#[derive(Clone, Debug)]
pub struct ShuffleProblem {
    pub src: TensorDesc,
    pub dst: TensorDesc,
    pub params: ShuffleParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_pick_the_channel_axis() {
        let fwd = ShuffleParams::forward(4);
        assert_eq!(fwd.axis, 1);
        assert_eq!(fwd.direction, ShuffleDirection::Forward);
        let bwd = ShuffleParams::backward(4);
        assert_eq!(bwd.group_size, 4);
        assert_eq!(bwd.direction, ShuffleDirection::Backward);
    }
}
