//! End-to-end checks through the facade re-exports.

use pretty_assertions::assert_eq;
use tessera::convolution::{ConvParams, ConvProblem, ConvolutionFwd};
use tessera::shuffle::{ChannelShuffle, ShuffleParams, ShuffleProblem};
use tessera::{ArgId, DataType, Engine, ExecContext, LayoutKind, TensorDesc, WeightsDesc};

#[test]
fn convolution_runs_end_to_end() {
    let desc = TensorDesc::new(1, 8, &[3, 3], LayoutKind::Blocked { block: 8 }, DataType::F32);
    let problem = ConvProblem {
        src: desc,
        weights: WeightsDesc {
            with_groups: false,
            groups: 1,
            oc: 8,
            ic: 8,
            kd: 1,
            kh: 1,
            kw: 1,
            oc_block: 8,
            ic_block: 8,
            dtype: DataType::F32,
        },
        dst: desc,
        params: ConvParams::unit_2d(0, 0),
    };

    let src: Vec<f32> = (0..desc.size()).map(|i| i as f32 + 1.0).collect();
    // One 8x8 tile holding the identity, so the output copies the input.
    let mut weights = vec![0.0f32; problem.weights.size()];
    for ic in 0..8 {
        weights[ic * 8 + ic] = 1.0;
    }

    let conv = ConvolutionFwd::init(&Engine::with_threads(2), &problem).unwrap();
    let mut dst = vec![0.0f32; desc.size()];
    let mut ctx = ExecContext::new();
    ctx.bind_input_typed(ArgId::Src, &src)
        .bind_input_typed(ArgId::Weights, &weights)
        .bind_output_typed(ArgId::Dst, &mut dst);
    conv.execute_forward(&ctx).unwrap();

    assert_eq!(dst, src);
}

#[test]
fn shuffle_runs_end_to_end() {
    let desc = TensorDesc::new(1, 8, &[1], LayoutKind::Blocked { block: 8 }, DataType::F32);
    let problem = ShuffleProblem {
        src: desc,
        dst: desc,
        params: ShuffleParams::forward(2),
    };

    let src: Vec<f32> = (1..=8).map(|i| i as f32).collect();
    let shuffle = ChannelShuffle::init(&Engine::with_threads(2), &problem).unwrap();
    let mut dst = vec![0.0f32; desc.size()];
    let mut ctx = ExecContext::new();
    ctx.bind_input_typed(ArgId::Src, &src)
        .bind_output_typed(ArgId::Dst, &mut dst);
    shuffle.execute(&ctx).unwrap();

    assert_eq!(dst, vec![1.0, 3.0, 5.0, 7.0, 2.0, 4.0, 6.0, 8.0]);
}
