//! End-to-end forward convolution checked against a straightforward
//! per-coordinate reference.

use pretty_assertions::assert_eq;
use rand::prelude::*;
use tessera_convolution::{ConvParams, ConvProblem, ConvolutionFwd};
use tessera_core::{ArgId, DataType, Engine, ExecContext, LayoutKind, TensorDesc, WeightsDesc};

fn blocked(block: usize) -> LayoutKind {
    LayoutKind::Blocked { block }
}

fn int_data(rng: &mut StdRng, len: usize) -> Vec<f32> {
    (0..len).map(|_| rng.gen_range(-3..=3) as f32).collect()
}

fn naive_forward(
    p: &ConvProblem,
    src: &[f32],
    wei: &[f32],
    bias: Option<&[f32]>,
    operands: &[Vec<f32>],
) -> Vec<f32> {
    let params = &p.params;
    let w = &p.weights;
    let (sh, sw) = (params.stride[1], params.stride[2]);
    let (ph, pw) = (params.padding[1], params.padding[2]);
    let (dh, dw) = (params.dilation[1] + 1, params.dilation[2] + 1);

    let mut out = vec![0.0f32; p.dst.size()];
    for n in 0..p.dst.n {
        for g in 0..params.groups {
            for oc in 0..w.oc {
                for oh in 0..p.dst.h {
                    for ow in 0..p.dst.w {
                        let mut acc = bias.map_or(0.0, |b| b[g * w.oc + oc]);
                        for kh in 0..w.kh {
                            for kw in 0..w.kw {
                                let ih = (oh * sh + kh * dh) as isize - ph as isize;
                                let iw = (ow * sw + kw * dw) as isize - pw as isize;
                                if ih < 0
                                    || ih >= p.src.h as isize
                                    || iw < 0
                                    || iw >= p.src.w as isize
                                {
                                    continue;
                                }
                                for ic in 0..w.ic {
                                    let s = src[p.src.offset(
                                        n,
                                        g * w.ic + ic,
                                        0,
                                        ih as usize,
                                        iw as usize,
                                    )];
                                    let wg = if w.with_groups { g } else { 0 };
                                    let at = w.offset(
                                        wg,
                                        oc / w.oc_block,
                                        ic / w.ic_block,
                                        0,
                                        kh,
                                        kw,
                                    ) + (ic % w.ic_block) * w.oc_block
                                        + oc % w.oc_block;
                                    acc += s * wei[at];
                                }
                            }
                        }
                        if params.with_eltwise {
                            acc = acc.max(0.0);
                        }
                        for op in operands {
                            acc += op[g * w.oc + oc];
                        }
                        out[p.dst.offset(n, g * w.oc + oc, 0, oh, ow)] = acc;
                    }
                }
            }
        }
    }
    out
}

fn run(p: &ConvProblem, nthr: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let src = int_data(&mut rng, p.src.size());
    let wei = int_data(&mut rng, p.weights.size());
    let bias = p.params.with_bias.then(|| int_data(&mut rng, p.dst.c));
    let operands: Vec<Vec<f32>> = (0..p.params.binary_operands)
        .map(|_| int_data(&mut rng, p.dst.c))
        .collect();

    let expected = naive_forward(p, &src, &wei, bias.as_deref(), &operands);

    let engine = Engine::with_threads(nthr);
    let conv = ConvolutionFwd::init(&engine, p).unwrap();
    // NaN prefill: every surviving NaN is a destination element nothing wrote.
    let mut dst = vec![f32::NAN; p.dst.size()];
    let mut ctx = ExecContext::new();
    ctx.bind_input_typed(ArgId::Src, &src)
        .bind_input_typed(ArgId::Weights, &wei)
        .bind_output_typed(ArgId::Dst, &mut dst);
    if let Some(bias) = &bias {
        ctx.bind_input_typed(ArgId::Bias, bias);
    }
    for (i, op) in operands.iter().enumerate() {
        ctx.bind_input_typed(ArgId::BinaryOperand(i as u32), op);
    }
    conv.execute_forward(&ctx).unwrap();

    assert_eq!(dst, expected);
}

#[test]
fn blocked_2d_with_bias() {
    let p = ConvProblem {
        src: TensorDesc::new(2, 16, &[5, 5], blocked(8), DataType::F32),
        weights: WeightsDesc {
            with_groups: false,
            groups: 1,
            oc: 16,
            ic: 16,
            kd: 1,
            kh: 3,
            kw: 3,
            oc_block: 8,
            ic_block: 8,
            dtype: DataType::F32,
        },
        dst: TensorDesc::new(2, 16, &[5, 5], blocked(8), DataType::F32),
        params: ConvParams {
            with_bias: true,
            ..ConvParams::unit_2d(1, 1)
        },
    };
    run(&p, 3, 1);
}

#[test]
fn strided_dilated_1d() {
    // Dilation 1 spreads 3 taps over 5 input points; stride 2 with leading
    // pad 2 over 9 points yields 5 outputs.
    let p = ConvProblem {
        src: TensorDesc::new(2, 8, &[9], blocked(8), DataType::F32),
        weights: WeightsDesc {
            with_groups: false,
            groups: 1,
            oc: 8,
            ic: 8,
            kd: 1,
            kh: 1,
            kw: 3,
            oc_block: 8,
            ic_block: 8,
            dtype: DataType::F32,
        },
        dst: TensorDesc::new(2, 8, &[5], blocked(8), DataType::F32),
        params: ConvParams {
            stride: [1, 1, 2],
            padding: [0, 0, 2],
            dilation: [0, 0, 1],
            ..ConvParams::unit_2d(0, 0)
        },
    };
    run(&p, 2, 2);
}

#[test]
fn channel_last_with_post_ops() {
    let p = ConvProblem {
        src: TensorDesc::new(1, 8, &[4, 4], LayoutKind::ChannelLast, DataType::F32),
        weights: WeightsDesc {
            with_groups: false,
            groups: 1,
            oc: 12,
            ic: 8,
            kd: 1,
            kh: 3,
            kw: 3,
            oc_block: 8,
            ic_block: 8,
            dtype: DataType::F32,
        },
        dst: TensorDesc::new(1, 12, &[4, 4], LayoutKind::ChannelLast, DataType::F32),
        params: ConvParams {
            with_bias: true,
            with_eltwise: true,
            binary_operands: 1,
            ..ConvParams::unit_2d(1, 1)
        },
    };
    run(&p, 4, 3);
}

#[test]
fn blocked_output_channel_tail_is_zero_filled() {
    // 12 output channels in 8-blocks leave 4 padded lanes per point; the
    // NaN prefill in `run` proves the tail was written by the cleanup pass.
    let p = ConvProblem {
        src: TensorDesc::new(1, 8, &[4, 4], blocked(8), DataType::F32),
        weights: WeightsDesc {
            with_groups: false,
            groups: 1,
            oc: 12,
            ic: 8,
            kd: 1,
            kh: 3,
            kw: 3,
            oc_block: 8,
            ic_block: 8,
            dtype: DataType::F32,
        },
        dst: TensorDesc::new(1, 12, &[4, 4], blocked(8), DataType::F32),
        params: ConvParams {
            with_bias: true,
            binary_operands: 1,
            ..ConvParams::unit_2d(1, 1)
        },
    };
    run(&p, 2, 4);
}

#[test]
fn grouped_blocked() {
    let p = ConvProblem {
        src: TensorDesc::new(2, 16, &[4, 4], blocked(8), DataType::F32),
        weights: WeightsDesc {
            with_groups: true,
            groups: 2,
            oc: 8,
            ic: 8,
            kd: 1,
            kh: 3,
            kw: 3,
            oc_block: 8,
            ic_block: 8,
            dtype: DataType::F32,
        },
        dst: TensorDesc::new(2, 16, &[4, 4], blocked(8), DataType::F32),
        params: ConvParams {
            groups: 2,
            with_bias: true,
            ..ConvParams::unit_2d(1, 1)
        },
    };
    run(&p, 2, 5);
}

#[test]
fn mixed_layouts() {
    let p = ConvProblem {
        src: TensorDesc::new(1, 8, &[5, 5], LayoutKind::ChannelLast, DataType::F32),
        weights: WeightsDesc {
            with_groups: false,
            groups: 1,
            oc: 16,
            ic: 8,
            kd: 1,
            kh: 3,
            kw: 3,
            oc_block: 16,
            ic_block: 8,
            dtype: DataType::F32,
        },
        dst: TensorDesc::new(1, 16, &[5, 5], blocked(16), DataType::F32),
        params: ConvParams::unit_2d(1, 1),
    };
    run(&p, 3, 6);
}
