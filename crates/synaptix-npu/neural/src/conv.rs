// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # 2-D Convolution Algebra
//!
//! Layouts:
//! - inputs and outputs are NHWC `(batch, rows, cols, channels)`
//! - kernels are HWIO `(k_rows, k_cols, c_in, c_out)`
//!
//! Every routine works kernel-offset by kernel-offset: for each `(a, b)` the strided
//! window of the (padded) input is flattened to a `(N·Ho·Wo, C)` matrix and combined
//! with the `(c_in, c_out)` kernel slice by a single matrix product.
//!
//! The two gradient routines (`calc_dk_conv`, `calc_dx_conv`) produce tensors whose
//! spatial extent can differ from the kernel/input they correspond to. Synapses
//! measure that difference once, on a zero-valued pass at construction, and hand the
//! resulting correction back on every call.

use core::fmt;
use core::str::FromStr;

use ndarray::{s, Array2, Array4, ArrayView4, Ix4, ShapeError};
use serde::{Deserialize, Serialize};

use crate::types::{NeuralError, Result, Tensor};

/// Padding mode of a convolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Padding {
    #[default]
    Same,
    Valid,
}

impl FromStr for Padding {
    type Err = NeuralError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SAME" => Ok(Padding::Same),
            "VALID" => Ok(Padding::Valid),
            other => Err(NeuralError::UnsupportedPadding(other.to_string())),
        }
    }
}

impl fmt::Display for Padding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Padding::Same => write!(f, "SAME"),
            Padding::Valid => write!(f, "VALID"),
        }
    }
}

/// Explicit `(low, high)` zero padding of the two spatial axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PadArgs {
    pub rows: (usize, usize),
    pub cols: (usize, usize),
}

impl Padding {
    /// Output extent along one spatial axis
    pub fn output_size(&self, input: usize, kernel: usize, stride: usize) -> usize {
        match self {
            Padding::Same => input.div_ceil(stride),
            Padding::Valid => {
                if input < kernel {
                    0
                } else {
                    (input - kernel) / stride + 1
                }
            }
        }
    }

    /// `(low, high)` padding along one spatial axis
    pub fn axis_padding(&self, input: usize, kernel: usize, stride: usize) -> (usize, usize) {
        match self {
            Padding::Valid => (0, 0),
            Padding::Same => {
                let out = self.output_size(input, kernel, stride);
                let total = ((out.saturating_sub(1)) * stride + kernel).saturating_sub(input);
                let lo = total / 2;
                (lo, total - lo)
            }
        }
    }

    pub fn pad_args(&self, rows: usize, cols: usize, kernel: (usize, usize), stride: usize) -> PadArgs {
        PadArgs {
            rows: self.axis_padding(rows, kernel.0, stride),
            cols: self.axis_padding(cols, kernel.1, stride),
        }
    }

    /// Spatial extent of a transposed convolution output along one axis
    pub fn deconv_output_size(&self, input: usize, kernel: usize, stride: usize) -> usize {
        match self {
            Padding::Same => input * stride,
            Padding::Valid => input * stride + kernel.saturating_sub(stride),
        }
    }
}

fn as_4d<'a>(tensor: &'a Tensor, what: &str) -> Result<ArrayView4<'a, f32>> {
    tensor.view().into_dimensionality::<Ix4>().map_err(|_| {
        NeuralError::invalid_shape(what, format!("expected rank 4, got shape {:?}", tensor.shape()))
    })
}

fn reshape_error(what: &str) -> impl Fn(ShapeError) -> NeuralError + '_ {
    move |e| NeuralError::invalid_shape(what, e.to_string())
}

fn check_stride(stride: usize) -> Result<()> {
    if stride == 0 {
        return Err(NeuralError::invalid_parameter("stride", "must be at least 1"));
    }
    Ok(())
}

fn pad_spatial(x: ArrayView4<f32>, pad: &PadArgs) -> Array4<f32> {
    let (n, h, w, c) = x.dim();
    let mut out = Array4::zeros((n, h + pad.rows.0 + pad.rows.1, w + pad.cols.0 + pad.cols.1, c));
    out.slice_mut(s![.., pad.rows.0..pad.rows.0 + h, pad.cols.0..pad.cols.0 + w, ..])
        .assign(&x);
    out
}

/// Copy the spatial window starting at `offset` into a zero tensor of `size`
///
/// Rows/cols beyond the source are left zero, so this both crops and zero-extends.
fn reframe(x: ArrayView4<f32>, offset: (usize, usize), size: (usize, usize)) -> Array4<f32> {
    let (n, h, w, c) = x.dim();
    let mut out = Array4::zeros((n, size.0, size.1, c));
    let rows = h.saturating_sub(offset.0).min(size.0);
    let cols = w.saturating_sub(offset.1).min(size.1);
    out.slice_mut(s![.., ..rows, ..cols, ..]).assign(&x.slice(s![
        ..,
        offset.0..offset.0 + rows,
        offset.1..offset.1 + cols,
        ..
    ]));
    out
}

/// Flattened strided window `xp[:, a::s, b::s, :]` of `rows x cols` positions
fn window_matrix(
    xp: &Array4<f32>,
    a: usize,
    b: usize,
    rows: usize,
    cols: usize,
    stride: usize,
) -> Result<Array2<f32>> {
    let (n, _, _, c) = xp.dim();
    let st = stride as isize;
    let span_r = (rows - 1) * stride + 1;
    let span_c = (cols - 1) * stride + 1;
    xp.slice(s![.., a..a + span_r; st, b..b + span_c; st, ..])
        .to_owned()
        .into_shape_with_order((n * rows * cols, c))
        .map_err(reshape_error("convolution window"))
}

/// Forward convolution `conv2d(x, kernel)`
pub fn conv2d(x: &Tensor, kernel: &Tensor, stride: usize, padding: Padding) -> Result<Tensor> {
    check_stride(stride)?;
    let x4 = as_4d(x, "conv2d inputs")?;
    let k4 = as_4d(kernel, "conv2d kernel")?;
    let (n, h, w, ci) = x4.dim();
    let (kh, kw, kci, co) = k4.dim();
    if ci != kci {
        return Err(NeuralError::shape_mismatch("conv2d input channels", &[kci], &[ci]));
    }
    let pad = padding.pad_args(h, w, (kh, kw), stride);
    let xp = pad_spatial(x4, &pad);
    let (_, hp, wp, _) = xp.dim();
    if hp < kh || wp < kw {
        return Err(NeuralError::invalid_shape(
            "conv2d inputs",
            format!("padded input {}x{} smaller than kernel {}x{}", hp, wp, kh, kw),
        ));
    }
    let ho = (hp - kh) / stride + 1;
    let wo = (wp - kw) / stride + 1;

    let mut acc = Array2::<f32>::zeros((n * ho * wo, co));
    for a in 0..kh {
        for b in 0..kw {
            let patch = window_matrix(&xp, a, b, ho, wo, stride)?;
            acc += &patch.dot(&k4.slice(s![a, b, .., ..]));
        }
    }
    Ok(acc
        .into_shape_with_order((n, ho, wo, co))
        .map_err(reshape_error("conv2d outputs"))?
        .into_dyn())
}

/// Scatter `d[:, i, j, :] · K[a, b]ᵀ` (or `· K[a, b]` when `transpose` is false) into
/// a buffer of extent `((H−1)s + kh, (W−1)s + kw)`
fn scatter_full(d: ArrayView4<f32>, k4: ArrayView4<f32>, stride: usize, transpose: bool) -> Result<Array4<f32>> {
    let (n, h, w, cd) = d.dim();
    let (kh, kw, kci, kco) = k4.dim();
    let c_out = if transpose { kci } else { kco };
    let span_r = (h - 1) * stride + 1;
    let span_c = (w - 1) * stride + 1;
    let st = stride as isize;
    let d2 = d
        .to_owned()
        .into_shape_with_order((n * h * w, cd))
        .map_err(reshape_error("scatter source"))?;
    let mut full = Array4::<f32>::zeros((n, span_r - 1 + kh, span_c - 1 + kw, c_out));
    for a in 0..kh {
        for b in 0..kw {
            let k_ab = k4.slice(s![a, b, .., ..]);
            let contrib = if transpose { d2.dot(&k_ab.t()) } else { d2.dot(&k_ab) };
            let contrib = contrib
                .into_shape_with_order((n, h, w, c_out))
                .map_err(reshape_error("scatter contribution"))?;
            let mut dst = full.slice_mut(s![.., a..a + span_r; st, b..b + span_c; st, ..]);
            dst += &contrib;
        }
    }
    Ok(full)
}

/// Transposed convolution (fractionally strided), the adjoint of `conv2d`
///
/// Output extent is `H·s` for SAME and `H·s + max(k − s, 0)` for VALID.
pub fn deconv2d(x: &Tensor, kernel: &Tensor, stride: usize, padding: Padding) -> Result<Tensor> {
    check_stride(stride)?;
    let x4 = as_4d(x, "deconv2d inputs")?;
    let k4 = as_4d(kernel, "deconv2d kernel")?;
    let (_, h, w, ci) = x4.dim();
    let (kh, kw, kci, _) = k4.dim();
    if ci != kci {
        return Err(NeuralError::shape_mismatch("deconv2d input channels", &[kci], &[ci]));
    }
    if h == 0 || w == 0 {
        return Err(NeuralError::invalid_shape("deconv2d inputs", "empty spatial extent"));
    }
    let full = scatter_full(x4, k4, stride, false)?;
    let (_, fh, fw, _) = full.dim();
    let th = padding.deconv_output_size(h, kh, stride);
    let tw = padding.deconv_output_size(w, kw, stride);
    let off_r = fh.saturating_sub(th) / 2;
    let off_c = fw.saturating_sub(tw) / 2;
    Ok(reframe(full.view(), (off_r, off_c), (th, tw)).into_dyn())
}

/// Kernel gradient `dK[a, b] = window(x, a, b)ᵀ · d`
///
/// The raw kernel extent is `Hp − (Ho − 1)s`; the trailing `delta_shape`
/// rows/cols are cropped away.
pub fn calc_dk_conv(
    x: &Tensor,
    d: &Tensor,
    stride: usize,
    pad: &PadArgs,
    delta_shape: (usize, usize),
) -> Result<Tensor> {
    check_stride(stride)?;
    let x4 = as_4d(x, "calc_dk_conv inputs")?;
    let d4 = as_4d(d, "calc_dk_conv signal")?;
    let (n, _, _, ci) = x4.dim();
    let (dn, ho, wo, co) = d4.dim();
    if n != dn {
        return Err(NeuralError::shape_mismatch("calc_dk_conv batch", &[n], &[dn]));
    }
    let xp = pad_spatial(x4, pad);
    let (_, hp, wp, _) = xp.dim();
    if ho == 0 || wo == 0 || hp < (ho - 1) * stride + 1 || wp < (wo - 1) * stride + 1 {
        return Err(NeuralError::invalid_shape(
            "calc_dk_conv signal",
            format!("{}x{} outputs do not fit a {}x{} padded input", ho, wo, hp, wp),
        ));
    }
    let raw_h = hp - (ho - 1) * stride;
    let raw_w = wp - (wo - 1) * stride;
    let kh = raw_h.saturating_sub(delta_shape.0);
    let kw = raw_w.saturating_sub(delta_shape.1);

    let d2 = d4
        .to_owned()
        .into_shape_with_order((n * ho * wo, co))
        .map_err(reshape_error("calc_dk_conv signal"))?;
    let mut dk = Array4::<f32>::zeros((kh, kw, ci, co));
    for a in 0..kh {
        for b in 0..kw {
            let patch = window_matrix(&xp, a, b, ho, wo, stride)?;
            dk.slice_mut(s![a, b, .., ..]).assign(&patch.t().dot(&d2));
        }
    }
    Ok(dk.into_dyn())
}

/// Input gradient: scatter `d · K[a, b]ᵀ`, drop the low-side padding, then apply the
/// signed `x_delta_shape` (positive crops trailing rows/cols, negative zero-fills them)
pub fn calc_dx_conv(
    kernel: &Tensor,
    d: &Tensor,
    stride: usize,
    pad: &PadArgs,
    x_delta_shape: (isize, isize),
) -> Result<Tensor> {
    check_stride(stride)?;
    let k4 = as_4d(kernel, "calc_dx_conv kernel")?;
    let d4 = as_4d(d, "calc_dx_conv signal")?;
    let (_, ho, wo, co) = d4.dim();
    let (_, _, _, kco) = k4.dim();
    if co != kco {
        return Err(NeuralError::shape_mismatch("calc_dx_conv output channels", &[kco], &[co]));
    }
    if ho == 0 || wo == 0 {
        return Err(NeuralError::invalid_shape("calc_dx_conv signal", "empty spatial extent"));
    }
    let full = scatter_full(d4, k4, stride, true)?;
    let (_, fh, fw, _) = full.dim();
    let rows = fh.saturating_sub(pad.rows.0);
    let cols = fw.saturating_sub(pad.cols.0);
    let target = (
        (rows as isize - x_delta_shape.0).max(0) as usize,
        (cols as isize - x_delta_shape.1).max(0) as usize,
    );
    Ok(reframe(full.view(), (pad.rows.0, pad.cols.0), target).into_dyn())
}
