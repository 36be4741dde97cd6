use anyhow::Result;
use candle_core::{DType, Tensor};

/// Mean of the unmasked token states followed by L2 normalization.
///
/// `hidden` is `[B, T, H]`, `attention_mask` is `[B, T]` of any dtype; the
/// result is `[B, H]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, _seq, hidden_dim) = hidden.dims3()?;

    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let mask_b = mask.unsqueeze(2)?.broadcast_as(hidden.shape())?;
    let summed = (hidden * &mask_b)?.sum(1)?;
    let lengths = mask.sum(1)?.unsqueeze(1)?;
    let mean = summed.broadcast_div(&lengths)?;

    let eps = match hidden.dtype() { DType::F16 | DType::BF16 => 1e-6, _ => 1e-12 };
    let norm = mean.sqr()?.sum_keepdim(1)?.sqrt()?.affine(1.0, eps)?;
    let out = mean.broadcast_div(&norm)?;
    debug_assert_eq!(out.dims(), &[batch, hidden_dim]);
    Ok(out)
}
