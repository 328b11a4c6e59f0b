//! 掩膜包围盒与同步裁剪.
//!
//! 计算掩膜前景的最紧包围盒, 按 buffer 外扩并钳制到网格范围内,
//! 然后对扫描与掩膜抽取完全相同的索引区间. 纯索引运算, 不做重采样.

use ndarray::s;

use crate::consts::mask::is_foreground;
use crate::{CropError, CtMask, CtVolume, Idx3d, NiftiHeaderAttr};

/// 掩膜前景的轴对齐包围盒. 每轴一个闭区间 \[min, max\],
/// 轴序与数据一致, 为 (z, h, w).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MaskBounds {
    axes: [(usize, usize); 3],
}

impl MaskBounds {
    /// 获取第 `i` 轴的 (min, max) 闭区间. `i >= 3` 时 panic.
    #[inline]
    pub fn axis(&self, i: usize) -> (usize, usize) {
        self.axes[i]
    }

    /// 三个轴的 (min, max) 闭区间.
    #[inline]
    pub fn axes(&self) -> [(usize, usize); 3] {
        self.axes
    }

    /// 抽取起点, 即每轴的 min.
    #[inline]
    pub fn start(&self) -> Idx3d {
        (self.axes[0].0, self.axes[1].0, self.axes[2].0)
    }

    /// 抽取大小, 即每轴的 max - min + 1.
    #[inline]
    pub fn extract_size(&self) -> Idx3d {
        let [(z0, z1), (h0, h1), (w0, w1)] = self.axes;
        (z1 - z0 + 1, h1 - h0 + 1, w1 - w0 + 1)
    }

    /// 将每轴的 min 减去 `buffer` (钳制到 0), max 加上 `buffer`
    /// (钳制到 `shape` 对应轴的 size - 1). 钳制后恒有 min <= max.
    pub fn padded(&self, buffer: usize, shape: Idx3d) -> MaskBounds {
        let limit = [shape.0, shape.1, shape.2];
        let mut axes = self.axes;
        for (i, (lo, hi)) in axes.iter_mut().enumerate() {
            *lo = lo.saturating_sub(buffer);
            *hi = (*hi + buffer).min(limit[i] - 1);
        }
        MaskBounds { axes }
    }
}

impl CtMask {
    /// 计算掩膜前景的最紧包围盒.
    ///
    /// 每轴返回前景体素下标的 (最小值, 最大值). 掩膜不含任何前景体素时
    /// 返回 [`CropError::EmptyMask`], 而不是退化区间.
    pub fn find_bounds(&self) -> Result<MaskBounds, CropError> {
        let mut axes = [(usize::MAX, 0usize); 3];
        let mut any = false;

        for ((z, h, w), &p) in self.data().indexed_iter() {
            if !is_foreground(p) {
                continue;
            }
            any = true;
            for (bound, cur) in axes.iter_mut().zip([z, h, w]) {
                bound.0 = bound.0.min(cur);
                bound.1 = bound.1.max(cur);
            }
        }

        if any {
            Ok(MaskBounds { axes })
        } else {
            Err(CropError::EmptyMask)
        }
    }
}

/// 以掩膜前景包围盒外扩 `buffer` 体素为界, 对扫描和掩膜做同步裁剪.
///
/// 两个返回值由完全相同的索引区间抽取, 形状恒一致. 不做任何插值.
///
/// # 错误
///
/// 1. 扫描与掩膜形状不一致: [`CropError::ShapeMismatch`] (在任何索引操作前返回);
/// 2. 掩膜全为背景: [`CropError::EmptyMask`].
pub fn crop_pair(
    volume: &CtVolume,
    mask: &CtMask,
    buffer: usize,
) -> Result<(CtVolume, CtMask), CropError> {
    let shape = volume.shape();
    if shape != mask.shape() {
        return Err(CropError::ShapeMismatch(shape, mask.shape()));
    }

    let bounds = mask.find_bounds()?.padded(buffer, shape);
    let [(z0, z1), (h0, h1), (w0, w1)] = bounds.axes();

    let sub_volume = volume
        .data()
        .slice(s![z0..=z1, h0..=h1, w0..=w1])
        .to_owned();
    let sub_mask = mask.data().slice(s![z0..=z1, h0..=h1, w0..=w1]).to_owned();

    Ok((
        CtVolume::with_header(volume.header(), sub_volume),
        CtMask::with_header(mask.header(), sub_mask),
    ))
}
