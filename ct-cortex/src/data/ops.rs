//! 体素级算子.
//!
//! 随访差值, 阈值钳制, 掩膜应用与乘积, 棋盘格融合, 高斯平滑.
//! 所有成对算子都在任何索引操作前校验形状一致性.

use ndarray::{Array3, Axis, Zip};

use crate::consts::mask::{is_foreground, MASK_FOREGROUND};
use crate::{CropError, CtMask, CtVolume, Idx3d, NiftiHeaderAttr};

#[inline]
fn check_shapes(expected: Idx3d, actual: Idx3d) -> Result<(), CropError> {
    if expected == actual {
        Ok(())
    } else {
        Err(CropError::ShapeMismatch(expected, actual))
    }
}

impl CtVolume {
    /// 将高于 `upper` 的体素值原地钳制到 `upper`.
    ///
    /// 用于去除手术螺钉等高 HU 金属伪影
    /// (参见 [`SCREW_HU_CUTOFF`](crate::consts::SCREW_HU_CUTOFF)).
    /// 该操作幂等.
    pub fn clamp_above(&mut self, upper: f32) {
        self.data_mut().mapv_inplace(|v| v.min(upper));
    }

    /// 计算随访差值 `self - baseline`, 逐体素相减.
    ///
    /// header 沿用 `self` 的几何信息. 形状不一致时返回
    /// [`CropError::ShapeMismatch`].
    pub fn subtract(&self, baseline: &CtVolume) -> Result<CtVolume, CropError> {
        check_shapes(self.shape(), baseline.shape())?;
        let data = &self.data() - &baseline.data();
        Ok(CtVolume::with_header(self.header(), data))
    }

    /// 应用掩膜: 掩膜背景处的体素置零, 前景处保持原值.
    ///
    /// 形状不一致时返回 [`CropError::ShapeMismatch`].
    pub fn masked(&self, mask: &CtMask) -> Result<CtVolume, CropError> {
        check_shapes(self.shape(), mask.shape())?;
        let mut data = self.data().to_owned();
        Zip::from(&mut data).and(mask.data()).for_each(|v, &m| {
            if !is_foreground(m) {
                *v = 0.0;
            }
        });
        Ok(CtVolume::with_header(self.header(), data))
    }

    /// 与 `other` 做棋盘格融合. `squares` 为逐轴 (z, h, w) 方格数.
    ///
    /// 方格边长为 `size / squares` (至少为 1 体素); 方格坐标之和为偶数处取
    /// `self` 的体素, 为奇数处取 `other` 的体素. 用于配准结果的目视检查.
    ///
    /// 形状不一致时返回 [`CropError::ShapeMismatch`];
    /// `squares` 含零时 panic.
    pub fn checkerboard(
        &self,
        other: &CtVolume,
        squares: [usize; 3],
    ) -> Result<CtVolume, CropError> {
        check_shapes(self.shape(), other.shape())?;
        assert!(squares.iter().all(|&s| s != 0), "方格数必须为正");

        let (z, h, w) = self.shape();
        let cell = [
            (z / squares[0]).max(1),
            (h / squares[1]).max(1),
            (w / squares[2]).max(1),
        ];

        let mut data = self.data().to_owned();
        Zip::indexed(&mut data)
            .and(other.data())
            .for_each(|(zi, hi, wi), v, &o| {
                let parity = zi / cell[0] + hi / cell[1] + wi / cell[2];
                if parity % 2 == 1 {
                    *v = o;
                }
            });
        Ok(CtVolume::with_header(self.header(), data))
    }

    /// 以 `sigma_mm` (毫米) 为标准差做三维高斯平滑.
    ///
    /// 可分离实现: 按 header 体素分辨率将 sigma 换算为逐轴体素数,
    /// 依次沿三个轴做一维卷积. 核半宽为 3 sigma, 边界按复制处理.
    /// 某轴换算后的核半宽为 0 时跳过该轴.
    pub fn smooth_gaussian(&self, sigma_mm: f64) -> CtVolume {
        assert!(sigma_mm > 0.0, "sigma 必须为正");

        let mut data = self.data().to_owned();
        for (axis, mm) in self.pix_dim().into_iter().enumerate() {
            let sigma_vox = sigma_mm / mm;
            let kernel = gaussian_kernel(sigma_vox);
            if kernel.len() > 1 {
                convolve_axis(&mut data, Axis(axis), &kernel);
            }
        }
        CtVolume::with_header(self.header(), data)
    }
}

/// 归一化一维高斯核. 返回值长度为 `2 * ceil(3 sigma) + 1`.
fn gaussian_kernel(sigma_vox: f64) -> Vec<f64> {
    let half = (3.0 * sigma_vox).ceil() as i64;
    let mut kernel: Vec<f64> = (-half..=half)
        .map(|i| (-0.5 * (i as f64 / sigma_vox).powi(2)).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= sum);
    kernel
}

/// 沿 `axis` 对每条 lane 做一维卷积, 边界复制.
fn convolve_axis(data: &mut Array3<f32>, axis: Axis, kernel: &[f64]) {
    let half = (kernel.len() / 2) as i64;
    let lane_op = |mut lane: ndarray::ArrayViewMut1<f32>| {
        let src: Vec<f64> = lane.iter().map(|&v| v as f64).collect();
        let len = src.len() as i64;
        for (i, out) in lane.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (k, &weight) in kernel.iter().enumerate() {
                let j = (i as i64 + k as i64 - half).clamp(0, len - 1);
                acc += weight * src[j as usize];
            }
            *out = acc as f32;
        }
    };

    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            Zip::from(data.lanes_mut(axis)).par_for_each(lane_op);
        } else {
            Zip::from(data.lanes_mut(axis)).for_each(lane_op);
        }
    }
}

impl CtMask {
    /// 构造 "等于 `label`" 的二值掩膜: 等于处为前景 1, 其余为背景 0.
    ///
    /// 用于从多标签分割中选取单个解剖区域.
    pub fn select_label(&self, label: u8) -> CtMask {
        let data = self.data().mapv(|p| u8::from(p == label));
        CtMask::with_header(self.header(), data)
    }

    /// 计算与 `other` 的逐体素乘积掩膜. 前景为两者前景的交集,
    /// 体素值为两者体素值之积.
    ///
    /// 形状不一致时返回 [`CropError::ShapeMismatch`].
    pub fn intersect(&self, other: &CtMask) -> Result<CtMask, CropError> {
        check_shapes(self.shape(), other.shape())?;
        let mut data = self.data().to_owned();
        Zip::from(&mut data)
            .and(other.data())
            .for_each(|p, &q| *p = p.wrapping_mul(q));
        Ok(CtMask::with_header(self.header(), data))
    }

    /// 将所有前景体素统一为 1.
    pub fn binarized(&self) -> CtMask {
        let data = self
            .data()
            .mapv(|p| if is_foreground(p) { MASK_FOREGROUND } else { 0 });
        CtMask::with_header(self.header(), data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    const MM: [f32; 3] = [1.0, 1.0, 1.0];

    fn volume_from(data: Array3<f32>) -> CtVolume {
        CtVolume::synthetic(data, MM)
    }

    #[test]
    fn test_clamp_above_is_idempotent() {
        let mut v = volume_from(Array3::from_shape_fn((3, 3, 3), |(z, h, w)| {
            (z * 1000 + h * 100 + w * 10) as f32
        }));
        v.clamp_above(1500.0);
        let first = v.data().to_owned();
        v.clamp_above(1500.0);
        assert_eq!(v.data(), first.view());
        assert!(v.data().iter().all(|&x| x <= 1500.0));
        // 低于阈值的体素不受影响.
        assert_eq!(v[(0, 1, 2)], 120.0);
    }

    #[test]
    fn test_subtract_self_is_zero() {
        let v = volume_from(Array3::from_shape_fn((4, 4, 4), |(z, h, w)| {
            (z + h + w) as f32
        }));
        let d = v.subtract(&v).unwrap();
        assert!(d.data().iter().all(|&x| x == 0.0));
        assert_eq!(d.shape(), v.shape());
    }

    #[test]
    fn test_subtract_shape_mismatch() {
        let a = volume_from(Array3::zeros((2, 2, 2)));
        let b = volume_from(Array3::zeros((2, 2, 3)));
        assert_eq!(
            a.subtract(&b).unwrap_err(),
            CropError::ShapeMismatch((2, 2, 2), (2, 2, 3))
        );
    }

    #[test]
    fn test_masked_zeroes_background() {
        let v = volume_from(Array3::from_elem((3, 3, 3), 7.0));
        let mut mask = Array3::<u8>::zeros((3, 3, 3));
        mask[(1, 1, 1)] = 5; // 任何非零值均为前景
        let mask = CtMask::synthetic(mask, MM);

        let out = v.masked(&mask).unwrap();
        assert_eq!(out[(1, 1, 1)], 7.0);
        assert_eq!(out.foreground_values(), vec![7.0]);
    }

    #[test]
    fn test_checkerboard_alternates() {
        let a = volume_from(Array3::from_elem((4, 4, 4), 1.0));
        let b = volume_from(Array3::from_elem((4, 4, 4), 2.0));
        let cb = a.checkerboard(&b, [2, 2, 2]).unwrap();

        // 方格边长 2: (0,0,0) 处为 a, (0,0,2) 处为 b.
        assert_eq!(cb[(0, 0, 0)], 1.0);
        assert_eq!(cb[(0, 0, 2)], 2.0);
        assert_eq!(cb[(0, 2, 2)], 1.0);
        assert_eq!(cb[(2, 2, 2)], 2.0);

        // 两种体素各占一半.
        let ones = cb.data().iter().filter(|&&x| x == 1.0).count();
        assert_eq!(ones, 32);
    }

    #[test]
    fn test_checkerboard_single_square_is_first_input() {
        // 每轴一个方格: 方格坐标恒为 (0, 0, 0), 输出逐体素等于第一个输入.
        let a = volume_from(Array3::from_shape_fn((3, 4, 5), |(z, h, w)| {
            (z * 100 + h * 10 + w) as f32
        }));
        let b = volume_from(Array3::from_elem((3, 4, 5), -1000.0));

        let cb = a.checkerboard(&b, [1, 1, 1]).unwrap();
        assert_eq!(cb.data(), a.data());
    }

    #[test]
    fn test_smooth_gaussian_keeps_constant() {
        let v = volume_from(Array3::from_elem((5, 5, 5), 42.0));
        let s = v.smooth_gaussian(1.5);
        for &x in s.data().iter() {
            assert!((x - 42.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_smooth_gaussian_spreads_peak() {
        let mut data = Array3::<f32>::zeros((7, 7, 7));
        data[(3, 3, 3)] = 100.0;
        let v = volume_from(data);
        let s = v.smooth_gaussian(1.0);

        assert!(s[(3, 3, 3)] < 100.0);
        assert!(s[(3, 3, 4)] > 0.0);
        // 平滑不改变形状.
        assert_eq!(s.shape(), (7, 7, 7));
    }

    #[test]
    fn test_select_label_and_intersect() {
        let mut labels = Array3::<u8>::zeros((3, 3, 3));
        labels[(0, 0, 0)] = 1;
        labels[(1, 1, 1)] = 2;
        labels[(2, 2, 2)] = 2;
        let labels = CtMask::synthetic(labels, MM);

        let two = labels.select_label(2);
        assert_eq!(two.count_foreground(), 2);
        assert_eq!(two[(1, 1, 1)], 1);
        assert_eq!(two[(0, 0, 0)], 0);

        let one = labels.select_label(1);
        let both = one.intersect(&two).unwrap();
        assert!(both.is_empty_mask());

        let same = two.intersect(&two).unwrap();
        assert_eq!(same.count_foreground(), 2);
    }
}
