//! 3D 形态学操作.
//!
//! 提供二值掩膜的椭球膨胀, 用于在掩膜感兴趣区外围保留一圈组织.

use crate::consts::mask::{is_background, is_foreground, MASK_FOREGROUND};
use crate::{CtMask, NiftiHeaderAttr};

/// 椭球结构元的逐轴整型偏移集合.
///
/// 包含所有满足 `(dz/rz)^2 + (dh/rh)^2 + (dw/rw)^2 <= 1` 的偏移;
/// 半径为 0 的轴上偏移恒为 0.
fn ellipsoid_offsets([rz, rh, rw]: [usize; 3]) -> Vec<(i64, i64, i64)> {
    let radius_range = |r: usize| -(r as i64)..=(r as i64);
    let normalized = |d: i64, r: usize| {
        if r == 0 {
            0.0
        } else {
            (d as f64 / r as f64).powi(2)
        }
    };

    let mut offsets = Vec::new();
    for dz in radius_range(rz) {
        for dh in radius_range(rh) {
            for dw in radius_range(rw) {
                let dist = normalized(dz, rz) + normalized(dh, rh) + normalized(dw, rw);
                if dist <= 1.0 + 1e-9 {
                    offsets.push((dz, dh, dw));
                }
            }
        }
    }
    offsets
}

impl CtMask {
    /// 以逐轴体素半径 `radius` (z, h, w 序) 对掩膜做椭球膨胀, 返回二值结果.
    ///
    /// 任何非零体素均视为前景. 只有表面前景体素 (存在 6-邻域背景体素的前景)
    /// 参与结构元扫描, 其余前景体素的贡献被表面体素覆盖.
    /// `radius` 全零时等价于 [`Self::binarized`].
    pub fn dilate(&self, radius: [usize; 3]) -> CtMask {
        let mut out = self.data().mapv(|p| u8::from(is_foreground(p)));
        if radius.iter().all(|&r| r == 0) {
            return CtMask::with_header(self.header(), out);
        }

        let offsets = ellipsoid_offsets(radius);
        let (z_len, h_len, w_len) = self.shape();

        for (pos, &p) in self.data().indexed_iter() {
            if !is_foreground(p) {
                continue;
            }
            // 表面检测: 仅当存在背景 6-邻域时才扫描结构元.
            let on_surface = self
                .diamond_neighbours(pos)
                .into_iter()
                .any(|n| is_background(self[n]));
            if !on_surface {
                continue;
            }

            let (z, h, w) = (pos.0 as i64, pos.1 as i64, pos.2 as i64);
            for &(dz, dh, dw) in &offsets {
                let (nz, nh, nw) = (z + dz, h + dh, w + dw);
                if nz < 0 || nh < 0 || nw < 0 {
                    continue;
                }
                let (nz, nh, nw) = (nz as usize, nh as usize, nw as usize);
                if nz < z_len && nh < h_len && nw < w_len {
                    out[(nz, nh, nw)] = MASK_FOREGROUND;
                }
            }
        }
        CtMask::with_header(self.header(), out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    const MM: [f32; 3] = [1.0, 1.0, 1.0];

    fn single_voxel_mask(shape: (usize, usize, usize), pos: (usize, usize, usize)) -> CtMask {
        let mut data = Array3::<u8>::zeros(shape);
        data[pos] = 3; // 非 1 的前景值也应被正确处理
        CtMask::synthetic(data, MM)
    }

    #[test]
    fn test_dilate_zero_radius_is_binarize() {
        let mask = single_voxel_mask((5, 5, 5), (2, 2, 2));
        let out = mask.dilate([0, 0, 0]);
        assert_eq!(out.count_foreground(), 1);
        assert_eq!(out[(2, 2, 2)], 1);
    }

    #[test]
    fn test_dilate_unit_ball_is_diamond() {
        let mask = single_voxel_mask((5, 5, 5), (2, 2, 2));
        let out = mask.dilate([1, 1, 1]);
        // 半径 1 的椭球仅包含中心与 6 个单位轴偏移.
        assert_eq!(out.count_foreground(), 7);
        assert_eq!(out[(1, 2, 2)], 1);
        assert_eq!(out[(2, 3, 2)], 1);
        assert_eq!(out[(1, 1, 2)], 0);
    }

    #[test]
    fn test_dilate_radius_two_ball() {
        let mask = single_voxel_mask((7, 7, 7), (3, 3, 3));
        let out = mask.dilate([2, 2, 2]);
        // dz^2 + dh^2 + dw^2 <= 4 的整数偏移共 33 个.
        assert_eq!(out.count_foreground(), 33);
    }

    #[test]
    fn test_dilate_monotone_in_radius() {
        let mask = single_voxel_mask((9, 9, 9), (4, 4, 4));
        let mut prev = mask.dilate([0, 0, 0]).count_foreground();
        for r in 1..4 {
            let cur = mask.dilate([r, r, r]).count_foreground();
            assert!(cur > prev);
            prev = cur;
        }
    }

    #[test]
    fn test_dilate_anisotropic_stays_in_plane() {
        let mask = single_voxel_mask((5, 5, 5), (2, 2, 2));
        let out = mask.dilate([0, 2, 2]);
        // z 半径为 0: 膨胀不跨切片.
        for z in [0usize, 1, 3, 4] {
            for h in 0..5 {
                for w in 0..5 {
                    assert_eq!(out[(z, h, w)], 0);
                }
            }
        }
        assert_eq!(out[(2, 0, 2)], 1);
        assert_eq!(out[(2, 2, 4)], 1);
    }

    #[test]
    fn test_dilate_clips_at_grid_edge() {
        let mask = single_voxel_mask((3, 3, 3), (0, 0, 0));
        let out = mask.dilate([1, 1, 1]);
        // 网格外的偏移被丢弃.
        assert_eq!(out.count_foreground(), 4);
    }
}
