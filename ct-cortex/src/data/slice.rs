//! 水平切片视图与持久化存储.

use std::ops::Index;
use std::path::Path;

use image::ImageResult;
use ndarray::ArrayView2;

use crate::{CtWindow, Idx2d};

/// 3D 扫描的一层水平 (axial) 切片只读视图.
#[derive(Copy, Clone, Debug)]
pub struct AxialSlice<'a> {
    data: ArrayView2<'a, f32>,
}

impl<'a> AxialSlice<'a> {
    #[inline]
    pub(crate) fn new(data: ArrayView2<'a, f32>) -> Self {
        Self { data }
    }

    /// 获取切片形状 (height, width).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 获取 `pos` 处的体素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&f32> {
        self.data.get(pos)
    }

    /// 按照 CT 窗口 `window` 将切片规范化为 8-bit 灰度图并保存到 `path`.
    ///
    /// 无意义体素值 (inf, NaN) 被映射为黑色.
    pub fn save_vis<P: AsRef<Path>>(&self, window: CtWindow, path: P) -> ImageResult<()> {
        let (height, width) = self.shape();
        let mut buf = image::GrayImage::new(width as u32, height as u32);
        for ((h, w), &hu) in self.data.indexed_iter() {
            let gray = window.eval(hu).unwrap_or(u8::MIN);
            buf.put_pixel(w as u32, h as u32, image::Luma([gray]));
        }
        buf.save(path)
    }
}

impl Index<Idx2d> for AxialSlice<'_> {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}
