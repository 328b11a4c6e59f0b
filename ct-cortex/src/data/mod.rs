use std::ops::{Index, IndexMut};
use std::path::Path;

use ndarray::{Array3, ArrayView, ArrayViewMut, Axis, Ix3};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::consts::mask::*;
use crate::{CropError, Idx2d, Idx3d};

pub mod bounds;
mod morph;
mod ops;
pub mod slice;
pub mod window;

pub use slice::AxialSlice;
pub use window::CtWindow;

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// 将 (W, H, z) 转换成 (z, H, W). 以后均按照该模式访问.
#[inline]
fn get_shape_from_header(h: &NiftiHeader) -> Idx3d {
    // [W, H, z]. 体素个数数组.
    let [_, w, h, z, ..] = h.dim;
    (z as usize, h as usize, w as usize)
}

/// 为测试与合成数据构造 header. `shape` 按 (z, H, W), `pix_dim` 按 \[z, h, w\],
/// 单位毫米.
fn synthetic_header(shape: Idx3d, pix_dim: [f32; 3]) -> BoxedHeader {
    let mut header = Box::<NiftiHeader>::default();
    let (z, h, w) = shape;
    header.dim = [3, w as u16, h as u16, z as u16, 1, 1, 1, 1];
    let [pz, ph, pw] = pix_dim;
    header.pixdim = [1.0, pw, ph, pz, 1.0, 1.0, 1.0, 1.0];
    header
}

/// 3D CT nii 文件 header 的共用属性和部分通用操作.
pub trait NiftiHeaderAttr {
    /// 获取 header 部分.
    fn header(&self) -> &NiftiHeader;

    /// 获取数据形状大小.
    #[inline]
    fn shape(&self) -> Idx3d {
        get_shape_from_header(self.header())
    }

    /// 获取数据水平切片形状大小.
    #[inline]
    fn slice_shape(&self) -> Idx2d {
        let (_, h, w) = self.shape();
        (h, w)
    }

    /// 获取水平切片个数.
    #[inline]
    fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 获取数据体素个数.
    #[inline]
    fn size(&self) -> usize {
        let (z, h, w) = self.shape();
        z * h * w
    }

    /// 检查索引是否合法.
    #[inline]
    fn check(&self, (z0, h0, w0): &Idx3d) -> bool {
        let (z, h, w) = self.shape();
        *z0 < z && *h0 < h && *w0 < w
    }

    /// 获取单个体素分辨率. 该分辨率以毫米为单位, 分别代表空间 (相邻切片方向),
    /// 高 (自然图像的垂直方向), 宽 (自然图像的水平方向).
    #[inline]
    fn pix_dim(&self) -> [f64; 3] {
        let [_, w, h, z, ..] = self.header().pixdim;
        [z as f64, h as f64, w as f64]
    }

    /// 获取 width 方向体素分辨率, 以毫米为单位.
    #[inline]
    fn width_mm(&self) -> f64 {
        self.header().pixdim[1] as f64
    }

    /// 获取 height 方向体素分辨率, 以毫米为单位.
    #[inline]
    fn height_mm(&self) -> f64 {
        self.header().pixdim[2] as f64
    }

    /// 获取空间方向 (相邻 2D 切片的方向) 体素分辨率, 以毫米为单位.
    #[inline]
    fn z_mm(&self) -> f64 {
        self.header().pixdim[3] as f64
    }

    /// 获取体素的实际体积值, 以立方毫米为单位.
    #[inline]
    fn voxel_mm3(&self) -> f64 {
        self.pix_dim().iter().product()
    }

    /// 获取体素的实际体积值, 以立方厘米为单位.
    #[inline]
    fn voxel_cm3(&self) -> f64 {
        self.voxel_mm3() / 1000.0
    }
}

/// nii 格式 3D CT 扫描, 包括 header 和 CT 数值 (HU 或标定后骨密度). 值以 `f32` 保存.
#[derive(Debug, Clone)]
pub struct CtVolume {
    header: BoxedHeader,
    data: Array3<f32>,
}

impl NiftiHeaderAttr for CtVolume {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl Index<Idx3d> for CtVolume {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for CtVolume {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl CtVolume {
    /// 打开 nii 文件格式的 3D CT 扫描. `path` 为 nii 文件的本地路径.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> nifti::Result<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = Box::new(obj.header().clone());

        // [W, H, z] -> [z, H, W].
        // hint: 原第一维向下增长, 原第二维向右增长.
        let data = obj
            .into_volume()
            .into_ndarray()?
            .permuted_axes([2, 1, 0].as_slice());

        // The nature of nifti data field layout.
        debug_assert!(data.is_standard_layout());

        // 该操作不会生成 `Err`, 可直接 unwrap.
        let data =
            Array3::<f32>::from_shape_vec(get_shape_from_header(&header), data.into_raw_vec())
                .unwrap();

        Ok(Self { header, data })
    }

    /// 将扫描写入 `path`. 后缀为 `.nii.gz` 时自动压缩.
    /// header 沿用打开时携带的几何信息, 体素维度按当前数据自动重建.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), nifti::NiftiError> {
        // [z, H, W] -> [W, H, z].
        let data = self.data.view().permuted_axes([2, 1, 0]);
        WriterOptions::new(path.as_ref())
            .reference_header(&self.header)
            .write_nifti(&data)
    }

    /// 根据裸数据和体素分辨率直接创建扫描实体.
    ///
    /// # 参数
    ///
    /// 1. `data` 按照本 crate 惯用的 (z, H, W) 格式存储.
    /// 2. `pix_dim` 按照 \[z, h, w\] 格式存储, 单位毫米.
    ///
    /// # 注意
    ///
    /// 该方法构造的 header 仅携带形状与分辨率信息, 你应仅将其用于实验目的.
    pub fn synthetic(data: Array3<f32>, pix_dim: [f32; 3]) -> Self {
        let header = synthetic_header(data.dim(), pix_dim);
        Self { header, data }
    }

    /// 用给定 header 的几何信息与新数据拼装扫描实体. 裁剪等操作的内部构造器.
    #[inline]
    pub(crate) fn with_header(header: &NiftiHeader, data: Array3<f32>) -> Self {
        Self {
            header: Box::new(header.clone()),
            data,
        }
    }

    /// 获取 3D 扫描 z 空间的第 `z_index` 层切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> AxialSlice<'_> {
        AxialSlice::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 获取能按升序迭代 3D 扫描水平切片的迭代器.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = AxialSlice> {
        self.data.axis_iter(Axis(0)).map(AxialSlice::new)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, f32, Ix3> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut<'_, f32, Ix3> {
        self.data.view_mut()
    }

    /// 收集所有非零体素的值. 结果按行优先存储.
    pub fn foreground_values(&self) -> Vec<f32> {
        self.data.iter().copied().filter(|&v| v != 0.0).collect()
    }
}

/// nii 格式 3D 掩膜/标签, 包括 header 和标签值. 标签值以 `u8` 保存,
/// 零为背景, 任何非零值为前景.
#[derive(Debug, Clone)]
pub struct CtMask {
    header: BoxedHeader,
    data: Array3<u8>,
}

impl NiftiHeaderAttr for CtMask {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl Index<Idx3d> for CtMask {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for CtMask {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl CtMask {
    /// 打开 nii 文件格式的 3D 掩膜. `path` 为 nii 文件的本地路径. 如果打开成功,
    /// 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> nifti::Result<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = Box::new(obj.header().clone());

        // [W, H, z] -> [z, H, W]
        let data = obj
            .into_volume()
            .into_ndarray::<u8>()?
            .permuted_axes([2, 1, 0].as_slice());

        debug_assert!(data.is_standard_layout());

        let data =
            Array3::<u8>::from_shape_vec(get_shape_from_header(&header), data.into_raw_vec())
                .unwrap();

        Ok(Self { header, data })
    }

    /// 将掩膜写入 `path`. 后缀为 `.nii.gz` 时自动压缩.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), nifti::NiftiError> {
        let data = self.data.view().permuted_axes([2, 1, 0]);
        WriterOptions::new(path.as_ref())
            .reference_header(&self.header)
            .write_nifti(&data)
    }

    /// 根据裸数据和体素分辨率直接创建掩膜实体.
    ///
    /// # 参数
    ///
    /// 1. `data` 按照本 crate 惯用的 (z, H, W) 格式存储.
    /// 2. `pix_dim` 按照 \[z, h, w\] 格式存储, 单位毫米.
    ///
    /// # 注意
    ///
    /// 该方法构造的 header 仅携带形状与分辨率信息, 你应仅将其用于实验目的.
    pub fn synthetic(data: Array3<u8>, pix_dim: [f32; 3]) -> Self {
        let header = synthetic_header(data.dim(), pix_dim);
        Self { header, data }
    }

    /// 用给定 header 的几何信息与新数据拼装掩膜实体.
    #[inline]
    pub(crate) fn with_header(header: &NiftiHeader, data: Array3<u8>) -> Self {
        Self {
            header: Box::new(header.clone()),
            data,
        }
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, u8, Ix3> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut<'_, u8, Ix3> {
        self.data.view_mut()
    }

    /// 获取掩膜中前景体素的个数.
    #[inline]
    pub fn count_foreground(&self) -> usize {
        self.data.iter().filter(|p| is_foreground(**p)).count()
    }

    /// 掩膜是否不含任何前景体素?
    #[inline]
    pub fn is_empty_mask(&self) -> bool {
        self.data.iter().all(|p| is_background(*p))
    }

    /// 收集满足谓词 `pred` 的所有体素对应的下标, 结果按行优先存储.
    pub fn filter_pos(&self, pred: fn(u8) -> bool) -> Vec<Idx3d> {
        self.data
            .indexed_iter()
            .filter_map(|(ref pos, pixel)| pred(*pixel).then_some(*pos))
            .collect()
    }

    /// 获取 `pos` 前后上下左右六个点的坐标.
    ///
    /// 在数据范围外的坐标会被过滤掉, 不会包含在返回值中.
    pub(crate) fn diamond_neighbours(&self, (z, h, w): Idx3d) -> Vec<Idx3d> {
        [
            (z.wrapping_sub(1), h, w),
            (z.saturating_add(1), h, w),
            (z, h.wrapping_sub(1), w),
            (z, h.saturating_add(1), w),
            (z, h, w.wrapping_sub(1)),
            (z, h, w.saturating_add(1)),
        ]
        .into_iter()
        .filter(|p| self.check(p))
        .collect()
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use ndarray::ArrayView2;
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 并发操作部分
#[cfg(feature = "rayon")]
impl CtVolume {
    /// 借助 `rayon`, 并行地对 3D 扫描每个水平切片实施 `op` 操作.
    pub fn par_for_each_slice<F>(&self, op: F)
    where
        F: Fn(ArrayView2<f32>) + Sync + Send,
    {
        self.data.axis_iter(Axis(0)).into_par_iter().for_each(|v| {
            op(v);
        });
    }

    /// 借助 `rayon`, 并行地对 3D 扫描每个水平切片实施 `op` 操作.
    /// 该操作会同时携带 z 方向索引信息.
    pub fn par_for_each_indexed_slice<F>(&self, op: F)
    where
        F: Fn(usize, ArrayView2<f32>) + Sync + Send,
    {
        self.data
            .axis_iter(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(i, v)| {
                op(i, v);
            });
    }
}

/// nii 格式的 3D CT 扫描与对应的掩膜.
///
/// 该结构完全透明, 仅包含两个公开的 `volume` 和 `mask` 子结构,
/// 用户可以直接使用它们来实现相关上层功能.
#[derive(Debug, Clone)]
pub struct VolumePair {
    /// 3D CT 扫描.
    pub volume: CtVolume,

    /// 3D 掩膜.
    pub mask: CtMask,
}

impl VolumePair {
    /// 分别打开 nii 文件格式的 3D CT 扫描和对应掩膜. 如果任一文件打开失败,
    /// 则返回 `Err`. 若两个文件的数据形状不一致, 则返回
    /// [`CropError::ShapeMismatch`] 对应的 [`StudyError`](crate::StudyError).
    pub fn open(
        volume_path: impl AsRef<Path>,
        mask_path: impl AsRef<Path>,
    ) -> Result<Self, crate::StudyError> {
        let volume = CtVolume::open(volume_path.as_ref())?;
        let mask = CtMask::open(mask_path.as_ref())?;
        let pair = Self { volume, mask };
        pair.check_shapes()?;
        Ok(pair)
    }

    /// 校验扫描与掩膜的形状一致性.
    pub fn check_shapes(&self) -> Result<(), CropError> {
        let (expected, actual) = (self.volume.shape(), self.mask.shape());
        if expected == actual {
            Ok(())
        } else {
            Err(CropError::ShapeMismatch(expected, actual))
        }
    }

    /// 获取水平切片个数.
    #[inline]
    pub fn len_z(&self) -> usize {
        self.volume.len_z()
    }
}
