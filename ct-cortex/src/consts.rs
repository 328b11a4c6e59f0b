//! 通用常量.

/// 掩膜体素值.
pub mod mask {
    /// 掩膜中, 背景 (感兴趣区外) 的体素值.
    pub const MASK_BACKGROUND: u8 = 0;

    /// 二值掩膜中, 前景的惯用体素值.
    pub const MASK_FOREGROUND: u8 = 1;

    /// 体素是否属于前景? 任何非零值均视为前景.
    #[inline]
    pub const fn is_foreground(p: u8) -> bool {
        p != MASK_BACKGROUND
    }

    /// 体素是否属于背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        p == MASK_BACKGROUND
    }
}

/// 钙标定后扫描中手术螺钉等金属伪影的 HU 上限.
/// 高于该值的体素在差值与统计前会被钳制到该值.
pub const SCREW_HU_CUTOFF: f32 = 1500.0;

/// 包围盒裁剪的默认外扩 buffer (体素).
pub const DEFAULT_CROP_BUFFER: usize = 30;

/// 棋盘格融合的默认逐轴方格数.
pub const DEFAULT_CHECKER_SQUARES: [usize; 3] = [20, 20, 20];

/// 形态学膨胀的默认逐轴体素半径.
pub const DEFAULT_DILATE_RADIUS: [usize; 3] = [1, 1, 1];
