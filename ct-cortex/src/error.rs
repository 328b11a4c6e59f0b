//! 运行时错误.

use crate::Idx3d;
use std::fmt;

/// 包围盒裁剪与其他成对体素运算的错误.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CropError {
    /// 掩膜不含任何前景体素, 包围盒无定义.
    EmptyMask,

    /// 扫描与掩膜的网格形状不一致. 携带 (期望形状, 实际形状).
    ShapeMismatch(Idx3d, Idx3d),
}

impl fmt::Display for CropError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CropError::EmptyMask => write!(f, "mask has no foreground voxel"),
            CropError::ShapeMismatch(expected, actual) => {
                write!(f, "shape mismatch: expected {expected:?}, got {actual:?}")
            }
        }
    }
}

impl std::error::Error for CropError {}

/// Friedman / Nemenyi 检验的输入错误.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FriedmanError {
    /// 处理 (随访) 个数不足. 至少需要 3 个.
    TooFewTreatments(usize),

    /// 区组 (参与者) 个数不足. 至少需要 2 个.
    TooFewBlocks(usize),
}

impl fmt::Display for FriedmanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FriedmanError::TooFewTreatments(k) => {
                write!(f, "friedman test needs at least 3 treatments, got {k}")
            }
            FriedmanError::TooFewBlocks(n) => {
                write!(f, "friedman test needs at least 2 blocks, got {n}")
            }
        }
    }
}

impl std::error::Error for FriedmanError {}

/// 随访研究流程的汇总错误.
#[derive(Debug)]
pub enum StudyError {
    /// 底层 nifti 读写错误.
    Nifti(nifti::NiftiError),

    /// 其他底层 I/O 错误.
    Io(std::io::Error),

    /// 裁剪与成对体素运算错误.
    Crop(CropError),

    /// 统计检验输入错误.
    Stats(FriedmanError),
}

impl fmt::Display for StudyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudyError::Nifti(e) => write!(f, "nifti error: {e}"),
            StudyError::Io(e) => write!(f, "io error: {e}"),
            StudyError::Crop(e) => write!(f, "{e}"),
            StudyError::Stats(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for StudyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StudyError::Nifti(e) => Some(e),
            StudyError::Io(e) => Some(e),
            StudyError::Crop(e) => Some(e),
            StudyError::Stats(e) => Some(e),
        }
    }
}

impl From<nifti::NiftiError> for StudyError {
    #[inline]
    fn from(e: nifti::NiftiError) -> Self {
        StudyError::Nifti(e)
    }
}

impl From<std::io::Error> for StudyError {
    #[inline]
    fn from(e: std::io::Error) -> Self {
        StudyError::Io(e)
    }
}

impl From<CropError> for StudyError {
    #[inline]
    fn from(e: CropError) -> Self {
        StudyError::Crop(e)
    }
}

impl From<FriedmanError> for StudyError {
    #[inline]
    fn from(e: FriedmanError) -> Self {
        StudyError::Stats(e)
    }
}
