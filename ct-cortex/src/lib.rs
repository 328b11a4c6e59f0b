#![warn(missing_docs)]

//! 核心库. 提供纵向 (多次随访) 骨密度 CT 研究的 nifti 文件结构化信息和基础处理算法.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 该 crate 按照随访研究的目录组织方式 (参与者/部位/随访) 处理数据,
//!    但所有体素级操作均不依赖该组织方式, 可独立使用.
//! 2. 体素级操作 (裁剪, 差值, 掩膜, 形态学) 均为纯索引运算,
//!    不进行任何重采样或插值.
//!
//! # 功能总览
//!
//! ### 掩膜包围盒裁剪 ✅
//!
//! 计算掩膜前景的最紧包围盒, 外扩 buffer 后对扫描与掩膜做同步裁剪.
//! 空掩膜与形状不匹配均以显式错误返回.
//!
//! 实现位于 `ct-cortex/src/data/bounds.rs`.
//!
//! ### 体素级算子 ✅
//!
//! 阈值钳制 (去除手术螺钉等高 HU 伪影), 随访差值, 掩膜应用与乘积,
//! 棋盘格融合, 高斯平滑.
//!
//! 实现位于 `ct-cortex/src/data/ops.rs`.
//!
//! ### 三维形态学膨胀 ✅
//!
//! 以逐轴体素半径对二值掩膜做椭球膨胀, 用于感兴趣区提取.
//!
//! 实现位于 `ct-cortex/src/data/morph.rs`.
//!
//! ### CT window 视图 ✅
//!
//! 提供一个独立的 CT 窗口对象, 以便将 CT HU 值转换为 8-bit 灰度值.
//!
//! 实现位于 `ct-cortex/src/data/window.rs`.
//!
//! ### 区域描述统计 ✅
//!
//! 前景体素的均值/标准差/中位数/四分位数等, 以及体素实际体积换算.
//!
//! 实现位于 `ct-cortex/src/stats`.
//!
//! ### Friedman / Nemenyi 非参数检验 ✅
//!
//! 参与者 × 随访表格的重复测量检验, 纯 Rust 实现
//! (卡方分布与学生化极差分布的数值计算).
//!
//! 实现位于 `ct-cortex/src/stats/friedman.rs`.
//!
//! ### 随访研究数据集 ✅
//!
//! 参与者/骨骼部位/随访编号的文件命名约定与迭代器风格加载器.
//!
//! 实现位于 `ct-cortex/src/study`.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 3D CT nii 文件基础数据结构.
mod data;

pub use data::bounds::{crop_pair, MaskBounds};
pub use data::{AxialSlice, CtMask, CtVolume, CtWindow, NiftiHeaderAttr, VolumePair};

mod error;

pub use error::{CropError, FriedmanError, StudyError};

pub mod consts;

pub mod stats;

pub mod study;

pub mod prelude;
