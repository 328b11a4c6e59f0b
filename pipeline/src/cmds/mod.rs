//! 子命令实现. 每个子命令对应研究流程的一个独立步骤.

mod checkerboard;
mod common_region;
mod crop;
mod extract;
mod friedman;
mod mask_product;
mod stats;
mod voxel_diff;

use clap::{Parser, Subcommand};
use ct_cortex::StudyError;

#[derive(Parser, Debug)]
#[command(name = "pipeline")]
#[command(about = "纵向 (多次随访) 骨密度 CT 研究的处理工具集.")]
#[command(version, long_about = None)]
pub struct Cli {
    /// 子命令.
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn run_program(&mut self) -> Result<(), StudyError> {
        match self.command {
            Commands::Crop(ref mut v) => v.run(),
            Commands::CommonRegion(ref mut v) => v.run(),
            Commands::MaskProduct(ref mut v) => v.run(),
            Commands::Extract(ref mut v) => v.run(),
            Commands::VoxelDiff(ref mut v) => v.run(),
            Commands::Checkerboard(ref mut v) => v.run(),
            Commands::Stats(ref mut v) => v.run(),
            Commands::Friedman(ref mut v) => v.run(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 按掩膜前景包围盒外扩 buffer, 同步裁剪扫描与掩膜.
    Crop(crop::Crop),
    /// 掩膜外体素置零后裁剪, 生成共同区扫描.
    CommonRegion(common_region::CommonRegion),
    /// 计算两个掩膜的逐体素乘积掩膜.
    MaskProduct(mask_product::MaskProduct),
    /// 从多标签分割中选取单个标签, 膨胀后抠取感兴趣区.
    Extract(extract::Extract),
    /// 计算随访差值 (含去螺钉钳制与可选高斯平滑).
    VoxelDiff(voxel_diff::VoxelDiff),
    /// 两个配准扫描的棋盘格融合, 可导出灰度切片.
    Checkerboard(checkerboard::Checkerboard),
    /// 批量计算共同区扫描的前景描述统计, 输出 CSV 表格.
    Stats(stats::Stats),
    /// 对统计表做 Friedman 检验与 Nemenyi 事后检验.
    Friedman(friedman::Friedman),
}

/// 正浮点参数校验.
fn positive_f64(s: &str) -> Result<f64, String> {
    let v: f64 = s
        .parse()
        .map_err(|_| format!("`{s}` is not a legal floating point value"))?;
    if !v.is_finite() || v <= 0.0 {
        return Err(format!("value must be positive and finite, but got `{s}`"));
    }
    Ok(v)
}

/// 正整数参数校验.
fn positive_usize(s: &str) -> Result<usize, String> {
    let v: usize = s
        .parse()
        .map_err(|_| format!("`{s}` is not a legal positive integer"))?;
    if v == 0 {
        return Err(format!("value must be positive, but got `{s}`"));
    }
    Ok(v)
}
