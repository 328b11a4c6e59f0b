use std::path::PathBuf;

use clap::Args;
use ct_cortex::prelude::*;

use super::positive_f64;

#[derive(Args, Debug)]
pub struct VoxelDiff {
    /// 随访扫描 nii 文件路径.
    #[arg(long)]
    follow_up: PathBuf,

    /// 基线扫描 nii 文件路径.
    #[arg(long)]
    baseline: PathBuf,

    /// 去金属伪影钳制阈值 (HU). 高于该值的体素被钳制到该值.
    #[arg(long, default_value_t = SCREW_HU_CUTOFF)]
    cutoff: f32,

    /// 可选高斯平滑标准差, 单位毫米. 缺省时不平滑.
    #[arg(long, value_parser = positive_f64)]
    sigma_mm: Option<f64>,

    /// 差值扫描的输出路径.
    #[arg(long, short = 'o')]
    output: PathBuf,
}

impl VoxelDiff {
    pub fn run(&mut self) -> Result<(), StudyError> {
        let mut follow_up = CtVolume::open(&self.follow_up)?;
        let mut baseline = CtVolume::open(&self.baseline)?;

        // 手术螺钉在两次扫描中的位置与伪影不同, 先统一钳制再相减.
        follow_up.clamp_above(self.cutoff);
        baseline.clamp_above(self.cutoff);

        let mut diff = follow_up.subtract(&baseline)?;
        if let Some(sigma_mm) = self.sigma_mm {
            println!("高斯平滑: sigma = {sigma_mm} mm");
            diff = diff.smooth_gaussian(sigma_mm);
        }

        println!("差值形状: {:?}", diff.shape());
        diff.save(&self.output)?;
        Ok(())
    }
}
