use std::path::PathBuf;

use clap::Args;
use ct_cortex::prelude::*;

#[derive(Args, Debug)]
pub struct CommonRegion {
    /// 扫描 nii 文件路径.
    #[arg(long, short = 'v')]
    volume: PathBuf,

    /// 共同区掩膜 nii 文件路径.
    #[arg(long, short = 'm')]
    mask: PathBuf,

    /// 包围盒逐轴外扩的体素数.
    #[arg(long, short = 'b', default_value_t = DEFAULT_CROP_BUFFER)]
    buffer: usize,

    /// 共同区扫描的输出路径.
    #[arg(long, short = 'o')]
    output: PathBuf,

    /// 裁剪后共同区掩膜的输出路径. 缺省时不输出掩膜.
    #[arg(long)]
    cropped_mask: Option<PathBuf>,
}

impl CommonRegion {
    pub fn run(&mut self) -> Result<(), StudyError> {
        let pair = VolumePair::open(&self.volume, &self.mask)?;

        // 先置零掩膜外体素, 再按同一掩膜裁剪, 保证各随访输出网格一致.
        let masked = pair.volume.masked(&pair.mask)?;
        let (volume, mask) = crop_pair(&masked, &pair.mask, self.buffer)?;
        println!(
            "共同区形状: {:?}, 前景体素数: {}",
            volume.shape(),
            mask.count_foreground()
        );

        volume.save(&self.output)?;
        if let Some(path) = &self.cropped_mask {
            mask.save(path)?;
        }
        Ok(())
    }
}
