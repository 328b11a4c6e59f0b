use std::path::PathBuf;

use clap::Args;
use ct_cortex::prelude::*;

#[derive(Args, Debug)]
pub struct Crop {
    /// 扫描 nii 文件路径.
    #[arg(long, short = 'v')]
    volume: PathBuf,

    /// 掩膜 nii 文件路径.
    #[arg(long, short = 'm')]
    mask: PathBuf,

    /// 包围盒逐轴外扩的体素数.
    #[arg(long, short = 'b', default_value_t = DEFAULT_CROP_BUFFER)]
    buffer: usize,

    /// 裁剪后扫描的输出路径.
    #[arg(long, short = 'o')]
    output: PathBuf,

    /// 裁剪后掩膜的输出路径. 缺省时不输出掩膜.
    #[arg(long)]
    cropped_mask: Option<PathBuf>,
}

impl Crop {
    pub fn run(&mut self) -> Result<(), StudyError> {
        let pair = VolumePair::open(&self.volume, &self.mask)?;
        println!("输入形状: {:?}", pair.volume.shape());

        let (volume, mask) = crop_pair(&pair.volume, &pair.mask, self.buffer)?;
        println!("裁剪后形状: {:?} (buffer = {})", volume.shape(), self.buffer);

        volume.save(&self.output)?;
        if let Some(path) = &self.cropped_mask {
            mask.save(path)?;
        }
        Ok(())
    }
}
