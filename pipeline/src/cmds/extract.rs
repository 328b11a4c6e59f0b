use std::path::PathBuf;

use clap::Args;
use ct_cortex::consts::DEFAULT_DILATE_RADIUS;
use ct_cortex::prelude::*;

#[derive(Args, Debug)]
pub struct Extract {
    /// 扫描 nii 文件路径.
    #[arg(long, short = 'v')]
    volume: PathBuf,

    /// 多标签分割 nii 文件路径.
    #[arg(long, short = 'l')]
    labels: PathBuf,

    /// 要抠取的标签值.
    #[arg(long)]
    label: u8,

    /// z 方向膨胀半径 (体素).
    #[arg(long, default_value_t = DEFAULT_DILATE_RADIUS[0])]
    radius_z: usize,

    /// height 方向膨胀半径 (体素).
    #[arg(long, default_value_t = DEFAULT_DILATE_RADIUS[1])]
    radius_h: usize,

    /// width 方向膨胀半径 (体素).
    #[arg(long, default_value_t = DEFAULT_DILATE_RADIUS[2])]
    radius_w: usize,

    /// 包围盒外扩体素数. 缺省时不裁剪, 仅抠取.
    #[arg(long, short = 'b')]
    buffer: Option<usize>,

    /// 抠取结果的输出路径.
    #[arg(long, short = 'o')]
    output: PathBuf,

    /// 膨胀后掩膜的输出路径. 缺省时不输出掩膜.
    #[arg(long)]
    dilated_mask: Option<PathBuf>,
}

impl Extract {
    pub fn run(&mut self) -> Result<(), StudyError> {
        let pair = VolumePair::open(&self.volume, &self.labels)?;

        let selected = pair.mask.select_label(self.label);
        println!(
            "标签 {} 体素数: {}",
            self.label,
            selected.count_foreground()
        );

        let dilated = selected.dilate([self.radius_z, self.radius_h, self.radius_w]);
        println!("膨胀后体素数: {}", dilated.count_foreground());

        let extracted = pair.volume.masked(&dilated)?;
        let (extracted, dilated) = match self.buffer {
            Some(buffer) => {
                let (v, m) = crop_pair(&extracted, &dilated, buffer)?;
                println!("裁剪后形状: {:?} (buffer = {buffer})", v.shape());
                (v, m)
            }
            None => (extracted, dilated),
        };

        extracted.save(&self.output)?;
        if let Some(path) = &self.dilated_mask {
            dilated.save(path)?;
        }
        Ok(())
    }
}
