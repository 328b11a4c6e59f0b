use std::io;
use std::path::PathBuf;

use clap::Args;
use ct_cortex::consts::DEFAULT_CHECKER_SQUARES;
use ct_cortex::prelude::*;

use super::positive_usize;

#[derive(Args, Debug)]
pub struct Checkerboard {
    /// 第一个扫描 (如基线) 的路径.
    #[arg(long)]
    first: PathBuf,

    /// 第二个扫描 (如配准后的随访) 的路径.
    #[arg(long)]
    second: PathBuf,

    /// z 方向方格数.
    #[arg(long, value_parser = positive_usize, default_value_t = DEFAULT_CHECKER_SQUARES[0])]
    squares_z: usize,

    /// height 方向方格数.
    #[arg(long, value_parser = positive_usize, default_value_t = DEFAULT_CHECKER_SQUARES[1])]
    squares_h: usize,

    /// width 方向方格数.
    #[arg(long, value_parser = positive_usize, default_value_t = DEFAULT_CHECKER_SQUARES[2])]
    squares_w: usize,

    /// 融合扫描的输出路径.
    #[arg(long, short = 'o')]
    output: PathBuf,

    /// 导出一层水平切片灰度图 (骨窗) 的路径. 缺省时不导出.
    #[arg(long)]
    png: Option<PathBuf>,

    /// 导出的切片 z 索引. 缺省时取中间切片.
    #[arg(long)]
    z_index: Option<usize>,
}

impl Checkerboard {
    pub fn run(&mut self) -> Result<(), StudyError> {
        let first = CtVolume::open(&self.first)?;
        let second = CtVolume::open(&self.second)?;

        let fused = first.checkerboard(&second, [self.squares_z, self.squares_h, self.squares_w])?;
        fused.save(&self.output)?;

        if let Some(png) = &self.png {
            let z = pick_z(self.z_index, fused.len_z())?;
            println!("导出切片 {z} 到 {}", png.display());
            fused
                .slice_at(z)
                .save_vis(CtWindow::from_bone_visual(), png)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        }
        Ok(())
    }
}

/// 选取导出切片的 z 索引: 缺省取中间切片, 越界时报错而不是 panic.
fn pick_z(z_index: Option<usize>, len_z: usize) -> Result<usize, io::Error> {
    match z_index {
        None => Ok(len_z / 2),
        Some(z) if z < len_z => Ok(z),
        Some(z) => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("z 索引 {z} 越界 (切片个数为 {len_z})"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::pick_z;

    #[test]
    fn test_pick_z_defaults_to_middle() {
        assert_eq!(pick_z(None, 9).unwrap(), 4);
        assert_eq!(pick_z(None, 10).unwrap(), 5);
    }

    #[test]
    fn test_pick_z_rejects_out_of_range() {
        assert_eq!(pick_z(Some(7), 8).unwrap(), 7);
        assert!(pick_z(Some(8), 8).is_err());
        assert!(pick_z(Some(100), 8).is_err());
    }
}
