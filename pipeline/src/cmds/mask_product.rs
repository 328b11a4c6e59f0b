use std::path::PathBuf;

use clap::Args;
use ct_cortex::prelude::*;

#[derive(Args, Debug)]
pub struct MaskProduct {
    /// 第一个掩膜 (如共同区掩膜) 的路径.
    #[arg(long)]
    first: PathBuf,

    /// 第二个掩膜 (如基线分割掩膜) 的路径.
    #[arg(long)]
    second: PathBuf,

    /// 乘积掩膜的输出路径.
    #[arg(long, short = 'o')]
    output: PathBuf,
}

impl MaskProduct {
    pub fn run(&mut self) -> Result<(), StudyError> {
        let first = CtMask::open(&self.first)?;
        let second = CtMask::open(&self.second)?;

        let product = first.intersect(&second)?;
        println!(
            "前景体素数: {} x {} -> {}",
            first.count_foreground(),
            second.count_foreground(),
            product.count_foreground()
        );

        product.save(&self.output)?;
        Ok(())
    }
}
