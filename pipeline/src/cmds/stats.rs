use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Args;
use ct_cortex::prelude::*;
use ct_cortex::study::volume_loader;

/// CSV 表头. `friedman` 子命令按列名读取该表.
const CSV_HEADER: &str =
    "Participant,Visit,Region,Side,VoxelCount,VolumeCm3,Mean,StdDev,Min,Max,Median,P25,P75,IQR";

#[derive(Args, Debug)]
pub struct Stats {
    /// 研究根目录. 缺省时取 `$CT_STUDY_DIR` 或 `{用户主目录}/study`.
    #[arg(long, short = 'd')]
    study_dir: Option<PathBuf>,

    /// 受试者编号列表.
    #[arg(long, short = 'p', num_args = 1.., required = true)]
    participants: Vec<String>,

    /// 随访时点列表. 缺省时取全部时点.
    #[arg(long)]
    visits: Vec<Visit>,

    /// 解剖区列表. 缺省时取全部解剖区.
    #[arg(long)]
    regions: Vec<Region>,

    /// 侧别列表. 缺省时取全部侧别.
    #[arg(long)]
    sides: Vec<Side>,

    /// 输出 CSV 文件路径.
    #[arg(long, short = 'o')]
    output: PathBuf,
}

impl Stats {
    pub fn run(&mut self) -> Result<(), StudyError> {
        let root = match self.study_dir.take() {
            Some(d) => d,
            None => study_dir_from_env_or_home().ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "cannot determine study directory")
            })?,
        };

        let visits = or_all(&self.visits, &Visit::ALL);
        let regions = or_all(&self.regions, &Region::ALL);
        let sides = or_all(&self.sides, &Side::ALL);

        let mut out = BufWriter::new(File::create(&self.output)?);
        writeln!(out, "{CSV_HEADER}")?;

        let mut rows = 0_usize;
        for participant in &self.participants {
            let dir = participant_dir(&root, participant);
            if !dir.is_dir() {
                println!("跳过 {participant}: 目录 {} 不存在", dir.display());
                continue;
            }
            for &region in &regions {
                for &side in &sides {
                    let keys = visits
                        .iter()
                        .map(|&v| ScanKey::new(participant.clone(), v, region, side));
                    for (key, result) in volume_loader(keys, &dir) {
                        let volume = match result {
                            Ok(v) => v,
                            Err(e) => {
                                println!("跳过 {}: {e}", key.common_file());
                                continue;
                            }
                        };
                        match volume.foreground_summary() {
                            Some(summary) => {
                                write_row(&mut out, &key, &summary, volume.voxel_cm3())?;
                                rows += 1;
                            }
                            None => println!("跳过 {}: 无前景体素", key.common_file()),
                        }
                    }
                }
            }
        }

        out.flush()?;
        println!("写入 {rows} 行到 {}", self.output.display());
        Ok(())
    }
}

fn or_all<T: Copy>(chosen: &[T], all: &[T]) -> Vec<T> {
    if chosen.is_empty() {
        all.to_vec()
    } else {
        chosen.to_vec()
    }
}

fn write_row<W: Write>(
    out: &mut W,
    key: &ScanKey,
    s: &RegionSummary,
    voxel_cm3: f64,
) -> io::Result<()> {
    writeln!(
        out,
        "{},{},{},{},{},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6}",
        key.participant,
        key.visit.as_str(),
        key.region.as_str(),
        key.side.as_str(),
        s.voxel_count,
        s.physical_volume_cm3(voxel_cm3),
        s.mean,
        s.std_dev,
        s.min,
        s.max,
        s.median,
        s.p25,
        s.p75,
        s.iqr()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_participant_dir_is_skipped() {
        // 受试者目录不存在时整体不应中止, 只写出表头.
        let root = std::env::temp_dir().join("stats-missing-participant");
        fs::create_dir_all(&root).unwrap();
        let output = root.join("summary.csv");

        let mut cmd = Stats {
            study_dir: Some(root.clone()),
            participants: vec!["NO_SUCH_ID".to_owned()],
            visits: Vec::new(),
            regions: Vec::new(),
            sides: Vec::new(),
            output: output.clone(),
        };
        cmd.run().unwrap();

        let written = fs::read_to_string(&output).unwrap();
        assert_eq!(written.trim_end(), CSV_HEADER);
        fs::remove_dir_all(&root).unwrap();
    }
}
