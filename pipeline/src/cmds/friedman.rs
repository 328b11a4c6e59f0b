use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::PathBuf;

use clap::Args;
use ct_cortex::prelude::*;
use ndarray::Array2;

#[derive(Args, Debug)]
pub struct Friedman {
    /// `stats` 子命令输出的 CSV 表格路径.
    #[arg(long, short = 't')]
    table: PathBuf,

    /// 参与检验的统计量列名.
    #[arg(long, default_value = "Mean")]
    metric: String,

    /// 解剖区.
    #[arg(long)]
    region: Region,

    /// 侧别.
    #[arg(long)]
    side: Side,

    /// 随访时点列表 (处理). 缺省时取全部时点.
    #[arg(long)]
    visits: Vec<Visit>,
}

impl Friedman {
    pub fn run(&mut self) -> Result<(), StudyError> {
        let visits = if self.visits.is_empty() {
            Visit::ALL.to_vec()
        } else {
            self.visits.clone()
        };

        let blocks = self.load_blocks(&visits)?;
        let n = blocks.len();
        let k = visits.len();
        println!(
            "{} {}: {} 名受试者 x {} 次随访 ({})",
            self.region.as_str(),
            self.side.as_str(),
            n,
            k,
            self.metric
        );

        let mut table = Array2::<f64>::zeros((n, k));
        for (i, (participant, row)) in blocks.iter().enumerate() {
            print!("{participant}:");
            for (j, value) in row.iter().enumerate() {
                table[(i, j)] = *value;
                print!(" {value:.4}");
            }
            println!();
        }

        let result = friedman_test(table.view())?;
        println!(
            "Friedman 卡方统计量: {:.6}, p = {:.6}",
            result.statistic, result.p_value
        );

        let p = nemenyi_posthoc(table.view())?;
        println!("Nemenyi 成对 p 值:");
        print!("      ");
        for v in &visits {
            print!("{:>8}", v.as_str());
        }
        println!();
        for (i, v) in visits.iter().enumerate() {
            print!("{:>6}", v.as_str());
            for j in 0..k {
                print!("{:8.4}", p[(i, j)]);
            }
            println!();
        }
        Ok(())
    }

    /// 读取 CSV, 过滤解剖区与侧别, 按受试者聚合各时点的统计量.
    /// 仅保留拥有全部时点数据的受试者.
    fn load_blocks(&self, visits: &[Visit]) -> Result<BTreeMap<String, Vec<f64>>, StudyError> {
        let text = fs::read_to_string(&self.table)?;
        let mut lines = text.lines();

        let header = lines
            .next()
            .ok_or_else(|| invalid_data("empty stats table"))?;
        let columns: Vec<&str> = header.split(',').collect();
        let col = |name: &str| {
            columns
                .iter()
                .position(|&c| c == name)
                .ok_or_else(|| invalid_data(&format!("missing column `{name}`")))
        };
        let (participant_col, visit_col) = (col("Participant")?, col("Visit")?);
        let (region_col, side_col) = (col("Region")?, col("Side")?);
        let metric_col = col(&self.metric)?;

        let mut by_participant: BTreeMap<String, HashMap<Visit, f64>> = BTreeMap::new();
        for line in lines.filter(|l| !l.is_empty()) {
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() != columns.len() {
                return Err(invalid_data(&format!("malformed row: `{line}`")).into());
            }
            if fields[region_col] != self.region.as_str()
                || fields[side_col] != self.side.as_str()
            {
                continue;
            }

            let visit: Visit = fields[visit_col]
                .parse()
                .map_err(|e: String| invalid_data(&e))?;
            let value: f64 = fields[metric_col]
                .parse()
                .map_err(|_| invalid_data(&format!("bad metric value in row: `{line}`")))?;
            by_participant
                .entry(fields[participant_col].to_owned())
                .or_default()
                .insert(visit, value);
        }

        let mut blocks = BTreeMap::new();
        for (participant, measured) in by_participant {
            let row: Option<Vec<f64>> = visits.iter().map(|v| measured.get(v).copied()).collect();
            match row {
                Some(row) => {
                    blocks.insert(participant, row);
                }
                None => println!("跳过 {participant}: 随访数据不完整"),
            }
        }
        Ok(blocks)
    }
}

fn invalid_data(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_owned())
}
