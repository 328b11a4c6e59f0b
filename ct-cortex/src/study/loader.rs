//! 随访研究数据加载器.
//!
//! 提供迭代器风格的数据集获取模式: 给定受试者目录与一组扫描键,
//! 按序打开对应的共同区扫描 (及掩膜).

use std::path::{Path, PathBuf};

use super::ScanKey;
use crate::{CtVolume, StudyError, VolumePair};

/// 从受试者目录和一组扫描键创建共同区扫描 ([`CtVolume`]) 加载器.
///
/// # 注意
///
/// 1. `path` 必须是目录, 否则程序 panic.
/// 2. 每个键 `key` 必须在 `path` 下有形如 `key.common_file()` 的文件,
///   否则加载器在迭代时会返回 `Result::Error`.
pub fn volume_loader<I: IntoIterator<Item = ScanKey>, P: AsRef<Path>>(
    keys: I,
    path: P,
) -> VolumeLoader {
    let path = path.as_ref().to_owned();
    assert!(path.is_dir());

    let mut keys_rev: Vec<ScanKey> = keys.into_iter().collect();
    keys_rev.reverse();

    VolumeLoader { path, keys_rev }
}

/// 共同区扫描加载器.
#[derive(Debug)]
pub struct VolumeLoader {
    path: PathBuf,
    keys_rev: Vec<ScanKey>,
}

impl Iterator for VolumeLoader {
    type Item = (ScanKey, nifti::Result<CtVolume>);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.keys_rev.pop()?;

        self.path.push(key.common_file());
        let data = CtVolume::open(self.path.as_path());
        self.path.pop();

        Some((key, data))
    }
}

impl ExactSizeIterator for VolumeLoader {
    #[inline]
    fn len(&self) -> usize {
        self.keys_rev.len()
    }
}

/// 从受试者目录和一组扫描键创建扫描 + 掩膜 ([`VolumePair`]) 加载器.
///
/// # 注意
///
/// 1. `path` 必须是目录, 否则程序 panic.
/// 2. 每个键 `key` 必须在 `path` 下有形如 `key.common_file()` 和
///   `key.common_mask_file()` 的文件, 否则加载器在迭代时会返回 `Result::Error`.
/// 3. 相同键对应的扫描与掩膜形状必须一致, 否则迭代时返回
///   [`StudyError::Crop`].
pub fn pair_loader<I: IntoIterator<Item = ScanKey>, P: AsRef<Path>>(
    keys: I,
    path: P,
) -> PairLoader {
    let path = path.as_ref().to_owned();
    assert!(path.is_dir());

    let mut keys_rev: Vec<ScanKey> = keys.into_iter().collect();
    keys_rev.reverse();

    PairLoader { path, keys_rev }
}

/// 共同区扫描 + 掩膜加载器.
#[derive(Debug)]
pub struct PairLoader {
    path: PathBuf,
    keys_rev: Vec<ScanKey>,
}

impl Iterator for PairLoader {
    type Item = (ScanKey, Result<VolumePair, StudyError>);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.keys_rev.pop()?;

        self.path.push(key.common_file());
        let volume_path = self.path.clone();
        self.path.pop();

        self.path.push(key.common_mask_file());
        let data = VolumePair::open(&volume_path, self.path.as_path());
        self.path.pop();

        Some((key, data))
    }
}

impl ExactSizeIterator for PairLoader {
    #[inline]
    fn len(&self) -> usize {
        self.keys_rev.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::study::{Region, Side, Visit};

    fn keys() -> Vec<ScanKey> {
        Visit::ALL
            .into_iter()
            .map(|v| ScanKey::new("SA01", v, Region::Femur, Side::Right))
            .collect()
    }

    #[test]
    fn test_volume_loader_len_and_order() {
        // 以临时目录检查迭代顺序; 文件不存在, 打开必然失败,
        // 但键序与长度不依赖文件内容.
        let dir = std::env::temp_dir();
        let mut loader = volume_loader(keys(), &dir);
        assert_eq!(loader.len(), 5);

        let (first, result) = loader.next().unwrap();
        assert_eq!(first.visit, Visit::V1);
        assert!(result.is_err());
        assert_eq!(loader.len(), 4);

        let visits: Vec<Visit> = loader.map(|(k, _)| k.visit).collect();
        assert_eq!(visits, vec![Visit::Vs, Visit::V2, Visit::V3, Visit::V4]);
    }

    #[test]
    #[should_panic]
    fn test_loader_rejects_non_directory() {
        volume_loader(keys(), "/definitely/not/a/dir");
    }
}
