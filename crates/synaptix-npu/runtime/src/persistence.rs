// Copyright 2025 Synaptix Developers
// SPDX-License-Identifier: Apache-2.0

//! # Parameter Persistence
//!
//! One archive per component, stored as `<dir>/<component>.params`.
//!
//! ## Format
//! ```text
//! [Header]
//! - Magic: "SYNPX" (5 bytes)
//! - Version: u32 (4 bytes, little endian)
//! - Checksum: u64 (8 bytes, FNV-1a of data)
//! [Data]
//! - Bincode-serialized BTreeMap<String, Tensor>
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use synaptix_npu_neural::Tensor;
use tracing::debug;

use crate::error::{Result, RuntimeError};

/// Magic number for parameter files: "SYNPX"
const MAGIC: &[u8; 5] = b"SYNPX";

/// Current format version
const FORMAT_VERSION: u32 = 1;

/// Named tensors persisted for one component
pub type ParamArchive = BTreeMap<String, Tensor>;

/// Archive path of `component` inside `dir`
pub fn params_path(dir: &Path, component: &str) -> PathBuf {
    dir.join(format!("{component}.params"))
}

pub fn save_archive<P: AsRef<Path>>(archive: &ParamArchive, path: P) -> Result<()> {
    let path = path.as_ref();
    let data =
        bincode::serialize(archive).map_err(|e| RuntimeError::Serialization(e.to_string()))?;

    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(MAGIC)?;
    file.write_all(&FORMAT_VERSION.to_le_bytes())?;
    file.write_all(&calculate_checksum(&data).to_le_bytes())?;
    file.write_all(&data)?;
    file.flush()?;

    debug!(path = %path.display(), keys = archive.len(), "saved parameter archive");
    Ok(())
}

pub fn load_archive<P: AsRef<Path>>(path: P) -> Result<ParamArchive> {
    let path = path.as_ref();
    let mut file = BufReader::new(File::open(path)?);

    let mut magic = [0u8; 5];
    file.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(RuntimeError::InvalidMagic(magic));
    }

    let mut version_bytes = [0u8; 4];
    file.read_exact(&mut version_bytes)?;
    let version = u32::from_le_bytes(version_bytes);
    if version != FORMAT_VERSION {
        return Err(RuntimeError::VersionMismatch {
            file_version: version,
            expected_version: FORMAT_VERSION,
        });
    }

    let mut checksum_bytes = [0u8; 8];
    file.read_exact(&mut checksum_bytes)?;
    let stored = u64::from_le_bytes(checksum_bytes);

    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    if calculate_checksum(&data) != stored {
        return Err(RuntimeError::ChecksumMismatch);
    }

    let archive: ParamArchive =
        bincode::deserialize(&data).map_err(|e| RuntimeError::Serialization(e.to_string()))?;
    debug!(path = %path.display(), keys = archive.len(), "loaded parameter archive");
    Ok(archive)
}

/// FNV-1a 64-bit
fn calculate_checksum(data: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &byte in data {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr2, IxDyn};
    use tempfile::tempdir;

    fn archive() -> ParamArchive {
        let mut a = ParamArchive::new();
        a.insert(
            "weights".to_string(),
            arr2(&[[0.1f32, -0.2, 0.3], [1e-7, -0.0, f32::MAX]]).into_dyn(),
        );
        a.insert("biases".to_string(), Tensor::zeros(IxDyn(&[1, 3])));
        a
    }

    #[test]
    fn test_archive_round_trip_is_bit_exact() {
        let dir = tempdir().unwrap();
        let path = params_path(dir.path(), "W");
        save_archive(&archive(), &path).unwrap();
        let loaded = load_archive(&path).unwrap();
        let original = archive();
        for (key, value) in &original {
            let bits: Vec<u32> = value.iter().map(|x| x.to_bits()).collect();
            let restored: Vec<u32> = loaded[key].iter().map(|x| x.to_bits()).collect();
            assert_eq!(bits, restored, "{key}");
        }
    }

    #[test]
    fn test_corrupted_payload_detected() {
        let dir = tempdir().unwrap();
        let path = params_path(dir.path(), "W");
        save_archive(&archive(), &path).unwrap();
        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        std::fs::write(&path, bytes).unwrap();
        assert!(matches!(
            load_archive(&path),
            Err(RuntimeError::ChecksumMismatch)
        ));
    }

    #[test]
    fn test_bad_magic_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("junk.params");
        std::fs::write(&path, b"NOTAPARAMFILE....").unwrap();
        assert!(matches!(
            load_archive(&path),
            Err(RuntimeError::InvalidMagic(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_archive(params_path(dir.path(), "nope")),
            Err(RuntimeError::Io(_))
        ));
    }
}
