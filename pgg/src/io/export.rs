//! Tabular export of round records.
//!
//! The header is `round,player_id,contribution,total_pool,reward`, optionally
//! followed by `governance` and `player_type`. Consumers depend on these names
//! and this order.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::core::types::RoundRecord;
use crate::error::{Result, SimError};

pub const BASE_COLUMNS: [&str; 5] = ["round", "player_id", "contribution", "total_pool", "reward"];

/// Optional label columns appended after [`BASE_COLUMNS`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Columns {
    pub governance: bool,
    pub player_type: bool,
}

impl Columns {
    pub const BASE: Columns = Columns {
        governance: false,
        player_type: false,
    };

    pub const LABELLED: Columns = Columns {
        governance: true,
        player_type: true,
    };

    pub fn header(&self) -> Vec<&'static str> {
        let mut header = BASE_COLUMNS.to_vec();
        if self.governance {
            header.push("governance");
        }
        if self.player_type {
            header.push("player_type");
        }
        header
    }
}

/// Render records as comma-separated text with a header row.
pub fn render_csv(records: &[RoundRecord], columns: Columns) -> String {
    let mut out = columns.header().join(",");
    out.push('\n');
    for record in records {
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "{},{},{},{},{:.2}",
            record.round, record.player_id, record.contribution, record.total_pool, record.reward
        );
        if columns.governance {
            out.push(',');
            out.push_str(record.governance.as_str());
        }
        if columns.player_type {
            out.push(',');
            out.push_str(record.player_type.as_str());
        }
        out.push('\n');
    }
    out
}

/// Atomically write records to `path`, creating parent directories.
pub fn write_csv(path: &Path, records: &[RoundRecord], columns: Columns) -> Result<()> {
    debug!(path = %path.display(), rows = records.len(), "writing records");
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|err| SimError::io(parent, err))?;
    }
    let tmp_path = path.with_extension("csv.tmp");
    fs::write(&tmp_path, render_csv(records, columns))
        .map_err(|err| SimError::io(&tmp_path, err))?;
    fs::rename(&tmp_path, path).map_err(|err| SimError::io(path, err))?;
    Ok(())
}
