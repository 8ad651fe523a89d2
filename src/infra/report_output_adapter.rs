use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::app::batch_use_case::BatchReport;
use crate::app::ports::ReportOutputPort;

/// Writes summary, per-record results and health report into a directory.
///
/// Each run gets its own file set named `<kind>_<timestamp>_<offset>_<run_id>`,
/// so concurrent runs over different windows can share one directory.
pub struct FileReportOutput {
    output_dir: PathBuf,
}

impl FileReportOutput {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn path_for(&self, kind: &str, stamp: &str, ext: &str) -> PathBuf {
        self.output_dir.join(format!("{}_{}.{}", kind, stamp, ext))
    }
}

#[async_trait]
impl ReportOutputPort for FileReportOutput {
    async fn write_report(&self, report: &BatchReport) -> Result<()> {
        fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("creating output dir {}", self.output_dir.display()))?;

        let run_info = &report.summary.run_info;
        let stamp = format!(
            "{}_{}_{}",
            run_info.timestamp.format("%Y%m%d_%H%M%S"),
            run_info.offset,
            run_info.run_id
        );

        let summary_path = self.path_for("summary", &stamp, "json");
        write_json(&summary_path, &serde_json::to_vec_pretty(&report.summary)?).await?;

        let mut lines = Vec::new();
        for outcome in &report.outcomes {
            serde_json::to_writer(&mut lines, outcome)?;
            lines.push(b'\n');
        }
        let results_path = self.path_for("results", &stamp, "ndjson");
        write_json(&results_path, &lines).await?;

        let health_path = self.path_for("health", &stamp, "json");
        write_json(&health_path, &serde_json::to_vec_pretty(&report.health)?).await?;

        info!(
            "Wrote batch report: {}, {}, {}",
            summary_path.display(),
            results_path.display(),
            health_path.display()
        );
        Ok(())
    }
}

// Refuses to replace an existing file; a name clash means two runs share an id.
async fn write_json(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .with_context(|| format!("creating {}", path.display()))?;
    file.write_all(bytes)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    file.flush()
        .await
        .with_context(|| format!("flushing {}", path.display()))
}

/// Discards reports, for callers that only need the returned `BatchReport`
pub struct NullReportOutput;

#[async_trait]
impl ReportOutputPort for NullReportOutput {
    async fn write_report(&self, _report: &BatchReport) -> Result<()> {
        Ok(())
    }
}
