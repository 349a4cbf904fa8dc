//! Disk probe.
//!
//! Exercises a scratch file of `data_size` bytes with `request_size`
//! requests. Workers own disjoint, interleaved chunks of the file; each
//! pass writes its chunks (optionally flushing every write) and then reads
//! them back, until the budget is spent.

use super::{Budget, Probe, ProbeContext, ProbeError, ProbeStats};
use async_trait::async_trait;
use check_types::{DiskTestSpec, NodeId};
use futures_util::future::try_join_all;
use rand::RngCore;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// Disk probe.
#[derive(Debug, Clone)]
pub struct DiskProbe {
    spec: DiskTestSpec,
    node_id: NodeId,
    scratch_dir: PathBuf,
    parallelism: usize,
}

impl DiskProbe {
    /// Create a disk probe for `spec` on the node described by `ctx`.
    pub fn new(spec: DiskTestSpec, ctx: &ProbeContext) -> Self {
        let parallelism = ctx.clamp_parallelism(spec.parallelism);
        Self {
            spec,
            node_id: ctx.node_id,
            scratch_dir: ctx.scratch_dir.clone(),
            parallelism,
        }
    }

    fn chunks(&self) -> u64 {
        (self.spec.data_size / self.spec.request_size.max(1)).max(1)
    }

    async fn exercise(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<ProbeStats, ProbeError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .await?;
        file.set_len(self.chunks() * self.spec.request_size).await?;
        drop(file);

        let chunks = self.chunks();
        let workers = self.parallelism.min(chunks as usize).max(1);
        let budget = Budget::from_millis(self.spec.duration_ms);

        let results = try_join_all(
            (0..workers).map(|index| self.worker(path, index, workers, chunks, budget, cancel)),
        )
        .await?;

        Ok(results
            .into_iter()
            .fold(ProbeStats::default(), ProbeStats::merge))
    }

    async fn worker(
        &self,
        path: &Path,
        index: usize,
        workers: usize,
        chunks: u64,
        budget: Budget,
        cancel: &CancellationToken,
    ) -> Result<ProbeStats, ProbeError> {
        let mut file = OpenOptions::new().read(true).write(true).open(path).await?;
        let request_size = self.spec.request_size as usize;

        let mut write_buf = vec![0u8; request_size];
        rand::thread_rng().fill_bytes(&mut write_buf);
        let mut read_buf = vec![0u8; request_size];

        let mut stats = ProbeStats::default();
        let mine: Vec<u64> = (index as u64..chunks).step_by(workers).collect();

        loop {
            if !self.spec.skip_write {
                for &chunk in &mine {
                    check(cancel)?;
                    file.seek(SeekFrom::Start(chunk * self.spec.request_size))
                        .await?;
                    file.write_all(&write_buf).await?;
                    if self.spec.dsync {
                        file.sync_data().await?;
                    }
                    stats.requests += 1;
                    stats.bytes += self.spec.request_size;
                    if budget.exhausted() {
                        return finish(file, stats).await;
                    }
                }
                file.flush().await?;
            }

            if !self.spec.skip_read {
                for &chunk in &mine {
                    check(cancel)?;
                    file.seek(SeekFrom::Start(chunk * self.spec.request_size))
                        .await?;
                    file.read_exact(&mut read_buf).await?;
                    stats.requests += 1;
                    stats.bytes += self.spec.request_size;
                    if budget.exhausted() {
                        return finish(file, stats).await;
                    }
                }
            }
        }
    }
}

fn check(cancel: &CancellationToken) -> Result<(), ProbeError> {
    if cancel.is_cancelled() {
        Err(ProbeError::Cancelled)
    } else {
        Ok(())
    }
}

async fn finish(mut file: File, stats: ProbeStats) -> Result<ProbeStats, ProbeError> {
    file.flush().await?;
    Ok(stats)
}

#[async_trait]
impl Probe for DiskProbe {
    async fn run(&self, cancel: CancellationToken) -> Result<ProbeStats, ProbeError> {
        let path = self.scratch_dir.join(format!(
            "nodecheck-disk-{}-{:016x}.tmp",
            self.node_id,
            rand::random::<u64>()
        ));

        let result = self.exercise(&path, &cancel).await;

        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::debug!(path = %path.display(), error = %e, "Failed to remove scratch file");
        }

        result
    }
}
