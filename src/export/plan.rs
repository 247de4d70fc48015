//! Planning and running a whole export.
//!
//! The [`Exporter`] ties the pieces together: it expands the user's
//! selection into source images, renders the watermark once, reserves a
//! destination per source and hands the resulting jobs to the
//! [`BatchExecutor`].

use super::batch::{BatchExecutor, CancellationFlag, JobOutcome, ProgressEvent};
use crate::config::ExportConfig;
use crate::error::{Result, WatermarkError};
use crate::image_io::is_supported_source;
use crate::watermark::{render_watermark, CompositionRequest, RasterLayer, WatermarkStyle};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Expand files and directories into source images.
    ///
    /// Directories are walked recursively in name order. Only files with a
    /// supported image extension are kept; duplicates are dropped, keeping
    /// the first occurrence. Files are not opened, so an unreadable image
    /// shows up later as a failed job.
    pub fn collect_sources<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<PathBuf>> {
        let mut seen = HashSet::new();
        let mut sources = Vec::new();
        for path in paths {
            collect_into(path.as_ref(), &mut seen, &mut sources)?;
        }
        tracing::debug!(count = sources.len(), "Collected source images");
        Ok(sources)
    }

    /// Build one composition request per source, reserving its destination.
    ///
    /// # Errors
    ///
    /// * [`WatermarkError::Config`] for an invalid configuration, or when a
    ///   source lives in the output directory and `allow_source_dir` is off
    /// * [`WatermarkError::PathAllocation`] if a destination cannot be claimed
    pub fn plan(
        &self,
        sources: &[PathBuf],
        layer: Arc<RasterLayer>,
    ) -> Result<Vec<CompositionRequest>> {
        self.config.validate()?;
        let output_dir = &self.config.output_dir;

        if !self.config.allow_source_dir {
            let output_abs = absolute(output_dir);
            for source in sources {
                let source_dir = source.parent().unwrap_or_else(|| Path::new(""));
                if absolute(source_dir) == output_abs {
                    return Err(WatermarkError::Config(format!(
                        "Refusing to export into the source folder {}; choose another output directory",
                        output_dir.display()
                    )));
                }
            }
        }

        std::fs::create_dir_all(output_dir)?;

        let naming = self.config.naming();
        let mut requests: Vec<CompositionRequest> = Vec::with_capacity(sources.len());
        for source in sources {
            let destination =
                match naming.reserve_for(source, output_dir, self.config.output_format) {
                    Ok(path) => path,
                    Err(e) => {
                        // Release what was claimed so far
                        for request in &requests {
                            let _ = std::fs::remove_file(&request.destination_path);
                        }
                        return Err(e);
                    }
                };

            let mut request = CompositionRequest::new(source, destination, layer.clone())
                .with_anchor(self.config.anchor)
                .with_output_format(self.config.output_format)
                .with_jpeg_quality(self.config.jpeg_quality);
            request.resize_target = self.config.resize_target();
            requests.push(request);
        }

        Ok(requests)
    }

    /// Render `style`, plan every source and run the batch.
    pub fn export<F>(
        &self,
        sources: &[PathBuf],
        style: &WatermarkStyle,
        on_progress: F,
    ) -> Result<Vec<JobOutcome>>
    where
        F: FnMut(ProgressEvent),
    {
        self.export_with_cancel(sources, style, &CancellationFlag::new(), on_progress)
    }

    pub fn export_with_cancel<F>(
        &self,
        sources: &[PathBuf],
        style: &WatermarkStyle,
        cancel: &CancellationFlag,
        on_progress: F,
    ) -> Result<Vec<JobOutcome>>
    where
        F: FnMut(ProgressEvent),
    {
        let layer = Arc::new(render_watermark(style)?);
        let requests = self.plan(sources, layer)?;

        let outcomes = BatchExecutor::new(self.config.max_concurrency).run_with_cancel(
            requests,
            cancel,
            on_progress,
        )?;

        for outcome in outcomes.iter().filter(|o| !o.success) {
            remove_placeholder(&outcome.destination_path);
        }

        Ok(outcomes)
    }
}

fn collect_into(path: &Path, seen: &mut HashSet<PathBuf>, sources: &mut Vec<PathBuf>) -> Result<()> {
    if path.is_dir() {
        let mut entries = std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();
        for entry in entries {
            collect_into(&entry, seen, sources)?;
        }
    } else if is_supported_source(path) {
        if seen.insert(path.to_path_buf()) {
            sources.push(path.to_path_buf());
        }
    } else {
        tracing::debug!(path = %path.display(), "Skipping unsupported file");
    }
    Ok(())
}

/// Delete an empty reserved destination left behind by a failed job.
fn remove_placeholder(path: &Path) {
    if let Ok(metadata) = std::fs::metadata(path) {
        if metadata.is_file() && metadata.len() == 0 {
            let _ = std::fs::remove_file(path);
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}
