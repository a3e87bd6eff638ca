use crate::config::JobParameters;
use crate::flatten::FlatProduct;
use crate::processor::{ObjectDetacher, ProductProcessor};
use crate::reader::{ProductReader, ReaderContext};
use crate::util::init_tracing_once;
use anyhow::{Context, Result};
use serde::Serialize;

/// Counters reported at the end of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub read: u64,
    pub written: u64,
}

/// One export run: reader, processor and a consumer callback, wired from job parameters.
///
/// ```ignore
/// let summary = CatalogExport::new(ctx, &detacher)
///     .params(JobParameters::default().with_channel("ecommerce"))
///     .progress(false)
///     .for_each_record(|flat| { rows.push(flat); Ok(()) })?;
/// ```
#[derive(Clone)]
pub struct CatalogExport<'a> {
    ctx: ReaderContext<'a>,
    detacher: &'a dyn ObjectDetacher,
    params: JobParameters,
    progress: bool,
}

impl<'a> CatalogExport<'a> {
    pub fn new(ctx: ReaderContext<'a>, detacher: &'a dyn ObjectDetacher) -> Self {
        Self { ctx, detacher, params: JobParameters::default(), progress: true }
    }

    // -------- Builder methods --------
    pub fn params(mut self, params: JobParameters) -> Self { self.params = params; self }
    pub fn channel(mut self, code: impl Into<String>) -> Self { self.params = self.params.with_channel(code); self }
    pub fn job_definition(mut self, id: impl Into<String>) -> Self { self.params = self.params.with_job_definition(id); self }
    pub fn progress(mut self, yes: bool) -> Self { self.progress = yes; self }

    /// Run the export, handing each shaped record to `f` in cursor order.
    /// The first failure from a collaborator or from `f` stops the run.
    pub fn for_each_record<F>(self, mut f: F) -> Result<ExportSummary>
    where
        F: FnMut(FlatProduct) -> Result<()>,
    {
        init_tracing_once();
        let config = self.params.validate().context("invalid job parameters")?;

        let mut reader = ProductReader::new(self.ctx).progress(self.progress);
        reader.initialize(&config)?;
        let channel = match reader.channel() {
            Some(c) => c.clone(),
            None => return Err(crate::error::ExportError::NotInitialized.into()),
        };
        let processor = ProductProcessor::new(channel, &config, self.detacher);
        if !processor.excluded().is_empty() {
            tracing::info!(codes = processor.excluded().len(), "excluding attributes/association types");
        }

        let mut summary = ExportSummary::default();
        while let Some(product) = reader.read()? {
            let identifier = product.identifier.clone();
            let flat = processor
                .process(product)
                .with_context(|| format!("processing product '{}'", identifier))?;
            f(flat).with_context(|| format!("writing product '{}'", identifier))?;
            summary.written += 1;
        }
        summary.read = reader.read_count();

        tracing::info!(read = summary.read, written = summary.written, "export finished");
        Ok(summary)
    }

    /// Convenience: collect every shaped record.
    pub fn collect_records(self) -> Result<Vec<FlatProduct>> {
        let mut out = Vec::new();
        self.for_each_record(|flat| {
            out.push(flat);
            Ok(())
        })?;
        Ok(out)
    }
}
