use anyhow::{bail, Context, Result};
use catalog_export::memory::InMemoryCatalog;
use catalog_export::{
    CatalogExport, ExecutionRecord, InMemoryExecutionHistory, JobParameters, MetricConverter, ReaderContext,
};
use std::fs;
use std::io::{self, BufWriter, Write};

// usage: catalog-export <catalog.json> <job.json> [executions.json]
fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        bail!("usage: catalog-export <catalog.json> <job.json> [executions.json]");
    }

    let catalog_json = fs::read_to_string(&args[0]).with_context(|| format!("reading {}", args[0]))?;
    let job_json = fs::read_to_string(&args[1]).with_context(|| format!("reading {}", args[1]))?;
    let executions: Vec<ExecutionRecord> = match args.get(2) {
        Some(path) => serde_json::from_str(&fs::read_to_string(path).with_context(|| format!("reading {}", path))?)?,
        None => Vec::new(),
    };

    let catalog = InMemoryCatalog::from_json(&catalog_json).context("parsing catalog")?;
    let history = InMemoryExecutionHistory::new(executions);
    let converter = MetricConverter::with_standard_families();
    let ctx = ReaderContext {
        query: &catalog,
        channels: &catalog,
        completeness: &catalog,
        history: &history,
        converter: &converter,
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let summary = CatalogExport::new(ctx, &catalog)
        .params(JobParameters::from_json(&job_json).context("parsing job parameters")?)
        .progress(false)
        .for_each_record(|flat| {
            serde_json::to_writer(&mut out, &flat.record)?;
            out.write_all(b"\n")?;
            Ok(())
        })?;
    out.flush()?;

    eprintln!("read {} products, wrote {} records", summary.read, summary.written);
    Ok(())
}
