//! Timestamped CSV/JSON export of harvested records

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::info;

use crate::domain::product::Product;

/// Where and in which formats the harvest lands on disk.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub output_dir: PathBuf,
    pub prefix: String,
    pub emit_csv: bool,
    pub emit_json: bool,
}

impl OutputConfig {
    pub fn new(output_dir: &Path, prefix: &str, emit_csv: bool, emit_json: bool) -> Result<Self> {
        if !emit_csv && !emit_json {
            bail!("at least one output format (CSV/JSON) must be enabled");
        }
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            prefix: prefix.to_string(),
            emit_csv,
            emit_json,
        })
    }
}

/// Write the enabled formats under a shared UTC timestamp, returning the
/// paths written.
pub fn write_outputs(products: &[Product], config: &OutputConfig) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("failed to create output dir {}", config.output_dir.display())
    })?;

    let timestamp = Utc::now().format("%Y%m%dT%H%M%SZ");
    let mut written = Vec::new();

    if config.emit_json {
        let path = config
            .output_dir
            .join(format!("{}_{timestamp}.json", config.prefix));
        let file = File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(file, products)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), records = products.len(), "wrote json output");
        written.push(path);
    }

    if config.emit_csv {
        let path = config
            .output_dir
            .join(format!("{}_{timestamp}.csv", config.prefix));
        write_csv(products, &path)?;
        info!(path = %path.display(), records = products.len(), "wrote csv output");
        written.push(path);
    }

    Ok(written)
}

fn write_csv(products: &[Product], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record([
        "name",
        "price",
        "product_code",
        "product_url",
        "image_url",
        "metadata",
    ])?;
    for product in products {
        // Metadata is free-form; embed it as one JSON object cell.
        let metadata = serde_json::to_string(&product.metadata)?;
        let price = product.price.map(|p| p.to_string()).unwrap_or_default();
        writer.write_record([
            product.name.as_str(),
            price.as_str(),
            product.product_code.as_deref().unwrap_or_default(),
            product.product_url.as_deref().unwrap_or_default(),
            product.image_url.as_deref().unwrap_or_default(),
            metadata.as_str(),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}
