use std::path::Path;

use anyhow::{Context, Result};
use luminary_source::SourceSet;
use tracing::info;

pub fn run(dir: &Path) -> Result<()> {
    let mut sources = SourceSet::new();
    sources
        .load_dir(dir)
        .with_context(|| format!("scanning {}", dir.display()))?;

    let definitions = sources.resolve();
    info!(
        files = sources.file_count(),
        entities = definitions.entities.len(),
        components = definitions.components.len(),
        "source scanned"
    );

    println!("{}", serde_json::to_string_pretty(&definitions)?);
    Ok(())
}
