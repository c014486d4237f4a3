use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use luminary_script::got::ENTRY_SIZE;
use luminary_script::relocation::{parse_relocation_lines, starts_with_got_base};
use luminary_script::{GlobalOffsetTable, LinkError, link_file};
use luminary_types::ScriptFunc;
use tracing::info;

#[derive(Args)]
pub struct LinkArgs {
    /// Extracted code binary, patched in place
    #[arg(short, long)]
    pub binary: PathBuf,

    /// Output of `objdump -t -r -C` for the unit's object file
    #[arg(short, long)]
    pub dump: PathBuf,

    /// Offset table entries; defaults to the length of --table
    #[arg(short, long)]
    pub got_entries: Option<u16>,

    /// Load offset of the code, in hex
    #[arg(short, long, value_parser = parse_hex_u16, default_value = "0")]
    pub load_offset: u16,

    /// Offset table (JSON) written by `luminary export`
    #[arg(short, long)]
    pub table: Option<PathBuf>,
}

fn parse_hex_u16(text: &str) -> Result<u16, String> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u16::from_str_radix(digits, 16).map_err(|e| format!("{text}: {e}"))
}

fn load_table(path: Option<&Path>) -> Result<GlobalOffsetTable> {
    let Some(path) = path else {
        return Ok(GlobalOffsetTable::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let entries: Vec<ScriptFunc> =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(entries.into_iter().collect())
}

pub fn run(args: &LinkArgs) -> Result<()> {
    let table = load_table(args.table.as_deref())?;
    let got_size = match args.got_entries {
        Some(entries) => entries
            .checked_mul(ENTRY_SIZE as u16)
            .context("offset table does not fit a 16-bit offset")?,
        None if args.table.is_some() => table.offset_size()?,
        None => bail!("--got-entries is required without --table"),
    };

    let dump = std::fs::read_to_string(&args.dump)
        .with_context(|| format!("reading {}", args.dump.display()))?;
    let relocations = parse_relocation_lines(&dump, &table)
        .with_context(|| format!("parsing {}", args.dump.display()))?;
    if !relocations.is_empty() && !starts_with_got_base(&relocations) {
        return Err(LinkError::MissingGotBase {
            first: relocations[0].name.clone(),
        })
        .with_context(|| format!("linking {}", args.binary.display()));
    }

    let size = link_file(&args.binary, &relocations, got_size, args.load_offset)
        .with_context(|| format!("linking {}", args.binary.display()))?;
    info!(
        binary = %args.binary.display(),
        relocations = relocations.len(),
        size,
        "script binary linked"
    );
    Ok(())
}
