//! Mask file reader: `'0'`/`'.'`/`'-'` decode to 0, everything else to 1.

use anyhow::{Context, Result};
use parsimony::Mask;
use std::path::Path;

pub fn read_file(path: &Path) -> Result<Mask> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading mask file {}", path.display()))?;
    Ok(parse(&text))
}

pub fn parse(text: &str) -> Mask {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '0' | '.' | '-' => 0,
            _ => 1,
        })
        .collect()
}
