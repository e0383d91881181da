//! Tab-separated taxonomy file reader: `leaf_name\tlineage` per line.

use anyhow::{Context, Result};
use parsimony::TaxonomyTable;
use std::path::Path;

pub fn read_file(path: &Path) -> Result<TaxonomyTable> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading taxonomy file {}", path.display()))?;
    Ok(parse(&text))
}

pub fn parse(text: &str) -> TaxonomyTable {
    let mut table = TaxonomyTable::new();
    for line in text.lines() {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            continue;
        }
        if let Some((name, lineage)) = line.split_once('\t') {
            table.insert(name.trim(), lineage.trim());
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use parsimony::TaxonomyStore;

    #[test]
    fn parses_name_and_lineage_columns() {
        let table = parse("Leaf1\tBacteria;Proteobacteria\nLeaf2\tArchaea;Euryarchaeota\n");
        assert_eq!(table.lineage("Leaf1"), Some("Bacteria;Proteobacteria"));
        assert_eq!(table.lineage("Leaf2"), Some("Archaea;Euryarchaeota"));
    }

    #[test]
    fn skips_blank_lines_and_lines_without_a_tab() {
        let table = parse("\nLeaf1\tBacteria\nmalformed line\n");
        assert_eq!(table.lineage("Leaf1"), Some("Bacteria"));
        assert_eq!(table.lineage("malformed line"), None);
    }
}
