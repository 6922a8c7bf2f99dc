//! Plain-text rendering for terminal output.

use chrono::SecondsFormat;

use skuforge_catalog::{ImportSummary, RegistryStats, SegmentKind, SkuRecord, VocabularySet};

/// Records as an aligned `ID  SKU  ISSUED` table, in the order given.
pub fn records_table(records: &[SkuRecord]) -> String {
    if records.is_empty() {
        return "No SKUs registered.\n".to_string();
    }

    let rows: Vec<[String; 3]> = records
        .iter()
        .map(|r| {
            [
                r.id_typed().to_string(),
                r.code().to_string(),
                r.issued_at().to_rfc3339_opts(SecondsFormat::Secs, true),
            ]
        })
        .collect();

    let header = ["ID", "SKU", "ISSUED"];
    let mut widths = header.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &header, &widths);
    for row in &rows {
        let cells = [row[0].as_str(), row[1].as_str(), row[2].as_str()];
        push_row(&mut out, &cells, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[&str; 3], widths: &[usize; 3]) {
    let line = format!(
        "{:<w0$}  {:<w1$}  {}",
        cells[0],
        cells[1],
        cells[2],
        w0 = widths[0],
        w1 = widths[1]
    );
    out.push_str(line.trim_end());
    out.push('\n');
}

pub fn stats_text(stats: &RegistryStats) -> String {
    format!(
        "Total: {}\nDuplicates: {}\nUnique: {}\n",
        stats.total, stats.duplicates, stats.unique
    )
}

pub fn import_text(summary: &ImportSummary) -> String {
    format!(
        "Imported {} SKUs, skipped {} duplicates\n",
        summary.imported_count, summary.duplicate_count
    )
}

pub fn vocabulary_text(vocabulary: &VocabularySet) -> String {
    let mut out = String::new();
    for kind in SegmentKind::ALL {
        out.push_str(&format!("{:<17} {}\n", format!("{kind}:"), vocabulary.tokens(kind).join(" ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use skuforge_core::SkuId;

    #[test]
    fn table_aligns_columns() {
        let at = Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap();
        let id = SkuId::new();
        let records = [
            SkuRecord::restore(id, "A-BR-NL", at, None),
            SkuRecord::restore(SkuId::new(), "SP-AU-R-HBL-001", at, None),
        ];

        let table = records_table(&records);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[1].starts_with(&id.to_string()));
        assert!(lines[1].ends_with("2024-02-03T04:05:06Z"));
        assert_eq!(lines[0].find("SKU"), lines[1].find("A-BR-NL"));
        assert_eq!(lines[0].find("ISSUED"), lines[2].rfind("2024"));
    }

    #[test]
    fn empty_table_says_so() {
        assert_eq!(records_table(&[]), "No SKUs registered.\n");
    }

    #[test]
    fn vocabulary_lists_every_kind() {
        let text = vocabulary_text(&VocabularySet::standard());
        assert!(text.starts_with("stone:"));
        assert!(text.contains("corporate_client: HBL NUMS DW"));
    }

    #[test]
    fn summaries_read_naturally() {
        let summary = ImportSummary {
            imported_count: 2,
            duplicate_count: 1,
        };
        assert_eq!(import_text(&summary), "Imported 2 SKUs, skipped 1 duplicates\n");
        let stats = RegistryStats {
            total: 3,
            duplicates: 1,
            unique: 2,
        };
        assert_eq!(stats_text(&stats), "Total: 3\nDuplicates: 1\nUnique: 2\n");
    }
}
