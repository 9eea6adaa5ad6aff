use crate::parameters::ResolvedParameters;
use crate::shared::storage::FileEntry;
use crate::utils::{format_bytes, format_timestamp};

const FILE_TABLE_HEADERS: [&str; 4] = ["Name", "Extension", "Size", "Modified"];

/// Display formatter for backup listings and the review summary
pub struct DisplayFormatter;

impl DisplayFormatter {
    /// Render non-directory entries as an aligned table, header first
    pub fn file_table(entries: &[FileEntry]) -> Vec<String> {
        let rows: Vec<[String; 4]> = entries
            .iter()
            .filter(|entry| !entry.is_dir())
            .map(|entry| {
                [
                    entry.basename.clone(),
                    entry.extension.clone(),
                    format_bytes(entry.size),
                    format_timestamp(&entry.timestamp),
                ]
            })
            .collect();

        let mut widths = FILE_TABLE_HEADERS.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let header = FILE_TABLE_HEADERS.map(str::to_string);
        let separator = widths.map(|width| "-".repeat(width));

        let mut lines = vec![
            Self::table_row(&header, &widths),
            Self::table_row(&separator, &widths),
        ];
        lines.extend(rows.iter().map(|row| Self::table_row(row, &widths)));
        lines
    }

    fn table_row(cells: &[String; 4], widths: &[usize; 4]) -> String {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    }

    /// Review lines shown before the operator confirms, one per parameter
    pub fn summary(parameters: &ResolvedParameters) -> Vec<String> {
        vec![
            format!("  Source:      {}", parameters.source),
            format!("  Backup path: {}", parameters.source_path),
            format!("  Database:    {}", parameters.database),
            format!("  Compression: {}", parameters.compression),
        ]
    }
}
