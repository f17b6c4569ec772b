//! Output formatting for the shape report.
//!
//! Writes ranked [`ReportRow`]s as a table, CSV, or JSON lines.

use std::io::Write;

use clap::ValueEnum;

use mysqltap_core::ReportRow;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed table (default)
    Table,
    /// Comma-separated values
    Csv,
    /// JSON Lines (one JSON object per row)
    Json,
}

const HEADERS: [&str; 10] = [
    "total_us",
    "count",
    "mean_us",
    "median_us",
    "rows",
    "mean_rows",
    "median_rows",
    "errors",
    "shape",
    "example",
];

/// Formats report rows for output.
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    /// Create a new formatter with the specified format.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Write the rows to the given writer.
    pub fn write<W: Write>(&self, rows: &[ReportRow], writer: &mut W) -> std::io::Result<()> {
        match self.format {
            OutputFormat::Table => self.write_table(rows, writer),
            OutputFormat::Csv => self.write_csv(rows, writer),
            OutputFormat::Json => self.write_json(rows, writer),
        }
    }

    fn values(row: &ReportRow) -> [String; 10] {
        [
            row.total_latency_us.to_string(),
            row.count.to_string(),
            format!("{:.1}", row.mean_latency_us),
            row.median_latency_us.to_string(),
            row.total_rows.to_string(),
            format!("{:.1}", row.mean_rows),
            row.median_rows.to_string(),
            row.errors.to_string(),
            row.shape.clone(),
            row.example.clone(),
        ]
    }

    fn write_table<W: Write>(&self, rows: &[ReportRow], writer: &mut W) -> std::io::Result<()> {
        use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);

        // The example column is left out of the table; it is usually
        // the same text as the shape with literals filled in.
        table.set_header(HEADERS[..9].iter().map(Cell::new));

        for row in rows {
            let values = Self::values(row);
            let cells = values[..9].iter().enumerate().map(|(i, value)| {
                let cell = Cell::new(value);
                if i < 8 {
                    cell.set_alignment(CellAlignment::Right)
                } else {
                    cell
                }
            });
            table.add_row(cells);
        }

        writeln!(writer, "{table}")
    }

    fn write_csv<W: Write>(&self, rows: &[ReportRow], writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "{}", HEADERS.join(","))?;

        for row in rows {
            let values: Vec<String> = Self::values(row).into_iter().map(csv_escape).collect();
            writeln!(writer, "{}", values.join(","))?;
        }

        Ok(())
    }

    fn write_json<W: Write>(&self, rows: &[ReportRow], writer: &mut W) -> std::io::Result<()> {
        for row in rows {
            serde_json::to_writer(&mut *writer, row)?;
            writeln!(writer)?;
        }
        Ok(())
    }
}

fn csv_escape(value: String) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value
    }
}
