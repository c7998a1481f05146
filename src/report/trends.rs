use std::io::Write;
use std::path::PathBuf;

use super::TrendRenderer;
use crate::db::{GroupTrend, YearRange};
use crate::error::Result;

pub fn trend_file_name(limit: usize, years: YearRange) -> String {
    format!("n{}_trends_in_{}-{}.csv", limit, years.start, years.end)
}

pub fn trends_title(limit: usize, years: YearRange) -> String {
    let span = if years.start == years.end {
        format!("in {}", years.start)
    } else {
        format!("from {} to {}", years.start, years.end)
    };
    format!("Trends of Top {} Groups of Keywords {} Over the Years", limit, span)
}

/// Writes the trend table as CSV and echoes it as an aligned text table.
pub struct CsvTrendReport<W: Write> {
    path: PathBuf,
    out: W,
}

impl CsvTrendReport<std::io::Stdout> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_output(path, std::io::stdout())
    }
}

impl<W: Write> CsvTrendReport<W> {
    pub fn with_output(path: impl Into<PathBuf>, out: W) -> Self {
        Self {
            path: path.into(),
            out,
        }
    }

    fn write_csv(&self, rows: &[GroupTrend]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(["name", "publication_year", "unique_paper_count"])?;
        for row in rows {
            writer.write_record([
                row.name.as_str(),
                row.publication_year.to_string().as_str(),
                row.unique_paper_count.to_string().as_str(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn print_table(&mut self, title: &str, rows: &[GroupTrend]) -> Result<()> {
        let width = rows
            .iter()
            .map(|row| row.name.chars().count())
            .chain(std::iter::once("group".len()))
            .max()
            .unwrap_or(0);

        writeln!(self.out, "{}", title)?;
        writeln!(self.out, "{:<width$}  {:>6}  {:>6}", "group", "year", "papers")?;
        for row in rows {
            writeln!(
                self.out,
                "{:<width$}  {:>6}  {:>6}",
                row.name, row.publication_year, row.unique_paper_count
            )?;
        }
        Ok(())
    }
}

impl<W: Write> TrendRenderer for CsvTrendReport<W> {
    fn render(&mut self, title: &str, rows: &[GroupTrend]) -> Result<Option<PathBuf>> {
        self.write_csv(rows)?;
        self.print_table(title, rows)?;
        tracing::info!("Wrote {} trend rows to {}", rows.len(), self.path.display());
        Ok(Some(self.path.clone()))
    }
}
