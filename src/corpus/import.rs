use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};

use crate::config::{ColumnNames, CsvFormat, ExcludedKeywords};
use crate::error::{AppError, Result};
use crate::models::Paper;

use super::normalize::normalize_keyword;

/// Everything needed to turn CSV rows into papers.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub columns: ColumnNames,
    pub keyword_separator: String,
    pub delimiter: u8,
    pub has_header: bool,
    pub excluded_exact: HashSet<String>,
    pub excluded_prefixes: Vec<String>,
}

impl ImportOptions {
    pub fn new(columns: &ColumnNames, format: &CsvFormat, excluded: &ExcludedKeywords) -> Result<Self> {
        let delimiter = match format.separator.as_bytes() {
            [byte] => *byte,
            _ => {
                return Err(AppError::Config(format!(
                    "CSV separator must be a single byte, got {:?}",
                    format.separator
                )))
            }
        };
        if format.keyword_separator.is_empty() {
            return Err(AppError::Config("Keyword separator must not be empty".to_string()));
        }

        Ok(Self {
            columns: columns.clone(),
            keyword_separator: format.keyword_separator.clone(),
            delimiter,
            has_header: format.has_header,
            excluded_exact: excluded.at_csv_import.iter().cloned().collect(),
            excluded_prefixes: excluded.starting_by_at_csv_import.clone(),
        })
    }
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            keyword_separator: ";".to_string(),
            delimiter: b',',
            has_header: true,
            excluded_exact: HashSet::new(),
            excluded_prefixes: Vec::new(),
        }
    }
}

/// Papers read from one source plus the row accounting for it.
#[derive(Debug, Default)]
pub struct SourceImport {
    pub papers: Vec<Paper>,
    pub rows_read: usize,
    pub malformed_rows: usize,
}

/// Summary of a folder import after merging into the corpus.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub files: usize,
    pub rows_read: usize,
    pub malformed_rows: usize,
    /// Corpus size after deduplication.
    pub papers: usize,
    pub duplicates_removed: usize,
}

struct ColumnIndices {
    title: usize,
    year: usize,
    keywords: usize,
}

impl ColumnIndices {
    fn from_headers(headers: &StringRecord, columns: &ColumnNames) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| AppError::Config(format!("Column '{}' not found in CSV header", name)))
        };
        Ok(Self {
            title: find(&columns.title)?,
            year: find(&columns.publication_year)?,
            keywords: find(&columns.keywords)?,
        })
    }

    /// Without a header row the configured names are zero-based positions.
    fn from_positions(columns: &ColumnNames) -> Result<Self> {
        let parse = |name: &str| {
            name.trim().parse::<usize>().map_err(|_| {
                AppError::Config(format!(
                    "Column '{}' must be a zero-based index when the CSV has no header",
                    name
                ))
            })
        };
        Ok(Self {
            title: parse(&columns.title)?,
            year: parse(&columns.publication_year)?,
            keywords: parse(&columns.keywords)?,
        })
    }
}

/// Splits a raw keyword field, normalizes every token and applies the import
/// exclusion rules. Empty tokens are always dropped.
pub fn extract_keywords(
    raw: &str,
    separator: &str,
    excluded_exact: &HashSet<String>,
    excluded_prefixes: &[String],
) -> BTreeSet<String> {
    raw.split(separator)
        .map(normalize_keyword)
        .filter(|keyword| {
            !keyword.is_empty()
                && !excluded_exact.contains(keyword)
                && !excluded_prefixes
                    .iter()
                    .any(|prefix| keyword.starts_with(prefix.as_str()))
        })
        .collect()
}

fn parse_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if let Ok(year) = raw.parse::<i32>() {
        return Some(year);
    }
    // Spreadsheet exports sometimes write whole numbers as "2023.0"
    let value = raw.parse::<f64>().ok()?;
    if value.fract() == 0.0 && value >= i32::MIN as f64 && value <= i32::MAX as f64 {
        Some(value as i32)
    } else {
        None
    }
}

fn parse_record(
    record: &StringRecord,
    indices: &ColumnIndices,
    options: &ImportOptions,
    row: u64,
) -> Result<Paper> {
    let malformed = |reason: String| AppError::MalformedRecord { row, reason };

    let title = record
        .get(indices.title)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| malformed("missing title".to_string()))?;

    let raw_year = record
        .get(indices.year)
        .ok_or_else(|| malformed("missing publication year".to_string()))?;
    let publication_year =
        parse_year(raw_year).ok_or_else(|| malformed(format!("invalid publication year {:?}", raw_year)))?;

    let keywords = record
        .get(indices.keywords)
        .map(|raw| {
            extract_keywords(
                raw,
                &options.keyword_separator,
                &options.excluded_exact,
                &options.excluded_prefixes,
            )
        })
        .unwrap_or_default();

    Ok(Paper::new(title, publication_year, keywords))
}

/// Reads papers from one CSV source.
///
/// Rows with an unusable title or year are skipped and counted; a missing
/// column in the header fails the whole source.
pub fn import_source<R: Read>(source: R, options: &ImportOptions) -> Result<SourceImport> {
    let mut reader = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(options.has_header)
        .flexible(true)
        .from_reader(source);

    let indices = if options.has_header {
        ColumnIndices::from_headers(reader.headers()?, &options.columns)?
    } else {
        ColumnIndices::from_positions(&options.columns)?
    };

    let mut import = SourceImport::default();
    for (index, result) in reader.records().enumerate() {
        let row = index as u64 + 1;
        import.rows_read += 1;

        let parsed = result
            .map_err(AppError::from)
            .and_then(|record| parse_record(&record, &indices, options, row));
        match parsed {
            Ok(paper) => import.papers.push(paper),
            Err(e) => {
                tracing::debug!("Skipping row: {}", e);
                import.malformed_rows += 1;
            }
        }
    }

    if import.malformed_rows > 0 {
        tracing::warn!(
            "Skipped {} of {} rows with missing or invalid fields",
            import.malformed_rows,
            import.rows_read
        );
    }
    Ok(import)
}

pub fn import_file(path: &Path, options: &ImportOptions) -> Result<SourceImport> {
    let file = File::open(path)?;
    let import = import_source(file, options)?;
    tracing::info!("Read {} papers from {}", import.papers.len(), path.display());
    Ok(import)
}

/// `*.csv` files directly inside `dir`, sorted by file name.
pub fn csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if path.is_file() && is_csv {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Imports every CSV file in `dir`, concatenated in file-name order.
pub fn import_folder(dir: &Path, options: &ImportOptions) -> Result<(SourceImport, usize)> {
    let files = csv_files(dir)?;
    let mut combined = SourceImport::default();
    for path in &files {
        let import = import_file(path, options)?;
        combined.papers.extend(import.papers);
        combined.rows_read += import.rows_read;
        combined.malformed_rows += import.malformed_rows;
    }
    Ok((combined, files.len()))
}

/// Keeps the first paper seen for every title.
///
/// Returns the survivors in input order and the number of records dropped,
/// so `kept.len() + dropped == papers.len()`.
pub fn merge_and_deduplicate(papers: Vec<Paper>) -> (Vec<Paper>, usize) {
    let total = papers.len();
    let mut seen = HashSet::with_capacity(total);
    let kept: Vec<Paper> = papers
        .into_iter()
        .filter(|paper| seen.insert(paper.title.clone()))
        .collect();
    let dropped = total - kept.len();
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ImportOptions {
        ImportOptions::default()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_keywords_applies_exclusions() {
        let exact: HashSet<String> = ["review"].iter().map(|s| s.to_string()).collect();
        let prefixes = vec!["article".to_string()];
        let keywords = extract_keywords(
            "Machine-Learning; Review ; ;Article 12; machine learning; AI",
            ";",
            &exact,
            &prefixes,
        );
        assert_eq!(keywords, set(&["ai", "machine learning"]));
    }

    #[test]
    fn test_extract_keywords_drops_empty_without_prefixes() {
        let keywords = extract_keywords(";; - ;iot", ";", &HashSet::new(), &[]);
        assert_eq!(keywords, set(&["iot"]));
    }

    #[test]
    fn test_import_source_reads_rows() {
        let csv = "title,publication_year,keywords\n\
                   Paper A,2023,AI;Machine-Learning\n\
                   Paper B,2024,\"IoT; Edge, Computing\"\n";
        let import = import_source(csv.as_bytes(), &options()).unwrap();

        assert_eq!(import.rows_read, 2);
        assert_eq!(import.malformed_rows, 0);
        assert_eq!(import.papers[0], Paper::new("Paper A", 2023, ["ai", "machine learning"]));
        assert_eq!(import.papers[1].keywords, set(&["iot", "edge computing"]));
    }

    #[test]
    fn test_import_source_skips_malformed_rows() {
        let csv = "title,publication_year,keywords\n\
                   Good,2020,x\n\
                   ,2021,y\n\
                   Bad year,soon,z\n\
                   Float year,2022.0,w\n\
                   Short row\n";
        let import = import_source(csv.as_bytes(), &options()).unwrap();

        assert_eq!(import.rows_read, 5);
        assert_eq!(import.malformed_rows, 3);
        let titles: Vec<_> = import.papers.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Good", "Float year"]);
        assert_eq!(import.papers[1].publication_year, 2022);
    }

    #[test]
    fn test_import_source_uses_column_map_and_separators() {
        let mut opts = options();
        opts.columns = ColumnNames {
            title: "Title".to_string(),
            publication_year: "Year".to_string(),
            keywords: "Author Keywords".to_string(),
        };
        opts.delimiter = b'\t';
        opts.keyword_separator = "|".to_string();

        let csv = "Year\tAuthors\tTitle\tAuthor Keywords\n2021\tDoe\t  Spaced Title  \tA|B\n";
        let import = import_source(csv.as_bytes(), &opts).unwrap();
        assert_eq!(import.papers, vec![Paper::new("Spaced Title", 2021, ["a", "b"])]);
    }

    #[test]
    fn test_import_source_without_header_uses_positions() {
        let mut opts = options();
        opts.has_header = false;
        opts.columns = ColumnNames {
            title: "1".to_string(),
            publication_year: "0".to_string(),
            keywords: "2".to_string(),
        };
        let import = import_source("2019,Headless,kw\n".as_bytes(), &opts).unwrap();
        assert_eq!(import.papers, vec![Paper::new("Headless", 2019, ["kw"])]);
    }

    #[test]
    fn test_import_source_missing_column_fails() {
        let csv = "name,year\nx,2020\n";
        let err = import_source(csv.as_bytes(), &options()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_merge_and_deduplicate_first_seen_wins() {
        let papers = vec![
            Paper::new("A", 2020, ["x"]),
            Paper::new("B", 2021, ["y"]),
            Paper::new("A", 2022, ["z"]),
            Paper::new("a", 2023, ["w"]),
            Paper::new("A", 2024, ["v"]),
        ];
        let (kept, dropped) = merge_and_deduplicate(papers.clone());

        assert_eq!(dropped, 2);
        assert_eq!(kept.len() + dropped, papers.len());
        assert_eq!(kept, vec![papers[0].clone(), papers[1].clone(), papers[3].clone()]);
    }

    #[test]
    fn test_import_folder_with_overlapping_title() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("b.csv"),
            "title,publication_year,keywords\nShared,2024,ml\nOnly B,2024,iot\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("a.csv"),
            "title,publication_year,keywords\nOnly A,2023,ai\nShared,2023,ai\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let (import, files) = import_folder(dir.path(), &options()).unwrap();
        assert_eq!(files, 2);
        assert_eq!(import.papers.len(), 4);

        let (kept, dropped) = merge_and_deduplicate(import.papers);
        assert_eq!(dropped, 1);
        assert_eq!(kept.len(), 3);
        // a.csv is read first, so its copy of the shared title survives
        let shared = kept.iter().find(|p| p.title == "Shared").unwrap();
        assert_eq!(shared.publication_year, 2023);
    }
}
