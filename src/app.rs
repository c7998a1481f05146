use std::collections::HashSet;
use std::path::{Path, PathBuf};

use clap::Subcommand;

use crate::checkpoint::{read_json, write_json, KEYWORD_GROUPS_FILE, UNIQUE_KEYWORDS_FILE};
use crate::cluster::{cluster, ClusterMode, Embedder};
use crate::config::{ClusteringSettings, Preferences};
use crate::corpus::{self, merge_and_deduplicate, unique_keywords, ImportOptions, ImportReport};
use crate::db::{GroupTrend, GroupYearTable, RebuildReport, RegroupReport, Repository, StoreCounts, YearRange};
use crate::error::{AppError, Result};
use crate::models::{merge_groups, KeywordGroups, Paper};
use crate::report::{trend_file_name, trends_title, without_excluded, CsvTrendReport, TrendRenderer};

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Import, extract keywords, cluster and build the database in one go
    Run {
        /// Number of groups; 0 cuts by the configured distance threshold
        #[arg(short, long, default_value_t = 0)]
        clusters: usize,
        /// Regenerate checkpoints even when they exist
        #[arg(long)]
        force: bool,
    },
    /// Import CSV folders and report what was read
    Import {
        /// Folders to import, in order (defaults to the configured CSV folder)
        folders: Vec<PathBuf>,
    },
    /// Extract the frequency-ranked unique keyword list and save it
    Keywords,
    /// Cluster the unique keywords into groups and save them
    Cluster {
        #[arg(short, long, default_value_t = 0)]
        clusters: usize,
        /// Overrides the configured distance threshold
        #[arg(short, long)]
        distance_threshold: Option<f64>,
    },
    /// Merge groups into a new group
    Merge {
        #[arg(required = true)]
        names: Vec<String>,
        #[arg(long = "into")]
        new_name: String,
    },
    /// Recreate the database from the corpus and the saved groups
    BuildDb,
    /// Rewrite database groups from the saved groups
    RegroupDb,
    /// Delete the database file
    DeleteDb,
    /// Export trends of the top groups
    Trends {
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        from: Option<i32>,
        #[arg(long)]
        to: Option<i32>,
    },
    /// Print distinct paper counts per group and year
    Table {
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Hide a group from trend reports
    Ban { group: String },
    /// Show a previously hidden group again
    Unban { group: String },
    /// Show checkpoint and database state
    Status,
}

/// Pipeline context shared by every command.
pub struct App {
    pub prefs: Preferences,
    prefs_path: PathBuf,

    // Data
    pub papers: Vec<Paper>,
    pub unique_keywords: Option<Vec<String>>,
    pub groups: Option<KeywordGroups>,

    // Services
    pub repository: Repository,
    embedder: Option<Box<dyn Embedder>>,
}

#[cfg(feature = "fastembed")]
fn load_embedder(settings: &ClusteringSettings) -> Result<Box<dyn Embedder>> {
    let embedder = crate::cluster::FastEmbedder::new(
        &settings.embedding_model,
        settings.model_cache_dir.as_deref(),
    )?;
    Ok(Box::new(embedder))
}

#[cfg(not(feature = "fastembed"))]
fn load_embedder(settings: &ClusteringSettings) -> Result<Box<dyn Embedder>> {
    Err(AppError::MissingCapability(format!(
        "Built without an embedding backend, cannot load '{}'",
        settings.embedding_model
    )))
}

impl App {
    pub fn new(prefs: Preferences, prefs_path: PathBuf) -> Self {
        let repository = Repository::new(prefs.database_path());
        Self {
            prefs,
            prefs_path,
            papers: Vec::new(),
            unique_keywords: None,
            groups: None,
            repository,
            embedder: None,
        }
    }

    /// Uses `embedder` instead of loading the configured model.
    #[cfg(test)]
    pub fn with_embedder(mut self, embedder: Box<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn handle_command(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Run { clusters, force } => {
                let mode = self.cluster_mode(clusters, None);
                let report = self.run(mode, force)?;
                print_rebuild(&report);
            }

            Command::Import { folders } => {
                let folders = if folders.is_empty() {
                    vec![self.prefs.csv_dir()]
                } else {
                    folders
                };
                for folder in &folders {
                    let report = self.import_folder(folder)?;
                    print_import(folder, &report);
                }
            }

            Command::Keywords => {
                let count = self.generate_unique_keywords()?.len();
                let path = self.save_unique_keywords()?;
                println!("Saved {} unique keywords to {}", count, path.display());
            }

            Command::Cluster {
                clusters,
                distance_threshold,
            } => {
                let mode = self.cluster_mode(clusters, distance_threshold);
                let count = self.generate_groups(mode, false)?.len();
                let path = self.save_groups()?;
                println!("Saved {} groups to {}", count, path.display());
            }

            Command::Merge { names, new_name } => {
                let regrouped = self.merge(&names, &new_name)?;
                let members = self.groups.as_ref().and_then(|g| g.get(&new_name)).map_or(0, |m| m.len());
                println!("Merged {} groups into '{}' ({} keywords)", names.len(), new_name, members);
                if let Some(report) = regrouped {
                    println!("Database now has {} groups", report.groups);
                }
            }

            Command::BuildDb => {
                let report = self.build_database()?;
                print_rebuild(&report);
            }

            Command::RegroupDb => {
                let report = self.regroup_database()?;
                println!(
                    "Database regrouped: {} groups, {} keywords re-pointed",
                    report.groups, report.keywords_repointed
                );
            }

            Command::DeleteDb => {
                if self.repository.delete()? {
                    println!("Deleted {}", self.repository.path().display());
                } else {
                    println!("No database at {}", self.repository.path().display());
                }
            }

            Command::Trends { limit, from, to } => {
                let years = self.year_range(from, to)?;
                let path = self.prefs.plot_dir().join(trend_file_name(limit, years));
                let mut renderer = CsvTrendReport::new(path);
                if let Some(path) = self.trends(limit, years, &mut renderer)? {
                    println!("Saved trends to {}", path.display());
                }
            }

            Command::Table { limit } => {
                let table = self.repository.group_year_table(limit)?;
                print_group_year_table(&table);
            }

            Command::Ban { group } => {
                if self.ban(&group)? {
                    println!("'{}' is now hidden from trend reports", group);
                } else {
                    println!("'{}' was already hidden", group);
                }
            }

            Command::Unban { group } => {
                if self.unban(&group)? {
                    println!("'{}' is shown in trend reports again", group);
                } else {
                    println!("'{}' was not hidden", group);
                }
            }

            Command::Status => self.print_status()?,
        }

        Ok(())
    }

    fn cluster_mode(&self, clusters: usize, distance_threshold: Option<f64>) -> ClusterMode {
        ClusterMode::from_request(
            clusters,
            distance_threshold.unwrap_or(self.prefs.clustering.distance_threshold),
        )
    }

    fn checkpoint_path(&self, file: &str) -> PathBuf {
        self.prefs.output_dir().join(file)
    }

    // Import

    /// Imports every CSV in `dir` after the papers already held, then drops
    /// repeated titles across the whole corpus.
    pub fn import_folder(&mut self, dir: &Path) -> Result<ImportReport> {
        let options = ImportOptions::new(
            &self.prefs.csv_import_column_names,
            &self.prefs.csv_format,
            &self.prefs.excluded_keywords,
        )?;
        let (import, files) = corpus::import_folder(dir, &options)?;

        let mut combined = std::mem::take(&mut self.papers);
        combined.extend(import.papers);
        let (papers, duplicates_removed) = merge_and_deduplicate(combined);
        self.papers = papers;
        // The corpus changed, so derived lists are stale.
        self.unique_keywords = None;

        let report = ImportReport {
            files,
            rows_read: import.rows_read,
            malformed_rows: import.malformed_rows,
            papers: self.papers.len(),
            duplicates_removed,
        };
        tracing::info!(
            "Imported {} files from {}: {} papers, {} duplicates removed",
            report.files,
            dir.display(),
            report.papers,
            report.duplicates_removed
        );
        Ok(report)
    }

    fn ensure_papers(&mut self) -> Result<()> {
        if self.papers.is_empty() {
            let dir = self.prefs.csv_dir();
            self.import_folder(&dir)?;
        }
        Ok(())
    }

    // Keywords

    pub fn generate_unique_keywords(&mut self) -> Result<&[String]> {
        self.ensure_papers()?;
        let excluded: HashSet<String> = self
            .prefs
            .excluded_keywords
            .at_csv_import
            .iter()
            .cloned()
            .collect();
        let keywords = unique_keywords(&self.papers, &excluded);
        tracing::info!("Found {} unique keywords", keywords.len());
        let keywords = self.unique_keywords.insert(keywords);
        Ok(keywords.as_slice())
    }

    pub fn save_unique_keywords(&self) -> Result<PathBuf> {
        let keywords = self
            .unique_keywords
            .as_ref()
            .ok_or_else(|| AppError::Precondition("No unique keywords to save".to_string()))?;
        let path = self.checkpoint_path(UNIQUE_KEYWORDS_FILE);
        write_json(keywords, &path, true)?;
        Ok(path)
    }

    /// Returns whether a checkpoint was found.
    pub fn load_unique_keywords(&mut self) -> Result<bool> {
        let loaded: Option<Vec<String>> = read_json(&self.checkpoint_path(UNIQUE_KEYWORDS_FILE))?;
        let found = loaded.is_some();
        if found {
            self.unique_keywords = loaded;
        }
        Ok(found)
    }

    /// The held list, else the checkpoint, else a freshly generated and saved
    /// list. `force` always regenerates.
    fn keywords_for_clustering(&mut self, force: bool) -> Result<Vec<String>> {
        if !force {
            if let Some(keywords) = &self.unique_keywords {
                return Ok(keywords.clone());
            }
            if self.load_unique_keywords()? {
                return Ok(self.unique_keywords.clone().unwrap_or_default());
            }
        }
        let keywords = self.generate_unique_keywords()?.to_vec();
        self.save_unique_keywords()?;
        Ok(keywords)
    }

    // Groups

    fn embedder(&mut self) -> Result<&mut (dyn Embedder + 'static)> {
        if self.embedder.is_none() {
            self.embedder = Some(load_embedder(&self.prefs.clustering)?);
        }
        self.embedder
            .as_deref_mut()
            .ok_or_else(|| AppError::MissingCapability("No embedding backend".to_string()))
    }

    pub fn generate_groups(&mut self, mode: ClusterMode, force_keywords: bool) -> Result<&KeywordGroups> {
        let keywords = self.keywords_for_clustering(force_keywords)?;
        let groups = cluster(&keywords, mode, self.embedder()?)?;
        Ok(&*self.groups.insert(groups))
    }

    pub fn save_groups(&self) -> Result<PathBuf> {
        let groups = self
            .groups
            .as_ref()
            .ok_or_else(|| AppError::Precondition("No keyword groups to save".to_string()))?;
        let path = self.checkpoint_path(KEYWORD_GROUPS_FILE);
        write_json(groups, &path, true)?;
        Ok(path)
    }

    pub fn load_groups(&mut self) -> Result<bool> {
        let loaded: Option<KeywordGroups> = read_json(&self.checkpoint_path(KEYWORD_GROUPS_FILE))?;
        let found = loaded.is_some();
        if found {
            self.groups = loaded;
        }
        Ok(found)
    }

    fn require_groups(&mut self) -> Result<KeywordGroups> {
        if self.groups.is_none() && !self.load_groups()? {
            return Err(AppError::Precondition(
                "No keyword groups yet, run `cluster` first".to_string(),
            ));
        }
        Ok(self.groups.clone().unwrap_or_default())
    }

    /// Merges groups in the saved map and, when a database exists, rewrites
    /// its groups to match.
    pub fn merge(&mut self, names: &[String], new_name: &str) -> Result<Option<RegroupReport>> {
        let groups = merge_groups(&self.require_groups()?, names, new_name)?;
        self.groups = Some(groups);
        self.save_groups()?;

        if self.repository.is_created() {
            return self.regroup_database().map(Some);
        }
        Ok(None)
    }

    // Database

    pub fn build_database(&mut self) -> Result<RebuildReport> {
        let groups = self.require_groups()?;
        if groups.is_empty() {
            tracing::warn!("Keyword group map is empty, papers will have no groups");
        }
        self.ensure_papers()?;
        self.repository.rebuild(&self.papers, &groups)
    }

    pub fn regroup_database(&mut self) -> Result<RegroupReport> {
        let groups = self.require_groups()?;
        if !self.repository.is_created() {
            return Err(AppError::Precondition(
                "No database yet, run `build-db` first".to_string(),
            ));
        }
        self.repository.regroup(&groups)
    }

    /// Full pipeline. Existing checkpoints are reused unless `force` is set.
    pub fn run(&mut self, mode: ClusterMode, force: bool) -> Result<RebuildReport> {
        self.ensure_papers()?;
        if force || !self.load_groups()? {
            self.generate_groups(mode, force)?;
            self.save_groups()?;
        }
        self.build_database()
    }

    // Reports

    /// Years spanned by the stored papers unless given explicitly.
    fn year_range(&self, from: Option<i32>, to: Option<i32>) -> Result<YearRange> {
        if let (Some(start), Some(end)) = (from, to) {
            return Ok(YearRange::new(start, end));
        }
        let years = self.repository.unique_years()?;
        let (Some(first), Some(last)) = (years.first(), years.last()) else {
            return Err(AppError::Precondition("The database has no papers".to_string()));
        };
        Ok(YearRange::new(from.unwrap_or(*first), to.unwrap_or(*last)))
    }

    /// Year-by-year counts, across all years, of the `limit` largest groups
    /// within `years`, minus the plot exclusion list.
    pub fn trend_rows(&self, limit: usize, years: YearRange) -> Result<Vec<GroupTrend>> {
        let excluded = &self.prefs.excluded_keywords.in_plot;
        let names: Vec<String> = self
            .repository
            .top_groups(Some(limit), years, excluded)?
            .into_iter()
            .map(|group| group.name)
            .collect();
        let rows = self
            .repository
            .trends_of_groups(&names, YearRange::unbounded(), excluded)?;
        Ok(without_excluded(rows, excluded))
    }

    pub fn trends(
        &self,
        limit: usize,
        years: YearRange,
        renderer: &mut dyn TrendRenderer,
    ) -> Result<Option<PathBuf>> {
        let rows = self.trend_rows(limit, years)?;
        renderer.render(&trends_title(limit, years), &rows)
    }

    // Preferences

    pub fn ban(&mut self, group: &str) -> Result<bool> {
        let changed = self.prefs.exclude_from_plot(group);
        if changed {
            self.prefs.save(&self.prefs_path)?;
        }
        Ok(changed)
    }

    pub fn unban(&mut self, group: &str) -> Result<bool> {
        let changed = self.prefs.include_in_plot(group);
        if changed {
            self.prefs.save(&self.prefs_path)?;
        }
        Ok(changed)
    }

    fn print_status(&mut self) -> Result<()> {
        println!("Preferences: {}", self.prefs_path.display());
        println!("CSV folder:  {}", self.prefs.csv_dir().display());

        match read_json::<Vec<String>>(&self.checkpoint_path(UNIQUE_KEYWORDS_FILE))? {
            Some(keywords) => println!("Unique keywords: {}", keywords.len()),
            None => println!("Unique keywords: not generated"),
        }
        if self.load_groups()? {
            let count = self.groups.as_ref().map_or(0, KeywordGroups::len);
            println!("Keyword groups: {}", count);
        } else {
            println!("Keyword groups: not generated");
        }

        if self.repository.is_created() {
            let StoreCounts {
                papers,
                groups,
                keywords,
                links,
            } = self.repository.counts()?;
            println!(
                "Database {}: {} papers, {} groups, {} keywords, {} links",
                self.repository.path().display(),
                papers,
                groups,
                keywords,
                links
            );
        } else {
            println!("Database: not created");
        }

        let hidden = &self.prefs.excluded_keywords.in_plot;
        if !hidden.is_empty() {
            println!("Hidden from trends: {}", hidden.join(", "));
        }
        Ok(())
    }
}

fn print_import(folder: &Path, report: &ImportReport) {
    println!(
        "{}: {} files, {} rows, {} malformed, {} papers after removing {} duplicates",
        folder.display(),
        report.files,
        report.rows_read,
        report.malformed_rows,
        report.papers,
        report.duplicates_removed
    );
}

fn print_rebuild(report: &RebuildReport) {
    println!(
        "Database built: {} papers, {} groups, {} keywords, {} links",
        report.papers, report.groups, report.keywords, report.links
    );
    if !report.dangling.is_empty() {
        println!("{} keyword references had no group and were skipped", report.dangling.len());
    }
}

fn print_group_year_table(table: &GroupYearTable) {
    let width = table
        .rows
        .iter()
        .map(|row| row.name.chars().count())
        .chain(std::iter::once("group".len()))
        .max()
        .unwrap_or(0);

    let mut header = format!("{:<width$}  {:>6}", "group", "total");
    for year in &table.years {
        header.push_str(&format!("  {:>6}", year));
    }
    println!("{}", header);

    for row in &table.rows {
        let mut line = format!("{:<width$}  {:>6}", row.name, row.total_paper_count);
        for count in &row.paper_counts {
            line.push_str(&format!("  {:>6}", count));
        }
        println!("{}", line);
    }
}
