use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const APP_DIR: &str = "keyword-trends";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paths {
    #[serde(default)]
    pub root_folder: Option<String>,
    #[serde(default)]
    pub csv_folder: Option<String>,
    #[serde(default)]
    pub output_files_folder: Option<String>,
    #[serde(default)]
    pub plot_folder: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExcludedKeywords {
    #[serde(default, rename = "excluded_keywords_at_csv_import")]
    pub at_csv_import: Vec<String>,
    #[serde(default, rename = "excluded_starting_by_keywords_at_csv_import")]
    pub starting_by_at_csv_import: Vec<String>,
    /// Group names hidden from top-group queries and trend reports.
    #[serde(default, rename = "excluded_keywords_in_plot")]
    pub in_plot: Vec<String>,
}

/// Physical CSV header for each logical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnNames {
    #[serde(default = "default_title_column")]
    pub title: String,
    #[serde(default = "default_year_column")]
    pub publication_year: String,
    #[serde(default = "default_keywords_column")]
    pub keywords: String,
}

fn default_title_column() -> String {
    "title".to_string()
}

fn default_year_column() -> String {
    "publication_year".to_string()
}

fn default_keywords_column() -> String {
    "keywords".to_string()
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            title: default_title_column(),
            publication_year: default_year_column(),
            keywords: default_keywords_column(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvFormat {
    #[serde(default = "default_keyword_separator")]
    pub keyword_separator: String,
    #[serde(default = "default_separator")]
    pub separator: String,
    #[serde(default = "default_has_header")]
    pub has_header: bool,
}

fn default_keyword_separator() -> String {
    ";".to_string()
}

fn default_separator() -> String {
    ",".to_string()
}

fn default_has_header() -> bool {
    true
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            keyword_separator: default_keyword_separator(),
            separator: default_separator(),
            has_header: default_has_header(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringSettings {
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_distance_threshold")]
    pub distance_threshold: f64,
    #[serde(default)]
    pub model_cache_dir: Option<String>,
}

fn default_embedding_model() -> String {
    "all-minilm-l6-v2".to_string()
}

fn default_distance_threshold() -> f64 {
    1.9
}

impl Default for ClusteringSettings {
    fn default() -> Self {
        Self {
            embedding_model: default_embedding_model(),
            distance_threshold: default_distance_threshold(),
            model_cache_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub excluded_keywords: ExcludedKeywords,
    #[serde(default)]
    pub csv_import_column_names: ColumnNames,
    #[serde(default)]
    pub csv_format: CsvFormat,
    #[serde(default)]
    pub clustering: ClusteringSettings,
    #[serde(default)]
    pub database_path: Option<String>,
}

fn app_dir(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR)
}

impl Preferences {
    /// Loads preferences from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            tracing::info!("No preferences at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        app_dir(dirs::config_dir()).join("preferences.json")
    }

    fn root(&self) -> PathBuf {
        self.paths
            .root_folder
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn resolve(&self, folder: Option<&str>) -> PathBuf {
        self.root().join(folder.unwrap_or(""))
    }

    pub fn csv_dir(&self) -> PathBuf {
        self.resolve(self.paths.csv_folder.as_deref())
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(self.paths.output_files_folder.as_deref())
    }

    pub fn plot_dir(&self) -> PathBuf {
        self.output_dir().join(self.paths.plot_folder.as_deref().unwrap_or(""))
    }

    pub fn database_path(&self) -> PathBuf {
        match &self.database_path {
            Some(path) => self.root().join(path),
            None => app_dir(dirs::data_dir()).join("review.db"),
        }
    }

    /// Adds a group name to the plot exclusion list. Returns false if it was
    /// already there.
    pub fn exclude_from_plot(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.excluded_keywords.in_plot.iter().any(|n| n == name) {
            return false;
        }
        self.excluded_keywords.in_plot.push(name.to_string());
        self.excluded_keywords.in_plot.sort();
        true
    }

    pub fn include_in_plot(&mut self, name: &str) -> bool {
        let before = self.excluded_keywords.in_plot.len();
        self.excluded_keywords.in_plot.retain(|n| n != name.trim());
        self.excluded_keywords.in_plot.len() != before
    }
}
