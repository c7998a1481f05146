use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OpenFlags, Row, Transaction};

use crate::error::{AppError, Result};
use crate::models::{KeywordGroups, Paper};

use super::schema::{DROP_SCHEMA, GROUP_PAPER_JOIN, SCHEMA};
use super::YearRange;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    pub name: String,
    pub unique_paper_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTrend {
    pub name: String,
    pub publication_year: i32,
    pub unique_paper_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupYearRow {
    pub name: String,
    pub total_paper_count: i64,
    /// One entry per year of [`GroupYearTable::years`].
    pub paper_counts: Vec<i64>,
}

/// Distinct papers per group, split into one column per publication year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupYearTable {
    pub years: Vec<i32>,
    pub rows: Vec<GroupYearRow>,
}

/// A paper keyword with no Keyword row; its link was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingKeyword {
    pub paper_title: String,
    pub keyword: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildReport {
    pub papers: usize,
    pub groups: usize,
    pub keywords: usize,
    pub links: usize,
    pub dangling: Vec<DanglingKeyword>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegroupReport {
    pub groups: usize,
    pub keywords_repointed: usize,
    pub keywords_not_stored: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub papers: i64,
    pub groups: i64,
    pub keywords: i64,
    pub links: i64,
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn text_values(items: &[String]) -> impl Iterator<Item = Value> + '_ {
    items.iter().map(|s| Value::Text(s.clone()))
}

fn limit_value(limit: Option<usize>) -> Option<Value> {
    limit.filter(|l| *l > 0).map(|l| Value::Integer(l as i64))
}

/// Single-file SQLite store. Every call opens its own connection and closes
/// it before returning.
pub struct Repository {
    db_path: PathBuf,
}

impl Repository {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn is_created(&self) -> bool {
        self.db_path.is_file()
    }

    /// Removes the database file. Returns whether there was one.
    pub fn delete(&self) -> Result<bool> {
        if !self.is_created() {
            return Ok(false);
        }
        std::fs::remove_file(&self.db_path)?;
        tracing::info!("Deleted database {}", self.db_path.display());
        Ok(true)
    }

    fn unavailable(&self, source: rusqlite::Error) -> AppError {
        AppError::StoreUnavailable {
            path: self.db_path.clone(),
            source,
        }
    }

    fn configure(&self, conn: Connection) -> Result<Connection> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| self.unavailable(e))?;
        Ok(conn)
    }

    /// Opens (creating if needed) for a rebuild.
    fn open_for_write(&self) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.db_path).map_err(|e| self.unavailable(e))?;
        self.configure(conn)
    }

    /// Opens an existing database; a missing file is an error rather than an
    /// empty new database.
    fn open_existing(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| self.unavailable(e))?;
        self.configure(conn)
    }

    // Rebuild

    /// Drops and recreates all tables, then loads papers, groups, keywords and
    /// paper-keyword links in one transaction.
    ///
    /// Paper keywords that belong to no group have no Keyword row; those links
    /// are skipped and listed in the report.
    pub fn rebuild(&self, papers: &[Paper], groups: &KeywordGroups) -> Result<RebuildReport> {
        let mut conn = self.open_for_write()?;
        let tx = conn.transaction()?;

        tx.execute_batch(DROP_SCHEMA)?;
        tx.execute_batch(SCHEMA)?;

        let mut report = RebuildReport::default();

        let paper_ids = insert_papers(&tx, papers)?;
        report.papers = paper_ids.len();

        let group_ids = insert_groups(&tx, groups)?;
        report.groups = group_ids.len();

        let keyword_ids = insert_keywords(&tx, groups, &group_ids)?;
        report.keywords = keyword_ids.len();

        {
            let mut stmt = tx.prepare("INSERT INTO Paper_Keyword (paper_id, keyword_id) VALUES (?1, ?2)")?;
            for (paper, paper_id) in papers.iter().zip(&paper_ids) {
                for keyword in &paper.keywords {
                    match keyword_ids.get(keyword.as_str()) {
                        Some(keyword_id) => {
                            stmt.execute(params![paper_id, keyword_id])?;
                            report.links += 1;
                        }
                        None => {
                            tracing::debug!("Keyword not found: {} (paper '{}')", keyword, paper.title);
                            report.dangling.push(DanglingKeyword {
                                paper_title: paper.title.clone(),
                                keyword: keyword.clone(),
                            });
                        }
                    }
                }
            }
        }

        tx.commit()?;

        if !report.dangling.is_empty() {
            tracing::warn!(
                "Skipped {} paper keyword links with no keyword row",
                report.dangling.len()
            );
        }
        tracing::info!(
            "Rebuilt database: {} papers, {} groups, {} keywords, {} links",
            report.papers,
            report.groups,
            report.keywords,
            report.links
        );
        Ok(report)
    }

    /// Replaces the group table and re-points keywords, leaving papers and
    /// links untouched. Keywords in no group end up with a NULL group.
    pub fn regroup(&self, groups: &KeywordGroups) -> Result<RegroupReport> {
        let mut conn = self.open_existing()?;
        let tx = conn.transaction()?;

        tx.execute("UPDATE Keyword SET group_id = NULL", [])?;
        tx.execute("DELETE FROM KeywordGroup", [])?;

        let group_ids = insert_groups(&tx, groups)?;
        let mut report = RegroupReport {
            groups: group_ids.len(),
            ..Default::default()
        };

        {
            let mut stmt = tx.prepare("UPDATE Keyword SET group_id = ?1 WHERE name = ?2")?;
            for (name, members) in groups.iter() {
                let group_id = group_ids[name];
                for keyword in members {
                    if stmt.execute(params![group_id, keyword])? > 0 {
                        report.keywords_repointed += 1;
                    } else {
                        report.keywords_not_stored += 1;
                    }
                }
            }
        }

        tx.commit()?;
        tracing::info!(
            "Regrouped database: {} groups, {} keywords re-pointed",
            report.groups,
            report.keywords_repointed
        );
        Ok(report)
    }

    // Queries

    pub fn counts(&self) -> Result<StoreCounts> {
        let conn = self.open_existing()?;
        let count = |table: &str| -> Result<i64> {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?)
        };
        Ok(StoreCounts {
            papers: count("Paper")?,
            groups: count("KeywordGroup")?,
            keywords: count("Keyword")?,
            links: count("Paper_Keyword")?,
        })
    }

    pub fn unique_years(&self) -> Result<Vec<i32>> {
        let conn = self.open_existing()?;
        query_unique_years(&conn)
    }

    /// Groups ranked by the number of distinct papers published within
    /// `years`, excluding `excluded` names. A limit of `None` or zero keeps
    /// every row.
    pub fn top_groups(
        &self,
        limit: Option<usize>,
        years: YearRange,
        excluded: &[String],
    ) -> Result<Vec<GroupCount>> {
        let mut sql = format!(
            "SELECT KeywordGroup.name, COUNT(DISTINCT Paper.paper_id) AS unique_paper_count {} \
             WHERE Paper.publication_year >= ? AND Paper.publication_year <= ?",
            GROUP_PAPER_JOIN
        );
        let mut values = vec![
            Value::Integer(years.start.into()),
            Value::Integer(years.end.into()),
        ];
        if !excluded.is_empty() {
            sql.push_str(&format!(" AND KeywordGroup.name NOT IN ({})", placeholders(excluded.len())));
            values.extend(text_values(excluded));
        }
        sql.push_str(" GROUP BY KeywordGroup.name ORDER BY unique_paper_count DESC, KeywordGroup.name");
        if let Some(limit) = limit_value(limit) {
            sql.push_str(" LIMIT ?");
            values.push(limit);
        }

        let conn = self.open_existing()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), group_count_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Distinct papers per (group, year) for `names` minus `excluded`,
    /// ordered by count ascending, then name, then year.
    pub fn trends_of_groups(
        &self,
        names: &[String],
        years: YearRange,
        excluded: &[String],
    ) -> Result<Vec<GroupTrend>> {
        let selected: Vec<String> = names
            .iter()
            .filter(|name| !excluded.contains(name))
            .cloned()
            .collect();
        if selected.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT KeywordGroup.name, Paper.publication_year, COUNT(DISTINCT Paper.paper_id) AS unique_paper_count {} \
             WHERE KeywordGroup.name IN ({}) \
             AND Paper.publication_year >= ? AND Paper.publication_year <= ? \
             GROUP BY KeywordGroup.name, Paper.publication_year \
             ORDER BY unique_paper_count, KeywordGroup.name, Paper.publication_year",
            GROUP_PAPER_JOIN,
            placeholders(selected.len())
        );
        let values: Vec<Value> = text_values(&selected)
            .chain([
                Value::Integer(years.start.into()),
                Value::Integer(years.end.into()),
            ])
            .collect();

        let conn = self.open_existing()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), group_trend_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Total distinct papers per group plus one count column per distinct
    /// publication year in the store, ranked by total.
    pub fn group_year_table(&self, limit: Option<usize>) -> Result<GroupYearTable> {
        let conn = self.open_existing()?;
        let years = query_unique_years(&conn)?;

        let year_columns: String = years
            .iter()
            .map(|year| {
                format!(
                    ", COUNT(DISTINCT CASE WHEN Paper.publication_year = ? THEN Paper.paper_id END) AS paper_count_{}",
                    year
                )
            })
            .collect();
        let mut sql = format!(
            "SELECT KeywordGroup.name, COUNT(DISTINCT Paper.paper_id) AS total_paper_count{} {} \
             GROUP BY KeywordGroup.name ORDER BY total_paper_count DESC, KeywordGroup.name",
            year_columns, GROUP_PAPER_JOIN
        );
        let mut values: Vec<Value> = years.iter().map(|y| Value::Integer((*y).into())).collect();
        if let Some(limit) = limit_value(limit) {
            sql.push_str(" LIMIT ?");
            values.push(limit);
        }

        let mut stmt = conn.prepare(&sql)?;
        let year_count = years.len();
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                let paper_counts = (0..year_count)
                    .map(|i| row.get::<_, i64>(i + 2))
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(GroupYearRow {
                    name: row.get(0)?,
                    total_paper_count: row.get(1)?,
                    paper_counts,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(GroupYearTable { years, rows })
    }
}

/// Inserts papers in input order and returns their ids in the same order.
fn insert_papers(tx: &Transaction, papers: &[Paper]) -> Result<Vec<i64>> {
    let mut stmt = tx.prepare("INSERT INTO Paper (title, publication_year) VALUES (?1, ?2)")?;
    let mut ids = Vec::with_capacity(papers.len());
    for paper in papers {
        stmt.execute(params![paper.title, paper.publication_year])?;
        ids.push(tx.last_insert_rowid());
    }
    Ok(ids)
}

fn insert_groups(tx: &Transaction, groups: &KeywordGroups) -> Result<HashMap<String, i64>> {
    let mut stmt = tx.prepare("INSERT INTO KeywordGroup (name) VALUES (?1)")?;
    let mut ids = HashMap::with_capacity(groups.len());
    for name in groups.names() {
        stmt.execute(params![name])?;
        ids.insert(name.to_string(), tx.last_insert_rowid());
    }
    Ok(ids)
}

/// One Keyword row per distinct member keyword. A keyword listed under two
/// groups stays with the first one.
fn insert_keywords(
    tx: &Transaction,
    groups: &KeywordGroups,
    group_ids: &HashMap<String, i64>,
) -> Result<HashMap<String, i64>> {
    let mut stmt = tx.prepare("INSERT INTO Keyword (name, group_id) VALUES (?1, ?2)")?;
    let mut ids: HashMap<String, i64> = HashMap::with_capacity(groups.keyword_count());
    for (name, members) in groups.iter() {
        let group_id = group_ids[name];
        for keyword in members {
            if ids.contains_key(keyword) {
                tracing::warn!("Keyword '{}' is in more than one group, keeping the first", keyword);
                continue;
            }
            stmt.execute(params![keyword, group_id])?;
            ids.insert(keyword.clone(), tx.last_insert_rowid());
        }
    }
    Ok(ids)
}

fn query_unique_years(conn: &Connection) -> Result<Vec<i32>> {
    let mut stmt = conn.prepare("SELECT DISTINCT publication_year FROM Paper ORDER BY publication_year ASC")?;
    let years = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<i32>, _>>()?;
    Ok(years)
}

fn group_count_from_row(row: &Row) -> rusqlite::Result<GroupCount> {
    Ok(GroupCount {
        name: row.get(0)?,
        unique_paper_count: row.get(1)?,
    })
}

fn group_trend_from_row(row: &Row) -> rusqlite::Result<GroupTrend> {
    Ok(GroupTrend {
        name: row.get(0)?,
        publication_year: row.get(1)?,
        unique_paper_count: row.get(2)?,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::new(dir.path().join("review.db"));
        (dir, repo)
    }

    fn corpus() -> (Vec<Paper>, KeywordGroups) {
        let papers = vec![
            Paper::new("P1", 2021, ["ai", "ml"]),
            Paper::new("P2", 2022, ["ai", "iot"]),
            Paper::new("P3", 2022, ["ml", "blockchain"]),
            Paper::new("P4", 2023, ["iot", "edge"]),
            Paper::new("P5", 2023, ["ai"]),
            Paper::new("P6", 2023, ["ledger"]),
        ];
        let mut groups = KeywordGroups::new();
        groups.insert("ai", set(&["ai", "ml"]));
        groups.insert("iot", set(&["iot", "edge"]));
        groups.insert("blockchain", set(&["blockchain", "ledger"]));
        (papers, groups)
    }

    #[test]
    fn test_top_groups_example() {
        let (_dir, repo) = repo();
        let papers = vec![Paper::new("A", 2023, ["ai", "ml"]), Paper::new("B", 2024, ["ai"])];
        let mut groups = KeywordGroups::new();
        groups.insert("ai", set(&["ai", "ml"]));

        repo.rebuild(&papers, &groups).unwrap();
        let top = repo.top_groups(Some(10), YearRange::new(2023, 2024), &[]).unwrap();
        assert_eq!(
            top,
            vec![GroupCount {
                name: "ai".to_string(),
                unique_paper_count: 2
            }]
        );
    }

    #[test]
    fn test_rebuild_round_trip_counts_distinct_papers() {
        let (_dir, repo) = repo();
        let (papers, groups) = corpus();
        let report = repo.rebuild(&papers, &groups).unwrap();

        assert_eq!(report.papers, 6);
        assert_eq!(report.groups, 3);
        assert_eq!(report.keywords, 6);
        assert_eq!(report.links, 10);
        assert!(report.dangling.is_empty());

        let top = repo.top_groups(None, YearRange::unbounded(), &[]).unwrap();
        let as_pairs: Vec<(&str, i64)> = top.iter().map(|g| (g.name.as_str(), g.unique_paper_count)).collect();
        // P1 counts once for "ai" even though it has two of its keywords
        assert_eq!(as_pairs, vec![("ai", 4), ("blockchain", 2), ("iot", 2)]);

        for row in &top {
            let members = groups.get(&row.name).unwrap();
            let expected = papers
                .iter()
                .filter(|p| p.keywords.iter().any(|k| members.contains(k)))
                .count() as i64;
            assert_eq!(row.unique_paper_count, expected);
        }
    }

    #[test]
    fn test_top_groups_filters_years_exclusions_and_limit() {
        let (_dir, repo) = repo();
        let (papers, groups) = corpus();
        repo.rebuild(&papers, &groups).unwrap();

        let in_2023 = repo.top_groups(Some(0), YearRange::new(2023, 2023), &[]).unwrap();
        let as_pairs: Vec<(&str, i64)> = in_2023.iter().map(|g| (g.name.as_str(), g.unique_paper_count)).collect();
        assert_eq!(as_pairs, vec![("ai", 1), ("blockchain", 1), ("iot", 1)]);

        let excluded = repo
            .top_groups(None, YearRange::unbounded(), &names(&["ai", "unknown"]))
            .unwrap();
        assert!(excluded.iter().all(|g| g.name != "ai"));
        assert_eq!(excluded.len(), 2);

        let limited = repo.top_groups(Some(1), YearRange::unbounded(), &[]).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].name, "ai");
    }

    #[test]
    fn test_exclusion_names_are_bound_not_spliced() {
        let (_dir, repo) = repo();
        let (papers, groups) = corpus();
        repo.rebuild(&papers, &groups).unwrap();

        let hostile = names(&["x\") OR 1=1 --", "'; DROP TABLE Paper; --"]);
        let top = repo.top_groups(None, YearRange::unbounded(), &hostile).unwrap();
        assert_eq!(top.len(), 3);
        assert_eq!(repo.counts().unwrap().papers, 6);
    }

    #[test]
    fn test_trends_order_by_count_then_name_then_year() {
        let (_dir, repo) = repo();
        let (papers, groups) = corpus();
        repo.rebuild(&papers, &groups).unwrap();

        let trends = repo
            .trends_of_groups(&names(&["ai", "iot", "blockchain"]), YearRange::unbounded(), &names(&["blockchain"]))
            .unwrap();
        let rows: Vec<(&str, i32, i64)> = trends
            .iter()
            .map(|t| (t.name.as_str(), t.publication_year, t.unique_paper_count))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("ai", 2021, 1),
                ("ai", 2023, 1),
                ("iot", 2022, 1),
                ("iot", 2023, 1),
                ("ai", 2022, 2),
            ]
        );

        let narrowed = repo
            .trends_of_groups(&names(&["ai"]), YearRange::new(2022, 2022), &[])
            .unwrap();
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].publication_year, 2022);
    }

    #[test]
    fn test_trends_ascending_count_puts_busy_years_last() {
        let (_dir, repo) = repo();
        let papers = vec![
            Paper::new("A", 2020, ["x"]),
            Paper::new("B", 2021, ["x"]),
            Paper::new("C", 2021, ["x"]),
            Paper::new("D", 2020, ["y"]),
        ];
        let mut groups = KeywordGroups::new();
        groups.insert("x", set(&["x"]));
        groups.insert("y", set(&["y"]));
        repo.rebuild(&papers, &groups).unwrap();

        let trends = repo
            .trends_of_groups(&names(&["x", "y"]), YearRange::unbounded(), &[])
            .unwrap();
        let rows: Vec<(&str, i32, i64)> = trends
            .iter()
            .map(|t| (t.name.as_str(), t.publication_year, t.unique_paper_count))
            .collect();
        assert_eq!(rows, vec![("x", 2020, 1), ("y", 2020, 1), ("x", 2021, 2)]);
    }

    #[test]
    fn test_trends_with_everything_excluded_is_empty() {
        let (_dir, repo) = repo();
        let (papers, groups) = corpus();
        repo.rebuild(&papers, &groups).unwrap();

        assert!(repo.trends_of_groups(&[], YearRange::unbounded(), &[]).unwrap().is_empty());
        assert!(repo
            .trends_of_groups(&names(&["ai"]), YearRange::unbounded(), &names(&["ai"]))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_rebuild_reports_dangling_keywords() {
        let (_dir, repo) = repo();
        let papers = vec![Paper::new("A", 2020, ["kept", "dropped"])];
        let mut groups = KeywordGroups::new();
        groups.insert("kept", set(&["kept"]));

        let report = repo.rebuild(&papers, &groups).unwrap();
        assert_eq!(report.links, 1);
        assert_eq!(
            report.dangling,
            vec![DanglingKeyword {
                paper_title: "A".to_string(),
                keyword: "dropped".to_string()
            }]
        );
    }

    #[test]
    fn test_rebuild_discards_previous_contents() {
        let (_dir, repo) = repo();
        let (papers, groups) = corpus();
        repo.rebuild(&papers, &groups).unwrap();

        let mut small = KeywordGroups::new();
        small.insert("ai", set(&["ai"]));
        repo.rebuild(&papers[..1], &small).unwrap();

        assert_eq!(
            repo.counts().unwrap(),
            StoreCounts {
                papers: 1,
                groups: 1,
                keywords: 1,
                links: 1
            }
        );
        let top = repo.top_groups(None, YearRange::unbounded(), &[]).unwrap();
        assert_eq!(top.len(), 1);
    }

    #[test]
    fn test_paper_ids_follow_input_order() {
        let (_dir, repo) = repo();
        let (papers, groups) = corpus();
        repo.rebuild(&papers, &groups).unwrap();

        let conn = Connection::open(repo.path()).unwrap();
        let titles: Vec<String> = conn
            .prepare("SELECT title FROM Paper ORDER BY paper_id")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(titles, names(&["P1", "P2", "P3", "P4", "P5", "P6"]));
    }

    #[test]
    fn test_regroup_repoints_keywords() {
        let (_dir, repo) = repo();
        let (papers, mut groups) = corpus();
        repo.rebuild(&papers, &groups).unwrap();

        groups.merge(&names(&["iot", "blockchain"]), "infrastructure").unwrap();
        let mut with_new = groups.clone();
        with_new.insert("quantum", set(&["qubit"]));
        let report = repo.regroup(&with_new).unwrap();

        assert_eq!(report.groups, 3);
        assert_eq!(report.keywords_repointed, 6);
        assert_eq!(report.keywords_not_stored, 1);

        let top = repo.top_groups(None, YearRange::unbounded(), &[]).unwrap();
        let as_pairs: Vec<(&str, i64)> = top.iter().map(|g| (g.name.as_str(), g.unique_paper_count)).collect();
        assert_eq!(as_pairs, vec![("ai", 4), ("infrastructure", 4)]);
        assert_eq!(repo.counts().unwrap().links, 10);
    }

    #[test]
    fn test_group_year_table_has_a_column_per_year() {
        let (_dir, repo) = repo();
        let (papers, groups) = corpus();
        repo.rebuild(&papers, &groups).unwrap();

        let table = repo.group_year_table(None).unwrap();
        assert_eq!(table.years, vec![2021, 2022, 2023]);
        assert_eq!(
            table.rows[0],
            GroupYearRow {
                name: "ai".to_string(),
                total_paper_count: 4,
                paper_counts: vec![1, 2, 1],
            }
        );
        assert_eq!(table.rows.len(), 3);

        let top_one = repo.group_year_table(Some(1)).unwrap();
        assert_eq!(top_one.rows.len(), 1);
    }

    #[test]
    fn test_queries_without_database_fail_cleanly() {
        let (_dir, repo) = repo();
        assert!(!repo.is_created());
        let err = repo.top_groups(None, YearRange::unbounded(), &[]).unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable { .. }));
        assert!(!repo.is_created(), "a failed query must not create the file");
    }

    #[test]
    fn test_delete() {
        let (_dir, repo) = repo();
        assert!(!repo.delete().unwrap());
        let (papers, groups) = corpus();
        repo.rebuild(&papers, &groups).unwrap();
        assert!(repo.is_created());
        assert!(repo.delete().unwrap());
        assert!(!repo.is_created());
    }
}
