/// Drops every table so a rebuild never sees rows from a previous run.
pub const DROP_SCHEMA: &str = r#"
DROP TABLE IF EXISTS Paper_Keyword;
DROP TABLE IF EXISTS Keyword;
DROP TABLE IF EXISTS KeywordGroup;
DROP TABLE IF EXISTS Paper;
"#;

pub const SCHEMA: &str = r#"
-- Paper table
CREATE TABLE IF NOT EXISTS Paper (
    paper_id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    publication_year INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_paper_publication_year ON Paper(publication_year);

-- KeywordGroup table (parent_group_id is reserved for nested groups)
CREATE TABLE IF NOT EXISTS KeywordGroup (
    group_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    parent_group_id INTEGER REFERENCES KeywordGroup(group_id)
);

-- Keyword table
CREATE TABLE IF NOT EXISTS Keyword (
    keyword_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    group_id INTEGER REFERENCES KeywordGroup(group_id)
);

CREATE INDEX IF NOT EXISTS idx_keyword_group_id ON Keyword(group_id);

-- Paper_Keyword table
CREATE TABLE IF NOT EXISTS Paper_Keyword (
    paper_id INTEGER NOT NULL REFERENCES Paper(paper_id),
    keyword_id INTEGER NOT NULL REFERENCES Keyword(keyword_id),
    PRIMARY KEY (paper_id, keyword_id)
);

CREATE INDEX IF NOT EXISTS idx_paper_keyword_keyword_id ON Paper_Keyword(keyword_id);
"#;

/// Shared join from groups down to papers used by every aggregate query.
pub const GROUP_PAPER_JOIN: &str = r#"
FROM KeywordGroup
JOIN Keyword ON Keyword.group_id = KeywordGroup.group_id
JOIN Paper_Keyword ON Keyword.keyword_id = Paper_Keyword.keyword_id
JOIN Paper ON Paper_Keyword.paper_id = Paper.paper_id
"#;
