//! JSON checkpoints for the intermediate pipeline artifacts.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

pub const UNIQUE_KEYWORDS_FILE: &str = "unique_keywords.json";
pub const KEYWORD_GROUPS_FILE: &str = "keyword_groups.json";

pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path, human_readable: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let content = if human_readable {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    std::fs::write(path, content)?;
    tracing::debug!("Wrote checkpoint {}", path.display());
    Ok(())
}

/// Reads a checkpoint. An absent file is `Ok(None)`, not an error.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::KeywordGroups;

    #[test]
    fn test_missing_checkpoint_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded: Option<Vec<String>> = read_json(&dir.path().join(UNIQUE_KEYWORDS_FILE)).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_unique_keywords_checkpoint_is_a_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join(UNIQUE_KEYWORDS_FILE);
        let keywords = vec!["ml".to_string(), "ai".to_string()];

        write_json(&keywords, &path, true).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!(["ml", "ai"]));

        let loaded: Option<Vec<String>> = read_json(&path).unwrap();
        assert_eq!(loaded, Some(keywords));
    }

    #[test]
    fn test_keyword_groups_checkpoint_reads_hand_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(KEYWORD_GROUPS_FILE);
        std::fs::write(&path, r#"{"ai": ["ai", "ml"], "iot": ["iot"]}"#).unwrap();

        let groups: KeywordGroups = read_json(&path).unwrap().unwrap();
        assert_eq!(groups.len(), 2);
        assert!(groups.get("ai").unwrap().contains("ml"));
    }

    #[test]
    fn test_compact_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compact.json");
        write_json(&["a", "b"], &path, false).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn test_corrupt_checkpoint_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(KEYWORD_GROUPS_FILE);
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(read_json::<KeywordGroups>(&path).is_err());
    }
}
