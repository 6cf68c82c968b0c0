//! File-backed response store: one pretty-printed JSON document per
//! template under a responses directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use super::traits::ResponseStore;
use crate::error::StoreError;
use crate::interview::model::ConversationResponse;

/// Stores `{dir}/{TemplateName}.json`, replacing any previous document.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ensure the responses directory exists.
    pub async fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Path of the document stored for `template_name`.
    pub fn path_for(&self, template_name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(template_name)))
    }
}

/// Make a template name safe to use as a file name.
///
/// Reserved characters, `%` itself and a leading `.` are written as `%XX`,
/// so distinct names always map to distinct files. Spaces are kept.
fn file_stem(template_name: &str) -> String {
    if template_name.is_empty() {
        return "%".to_string();
    }
    let mut stem = String::with_capacity(template_name.len());
    for (i, c) in template_name.chars().enumerate() {
        let escape = matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '%')
            || c.is_control()
            || (i == 0 && c == '.');
        if escape {
            stem.push_str(&format!("%{:02X}", u32::from(c)));
        } else {
            stem.push(c);
        }
    }
    stem
}

#[async_trait]
impl ResponseStore for JsonFileStore {
    fn name(&self) -> &str {
        "json-files"
    }

    async fn save_response(&self, response: &ConversationResponse) -> Result<(), StoreError> {
        self.ensure_dir().await?;
        let path = self.path_for(&response.template_name);
        let json = serde_json::to_string_pretty(response)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        // Each write gets its own temp file; the rename is the commit point.
        let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, json).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        info!(
            template = %response.template_name,
            path = %path.display(),
            "Response written"
        );
        Ok(())
    }

    async fn get_response(
        &self,
        template_name: &str,
    ) -> Result<Option<ConversationResponse>, StoreError> {
        let path = self.path_for(template_name);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let response = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Serialization(format!("{}: {e}", path.display())))?;
        Ok(Some(response))
    }

    async fn list_template_names(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        let mut read_dir = match fs::read_dir(&self.dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Ok(raw) = fs::read_to_string(&path).await else {
                continue;
            };
            match serde_json::from_str::<ConversationResponse>(&raw) {
                Ok(response) => names.push(response.template_name),
                Err(e) => debug!(path = %path.display(), error = %e, "Skipping non-response file"),
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::interview::model::{QuestionResponse, SectionResponse};
    use tempfile::TempDir;

    fn response(template: &str, answer: &str) -> ConversationResponse {
        ConversationResponse {
            template_name: template.to_string(),
            section_responses: vec![SectionResponse {
                section_name: "Basics".to_string(),
                question_responses: vec![QuestionResponse {
                    id: "q1".to_string(),
                    response: answer.to_string(),
                }],
            }],
        }
    }

    #[tokio::test]
    async fn writes_pascal_case_document_named_after_template() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("Responses"));
        store.save_response(&response("Exit Survey", "Engineer")).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("Responses/Exit Survey.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["TemplateName"], "Exit Survey");
        assert_eq!(value["SectionResponses"][0]["QuestionResponses"][0]["Response"], "Engineer");
        assert!(!dir.path().join("Responses/Exit Survey.json.tmp").exists());
    }

    #[tokio::test]
    async fn second_save_overwrites_first() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.save_response(&response("Exit Survey", "first")).await.unwrap();
        store.save_response(&response("Exit Survey", "second")).await.unwrap();

        let got = store.get_response("Exit Survey").await.unwrap().unwrap();
        assert_eq!(got.section_responses[0].question_responses[0].response, "second");
        assert_eq!(store.list_template_names().await.unwrap(), vec!["Exit Survey"]);
    }

    #[tokio::test]
    async fn missing_response_is_none() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("never-created"));
        assert!(store.get_response("Nope").await.unwrap().is_none());
        assert!(store.list_template_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unsafe_names_stay_inside_dir() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert_eq!(
            store.path_for("../etc/passwd"),
            dir.path().join("%2E.%2Fetc%2Fpasswd.json")
        );
        store.save_response(&response("a/b", "x")).await.unwrap();
        assert!(dir.path().join("a%2Fb.json").exists());
        assert_eq!(store.get_response("a/b").await.unwrap().unwrap().template_name, "a/b");
    }

    #[tokio::test]
    async fn similar_names_get_separate_files() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert_ne!(store.path_for("a/b"), store.path_for("a_b"));
        assert_ne!(store.path_for("a/b"), store.path_for("a%2Fb"));

        store.save_response(&response("a/b", "slash")).await.unwrap();
        store.save_response(&response("a_b", "underscore")).await.unwrap();

        let slash = store.get_response("a/b").await.unwrap().unwrap();
        assert_eq!(slash.section_responses[0].question_responses[0].response, "slash");
        assert_eq!(store.get_response("a_b").await.unwrap().unwrap().template_name, "a_b");
        assert_eq!(store.list_template_names().await.unwrap(), vec!["a/b", "a_b"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_saves_of_one_template_all_succeed() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonFileStore::new(dir.path()));

        for round in 0..10 {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let store = Arc::clone(&store);
                    tokio::spawn(async move {
                        store
                            .save_response(&response("Exit Survey", &format!("{round}-{i}")))
                            .await
                    })
                })
                .collect();
            for handle in handles {
                handle.await.unwrap().unwrap();
            }
        }

        let stored = store.get_response("Exit Survey").await.unwrap().unwrap();
        assert!(stored.section_responses[0].question_responses[0].response.starts_with("9-"));
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .filter(|n| n.to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
