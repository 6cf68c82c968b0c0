//! Template catalog — the read-only set of interviews a user can start.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::model::{ConversationTemplate, TemplateDefinition};
use crate::error::CatalogError;

/// Immutable mapping from template name to template, in load order.
#[derive(Debug, Default)]
pub struct TemplateCatalog {
    templates: Vec<Arc<ConversationTemplate>>,
    by_name: HashMap<String, usize>,
}

/// Outcome of building a catalog: what was accepted and what was rejected.
#[derive(Debug)]
pub struct CatalogLoad {
    pub catalog: TemplateCatalog,
    pub rejected: Vec<CatalogError>,
}

impl TemplateCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already-validated templates. Later duplicates are rejected.
    pub fn from_templates<I>(templates: I) -> CatalogLoad
    where
        I: IntoIterator<Item = ConversationTemplate>,
    {
        let mut catalog = Self::new();
        let mut rejected = Vec::new();
        for template in templates {
            if let Err(e) = catalog.insert(template) {
                rejected.push(e);
            }
        }
        CatalogLoad { catalog, rejected }
    }

    /// Validate authored definitions, keeping the ones that pass.
    pub fn from_definitions<I>(definitions: I) -> CatalogLoad
    where
        I: IntoIterator<Item = TemplateDefinition>,
    {
        let mut catalog = Self::new();
        let mut rejected = Vec::new();
        for def in definitions {
            let result = ConversationTemplate::try_from(def).and_then(|t| catalog.insert(t));
            if let Err(e) = result {
                rejected.push(e);
            }
        }
        CatalogLoad { catalog, rejected }
    }

    /// Load every `*.json` file under `dir`, one template per file, in
    /// file-name order.
    ///
    /// Only an unreadable directory fails the whole load; bad files are
    /// reported in `CatalogLoad::rejected`.
    pub async fn load_dir(dir: &Path) -> Result<CatalogLoad, CatalogError> {
        let io_err = |e: std::io::Error| CatalogError::Io {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        };

        let mut paths: Vec<PathBuf> = Vec::new();
        let mut read_dir = fs::read_dir(dir).await.map_err(io_err)?;
        while let Some(entry) = read_dir.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut catalog = Self::new();
        let mut rejected = Vec::new();
        for path in paths {
            match read_definition(&path).await {
                Ok(def) => {
                    let result =
                        ConversationTemplate::try_from(def).and_then(|t| catalog.insert(t));
                    if let Err(e) = result {
                        rejected.push(e);
                    }
                }
                Err(e) => rejected.push(e),
            }
        }

        for e in &rejected {
            warn!(error = %e, "Template rejected");
        }
        info!(
            dir = %dir.display(),
            loaded = catalog.len(),
            rejected = rejected.len(),
            "Template catalog loaded"
        );

        Ok(CatalogLoad { catalog, rejected })
    }

    fn insert(&mut self, template: ConversationTemplate) -> Result<(), CatalogError> {
        let name = template.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(CatalogError::DuplicateTemplate { name });
        }
        debug!(template = %name, sections = template.sections().len(), "Registered template");
        self.by_name.insert(name, self.templates.len());
        self.templates.push(Arc::new(template));
        Ok(())
    }

    /// Look up a template by its exact name.
    pub fn lookup(&self, name: &str) -> Option<Arc<ConversationTemplate>> {
        self.by_name
            .get(name)
            .map(|&i| Arc::clone(&self.templates[i]))
    }

    /// Template names in load order.
    pub fn names(&self) -> Vec<String> {
        self.templates.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

async fn read_definition(path: &Path) -> Result<TemplateDefinition, CatalogError> {
    let raw = fs::read_to_string(path).await.map_err(|e| CatalogError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&raw).map_err(|e| CatalogError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Shared handle to the current catalog.
///
/// Readers take an `Arc` snapshot; a reload swaps the whole catalog, so a
/// half-built catalog is never observable.
#[derive(Debug, Clone)]
pub struct CatalogHandle {
    inner: Arc<RwLock<Arc<TemplateCatalog>>>,
}

impl CatalogHandle {
    pub fn new(catalog: TemplateCatalog) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(catalog))),
        }
    }

    /// The catalog as of now.
    pub async fn current(&self) -> Arc<TemplateCatalog> {
        Arc::clone(&*self.inner.read().await)
    }

    /// Swap in a new catalog.
    pub async fn replace(&self, catalog: TemplateCatalog) {
        let count = catalog.len();
        *self.inner.write().await = Arc::new(catalog);
        info!(templates = count, "Template catalog replaced");
    }

    /// Reload from `dir` and swap. The old catalog stays in place if the
    /// directory cannot be read.
    pub async fn reload_from(&self, dir: &Path) -> Result<Vec<CatalogError>, CatalogError> {
        let CatalogLoad { catalog, rejected } = TemplateCatalog::load_dir(dir).await?;
        self.replace(catalog).await;
        Ok(rejected)
    }
}
