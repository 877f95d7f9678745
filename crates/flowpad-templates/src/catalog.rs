use std::collections::HashSet;
use std::path::Path;

use crate::error::CatalogError;
use crate::template::Template;

/// Templates shipped with flowpad, one JSON document per file.
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
  (
    "customer-support-automation.json",
    include_str!("../templates/customer-support-automation.json"),
  ),
  (
    "document-analysis-pipeline.json",
    include_str!("../templates/document-analysis-pipeline.json"),
  ),
  (
    "lead-generation-qualification.json",
    include_str!("../templates/lead-generation-qualification.json"),
  ),
  (
    "content-creation-pipeline.json",
    include_str!("../templates/content-creation-pipeline.json"),
  ),
  (
    "email-marketing-automation.json",
    include_str!("../templates/email-marketing-automation.json"),
  ),
  (
    "data-processing-pipeline.json",
    include_str!("../templates/data-processing-pipeline.json"),
  ),
  (
    "social-media-campaign.json",
    include_str!("../templates/social-media-campaign.json"),
  ),
  (
    "e-commerce-order-processing.json",
    include_str!("../templates/e-commerce-order-processing.json"),
  ),
  (
    "hr-recruitment-pipeline.json",
    include_str!("../templates/hr-recruitment-pipeline.json"),
  ),
];

/// Read-only access to a set of templates.
///
/// Only [`all`](TemplateCatalog::all) is required; lookups and search are
/// derived from it.
pub trait TemplateCatalog: Send + Sync {
  /// Every template, in catalog order.
  fn all(&self) -> &[Template];

  fn get(&self, id: &str) -> Option<&Template> {
    self.all().iter().find(|t| t.id == id)
  }

  fn by_category(&self, category: &str) -> Vec<&Template> {
    self.all().iter().filter(|t| t.category == category).collect()
  }

  /// Case-insensitive match over name, description, category and tags.
  fn search(&self, query: &str) -> Vec<&Template> {
    let needle = query.to_lowercase();
    self.all().iter().filter(|t| t.matches(&needle)).collect()
  }

  /// Unique categories in first-seen order.
  fn categories(&self) -> Vec<&str> {
    let mut seen = HashSet::new();
    self
      .all()
      .iter()
      .map(|t| t.category.as_str())
      .filter(|c| seen.insert(*c))
      .collect()
  }

  /// Unique tags in first-seen order.
  fn tags(&self) -> Vec<&str> {
    let mut seen = HashSet::new();
    self
      .all()
      .iter()
      .flat_map(|t| t.tags.iter().map(String::as_str))
      .filter(|tag| seen.insert(*tag))
      .collect()
  }
}

/// In-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
  templates: Vec<Template>,
}

impl Catalog {
  /// Build a catalog from templates, rejecting duplicate ids.
  pub fn from_templates(templates: Vec<Template>) -> Result<Self, CatalogError> {
    let mut ids = HashSet::new();
    for template in &templates {
      if !ids.insert(template.id.as_str()) {
        return Err(CatalogError::AlreadyExists {
          id: template.id.clone(),
        });
      }
    }
    Ok(Self { templates })
  }

  /// The templates bundled with the crate.
  pub fn builtin() -> Result<Self, CatalogError> {
    let templates = BUILTIN_TEMPLATES
      .iter()
      .map(|(name, json)| parse_template(name, json))
      .collect::<Result<Vec<_>, _>>()?;
    Self::from_templates(templates)
  }

  /// Parse a JSON array of templates.
  pub fn from_json(json: &str) -> Result<Self, CatalogError> {
    let templates: Vec<Template> =
      serde_json::from_str(json).map_err(|error| CatalogError::InvalidTemplate {
        source_name: "catalog".to_string(),
        error,
      })?;
    Self::from_templates(templates)
  }

  /// Load every `*.json` file of a directory, sorted by file name.
  pub fn from_dir(dir: &Path) -> Result<Self, CatalogError> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
      let path = entry?.path();
      if path.extension().is_some_and(|ext| ext == "json") {
        paths.push(path);
      }
    }
    paths.sort();

    let mut templates = Vec::with_capacity(paths.len());
    for path in paths {
      let content = std::fs::read_to_string(&path)?;
      templates.push(parse_template(&path.display().to_string(), &content)?);
    }
    Self::from_templates(templates)
  }

  pub fn into_templates(self) -> Vec<Template> {
    self.templates
  }
}

impl TemplateCatalog for Catalog {
  fn all(&self) -> &[Template] {
    &self.templates
  }
}

fn parse_template(source_name: &str, json: &str) -> Result<Template, CatalogError> {
  serde_json::from_str(json).map_err(|error| CatalogError::InvalidTemplate {
    source_name: source_name.to_string(),
    error,
  })
}
