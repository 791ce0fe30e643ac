//! Catalog loader
//!
//! Parses a catalog document and validates it into the typed model. A load
//! either yields a complete catalog or fails on the first problem found.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::document::{
    CatalogDocument, CloudDocument, ExcludeFilterDocument, FlavorGroupDocument,
    ImageFiltersDocument, InstanceTypeDocument, VersionDocument,
};
use super::{
    Catalog, Cloud, FlavorGroup, FlavorPattern, ImageExcludeFilter, ImageFilter, ImageVisibility,
    InstanceType, Version,
};
use crate::{CatalogError, ValidationError};

/// Encoding of a catalog source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFormat {
    #[default]
    Json,
    Yaml,
}

impl SourceFormat {
    /// Pick the format from a file extension (`.json`, `.yaml`, `.yml`)
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| CatalogError::UnsupportedFormat(path.display().to_string()))?;
        ext.parse()
    }
}

impl FromStr for SourceFormat {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(CatalogError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Json => write!(f, "json"),
            SourceFormat::Yaml => write!(f, "yaml"),
        }
    }
}

/// Parse and validate catalog text
pub fn load(source: &str, format: SourceFormat) -> Result<Catalog, CatalogError> {
    let document = match format {
        SourceFormat::Json => CatalogDocument::from_json(source)?,
        SourceFormat::Yaml => CatalogDocument::from_yaml(source)?,
    };
    Ok(validate(document)?)
}

/// Load a catalog file, detecting its format from the extension
pub async fn load_file(path: impl AsRef<Path>) -> Result<Catalog, CatalogError> {
    let path = path.as_ref();
    let format = SourceFormat::from_path(path)?;
    load_file_as(path, format).await
}

async fn load_file_as(path: &Path, format: SourceFormat) -> Result<Catalog, CatalogError> {
    let content = fs::read_to_string(path).await?;
    let catalog = load(&content, format)?;
    info!(
        "Loaded {} clouds from {} ({})",
        catalog.len(),
        path.display(),
        format
    );
    Ok(catalog)
}

/// Validate a parsed document into a catalog
pub fn validate(document: CatalogDocument) -> Result<Catalog, ValidationError> {
    let documents = document.clouds.unwrap_or_default();
    let mut clouds = Vec::with_capacity(documents.len());
    // Lowercased hostname -> path of the first cloud using it
    let mut seen: HashMap<String, String> = HashMap::new();

    for (i, doc) in documents.into_iter().enumerate() {
        let path = format!("clouds[{}]", i);
        let cloud = validate_cloud(doc, &path)?;

        let key = cloud.keystone_hostname.to_ascii_lowercase();
        if let Some(first) = seen.get(&key) {
            return Err(ValidationError::DuplicateHostname {
                path,
                hostname: cloud.keystone_hostname,
                first: first.clone(),
            });
        }
        seen.insert(key, path);

        debug!(
            "Parsed cloud {} ({} instance types, {} flavor groups)",
            cloud.keystone_hostname,
            cloud.instance_types.len(),
            cloud.flavor_groups.len()
        );
        clouds.push(cloud);
    }

    Ok(Catalog { clouds })
}

fn validate_cloud(doc: CloudDocument, path: &str) -> Result<Cloud, ValidationError> {
    let keystone_hostname = required(doc.keystone_hostname, path, "keystoneHostname")?;
    let friendly_name = required(doc.friendly_name, path, "friendlyName")?;

    let image_exclude_filter = doc
        .image_exclude_filter
        .map(|f| validate_exclude_filter(f, &format!("{}.imageExcludeFilter", path)))
        .transpose()?;

    let instance_types = doc
        .instance_types
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, t)| validate_instance_type(t, &format!("{}.instanceTypes[{}]", path, i)))
        .collect::<Result<Vec<_>, _>>()?;

    let flavor_groups = doc
        .flavor_groups
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, g)| validate_flavor_group(g, &format!("{}.flavorGroups[{}]", path, i)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Cloud {
        keystone_hostname,
        friendly_name,
        friendly_sub_name: doc.friendly_sub_name,
        user_app_proxy: doc.user_app_proxy,
        image_exclude_filter,
        featured_image_name_prefix: doc.featured_image_name_prefix,
        instance_types,
        flavor_groups,
    })
}

fn validate_exclude_filter(
    doc: ExcludeFilterDocument,
    path: &str,
) -> Result<ImageExcludeFilter, ValidationError> {
    match (doc.filter_key, doc.filter_value) {
        (Some(filter_key), Some(filter_value)) if !filter_key.trim().is_empty() => {
            Ok(ImageExcludeFilter {
                filter_key,
                filter_value,
            })
        }
        _ => Err(ValidationError::IncompleteExcludeFilter {
            path: path.to_string(),
        }),
    }
}

fn validate_instance_type(
    doc: InstanceTypeDocument,
    path: &str,
) -> Result<InstanceType, ValidationError> {
    let friendly_name = required(doc.friendly_name, path, "friendlyName")?;

    let documents = doc.versions.unwrap_or_default();
    let mut versions = Vec::with_capacity(documents.len());
    let mut primary: Option<String> = None;

    for (i, v) in documents.into_iter().enumerate() {
        let version = validate_version(v, &format!("{}.versions[{}]", path, i))?;
        if version.is_primary {
            if let Some(first) = &primary {
                return Err(ValidationError::MultiplePrimaryVersions {
                    path: path.to_string(),
                    first: first.clone(),
                    second: version.friendly_name,
                });
            }
            primary = Some(version.friendly_name.clone());
        }
        versions.push(version);
    }

    if primary.is_none() && !versions.is_empty() {
        warn!(
            "{}: no primary version for '{}', first entry will be the default",
            path, friendly_name
        );
    }

    Ok(InstanceType {
        friendly_name,
        description: doc.description.unwrap_or_default(),
        logo: doc.logo.unwrap_or_default(),
        versions,
    })
}

fn validate_version(doc: VersionDocument, path: &str) -> Result<Version, ValidationError> {
    let friendly_name = required(doc.friendly_name, path, "friendlyName")?;

    let filters_path = format!("{}.imageFilters", path);
    let image_filters = match doc.image_filters {
        Some(filters) => validate_image_filters(filters, &filters_path)?,
        None => return Err(ValidationError::image_filter(filters_path, "missing")),
    };

    let restrict_flavor_ids = match doc.restrict_flavor_ids {
        Some(ids) if ids.is_empty() => {
            return Err(ValidationError::EmptyRestrictFlavorIds {
                path: format!("{}.restrictFlavorIds", path),
            });
        }
        Some(ids) => Some(ids.into_iter().collect::<BTreeSet<_>>()),
        None => None,
    };

    Ok(Version {
        friendly_name,
        is_primary: doc.is_primary.unwrap_or(false),
        image_filters,
        restrict_flavor_ids,
    })
}

fn validate_image_filters(
    doc: ImageFiltersDocument,
    path: &str,
) -> Result<ImageFilter, ValidationError> {
    match (doc.uuid, doc.name, doc.visibility) {
        (Some(uuid), None, None) => {
            let uuid = Uuid::parse_str(uuid.trim()).map_err(|e| {
                ValidationError::image_filter(path, format!("invalid uuid '{}': {}", uuid, e))
            })?;
            Ok(ImageFilter::Uuid { uuid })
        }
        (None, Some(name), Some(visibility)) => {
            if name.trim().is_empty() {
                return Err(ValidationError::image_filter(path, "empty name"));
            }
            let visibility = visibility.parse::<ImageVisibility>().map_err(|value| {
                ValidationError::UnknownVisibility {
                    path: path.to_string(),
                    value,
                }
            })?;
            Ok(ImageFilter::Name { name, visibility })
        }
        (Some(_), _, _) => Err(ValidationError::image_filter(
            path,
            "uuid cannot be combined with name or visibility",
        )),
        (None, _, _) => Err(ValidationError::image_filter(
            path,
            "neither uuid nor name with visibility given",
        )),
    }
}

fn validate_flavor_group(
    doc: FlavorGroupDocument,
    path: &str,
) -> Result<FlavorGroup, ValidationError> {
    let pattern = required(doc.match_on, path, "matchOn")?;
    let title = required(doc.title, path, "title")?;

    let match_on =
        FlavorPattern::new(pattern.clone()).map_err(|source| ValidationError::InvalidFlavorPattern {
            path: path.to_string(),
            pattern,
            source,
        })?;

    Ok(FlavorGroup {
        match_on,
        title,
        description: doc.description,
    })
}

/// Non-empty string field, trimmed
fn required(
    value: Option<String>,
    path: &str,
    field: &'static str,
) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ValidationError::missing(path, field)),
    }
}

/// Catalog loader builder for more control
pub struct CatalogLoader {
    path: Option<PathBuf>,
    format: Option<SourceFormat>,
    source: Option<String>,
    fallback_to_builtin: bool,
}

impl CatalogLoader {
    /// Create a loader that yields the bundled catalog unless told otherwise
    pub fn new() -> Self {
        Self {
            path: None,
            format: None,
            source: None,
            fallback_to_builtin: false,
        }
    }

    /// Read the catalog from a file
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Override format detection
    pub fn with_format(mut self, format: SourceFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Use in-memory catalog text; takes precedence over a path
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Use the bundled catalog when the configured file does not exist
    pub fn fallback_to_builtin(mut self) -> Self {
        self.fallback_to_builtin = true;
        self
    }

    /// Load and validate the catalog
    pub async fn load(self) -> Result<Catalog, CatalogError> {
        if let Some(source) = &self.source {
            return load(source, self.format.unwrap_or_default());
        }

        let Some(path) = &self.path else {
            debug!("No catalog path configured, using bundled catalog");
            return Catalog::builtin();
        };

        if self.fallback_to_builtin && fs::metadata(path).await.is_err() {
            warn!(
                "Catalog {} not found, using bundled catalog",
                path.display()
            );
            return Catalog::builtin();
        }

        let format = match self.format {
            Some(format) => format,
            None => SourceFormat::from_path(path)?,
        };
        load_file_as(path, format).await
    }
}

impl Default for CatalogLoader {
    fn default() -> Self {
        Self::new()
    }
}
