//! Cloud catalog model and queries
//!
//! A [`Catalog`] is built once by the loader and never changes afterwards.
//! Every query here is a read-only lookup over it, so a catalog can be shared
//! across threads without locking.

pub mod document;
pub mod image;
pub mod loader;

use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use crate::CatalogError;

pub use image::{ImageMetadata, ImageVisibility};
pub use loader::{CatalogLoader, SourceFormat};

/// Bundled sample catalog
const BUILTIN_CATALOG: &str = include_str!("../../data/cloud_configs.json");

/// All known cloud deployments, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Catalog {
    clouds: Vec<Cloud>,
}

/// One cloud deployment, keyed by its Keystone hostname
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cloud {
    keystone_hostname: String,
    friendly_name: String,
    friendly_sub_name: Option<String>,
    user_app_proxy: Option<String>,
    image_exclude_filter: Option<ImageExcludeFilter>,
    featured_image_name_prefix: Option<String>,
    instance_types: Vec<InstanceType>,
    flavor_groups: Vec<FlavorGroup>,
}

/// Metadata key/value pair that hides images carrying a different value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageExcludeFilter {
    filter_key: String,
    filter_value: String,
}

/// A named OS family such as "Ubuntu"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceType {
    friendly_name: String,
    description: String,
    logo: String,
    versions: Vec<Version>,
}

/// One selectable OS image definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    friendly_name: String,
    is_primary: bool,
    image_filters: ImageFilter,
    restrict_flavor_ids: Option<BTreeSet<String>>,
}

/// How a version locates its image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ImageFilter {
    /// Exactly one image, by id
    Uuid { uuid: Uuid },
    /// Whichever image currently carries this name and visibility
    Name {
        name: String,
        visibility: ImageVisibility,
    },
}

/// Display grouping for flavors whose name matches a pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlavorGroup {
    match_on: FlavorPattern,
    title: String,
    description: Option<String>,
}

/// Compiled flavor name pattern
///
/// Matches whole flavor names only: `m3\..*` accepts `m3.large` but not
/// `xm3.large`.
#[derive(Clone)]
pub struct FlavorPattern {
    source: String,
    regex: Regex,
}

impl Catalog {
    /// Parse and validate the bundled sample catalog
    pub fn builtin() -> Result<Self, CatalogError> {
        loader::load(BUILTIN_CATALOG, SourceFormat::Json)
    }

    /// Parse and validate a JSON catalog
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        loader::load(json, SourceFormat::Json)
    }

    /// Parse and validate a YAML catalog
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        loader::load(yaml, SourceFormat::Yaml)
    }

    pub fn clouds(&self) -> &[Cloud] {
        &self.clouds
    }

    pub fn len(&self) -> usize {
        self.clouds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clouds.is_empty()
    }

    /// Keystone hostnames in declaration order
    pub fn hostnames(&self) -> impl Iterator<Item = &str> {
        self.clouds.iter().map(Cloud::keystone_hostname)
    }

    /// Find a cloud by Keystone hostname
    ///
    /// Comparison ignores ASCII case and surrounding whitespace.
    pub fn find_cloud_by_hostname(&self, hostname: &str) -> Result<&Cloud, CatalogError> {
        let wanted = hostname.trim();
        self.clouds
            .iter()
            .find(|c| c.keystone_hostname.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CatalogError::not_found("cloud", wanted))
    }

    /// Application proxy hostname for a cloud, if it has one
    pub fn user_app_proxy(&self, hostname: &str) -> Result<Option<&str>, CatalogError> {
        Ok(self.find_cloud_by_hostname(hostname)?.user_app_proxy())
    }

    /// Serialize back into the catalog document format
    pub fn to_json_string(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml_string(&self) -> Result<String, CatalogError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl Cloud {
    pub fn keystone_hostname(&self) -> &str {
        &self.keystone_hostname
    }

    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    pub fn friendly_sub_name(&self) -> Option<&str> {
        self.friendly_sub_name.as_deref()
    }

    /// Friendly name with the sub-name appended, e.g. "Jetstream1 IU"
    pub fn display_name(&self) -> String {
        match &self.friendly_sub_name {
            Some(sub) => format!("{} {}", self.friendly_name, sub),
            None => self.friendly_name.clone(),
        }
    }

    pub fn user_app_proxy(&self) -> Option<&str> {
        self.user_app_proxy.as_deref()
    }

    pub fn image_exclude_filter(&self) -> Option<&ImageExcludeFilter> {
        self.image_exclude_filter.as_ref()
    }

    pub fn featured_image_name_prefix(&self) -> Option<&str> {
        self.featured_image_name_prefix.as_deref()
    }

    /// Instance types in display order
    pub fn instance_types(&self) -> &[InstanceType] {
        &self.instance_types
    }

    /// Find an instance type by friendly name
    pub fn instance_type(&self, friendly_name: &str) -> Result<&InstanceType, CatalogError> {
        self.instance_types
            .iter()
            .find(|t| t.friendly_name == friendly_name)
            .ok_or_else(|| CatalogError::not_found("instance type", friendly_name))
    }

    pub fn flavor_groups(&self) -> &[FlavorGroup] {
        &self.flavor_groups
    }

    /// First flavor group, in declaration order, whose pattern matches
    pub fn match_flavor_group(&self, flavor_name: &str) -> Result<&FlavorGroup, CatalogError> {
        self.flavor_groups
            .iter()
            .find(|g| g.matches(flavor_name))
            .ok_or_else(|| CatalogError::not_found("flavor group", flavor_name))
    }

    /// Whether an image is hidden by this cloud's exclude filter
    ///
    /// An image is excluded when it carries the filter key with a different
    /// value. Images without the key stay listed.
    pub fn exclude_image(&self, image: &ImageMetadata) -> bool {
        match &self.image_exclude_filter {
            Some(filter) => filter.excludes(image),
            None => false,
        }
    }

    /// Images left after applying the exclude filter, in input order
    pub fn visible_images<'a>(&self, images: &'a [ImageMetadata]) -> Vec<&'a ImageMetadata> {
        images.iter().filter(|i| !self.exclude_image(i)).collect()
    }

    /// Whether an image name marks it as featured on this cloud
    pub fn is_featured_image(&self, image_name: &str) -> bool {
        self.featured_image_name_prefix
            .as_deref()
            .is_some_and(|prefix| image_name.starts_with(prefix))
    }

    /// Every version that accepts the given flavor, with its instance type
    pub fn compatible_versions(&self, flavor_id: &str) -> Vec<(&InstanceType, &Version)> {
        self.instance_types
            .iter()
            .flat_map(|t| t.versions.iter().map(move |v| (t, v)))
            .filter(|(_, v)| v.is_flavor_compatible(flavor_id))
            .collect()
    }
}

impl ImageExcludeFilter {
    pub fn filter_key(&self) -> &str {
        &self.filter_key
    }

    pub fn filter_value(&self) -> &str {
        &self.filter_value
    }

    fn excludes(&self, image: &ImageMetadata) -> bool {
        image
            .property(&self.filter_key)
            .is_some_and(|value| value != self.filter_value)
    }
}

impl InstanceType {
    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Description split on blank lines, empty paragraphs dropped
    pub fn description_paragraphs(&self) -> Vec<&str> {
        self.description
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }

    pub fn logo(&self) -> &str {
        &self.logo
    }

    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    /// Find a version by friendly name
    pub fn version(&self, friendly_name: &str) -> Result<&Version, CatalogError> {
        self.versions
            .iter()
            .find(|v| v.friendly_name == friendly_name)
            .ok_or_else(|| CatalogError::not_found("version", friendly_name))
    }

    /// The version marked primary
    pub fn primary_version(&self) -> Result<&Version, CatalogError> {
        self.versions
            .iter()
            .find(|v| v.is_primary)
            .ok_or_else(|| CatalogError::not_found("primary version", &self.friendly_name))
    }

    /// The primary version, or the first version when none is marked
    pub fn primary_version_or_first(&self) -> Option<&Version> {
        self.primary_version().ok().or_else(|| self.versions.first())
    }
}

impl Version {
    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    pub fn image_filters(&self) -> &ImageFilter {
        &self.image_filters
    }

    /// Flavor ids this image is limited to; `None` means unrestricted
    pub fn restrict_flavor_ids(&self) -> Option<&BTreeSet<String>> {
        self.restrict_flavor_ids.as_ref()
    }

    pub fn is_flavor_compatible(&self, flavor_id: &str) -> bool {
        match &self.restrict_flavor_ids {
            Some(ids) => ids.contains(flavor_id),
            None => true,
        }
    }

    /// First image this version's filter selects
    pub fn select_image<'a>(&self, images: &'a [ImageMetadata]) -> Option<&'a ImageMetadata> {
        images.iter().find(|i| self.image_filters.matches(i))
    }
}

impl ImageFilter {
    pub fn matches(&self, image: &ImageMetadata) -> bool {
        match self {
            ImageFilter::Uuid { uuid } => {
                Uuid::parse_str(image.id.trim()).is_ok_and(|id| id == *uuid)
            }
            ImageFilter::Name { name, visibility } => {
                image.name == *name && image.visibility == *visibility
            }
        }
    }
}

impl fmt::Display for ImageFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageFilter::Uuid { uuid } => write!(f, "uuid={}", uuid),
            ImageFilter::Name { name, visibility } => {
                write!(f, "name={} visibility={}", name, visibility)
            }
        }
    }
}

impl FlavorGroup {
    pub fn match_on(&self) -> &FlavorPattern {
        &self.match_on
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn matches(&self, flavor_name: &str) -> bool {
        self.match_on.is_match(flavor_name)
    }
}

impl FlavorPattern {
    pub fn new(source: impl Into<String>) -> Result<Self, regex::Error> {
        let source = source.into();
        let regex = Regex::new(&format!("^(?:{})$", source))?;
        Ok(Self { source, regex })
    }

    /// The pattern as written in the catalog
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, flavor_name: &str) -> bool {
        self.regex.is_match(flavor_name)
    }
}

impl PartialEq for FlavorPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for FlavorPattern {}

impl fmt::Debug for FlavorPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FlavorPattern").field(&self.source).finish()
    }
}

impl fmt::Display for FlavorPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for FlavorPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(restrict: Option<&[&str]>) -> Version {
        Version {
            friendly_name: "20.04".to_string(),
            is_primary: true,
            image_filters: ImageFilter::Name {
                name: "Featured-Ubuntu20".to_string(),
                visibility: ImageVisibility::Public,
            },
            restrict_flavor_ids: restrict
                .map(|ids| ids.iter().map(|s| s.to_string()).collect()),
        }
    }

    fn cloud_with_filter(filter: Option<ImageExcludeFilter>) -> Cloud {
        Cloud {
            keystone_hostname: "keystone.example.org".to_string(),
            friendly_name: "Example".to_string(),
            friendly_sub_name: None,
            user_app_proxy: None,
            image_exclude_filter: filter,
            featured_image_name_prefix: Some("Featured-".to_string()),
            instance_types: Vec::new(),
            flavor_groups: vec![
                FlavorGroup {
                    match_on: FlavorPattern::new(r"m3\..*").unwrap(),
                    title: "General-purpose".to_string(),
                    description: None,
                },
                FlavorGroup {
                    match_on: FlavorPattern::new(r".*\.large").unwrap(),
                    title: "Large".to_string(),
                    description: None,
                },
            ],
        }
    }

    #[test]
    fn test_unrestricted_version_accepts_any_flavor() {
        let v = version(None);
        assert!(v.is_flavor_compatible("7"));
        assert!(v.is_flavor_compatible("anything"));
    }

    #[test]
    fn test_restricted_version_accepts_listed_only() {
        let v = version(Some(&["24", "25"]));
        assert!(v.is_flavor_compatible("24"));
        assert!(!v.is_flavor_compatible("2"));
    }

    #[test]
    fn test_flavor_pattern_is_anchored() {
        let pattern = FlavorPattern::new(r"m3\..*").unwrap();
        assert!(pattern.is_match("m3.large"));
        assert!(!pattern.is_match("xm3.large"));
        assert!(!pattern.is_match("m3xlarge"));
    }

    #[test]
    fn test_first_matching_flavor_group_wins() {
        let cloud = cloud_with_filter(None);
        // Both groups match; declaration order decides
        assert_eq!(
            cloud.match_flavor_group("m3.large").unwrap().title(),
            "General-purpose"
        );
        assert_eq!(cloud.match_flavor_group("r3.large").unwrap().title(), "Large");
        assert!(cloud.match_flavor_group("r3.small").unwrap_err().is_not_found());
    }

    #[test]
    fn test_exclude_image() {
        let cloud = cloud_with_filter(Some(ImageExcludeFilter {
            filter_key: "atmo_image_include".to_string(),
            filter_value: "true".to_string(),
        }));

        let included = ImageMetadata::new("a", "a", ImageVisibility::Public)
            .with_property("atmo_image_include", "true");
        let excluded = ImageMetadata::new("b", "b", ImageVisibility::Public)
            .with_property("atmo_image_include", "false");
        let unlabelled = ImageMetadata::new("c", "c", ImageVisibility::Public);

        assert!(!cloud.exclude_image(&included));
        assert!(cloud.exclude_image(&excluded));
        assert!(!cloud.exclude_image(&unlabelled));

        let images = vec![included, excluded, unlabelled];
        let visible: Vec<_> = cloud
            .visible_images(&images)
            .into_iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(visible, vec!["a", "c"]);
    }

    #[test]
    fn test_no_exclude_filter_keeps_everything() {
        let cloud = cloud_with_filter(None);
        let image = ImageMetadata::new("b", "b", ImageVisibility::Public)
            .with_property("atmo_image_include", "false");
        assert!(!cloud.exclude_image(&image));
    }

    #[test]
    fn test_featured_image() {
        let cloud = cloud_with_filter(None);
        assert!(cloud.is_featured_image("Featured-Ubuntu20"));
        assert!(!cloud.is_featured_image("Ubuntu20"));
    }

    #[test]
    fn test_image_filter_matches() {
        let uuid = Uuid::parse_str("f0d43d1c-c022-4079-812c-3dd3dbee45cf").unwrap();
        let by_id = ImageFilter::Uuid { uuid };
        let by_name = ImageFilter::Name {
            name: "Featured-Ubuntu20".to_string(),
            visibility: ImageVisibility::Public,
        };

        let upper = ImageMetadata::new(
            "F0D43D1C-C022-4079-812C-3DD3DBEE45CF",
            "whatever",
            ImageVisibility::Private,
        );
        assert!(by_id.matches(&upper));
        assert!(!by_name.matches(&upper));

        let public = ImageMetadata::new("not-a-uuid", "Featured-Ubuntu20", ImageVisibility::Public);
        let private = ImageMetadata::new("x", "Featured-Ubuntu20", ImageVisibility::Private);
        assert!(by_name.matches(&public));
        assert!(!by_name.matches(&private));
        assert!(!by_id.matches(&public));
    }

    #[test]
    fn test_primary_version_fallback() {
        let mut first = version(None);
        first.is_primary = false;
        first.friendly_name = "18.04".to_string();
        let mut second = version(None);
        second.is_primary = false;

        let instance_type = InstanceType {
            friendly_name: "Ubuntu".to_string(),
            description: "- One\n\n- Two\n\n".to_string(),
            logo: "assets/img/ubuntu.svg".to_string(),
            versions: vec![first, second],
        };

        assert!(instance_type.primary_version().unwrap_err().is_not_found());
        assert_eq!(
            instance_type.primary_version_or_first().unwrap().friendly_name(),
            "18.04"
        );
        assert_eq!(instance_type.description_paragraphs(), vec!["- One", "- Two"]);
    }
}
