//! On-disk catalog document
//!
//! Mirrors the catalog file exactly as written: camelCase keys, every field
//! optional or nullable. Nothing here is validated; see the loader for the
//! conversion into the typed model.

use serde::{Deserialize, Serialize};

/// Top-level catalog document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogDocument {
    pub clouds: Option<Vec<CloudDocument>>,
}

/// One cloud deployment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CloudDocument {
    pub keystone_hostname: Option<String>,
    pub friendly_name: Option<String>,
    pub friendly_sub_name: Option<String>,
    pub user_app_proxy: Option<String>,
    pub image_exclude_filter: Option<ExcludeFilterDocument>,
    pub featured_image_name_prefix: Option<String>,
    pub instance_types: Option<Vec<InstanceTypeDocument>>,
    pub flavor_groups: Option<Vec<FlavorGroupDocument>>,
}

/// Metadata key/value pair used to hide images
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExcludeFilterDocument {
    pub filter_key: Option<String>,
    pub filter_value: Option<String>,
}

/// OS family offered on a cloud
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstanceTypeDocument {
    pub friendly_name: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub versions: Option<Vec<VersionDocument>>,
}

/// Selectable image within an OS family
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VersionDocument {
    pub friendly_name: Option<String>,
    pub is_primary: Option<bool>,
    pub image_filters: Option<ImageFiltersDocument>,
    pub restrict_flavor_ids: Option<Vec<String>>,
}

/// Image predicate, either uuid-shaped or name/visibility-shaped
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageFiltersDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
}

/// Flavor display grouping rule
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlavorGroupDocument {
    pub match_on: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl CatalogDocument {
    /// Parse a catalog document from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse a catalog document from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nullable_fields() {
        let json = r#"{
            "clouds": [{
                "keystoneHostname": "keystone.example.org",
                "friendlyName": "Example",
                "friendlySubName": null,
                "imageExcludeFilter": null,
                "instanceTypes": [],
                "flavorGroups": []
            }]
        }"#;

        let doc = CatalogDocument::from_json(json).unwrap();
        let clouds = doc.clouds.unwrap();
        assert_eq!(clouds.len(), 1);
        let cloud = &clouds[0];
        assert_eq!(cloud.keystone_hostname.as_deref(), Some("keystone.example.org"));
        assert!(cloud.friendly_sub_name.is_none());
        assert!(cloud.user_app_proxy.is_none());
        assert!(cloud.image_exclude_filter.is_none());
    }

    #[test]
    fn test_parse_missing_collections() {
        let doc = CatalogDocument::from_json(r#"{"clouds":[{"friendlyName":"x"}]}"#).unwrap();
        let clouds = doc.clouds.unwrap();
        let cloud = &clouds[0];
        assert!(cloud.instance_types.is_none());
        assert!(cloud.flavor_groups.is_none());
        assert!(cloud.keystone_hostname.is_none());
    }

    #[test]
    fn test_parse_null_collections() {
        let json = r#"{"clouds":[{"friendlyName":"x","instanceTypes":null,"flavorGroups":null}]}"#;
        let doc = CatalogDocument::from_json(json).unwrap();
        let clouds = doc.clouds.unwrap();
        let cloud = &clouds[0];
        assert!(cloud.instance_types.is_none());
        assert!(cloud.flavor_groups.is_none());

        let empty = CatalogDocument::from_json(r#"{"clouds":null}"#).unwrap();
        assert!(empty.clouds.is_none());
    }

    #[test]
    fn test_parse_yaml_document() {
        let yaml = r#"
clouds:
  - keystoneHostname: keystone.example.org
    friendlyName: Example
    instanceTypes:
      - friendlyName: Ubuntu
        description: "- Good choice"
        logo: assets/img/ubuntu.svg
        versions:
          - friendlyName: "22.04"
            isPrimary: true
            imageFilters:
              name: Featured-Ubuntu22
              visibility: public
            restrictFlavorIds: ~
"#;

        let doc = CatalogDocument::from_yaml(yaml).unwrap();
        let clouds = doc.clouds.unwrap();
        let instance_type = &clouds[0].instance_types.as_ref().unwrap()[0];
        let version = &instance_type.versions.as_ref().unwrap()[0];
        assert_eq!(version.is_primary, Some(true));
        let filters = version.image_filters.as_ref().unwrap();
        assert_eq!(filters.name.as_deref(), Some("Featured-Ubuntu22"));
        assert!(filters.uuid.is_none());
        assert!(version.restrict_flavor_ids.is_none());
    }
}
