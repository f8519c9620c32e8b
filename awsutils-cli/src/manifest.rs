//! Manifest (`awsutils.json`) loading
//!
//! A manifest names the provider configuration, the managed resources and
//! the data sources to read:
//!
//! ```json
//! {
//!   "provider": { "region": "us-east-1" },
//!   "resources": [
//!     { "type": "awsutils_default_vpc_deletion", "name": "default", "attributes": {} }
//!   ],
//!   "data": [
//!     { "type": "awsutils_caller_identity", "name": "current" }
//!   ]
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use awsutils_core::resource::{Resource, Value, attributes_from_json};
use serde::Deserialize;

use crate::state::STATE_FILE_NAME;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Duplicate block {0}")]
    Duplicate(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub provider: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub resources: Vec<Block>,
    #[serde(default)]
    pub data: Vec<Block>,
}

/// One `resources` or `data` entry
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Block {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Block {
    fn to_resource(&self, read_only: bool) -> Resource {
        let mut resource = Resource::new(&self.resource_type, &self.name).with_read_only(read_only);
        resource.attributes = attributes_from_json(&self.attributes);
        resource
    }
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: Manifest =
            serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        manifest.check_unique()?;
        Ok(manifest)
    }

    fn check_unique(&self) -> Result<(), ManifestError> {
        let mut seen = HashSet::new();
        for (prefix, block) in self
            .resources
            .iter()
            .map(|b| ("", b))
            .chain(self.data.iter().map(|b| ("data.", b)))
        {
            let key = format!("{}{}.{}", prefix, block.resource_type, block.name);
            if !seen.insert(key.clone()) {
                return Err(ManifestError::Duplicate(key));
            }
        }
        Ok(())
    }

    pub fn provider_attributes(&self) -> HashMap<String, Value> {
        attributes_from_json(&self.provider)
    }

    /// Managed resources, in declaration order
    pub fn resources(&self) -> Vec<Resource> {
        self.resources.iter().map(|b| b.to_resource(false)).collect()
    }

    pub fn data_sources(&self) -> Vec<Resource> {
        self.data.iter().map(|b| b.to_resource(true)).collect()
    }
}

/// State file path for a manifest: a sibling of the manifest itself
pub fn state_path(manifest_path: &Path) -> PathBuf {
    manifest_path.with_file_name(STATE_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_manifest(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parses_blocks() {
        let file = write_manifest(
            r#"{
                "provider": {"region": "eu-west-1", "max_retries": 5},
                "resources": [
                    {
                        "type": "awsutils_security_hub_control_disablement",
                        "name": "iam_1",
                        "attributes": {"control_arn": "arn:aws:securityhub:eu-west-1:111:control/cis/1.1", "reason": null}
                    }
                ],
                "data": [{"type": "awsutils_caller_identity", "name": "current"}]
            }"#,
        );
        let manifest = Manifest::load(file.path()).unwrap();

        let provider = manifest.provider_attributes();
        assert_eq!(provider.get("region"), Some(&Value::from("eu-west-1")));
        assert_eq!(provider.get("max_retries"), Some(&Value::Int(5)));

        let resources = manifest.resources();
        assert_eq!(resources.len(), 1);
        assert_eq!(
            resources[0].id.to_string(),
            "awsutils_security_hub_control_disablement.iam_1"
        );
        assert!(!resources[0].is_data_source());
        assert!(resources[0].get("reason").is_none());

        let data = manifest.data_sources();
        assert_eq!(data.len(), 1);
        assert!(data[0].is_data_source());
        assert!(data[0].attributes.is_empty());
    }

    #[test]
    fn empty_manifest_is_valid() {
        let file = write_manifest("{}");
        let manifest = Manifest::load(file.path()).unwrap();
        assert!(manifest.resources().is_empty());
        assert!(manifest.provider_attributes().is_empty());
    }

    #[test]
    fn rejects_duplicate_names() {
        let file = write_manifest(
            r#"{"resources": [
                {"type": "awsutils_default_vpc_deletion", "name": "default"},
                {"type": "awsutils_default_vpc_deletion", "name": "default"}
            ]}"#,
        );
        let err = Manifest::load(file.path()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Duplicate block awsutils_default_vpc_deletion.default"
        );
    }

    #[test]
    fn same_name_may_be_resource_and_data() {
        let file = write_manifest(
            r#"{
                "resources": [{"type": "awsutils_caller_identity", "name": "x"}],
                "data": [{"type": "awsutils_caller_identity", "name": "x"}]
            }"#,
        );
        assert!(Manifest::load(file.path()).is_ok());
    }

    #[test]
    fn rejects_unknown_keys() {
        let file = write_manifest(r#"{"resource": []}"#);
        assert!(matches!(
            Manifest::load(file.path()),
            Err(ManifestError::Parse { .. })
        ));
    }

    #[test]
    fn state_lives_next_to_manifest() {
        assert_eq!(
            state_path(Path::new("/work/prod/awsutils.json")),
            PathBuf::from("/work/prod/awsutils.state.json")
        );
        assert_eq!(
            state_path(Path::new("awsutils.json")),
            PathBuf::from("awsutils.state.json")
        );
    }
}
