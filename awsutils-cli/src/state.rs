//! Local state file (`awsutils.state.json`)
//!
//! Records every resource the provider created, with its tracking identifier
//! and last known attributes. Writes go through a temporary sibling file and
//! a rename so a crash never leaves a truncated state behind. State can hold
//! generated secrets, so on unix the file is readable by its owner only.

use std::io::Write;
use std::path::{Path, PathBuf};

use awsutils_core::resource::{ResourceId, State, attributes_from_json, attributes_to_json};
use serde::{Deserialize, Serialize};

pub const STATE_FILE_NAME: &str = "awsutils.state.json";

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to access state file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse state file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("State file version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    /// Format version
    pub version: u32,
    /// Bumped on every write
    pub serial: u64,
    /// Fixed when the file is first created
    pub lineage: String,
    /// Version of awsutils that last wrote this file
    pub awsutils_version: String,
    pub resources: Vec<ResourceState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl ResourceState {
    fn matches(&self, id: &ResourceId) -> bool {
        self.resource_type == id.resource_type && self.name == id.name
    }

    pub fn to_state(&self) -> State {
        let id = ResourceId::new(&self.resource_type, &self.name);
        let mut state = State::existing(id, attributes_from_json(&self.attributes));
        state.identifier = self.identifier.clone();
        state
    }
}

impl From<&State> for ResourceState {
    fn from(state: &State) -> Self {
        Self {
            resource_type: state.id.resource_type.clone(),
            name: state.id.name.clone(),
            identifier: state.identifier.clone(),
            attributes: attributes_to_json(&state.attributes),
        }
    }
}

impl StateFile {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            serial: 0,
            lineage: uuid::Uuid::new_v4().to_string(),
            awsutils_version: env!("CARGO_PKG_VERSION").to_string(),
            resources: Vec::new(),
        }
    }

    /// Read the state at `path`, or start a fresh one if there is none yet
    pub fn load(path: &Path) -> Result<Self, StateError> {
        if !path.exists() {
            log::debug!("no state at {}, starting empty", path.display());
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path).map_err(|source| StateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let state: StateFile =
            serde_json::from_str(&content).map_err(|source| StateError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if state.version > Self::CURRENT_VERSION {
            return Err(StateError::UnsupportedVersion {
                found: state.version,
                supported: Self::CURRENT_VERSION,
            });
        }
        Ok(state)
    }

    /// Bump the serial and write atomically
    pub fn save(&mut self, path: &Path) -> Result<(), StateError> {
        self.serial += 1;
        self.awsutils_version = env!("CARGO_PKG_VERSION").to_string();

        let content = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        let io_error = |source| StateError::Io {
            path: path.to_path_buf(),
            source,
        };

        write_private(&tmp, content.as_bytes()).map_err(io_error)?;
        std::fs::rename(&tmp, path).map_err(io_error)?;
        log::debug!("wrote state serial {} to {}", self.serial, path.display());
        Ok(())
    }

    pub fn find(&self, id: &ResourceId) -> Option<&ResourceState> {
        self.resources.iter().find(|r| r.matches(id))
    }

    /// Recorded states, in the order they were first created
    pub fn states(&self) -> Vec<State> {
        self.resources.iter().map(ResourceState::to_state).collect()
    }

    /// Store a state reported by the provider; one that no longer exists is dropped
    pub fn record(&mut self, state: &State) {
        if !state.exists {
            self.remove(&state.id);
            return;
        }

        let entry = ResourceState::from(state);
        match self.resources.iter_mut().find(|r| r.matches(&state.id)) {
            Some(existing) => *existing = entry,
            None => self.resources.push(entry),
        }
    }

    pub fn remove(&mut self, id: &ResourceId) -> Option<ResourceState> {
        let pos = self.resources.iter().position(|r| r.matches(id))?;
        Some(self.resources.remove(pos))
    }
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `content` to a freshly created owner-only file
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    // A leftover file would keep its old mode
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(content)?;
    file.sync_all()
}
