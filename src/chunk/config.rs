use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::BuildError;

/// Declarative chunking configuration. The file lists one or more
/// splitting strategies; the adapter materializes the corpus from the
/// first one, matching the behavior of picking the first module's output
/// artifact.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkSettings {
    pub modules: Vec<ChunkModule>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "module_type", rename_all = "snake_case")]
pub enum ChunkModule {
    CharacterWindow {
        #[serde(default = "default_min_chars")]
        min_chars: usize,
        #[serde(default = "default_max_chars")]
        max_chars: usize,
        #[serde(default)]
        overlap_chars: usize,
    },
}

fn default_min_chars() -> usize {
    500
}

fn default_max_chars() -> usize {
    2000
}

impl ChunkSettings {
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let contents = fs::read_to_string(path).map_err(|err| BuildError::io(path, err))?;
        let settings: Self = serde_yaml::from_str(&contents).map_err(|err| {
            BuildError::Configuration(format!(
                "invalid chunk config {}: {err}",
                path.display()
            ))
        })?;
        if settings.modules.is_empty() {
            return Err(BuildError::Configuration(format!(
                "chunk config {} defines no modules",
                path.display()
            )));
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn parses_character_window_module() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chunk.yaml");
        fs::write(
            &path,
            "modules:\n  - module_type: character_window\n    min_chars: 100\n    max_chars: 400\n",
        )
        .unwrap();

        let settings = ChunkSettings::load(&path).unwrap();
        let ChunkModule::CharacterWindow {
            min_chars,
            max_chars,
            overlap_chars,
        } = &settings.modules[0];
        assert_eq!(*min_chars, 100);
        assert_eq!(*max_chars, 400);
        assert_eq!(*overlap_chars, 0);
    }

    #[test]
    fn rejects_empty_module_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chunk.yaml");
        fs::write(&path, "modules: []\n").unwrap();

        let err = ChunkSettings::load(&path).unwrap_err();
        assert!(matches!(err, BuildError::Configuration(_)));
    }

    #[test]
    fn rejects_unparsable_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chunk.yaml");
        fs::write(&path, "modules: [unclosed\n").unwrap();

        let err = ChunkSettings::load(&path).unwrap_err();
        assert!(matches!(err, BuildError::Configuration(_)));
    }
}
