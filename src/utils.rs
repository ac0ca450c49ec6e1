use crate::Result;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Read a file to a `String`.
pub(crate) async fn read(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file at {}", path.display()))
}

/// Deserialize a JSON file into type `T`.
pub(crate) async fn deserialize<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let content = read(path).await?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON file at {}", path.display()))
}

/// Serialize `value` as pretty JSON into `path`, readable only by the current user on Unix.
pub(crate) async fn save_private<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize,
{
    let json = serde_json::to_string_pretty(value).context("Failed to serialize data to JSON")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Unable to write to {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, Permissions::from_mode(0o600))
            .await
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[tokio::test]
    async fn test_save_private_then_deserialize() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.json");
        let sample = Sample {
            name: "rent".to_string(),
            count: 3,
        };
        save_private(&path, &sample).await.unwrap();
        let loaded: Sample = deserialize(&path).await.unwrap();
        assert_eq!(sample, loaded);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[tokio::test]
    async fn test_deserialize_missing_file() {
        let dir = TempDir::new().unwrap();
        let result: Result<Sample> = deserialize(&dir.path().join("nope.json")).await;
        let message = format!("{:?}", result.unwrap_err());
        assert!(message.contains("Failed to read file"));
    }
}
