use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use toml_edit::DocumentMut;

/// Writes `airport = "<code>"` into the config file, keeping every other key.
pub fn save_airport(path: &Path, airport: &str) -> Result<()> {
    let existing = if path.exists() {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?
    } else {
        String::new()
    };
    let mut doc = existing
        .parse::<DocumentMut>()
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    doc["airport"] = toml_edit::value(airport);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    fs::write(path, doc.to_string())
        .with_context(|| format!("Failed to write config: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::save_airport;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file(name: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        dir.push(format!("airport-ops-test-{suffix}"));
        let _ = fs::create_dir_all(&dir);
        dir.push(name);
        dir
    }

    #[test]
    fn save_airport_preserves_other_keys() {
        let path = temp_file("airport-ops.toml");
        fs::write(
            &path,
            "# operator settings\noperator_prefix = \"LS\"\nairport = \"EGCC\"\nrefresh_secs = 90\n",
        )
        .unwrap();
        save_airport(&path, "EGNM").unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("# operator settings"));
        assert!(text.contains("operator_prefix = \"LS\""));
        assert!(text.contains("airport = \"EGNM\""));
        assert!(!text.contains("EGCC"));
        assert!(text.contains("refresh_secs = 90"));
        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir(path.parent().unwrap());
    }

    #[test]
    fn save_airport_creates_missing_file() {
        let path = temp_file("fresh.toml");
        save_airport(&path, "LBA").unwrap();
        let parsed: toml::Value = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["airport"].as_str(), Some("LBA"));
        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir(path.parent().unwrap());
    }

    #[test]
    fn unparseable_config_is_left_alone() {
        let path = temp_file("broken.toml");
        fs::write(&path, "airport = [unterminated").unwrap();
        assert!(save_airport(&path, "EGNM").is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "airport = [unterminated");
        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir(path.parent().unwrap());
    }
}
