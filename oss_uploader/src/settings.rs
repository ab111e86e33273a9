use std::fmt;
use std::path::Path;

use ini::{Ini, Properties};
use oss_client::OssTarget;
use tracing::debug;

use crate::constants::*;
use crate::errors::SettingsError;

/// Everything read from the device and upload configuration files.  Keys that
/// are absent leave their field empty.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub device_id: String,
    pub oss_end_point: String,
    pub oss_bucket: String,
    pub oss_access_id: String,
    pub oss_access_key: String,
}

impl Settings {
    /// Load the device file, then the upload file.  Either file being missing
    /// or malformed is an error; missing sections and keys are not.
    pub fn load(device_file: impl AsRef<Path>, config_file: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let mut settings = Settings::default();
        settings.apply_device_file(device_file)?;
        settings.apply_upload_file(config_file)?;
        Ok(settings)
    }

    pub fn apply_device_file(&mut self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let ini = read_ini(path.as_ref())?;
        if let Some(section) = ini.section(Some(DEVICE_SECTION)) {
            assign_if_present(section, DEVICE_ID_KEY, &mut self.device_id);
        }
        debug!(device_id = %self.device_id, "loaded device settings");
        Ok(())
    }

    pub fn apply_upload_file(&mut self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let ini = read_ini(path.as_ref())?;
        if let Some(section) = ini.section(Some(UPLOAD_SECTION)) {
            assign_if_present(section, OSS_END_POINT_KEY, &mut self.oss_end_point);
            assign_if_present(section, OSS_BUCKET_KEY, &mut self.oss_bucket);
            assign_if_present(section, OSS_ACCESS_ID_KEY, &mut self.oss_access_id);
            assign_if_present(section, OSS_ACCESS_KEY_KEY, &mut self.oss_access_key);
        }
        debug!(
            end_point = %self.oss_end_point,
            bucket = %self.oss_bucket,
            access_id = %self.oss_access_id,
            "loaded upload settings"
        );
        Ok(())
    }

    pub fn oss_target(&self) -> OssTarget {
        OssTarget {
            endpoint: self.oss_end_point.clone(),
            bucket: self.oss_bucket.clone(),
            access_id: self.oss_access_id.clone(),
            access_key: self.oss_access_key.clone(),
        }
    }
}

fn read_ini(path: &Path) -> Result<Ini, SettingsError> {
    Ini::load_from_file(path).map_err(|source| SettingsError::Unreadable {
        path: path.to_path_buf(),
        source,
    })
}

fn assign_if_present(section: &Properties, key: &str, field: &mut String) {
    if let Some(value) = section.get(key) {
        *field = value.to_owned();
    }
}

fn redacted(key: &str) -> &'static str {
    if key.is_empty() { "" } else { "******" }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("device_id", &self.device_id)
            .field("oss_end_point", &self.oss_end_point)
            .field("oss_bucket", &self.oss_bucket)
            .field("oss_access_id", &self.oss_access_id)
            .field("oss_access_key", &redacted(&self.oss_access_key))
            .finish()
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "device_id: {}, oss_end_point: {}, oss_bucket: {}, oss_access_id: {}, oss_access_key: {}",
            self.device_id,
            self.oss_end_point,
            self.oss_bucket,
            self.oss_access_id,
            redacted(&self.oss_access_key)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_key_is_redacted() {
        let settings = Settings {
            device_id: "dev1".into(),
            oss_access_key: "top-secret".into(),
            ..Default::default()
        };

        let shown = format!("{settings} {settings:?}");
        assert!(shown.contains("dev1"));
        assert!(!shown.contains("top-secret"));
    }

    #[test]
    fn test_oss_target_copies_fields() {
        let settings = Settings {
            device_id: "dev1".into(),
            oss_end_point: "oss-cn-hangzhou.aliyuncs.com".into(),
            oss_bucket: "logs".into(),
            oss_access_id: "id".into(),
            oss_access_key: "key".into(),
        };

        let target = settings.oss_target();
        assert_eq!(target.endpoint, "oss-cn-hangzhou.aliyuncs.com");
        assert_eq!(target.bucket, "logs");
        assert_eq!(target.access_id, "id");
        assert_eq!(target.access_key, "key");
    }
}
