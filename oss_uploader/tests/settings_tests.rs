use std::fs;
use std::path::PathBuf;

use oss_uploader::{Settings, SettingsError};
use tempfile::{tempdir, TempDir};

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_full_configuration() {
    let dir = tempdir().unwrap();
    let device = write(&dir, "device.ini", "[device]\ndevice_id = dev1\n");
    let config = write(
        &dir,
        "config.ini",
        "[upload]\n\
         oss_end_point = oss-cn-hangzhou.aliyuncs.com\n\
         oss_bucket = logs\n\
         oss_access_id = LTAIexample\n\
         oss_access_key = secret\n",
    );

    let settings = Settings::load(&device, &config).unwrap();
    assert_eq!(
        settings,
        Settings {
            device_id: "dev1".into(),
            oss_end_point: "oss-cn-hangzhou.aliyuncs.com".into(),
            oss_bucket: "logs".into(),
            oss_access_id: "LTAIexample".into(),
            oss_access_key: "secret".into(),
        }
    );
}

#[test]
fn test_missing_upload_section_leaves_fields_empty() {
    let dir = tempdir().unwrap();
    let device = write(&dir, "device.ini", "[device]\ndevice_id = dev1\n");
    let config = write(&dir, "config.ini", "[other]\noss_bucket = ignored\n");

    let settings = Settings::load(&device, &config).unwrap();
    assert_eq!(settings.device_id, "dev1");
    assert!(settings.oss_end_point.is_empty());
    assert!(settings.oss_bucket.is_empty());
    assert!(settings.oss_access_id.is_empty());
    assert!(settings.oss_access_key.is_empty());
}

#[test]
fn test_missing_keys_leave_fields_empty() {
    let dir = tempdir().unwrap();
    let device = write(&dir, "device.ini", "[device]\n");
    let config = write(&dir, "config.ini", "[upload]\noss_end_point = example.com\n");

    let settings = Settings::load(&device, &config).unwrap();
    assert!(settings.device_id.is_empty());
    assert_eq!(settings.oss_end_point, "example.com");
    assert!(settings.oss_bucket.is_empty());
}

#[test]
fn test_comments_and_whitespace() {
    let dir = tempdir().unwrap();
    let device = write(&dir, "device.ini", "; device identity\n[device]\n# the id\n  device_id   =   dev-7  \n");
    let config = write(&dir, "config.ini", "[upload]\n");

    let settings = Settings::load(&device, &config).unwrap();
    assert_eq!(settings.device_id, "dev-7");
}

#[test]
fn test_missing_file_is_error() {
    let dir = tempdir().unwrap();
    let config = write(&dir, "config.ini", "[upload]\n");

    let err = Settings::load(dir.path().join("absent.ini"), &config).unwrap_err();
    let SettingsError::Unreadable { path, .. } = &err;
    assert_eq!(path, &dir.path().join("absent.ini"));
    assert!(err.to_string().starts_with("Fail to find"));
}

#[test]
fn test_later_file_does_not_touch_device_id() {
    let dir = tempdir().unwrap();
    let device = write(&dir, "device.ini", "[device]\ndevice_id = dev1\n");
    let config = write(&dir, "config.ini", "[device]\ndevice_id = other\n[upload]\noss_bucket = logs\n");

    let settings = Settings::load(&device, &config).unwrap();
    assert_eq!(settings.device_id, "dev1");
    assert_eq!(settings.oss_bucket, "logs");
}
