use promptrec_core::config::{Config, DevicePreference};
use promptrec_embed::select_device;

#[test]
fn cpu_preference_always_selects_cpu() {
    assert!(select_device(DevicePreference::Cpu).is_cpu());
}

#[cfg(not(feature = "metal"))]
#[test]
fn metal_request_without_the_feature_falls_back_to_cpu() {
    assert!(select_device(DevicePreference::Metal).is_cpu());
    assert!(select_device(DevicePreference::Auto).is_cpu());
}

#[test]
fn device_preference_is_read_from_config() {
    let settings = Config::from_toml_str("[embedding]\ndevice = \"cpu\"").unwrap().settings().unwrap();
    assert_eq!(settings.embedding.device, DevicePreference::Cpu);
    let defaults = Config::from_toml_str("").unwrap().settings().unwrap();
    assert_eq!(defaults.embedding.device, DevicePreference::Auto);
}
