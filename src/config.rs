use serde::Deserialize;

use crate::provider::SharingStyle;

/// `plugins.sharekit` in `tauri.conf.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Report mail and social cancellations with the cancellation sentinel,
    /// like a dismissed chooser.
    pub unify_cancellation: bool,
    /// Styling every window starts with until `set_style` is called.
    pub style: SharingStyle,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: Config = serde_json::from_value(json!({})).unwrap();
        assert!(!config.unify_cancellation);
        assert_eq!(config.style, SharingStyle::default());

        let absent: Option<Config> = serde_json::from_value(json!(null)).unwrap();
        assert!(absent.is_none());
    }

    #[test]
    fn style_is_read_in_camel_case() {
        let config: Config = serde_json::from_value(json!({
            "unifyCancellation": true,
            "style": {
                "backgroundColor": { "red": 10, "green": 20, "blue": 30 },
                "barButtonTitle": { "fontSize": 15.0 }
            }
        }))
        .unwrap();

        assert!(config.unify_cancellation);
        let background = config.style.background_color.unwrap();
        assert_eq!((background.red, background.alpha), (10, 255));
        assert_eq!(
            config.style.bar_button_title.and_then(|t| t.font_size),
            Some(15.0)
        );
    }
}
