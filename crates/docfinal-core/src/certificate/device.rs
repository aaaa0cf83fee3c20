//! Best-effort device classification from a user-agent string
//!
//! Thresholds are heuristic: tablets are checked first so that iPads and
//! Android devices without a "mobile" token are not reported as phones.

use serde::{Deserialize, Serialize};

const TABLET_TOKENS: &[&str] = &["ipad", "tablet", "playbook", "silk"];
const MOBILE_TOKENS: &[&str] = &["mobi", "iphone", "ipod", "android", "windows phone", "blackberry"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceKind {
    Desktop,
    Mobile,
    Tablet,
}

impl DeviceKind {
    /// Classify a user agent. A missing user agent counts as desktop.
    pub fn from_user_agent(user_agent: Option<&str>) -> Self {
        let Some(ua) = user_agent else {
            return DeviceKind::Desktop;
        };
        let ua = ua.to_lowercase();

        let android_tablet = ua.contains("android") && !ua.contains("mobile");
        if android_tablet || TABLET_TOKENS.iter().any(|t| ua.contains(t)) {
            DeviceKind::Tablet
        } else if MOBILE_TOKENS.iter().any(|t| ua.contains(t)) {
            DeviceKind::Mobile
        } else {
            DeviceKind::Desktop
        }
    }

    pub fn descriptor(&self) -> &'static str {
        match self {
            DeviceKind::Desktop => "Desktop Browser",
            DeviceKind::Mobile => "Mobile Browser",
            DeviceKind::Tablet => "Tablet Browser",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let cases = [
            (
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0",
                DeviceKind::Desktop,
            ),
            (
                "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile/15E148",
                DeviceKind::Mobile,
            ),
            (
                "Mozilla/5.0 (Linux; Android 14; Pixel 8) Chrome/120.0 Mobile Safari/537.36",
                DeviceKind::Mobile,
            ),
            (
                "Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X) Mobile/15E148",
                DeviceKind::Tablet,
            ),
            (
                "Mozilla/5.0 (Linux; Android 13; SM-X700) Chrome/120.0 Safari/537.36",
                DeviceKind::Tablet,
            ),
        ];
        for (ua, expected) in cases {
            assert_eq!(DeviceKind::from_user_agent(Some(ua)), expected, "{}", ua);
        }
    }

    #[test]
    fn test_missing_user_agent_is_desktop() {
        assert_eq!(DeviceKind::from_user_agent(None), DeviceKind::Desktop);
        assert_eq!(DeviceKind::Desktop.descriptor(), "Desktop Browser");
    }
}
