use serde::Serialize;

use crate::models::Verdict;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BadgeVariant {
    Default,
    Destructive,
    Secondary,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BadgeIcon {
    CheckCircle,
    XCircle,
    HelpCircle,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Badge {
    pub variant: BadgeVariant,
    pub icon: BadgeIcon,
    pub label: &'static str,
}

pub fn badge_for(verdict: Verdict) -> Badge {
    let (variant, icon) = match verdict {
        Verdict::Normal => (BadgeVariant::Default, BadgeIcon::CheckCircle),
        Verdict::Defective => (BadgeVariant::Destructive, BadgeIcon::XCircle),
        Verdict::NotABearing => (BadgeVariant::Secondary, BadgeIcon::HelpCircle),
    };
    Badge {
        variant,
        icon,
        label: verdict.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_verdict_has_its_own_badge() {
        assert_eq!(badge_for(Verdict::Normal).icon, BadgeIcon::CheckCircle);
        assert_eq!(badge_for(Verdict::Defective).variant, BadgeVariant::Destructive);
        assert_eq!(
            serde_json::to_value(badge_for(Verdict::NotABearing)).unwrap(),
            json!({ "variant": "secondary", "icon": "help-circle", "label": "Not a bearing" })
        );
    }
}
