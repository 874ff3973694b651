use serde::{Deserialize, Serialize};

/// Stage codes follow the modified E-L scale the diary uses. The three
/// thresholds that bound heat-accumulation windows:
pub const BUDBREAK_CODE: i32 = 5;
pub const BLOOM_CODE: i32 = 23;
pub const HARVEST_CODE: i32 = 40;

/// A typed growth-stage observation. The diary file stores stages as
/// "`<code>: <label>`" strings; parsing happens once, when entries are
/// loaded, so everything downstream compares plain integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhenologyStage {
    pub code: i32,
    pub label: String,
}

impl PhenologyStage {
    /// Parse the diary's "`<code>: <label>`" form. Returns `None` when the
    /// leading token is not an integer; such records stay in the diary but
    /// never match a stage threshold.
    pub fn parse(raw: &str) -> Option<Self> {
        let (code_part, label_part) = match raw.split_once(':') {
            Some((code, label)) => (code, label),
            None => (raw, ""),
        };

        let code = code_part.trim().parse::<i32>().ok()?;
        Some(Self {
            code,
            label: label_part.trim().to_string(),
        })
    }
}

impl std::fmt::Display for PhenologyStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.label.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}: {}", self.code, self.label)
        }
    }
}

/// Fold a variety name for matching: lowercase plus Latin diacritic
/// stripping, so "Grüner Veltliner" and "gruner veltliner" compare equal.
pub fn fold_name(name: &str) -> String {
    let mut folded = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        match c {
            'à'..='å' | 'ā' | 'ă' | 'ą' => folded.push('a'),
            'è'..='ë' | 'ē' | 'ė' | 'ę' | 'ě' => folded.push('e'),
            'ì'..='ï' | 'ī' | 'į' => folded.push('i'),
            'ò'..='ö' | 'ō' | 'ő' | 'ø' => folded.push('o'),
            'ù'..='ü' | 'ū' | 'ű' | 'ů' => folded.push('u'),
            'ç' | 'ć' | 'č' => folded.push('c'),
            'ñ' | 'ń' | 'ň' => folded.push('n'),
            'š' | 'ś' => folded.push('s'),
            'ž' | 'ź' | 'ż' => folded.push('z'),
            'ý' | 'ÿ' => folded.push('y'),
            'ß' => folded.push_str("ss"),
            _ => folded.push(c),
        }
    }
    folded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_stage_strings() {
        let stage = PhenologyStage::parse("5: Budbreak").unwrap();
        assert_eq!(stage.code, 5);
        assert_eq!(stage.label, "Budbreak");

        let stage = PhenologyStage::parse("  23 :  Full bloom ").unwrap();
        assert_eq!(stage.code, 23);
        assert_eq!(stage.label, "Full bloom");

        // Bare code without a label is still a stage
        let stage = PhenologyStage::parse("40").unwrap();
        assert_eq!(stage.code, 40);
        assert_eq!(stage.label, "");
    }

    #[test]
    fn parse_rejects_non_numeric_prefix() {
        assert_eq!(PhenologyStage::parse("Budbreak"), None);
        assert_eq!(PhenologyStage::parse(": missing code"), None);
        assert_eq!(PhenologyStage::parse("five: Budbreak"), None);
        assert_eq!(PhenologyStage::parse(""), None);
    }

    #[test]
    fn display_round_trips_the_diary_form() {
        let stage = PhenologyStage::parse("40: Harvest ripe").unwrap();
        assert_eq!(stage.to_string(), "40: Harvest ripe");
        assert_eq!(PhenologyStage::parse(&stage.to_string()), Some(stage));
    }

    #[test]
    fn fold_name_is_case_insensitive() {
        assert_eq!(fold_name("Riesling"), fold_name("RIESLING"));
        assert_eq!(fold_name("Pinot Noir"), "pinot noir");
    }

    #[test]
    fn fold_name_strips_diacritics() {
        assert_eq!(fold_name("Grüner Veltliner"), "gruner veltliner");
        assert_eq!(fold_name("Blaufränkisch"), "blaufrankisch");
        assert_eq!(fold_name("Albariño"), "albarino");
        assert_eq!(fold_name("Kékfrankos"), "kekfrankos");
        assert_eq!(fold_name("Müller-Thurgau"), fold_name("Muller-Thurgau"));
    }

    #[test]
    fn milestone_codes_are_ordered() {
        assert!(BUDBREAK_CODE < BLOOM_CODE);
        assert!(BLOOM_CODE < HARVEST_CODE);
    }
}
