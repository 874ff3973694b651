use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of heat accumulation. `value` is always ≥ 0; days with no cached
/// weather contribute 0.0 but stay in the series so it has no date gaps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyHeatPoint {
    pub day: NaiveDate,
    pub value: f64,
}

/// Running total of the daily series, one point per daily point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CumulativeHeatPoint {
    pub day: NaiveDate,
    pub value: f64,
}

/// Day-level heat-accumulation model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatModel {
    /// Base-10 growing degree days, no upper clamp.
    #[default]
    Classic,
    /// eGDD: the classic core attenuated above 30 °C to model heat stress.
    Effective,
}

impl HeatModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeatModel::Classic => "classic",
            HeatModel::Effective => "effective",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "classic" | "gdd" => Some(HeatModel::Classic),
            "effective" | "egdd" => Some(HeatModel::Effective),
            _ => None,
        }
    }
}

impl std::fmt::Display for HeatModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the accumulation window's start day is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartRule {
    /// April 1 of the season year.
    #[default]
    Fixed,
    /// The observed budbreak day when it falls before April 1, else April 1.
    Budbreak,
}

impl StartRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            StartRule::Fixed => "fixed",
            StartRule::Budbreak => "budbreak",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Some(StartRule::Fixed),
            "budbreak" => Some(StartRule::Budbreak),
            _ => None,
        }
    }
}

impl std::fmt::Display for StartRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameters of one series request.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesQuery {
    pub year: i32,
    pub block: Option<String>,
    pub variety: Option<String>,
    pub model: HeatModel,
    pub start_rule: StartRule,
}

impl SeriesQuery {
    pub fn new(year: i32, model: HeatModel, start_rule: StartRule) -> Self {
        Self {
            year,
            block: None,
            variety: None,
            model,
            start_rule,
        }
    }

    pub fn with_block(mut self, block: &str) -> Self {
        self.block = Some(block.to_string());
        self
    }

    pub fn with_variety(mut self, variety: &str) -> Self {
        self.variety = Some(variety.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heat_model_from_str() {
        assert_eq!(HeatModel::from_str("classic"), Some(HeatModel::Classic));
        assert_eq!(HeatModel::from_str("GDD"), Some(HeatModel::Classic));
        assert_eq!(HeatModel::from_str("effective"), Some(HeatModel::Effective));
        assert_eq!(HeatModel::from_str("eGDD"), Some(HeatModel::Effective));
        assert_eq!(HeatModel::from_str("linear"), None);
    }

    #[test]
    fn start_rule_from_str() {
        assert_eq!(StartRule::from_str("fixed"), Some(StartRule::Fixed));
        assert_eq!(StartRule::from_str("Budbreak"), Some(StartRule::Budbreak));
        assert_eq!(StartRule::from_str("april"), None);
    }

    #[test]
    fn round_trip_through_as_str() {
        for model in [HeatModel::Classic, HeatModel::Effective] {
            assert_eq!(HeatModel::from_str(model.as_str()), Some(model));
        }
        for rule in [StartRule::Fixed, StartRule::Budbreak] {
            assert_eq!(StartRule::from_str(rule.as_str()), Some(rule));
        }
    }

    #[test]
    fn query_builder() {
        let query = SeriesQuery::new(2024, HeatModel::Effective, StartRule::Budbreak)
            .with_block("Home block")
            .with_variety("Riesling");

        assert_eq!(query.year, 2024);
        assert_eq!(query.block.as_deref(), Some("Home block"));
        assert_eq!(query.variety.as_deref(), Some("Riesling"));
    }
}
