use serde::Deserialize;

/// Tokens the source files use for "no value"
const MISSING_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "#N/A", "n/a"];

/// One row of `athlete_events.csv`: a single athlete-event participation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AthleteEventRecord {
    #[serde(rename = "ID")]
    pub id: Option<String>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Sex")]
    pub sex: Option<String>,
    #[serde(rename = "Age")]
    pub age: Option<String>,
    #[serde(rename = "Height")]
    pub height: Option<String>,
    #[serde(rename = "Weight")]
    pub weight: Option<String>,
    #[serde(rename = "Team")]
    pub team: Option<String>,
    #[serde(rename = "NOC")]
    pub noc: Option<String>,
    #[serde(rename = "Games")]
    pub games: Option<String>,
    #[serde(rename = "Year")]
    pub year: Option<String>,
    #[serde(rename = "Season")]
    pub season: Option<String>,
    #[serde(rename = "City")]
    pub city: Option<String>,
    #[serde(rename = "Sport")]
    pub sport: Option<String>,
    #[serde(rename = "Event")]
    pub event: Option<String>,
    #[serde(rename = "Medal")]
    pub medal: Option<String>,
}

/// One row of `noc_regions.csv`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NocRegionRecord {
    #[serde(rename = "NOC")]
    pub noc: Option<String>,
    pub region: Option<String>,
    pub notes: Option<String>,
}

/// Columns that must be present in the athlete-events header
pub const ATHLETE_EVENT_COLUMNS: &[&str] = &[
    "ID", "Name", "Sex", "Age", "Height", "Weight", "Team", "NOC", "Games", "Year", "Season",
    "City", "Sport", "Event", "Medal",
];

/// Columns that must be present in the NOC-regions header
pub const NOC_REGION_COLUMNS: &[&str] = &["NOC", "region", "notes"];

impl AthleteEventRecord {
    /// Convert missing-value tokens to `None` in every field
    pub fn normalized(self) -> Self {
        Self {
            id: present(self.id),
            name: present(self.name),
            sex: present(self.sex),
            age: present(self.age),
            height: present(self.height),
            weight: present(self.weight),
            team: present(self.team),
            noc: present(self.noc),
            games: present(self.games),
            year: present(self.year),
            season: present(self.season),
            city: present(self.city),
            sport: present(self.sport),
            event: present(self.event),
            medal: present(self.medal),
        }
    }
}

impl NocRegionRecord {
    pub fn normalized(self) -> Self {
        Self {
            noc: present(self.noc),
            region: present(self.region),
            notes: present(self.notes),
        }
    }
}

/// `None` for missing-value tokens, the untouched value otherwise
pub fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !is_missing(v))
}

pub fn is_missing(value: &str) -> bool {
    MISSING_TOKENS.contains(&value.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tokens() {
        assert!(is_missing("NA"));
        assert!(is_missing(" N/A "));
        assert!(is_missing(""));
        assert!(!is_missing("NAM"));
        assert!(!is_missing("0"));
    }

    #[test]
    fn test_normalized_keeps_values() {
        let record = AthleteEventRecord {
            id: Some("1".into()),
            age: Some("NA".into()),
            medal: Some("Gold".into()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(record.id.as_deref(), Some("1"));
        assert_eq!(record.age, None);
        assert_eq!(record.medal.as_deref(), Some("Gold"));
    }
}
