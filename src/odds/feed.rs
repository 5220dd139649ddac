use serde::Deserialize;

/// Top-level element of the odds feed response array.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct FeedGroup {
    #[serde(default)]
    pub events: Vec<FeedEvent>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct FeedEvent {
    #[serde(default)]
    pub description: String,
    /// "GAMEEVENT" for games; futures and props use other values.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Path ending in `-YYYYMMDDHHMM`.
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub competitors: Vec<Competitor>,
    #[serde(rename = "displayGroups", default)]
    pub display_groups: Vec<DisplayGroup>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Competitor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub home: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DisplayGroup {
    #[serde(default)]
    pub markets: Vec<Market>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Market {
    /// "Moneyline", "Point Spread", "Total", ...
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub period: Period,
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Period {
    /// "Match" for full-game markets.
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Outcome {
    /// "H" or "A".
    #[serde(rename = "type", default)]
    pub side: String,
    #[serde(default)]
    pub price: Price,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Price {
    pub american: Option<String>,
    pub handicap: Option<String>,
}

/// Parse a raw response body. An empty array is valid (no data).
pub fn parse_body(raw: &str) -> serde_json::Result<Vec<FeedGroup>> {
    serde_json::from_str(raw)
}

/// True if the first group carries any events at all.
pub fn has_events(groups: &[FeedGroup]) -> bool {
    groups.first().is_some_and(|g| !g.events.is_empty())
}
