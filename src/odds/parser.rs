use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::odds::feed::{Competitor, FeedEvent, FeedGroup, Market};
use crate::types::OddsLine;

const GAME_EVENT: &str = "GAMEEVENT";
const FULL_MATCH: &str = "Match";
const MONEYLINE: &str = "Moneyline";
const POINT_SPREAD: &str = "Point Spread";

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedFeed {
    /// The feed carried no game events. Not an error.
    NoData,
    /// Upcoming games. May be empty when every listed game has started.
    Lines(Vec<OddsLine>),
}

/// Flatten a feed into one `OddsLine` per upcoming game.
///
/// Games starting at or before `now` are skipped: live and finished games no
/// longer carry pre-game lines. Any malformed game fails the whole feed.
pub fn parse_feed(
    groups: &[FeedGroup],
    now: NaiveDateTime,
    scrape_time: NaiveDateTime,
) -> Result<ParsedFeed> {
    let Some(group) = groups.first() else {
        return Ok(ParsedFeed::NoData);
    };

    let games: Vec<&FeedEvent> = group
        .events
        .iter()
        .filter(|e| e.description.contains('@') && e.kind == GAME_EVENT)
        .collect();
    if games.is_empty() {
        return Ok(ParsedFeed::NoData);
    }

    let mut lines = Vec::with_capacity(games.len());
    for game in games {
        if let Some(line) = parse_game(game, now, scrape_time)? {
            lines.push(line);
        }
    }
    Ok(ParsedFeed::Lines(lines))
}

fn parse_game(
    game: &FeedEvent,
    now: NaiveDateTime,
    scrape_time: NaiveDateTime,
) -> Result<Option<OddsLine>> {
    let start_time = parse_start_time(&game.link)?;
    if start_time <= now {
        info!(
            game = %game.description,
            %start_time,
            "Game is ongoing or completed, not scraping"
        );
        return Ok(None);
    }

    let (home_team, away_team) = parse_teams(&game.competitors)?;

    let full_match: Vec<&Market> = game
        .display_groups
        .first()
        .map(|g| g.markets.iter().filter(|m| m.period.description == FULL_MATCH).collect())
        .unwrap_or_default();

    let mut moneyline = (None, None);
    let mut spread = (None, None, None);
    for market in full_match {
        match market.description.as_str() {
            MONEYLINE => moneyline = parse_moneyline(market)?,
            POINT_SPREAD => spread = parse_spread(market)?,
            other => debug!(market = other, "Ignoring market"),
        }
    }

    Ok(Some(OddsLine {
        home_team,
        away_team,
        start_time,
        spread: spread.0,
        home_spread_price: spread.1,
        away_spread_price: spread.2,
        home_moneyline: moneyline.0,
        away_moneyline: moneyline.1,
        scrape_time,
    }))
}

/// The start time is the run of digits in the last `-` segment of the link,
/// laid out as `YYYYMMDDHHMM`.
fn parse_start_time(link: &str) -> Result<NaiveDateTime> {
    let tail = link.rsplit('-').next().unwrap_or(link);
    let digits: String = tail.chars().filter(|c| c.is_ascii_digit()).collect();
    let bad = || AppError::Parse(format!("no YYYYMMDDHHMM start time in link {link:?}"));
    if digits.len() != 12 {
        return Err(bad());
    }
    let field = |range: std::ops::Range<usize>| digits[range].parse::<u32>().map_err(|_| bad());

    let year = field(0..4)? as i32;
    NaiveDate::from_ymd_opt(year, field(4..6)?, field(6..8)?)
        .and_then(|d| d.and_hms_opt(field(8..10).ok()?, field(10..12).ok()?, 0))
        .ok_or_else(bad)
}

fn parse_teams(competitors: &[Competitor]) -> Result<(String, String)> {
    if competitors.len() > 2 {
        return Err(AppError::Parse(format!(
            "unexpected objects in competitors: {} entries",
            competitors.len()
        )));
    }
    let name = |home: bool| {
        competitors
            .iter()
            .find(|c| c.home == home)
            .map(|c| c.name.trim().to_uppercase())
            .filter(|n| !n.is_empty())
    };
    match (name(true), name(false)) {
        (Some(home), Some(away)) => Ok((home, away)),
        _ => Err(AppError::Parse(
            "competitors missing a home or away team".to_string(),
        )),
    }
}

/// Returns (home, away) American prices.
fn parse_moneyline(market: &Market) -> Result<(Option<i32>, Option<i32>)> {
    check_outcome_count(market)?;
    let mut home = None;
    let mut away = None;
    for o in &market.outcomes {
        let price = parse_american(o.price.american.as_deref())?;
        match o.side.as_str() {
            "H" => home = price,
            "A" => away = price,
            _ => {}
        }
    }
    if home.is_none() && away.is_none() {
        return Err(AppError::Parse("moneyline market has no prices".to_string()));
    }
    Ok((home, away))
}

/// Returns (spread, home price, away price). The handicap is read from the
/// home outcome so the spread is in home perspective.
fn parse_spread(market: &Market) -> Result<(Option<f64>, Option<i32>, Option<i32>)> {
    check_outcome_count(market)?;
    let mut spread = None;
    let mut home_price = None;
    let mut away_price = None;
    for o in &market.outcomes {
        match o.side.as_str() {
            "H" => {
                spread = parse_handicap(o.price.handicap.as_deref())?;
                home_price = parse_american(o.price.american.as_deref())?;
            }
            "A" => away_price = parse_american(o.price.american.as_deref())?,
            _ => {}
        }
    }
    if spread.is_none() && home_price.is_none() && away_price.is_none() {
        return Err(AppError::Parse("point spread market has no values".to_string()));
    }
    Ok((spread, home_price, away_price))
}

fn check_outcome_count(market: &Market) -> Result<()> {
    if market.outcomes.len() > 2 {
        return Err(AppError::Parse(format!(
            "unexpected objects in {} market: {} outcomes",
            market.description,
            market.outcomes.len()
        )));
    }
    Ok(())
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_american(raw: Option<&str>) -> Result<Option<i32>> {
    let Some(raw) = non_empty(raw) else {
        return Ok(None);
    };
    if raw.eq_ignore_ascii_case("EVEN") {
        return Ok(Some(100));
    }
    raw.parse::<i32>()
        .map(Some)
        .map_err(|_| AppError::Parse(format!("american price {raw:?}")))
}

fn parse_handicap(raw: Option<&str>) -> Result<Option<f64>> {
    let Some(raw) = non_empty(raw) else {
        return Ok(None);
    };
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| AppError::Parse(format!("handicap {raw:?}")))
}
