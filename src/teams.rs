//! Canonical NBA franchises and the case-insensitive name lookup.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Team {
    AtlantaHawks,
    BostonCeltics,
    BrooklynNets,
    CharlotteHornets,
    ChicagoBulls,
    ClevelandCavaliers,
    DallasMavericks,
    DenverNuggets,
    DetroitPistons,
    GoldenStateWarriors,
    HoustonRockets,
    IndianaPacers,
    LosAngelesClippers,
    LosAngelesLakers,
    MemphisGrizzlies,
    MiamiHeat,
    MilwaukeeBucks,
    MinnesotaTimberwolves,
    NewOrleansPelicans,
    NewYorkKnicks,
    OklahomaCityThunder,
    OrlandoMagic,
    Philadelphia76ers,
    PhoenixSuns,
    PortlandTrailBlazers,
    SacramentoKings,
    SanAntonioSpurs,
    TorontoRaptors,
    UtahJazz,
    WashingtonWizards,
}

impl Team {
    pub const ALL: [Team; 30] = [
        Team::AtlantaHawks,
        Team::BostonCeltics,
        Team::BrooklynNets,
        Team::CharlotteHornets,
        Team::ChicagoBulls,
        Team::ClevelandCavaliers,
        Team::DallasMavericks,
        Team::DenverNuggets,
        Team::DetroitPistons,
        Team::GoldenStateWarriors,
        Team::HoustonRockets,
        Team::IndianaPacers,
        Team::LosAngelesClippers,
        Team::LosAngelesLakers,
        Team::MemphisGrizzlies,
        Team::MiamiHeat,
        Team::MilwaukeeBucks,
        Team::MinnesotaTimberwolves,
        Team::NewOrleansPelicans,
        Team::NewYorkKnicks,
        Team::OklahomaCityThunder,
        Team::OrlandoMagic,
        Team::Philadelphia76ers,
        Team::PhoenixSuns,
        Team::PortlandTrailBlazers,
        Team::SacramentoKings,
        Team::SanAntonioSpurs,
        Team::TorontoRaptors,
        Team::UtahJazz,
        Team::WashingtonWizards,
    ];

    /// Canonical (stored) name.
    pub fn name(self) -> &'static str {
        match self {
            Team::AtlantaHawks => "ATLANTA HAWKS",
            Team::BostonCeltics => "BOSTON CELTICS",
            Team::BrooklynNets => "BROOKLYN NETS",
            Team::CharlotteHornets => "CHARLOTTE HORNETS",
            Team::ChicagoBulls => "CHICAGO BULLS",
            Team::ClevelandCavaliers => "CLEVELAND CAVALIERS",
            Team::DallasMavericks => "DALLAS MAVERICKS",
            Team::DenverNuggets => "DENVER NUGGETS",
            Team::DetroitPistons => "DETROIT PISTONS",
            Team::GoldenStateWarriors => "GOLDEN STATE WARRIORS",
            Team::HoustonRockets => "HOUSTON ROCKETS",
            Team::IndianaPacers => "INDIANA PACERS",
            Team::LosAngelesClippers => "LOS ANGELES CLIPPERS",
            Team::LosAngelesLakers => "LOS ANGELES LAKERS",
            Team::MemphisGrizzlies => "MEMPHIS GRIZZLIES",
            Team::MiamiHeat => "MIAMI HEAT",
            Team::MilwaukeeBucks => "MILWAUKEE BUCKS",
            Team::MinnesotaTimberwolves => "MINNESOTA TIMBERWOLVES",
            Team::NewOrleansPelicans => "NEW ORLEANS PELICANS",
            Team::NewYorkKnicks => "NEW YORK KNICKS",
            Team::OklahomaCityThunder => "OKLAHOMA CITY THUNDER",
            Team::OrlandoMagic => "ORLANDO MAGIC",
            Team::Philadelphia76ers => "PHILADELPHIA 76ERS",
            Team::PhoenixSuns => "PHOENIX SUNS",
            Team::PortlandTrailBlazers => "PORTLAND TRAIL BLAZERS",
            Team::SacramentoKings => "SACRAMENTO KINGS",
            Team::SanAntonioSpurs => "SAN ANTONIO SPURS",
            Team::TorontoRaptors => "TORONTO RAPTORS",
            Team::UtahJazz => "UTAH JAZZ",
            Team::WashingtonWizards => "WASHINGTON WIZARDS",
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Team {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        normalize(s)
    }
}

fn lookup_table() -> &'static HashMap<&'static str, Team> {
    static TABLE: OnceLock<HashMap<&'static str, Team>> = OnceLock::new();
    TABLE.get_or_init(|| Team::ALL.iter().map(|&t| (t.name(), t)).collect())
}

/// Strip source decorations (basketball reference marks playoff teams with a
/// trailing `*`) and upper-case.
fn clean_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Map a team name in any casing to its canonical `Team`.
pub fn normalize(raw: &str) -> Result<Team> {
    lookup_table()
        .get(clean_name(raw).as_str())
        .copied()
        .ok_or_else(|| AppError::UnknownTeam(raw.to_string()))
}
