// CSV ingest for season stat lines and scouting grades.
//
// Column layouts:
//   pitching stats:    ID,Name,Year,Level,Split,IP,K,BB,HR,ER
//   batting stats:     ID,Name,Year,Level,Split,PA,AB,H,2B,3B,HR,BB,K,SB
//   pitcher scouting:  ID,Name,Stuff,Control,HRA,Stamina,OVR,POT,Age,AsOf
//   batter scouting:   ID,Name,Power,Eye,AvoidK,Speed,OVR,POT,Age,AsOf
//
// Extra columns are ignored. Counting stats that are missing or non-numeric
// read as zero; rows without a usable id/year/level or skill grades are
// skipped with a warning.

use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};
use truerating_engine::types::{
    BatterSkills, BattingCounts, Level, PitcherSkills, PitchingCounts, SeasonStatLine,
    SkillGrades, Split, StatCounts,
};
use truerating_engine::{ScoutingGrade, ScoutingSource};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

// ---------------------------------------------------------------------------
// Raw CSV rows (private)
// ---------------------------------------------------------------------------

/// Every field is read as text so one bad cell never rejects the row.
#[derive(Debug, Deserialize)]
struct RawPitchingLine {
    #[serde(rename = "ID", alias = "PlayerID", default)]
    id: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "Level", default)]
    level: String,
    #[serde(rename = "Split", default)]
    split: String,
    #[serde(rename = "IP", default)]
    ip: String,
    #[serde(rename = "K", alias = "SO", default)]
    k: String,
    #[serde(rename = "BB", default)]
    bb: String,
    #[serde(rename = "HR", alias = "HRA", default)]
    hr: String,
    #[serde(rename = "ER", default)]
    er: String,
}

#[derive(Debug, Deserialize)]
struct RawBattingLine {
    #[serde(rename = "ID", alias = "PlayerID", default)]
    id: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "Level", default)]
    level: String,
    #[serde(rename = "Split", default)]
    split: String,
    #[serde(rename = "PA", default)]
    pa: String,
    #[serde(rename = "AB", default)]
    ab: String,
    #[serde(rename = "H", default)]
    h: String,
    #[serde(rename = "2B", default)]
    doubles: String,
    #[serde(rename = "3B", default)]
    triples: String,
    #[serde(rename = "HR", default)]
    hr: String,
    #[serde(rename = "BB", default)]
    bb: String,
    #[serde(rename = "K", alias = "SO", default)]
    k: String,
    #[serde(rename = "SB", default)]
    sb: String,
}

#[derive(Debug, Deserialize)]
struct RawPitcherScouting {
    #[serde(rename = "ID", alias = "PlayerID", default)]
    id: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Stuff", alias = "STU", default)]
    stuff: String,
    #[serde(rename = "Control", alias = "CON", default)]
    control: String,
    #[serde(rename = "HRA", default)]
    hra: String,
    #[serde(rename = "Stamina", alias = "STM", default)]
    stamina: String,
    #[serde(rename = "OVR", default)]
    ovr: String,
    #[serde(rename = "POT", default)]
    pot: String,
    #[serde(rename = "Age", default)]
    age: String,
    #[serde(rename = "AsOf", alias = "Date", default)]
    as_of: String,
}

#[derive(Debug, Deserialize)]
struct RawBatterScouting {
    #[serde(rename = "ID", alias = "PlayerID", default)]
    id: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Power", alias = "POW", default)]
    power: String,
    #[serde(rename = "Eye", alias = "EYE", default)]
    eye: String,
    #[serde(rename = "AvoidK", alias = "AvK", default)]
    avoid_k: String,
    #[serde(rename = "Speed", alias = "SPE", default)]
    speed: String,
    #[serde(rename = "OVR", default)]
    ovr: String,
    #[serde(rename = "POT", default)]
    pot: String,
    #[serde(rename = "Age", default)]
    age: String,
    #[serde(rename = "AsOf", alias = "Date", default)]
    as_of: String,
}

// ---------------------------------------------------------------------------
// Field parsers
// ---------------------------------------------------------------------------

/// Counting stat: missing or non-numeric reads as zero.
fn count(s: &str) -> f64 {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Innings in baseball notation: `180.2` is 180 and two thirds. Anything
/// that is not `<whole>.<0|1|2>` is read as a plain decimal.
pub fn parse_innings(s: &str) -> f64 {
    let trimmed = s.trim();
    if let Some((whole, frac)) = trimmed.split_once('.') {
        if let (Ok(w), Ok(outs @ 0..=2)) = (whole.parse::<u32>(), frac.parse::<u32>()) {
            if frac.len() == 1 {
                return w as f64 + outs as f64 / 3.0;
            }
        }
    }
    count(trimmed)
}

/// Star strings such as `"4.5 Stars"` or `"3"`. Empty or unreadable is `None`.
pub fn parse_stars(s: &str) -> Option<f64> {
    s.split_whitespace()
        .next()
        .and_then(|tok| tok.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// As-of dates: ISO `2024-06-01`, US `6/1/2024`, or a bare year (January 1st).
pub fn parse_as_of(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%m/%d/%Y"))
        .ok()
        .or_else(|| {
            trimmed
                .parse::<i32>()
                .ok()
                .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
        })
}

fn grade(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Player id; empty means unknown (0).
fn player_id(s: &str) -> Option<u32> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        Some(0)
    } else {
        trimmed.parse::<u32>().ok()
    }
}

fn optional_name(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Identity columns shared by both stat files.
fn identity(
    kind: &str,
    id: &str,
    name: &str,
    year: &str,
    level: &str,
) -> Option<(u32, String, i32, Level)> {
    let Some(player_id) = player_id(id).filter(|id| *id != 0) else {
        warn!("skipping {kind} row for '{}': missing or invalid ID '{}'", name.trim(), id);
        return None;
    };
    let Ok(year) = year.trim().parse::<i32>() else {
        warn!("skipping {kind} row for player {player_id}: invalid Year '{}'", year);
        return None;
    };
    let Some(level) = Level::parse(level) else {
        warn!("skipping {kind} row for player {player_id}: unknown Level '{}'", level);
        return None;
    };
    Some((player_id, name.trim().to_string(), year, level))
}

fn csv_reader<R: Read>(rdr: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(rdr)
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, enable testing without temp files)
// ---------------------------------------------------------------------------

fn pitching_from_reader<R: Read>(rdr: R) -> Result<Vec<SeasonStatLine>, csv::Error> {
    let mut reader = csv_reader(rdr);
    let mut lines = Vec::new();
    for result in reader.deserialize::<RawPitchingLine>() {
        match result {
            Ok(raw) => {
                let Some((player_id, name, year, level)) =
                    identity("pitching", &raw.id, &raw.name, &raw.year, &raw.level)
                else {
                    continue;
                };
                lines.push(SeasonStatLine {
                    player_id,
                    name,
                    year,
                    level,
                    split: Split::parse(&raw.split),
                    counts: StatCounts::Pitching(PitchingCounts {
                        ip: parse_innings(&raw.ip),
                        k: count(&raw.k),
                        bb: count(&raw.bb),
                        hr: count(&raw.hr),
                        er: count(&raw.er),
                    }),
                });
            }
            Err(e) => {
                warn!("skipping malformed pitching row: {}", e);
            }
        }
    }
    Ok(lines)
}

fn batting_from_reader<R: Read>(rdr: R) -> Result<Vec<SeasonStatLine>, csv::Error> {
    let mut reader = csv_reader(rdr);
    let mut lines = Vec::new();
    for result in reader.deserialize::<RawBattingLine>() {
        match result {
            Ok(raw) => {
                let Some((player_id, name, year, level)) =
                    identity("batting", &raw.id, &raw.name, &raw.year, &raw.level)
                else {
                    continue;
                };
                lines.push(SeasonStatLine {
                    player_id,
                    name,
                    year,
                    level,
                    split: Split::parse(&raw.split),
                    counts: StatCounts::Batting(BattingCounts {
                        pa: count(&raw.pa),
                        ab: count(&raw.ab),
                        h: count(&raw.h),
                        doubles: count(&raw.doubles),
                        triples: count(&raw.triples),
                        hr: count(&raw.hr),
                        bb: count(&raw.bb),
                        k: count(&raw.k),
                        sb: count(&raw.sb),
                    }),
                });
            }
            Err(e) => {
                warn!("skipping malformed batting row: {}", e);
            }
        }
    }
    Ok(lines)
}

fn pitcher_scouting_from_reader<R: Read>(
    rdr: R,
    source: ScoutingSource,
) -> Result<Vec<ScoutingGrade>, csv::Error> {
    let mut reader = csv_reader(rdr);
    let mut grades = Vec::new();
    for result in reader.deserialize::<RawPitcherScouting>() {
        match result {
            Ok(raw) => {
                let Some(player_id) = player_id(&raw.id) else {
                    warn!("skipping pitcher scouting row '{}': invalid ID '{}'", raw.name, raw.id);
                    continue;
                };
                let name = optional_name(&raw.name);
                if player_id == 0 && name.is_none() {
                    warn!("skipping pitcher scouting row with neither ID nor Name");
                    continue;
                }
                let (Some(stuff), Some(control), Some(hra)) =
                    (grade(&raw.stuff), grade(&raw.control), grade(&raw.hra))
                else {
                    warn!("skipping pitcher scouting row for '{}': missing skill grades", raw.name);
                    continue;
                };
                let stamina = grade(&raw.stamina).unwrap_or_else(|| {
                    debug!("no stamina grade for '{}', using 50", raw.name);
                    50.0
                });
                grades.push(ScoutingGrade {
                    player_id,
                    name,
                    skills: SkillGrades::Pitcher(PitcherSkills {
                        stuff,
                        control,
                        hra,
                        stamina,
                    }),
                    overall_stars: parse_stars(&raw.ovr),
                    potential_stars: parse_stars(&raw.pot),
                    age: raw.age.trim().parse::<u32>().ok(),
                    source,
                    as_of: parse_as_of(&raw.as_of),
                });
            }
            Err(e) => {
                warn!("skipping malformed pitcher scouting row: {}", e);
            }
        }
    }
    Ok(grades)
}

fn batter_scouting_from_reader<R: Read>(
    rdr: R,
    source: ScoutingSource,
) -> Result<Vec<ScoutingGrade>, csv::Error> {
    let mut reader = csv_reader(rdr);
    let mut grades = Vec::new();
    for result in reader.deserialize::<RawBatterScouting>() {
        match result {
            Ok(raw) => {
                let Some(player_id) = player_id(&raw.id) else {
                    warn!("skipping batter scouting row '{}': invalid ID '{}'", raw.name, raw.id);
                    continue;
                };
                let name = optional_name(&raw.name);
                if player_id == 0 && name.is_none() {
                    warn!("skipping batter scouting row with neither ID nor Name");
                    continue;
                }
                let (Some(power), Some(eye), Some(avoid_k), Some(speed)) = (
                    grade(&raw.power),
                    grade(&raw.eye),
                    grade(&raw.avoid_k),
                    grade(&raw.speed),
                ) else {
                    warn!("skipping batter scouting row for '{}': missing skill grades", raw.name);
                    continue;
                };
                grades.push(ScoutingGrade {
                    player_id,
                    name,
                    skills: SkillGrades::Batter(BatterSkills {
                        power,
                        eye,
                        avoid_k,
                        speed,
                    }),
                    overall_stars: parse_stars(&raw.ovr),
                    potential_stars: parse_stars(&raw.pot),
                    age: raw.age.trim().parse::<u32>().ok(),
                    source,
                    as_of: parse_as_of(&raw.as_of),
                });
            }
            Err(e) => {
                warn!("skipping malformed batter scouting row: {}", e);
            }
        }
    }
    Ok(grades)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

fn open(path: &Path) -> Result<std::fs::File, IngestError> {
    std::fs::File::open(path).map_err(|e| IngestError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

fn csv_err(path: &Path) -> impl FnOnce(csv::Error) -> IngestError + '_ {
    move |e| IngestError::Csv {
        path: path.display().to_string(),
        source: e,
    }
}

/// Load pitching season lines from a CSV file.
pub fn load_pitching_stats(path: &Path) -> Result<Vec<SeasonStatLine>, IngestError> {
    pitching_from_reader(open(path)?).map_err(csv_err(path))
}

/// Load batting season lines from a CSV file.
pub fn load_batting_stats(path: &Path) -> Result<Vec<SeasonStatLine>, IngestError> {
    batting_from_reader(open(path)?).map_err(csv_err(path))
}

/// Load pitcher scouting grades, tagging every row with `source`.
pub fn load_pitcher_scouting(
    path: &Path,
    source: ScoutingSource,
) -> Result<Vec<ScoutingGrade>, IngestError> {
    pitcher_scouting_from_reader(open(path)?, source).map_err(csv_err(path))
}

/// Load batter scouting grades, tagging every row with `source`.
pub fn load_batter_scouting(
    path: &Path,
    source: ScoutingSource,
) -> Result<Vec<ScoutingGrade>, IngestError> {
    batter_scouting_from_reader(open(path)?, source).map_err(csv_err(path))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
