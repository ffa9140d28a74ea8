// End-to-end run: load inputs, derive the league context, build one input
// per player, project everyone, and assemble the report.

use anyhow::Context;
use chrono::Datelike;
use std::collections::BTreeMap;
use tracing::{info, warn};
use truerating_engine::scouting::ResolvedScouting;
use truerating_engine::types::SeasonStatLine;
use truerating_engine::{PlayerInput, PlayerKind, Projector, ScoutingGrade};

use crate::config::Config;
use crate::report::Report;
use crate::source::{load_inputs, DataSource, InputData};

/// Context year: the configured one, else the latest season in the data,
/// else the year before the target.
pub fn resolve_base_year(configured: Option<i32>, data: &InputData, target_year: i32) -> i32 {
    if let Some(year) = configured {
        return year;
    }
    data.pitching
        .iter()
        .chain(data.batting.iter())
        .map(|line| line.year)
        .max()
        .unwrap_or_else(|| {
            warn!("no stat lines loaded; using {} as the context year", target_year - 1);
            target_year - 1
        })
}

/// Age during `base_year` from a grade's age and as-of date. Grades without
/// a date are taken as current.
fn age_in(grade: &ScoutingGrade, base_year: i32) -> Option<u32> {
    let age = grade.age?;
    let shift = grade.as_of.map_or(0, |d| base_year - d.year());
    Some((age as i64 + shift as i64).max(0) as u32)
}

fn input_age(scouting: &ResolvedScouting, base_year: i32) -> Option<u32> {
    scouting
        .active
        .as_ref()
        .and_then(|g| age_in(g, base_year))
        .or_else(|| scouting.comparison.as_ref().and_then(|g| age_in(g, base_year)))
}

/// One input per player of `kind`: everyone with stat lines, plus anyone
/// with an id in either scouting source but no lines. Ordered by id.
pub fn player_inputs(data: &InputData, kind: PlayerKind, base_year: i32) -> Vec<PlayerInput> {
    // id -> (name from the latest season, lines)
    let mut players: BTreeMap<u32, (String, Vec<SeasonStatLine>)> = BTreeMap::new();
    let mut latest = BTreeMap::new();
    for line in data.stat_lines(kind) {
        let entry = players.entry(line.player_id).or_default();
        let seen = latest.entry(line.player_id).or_insert(i32::MIN);
        if !line.name.is_empty() && line.year >= *seen {
            *seen = line.year;
            entry.0 = line.name.clone();
        }
        entry.1.push(line.clone());
    }

    let book = data.scouting(kind);
    for grade in book.primary.grades().iter().chain(book.fallback.grades()) {
        if grade.player_id == 0 || players.contains_key(&grade.player_id) {
            continue;
        }
        let name = grade.name.clone().unwrap_or_default();
        players.insert(grade.player_id, (name, Vec::new()));
    }

    players
        .into_iter()
        .map(|(player_id, (name, lines))| {
            let lookup_name = (!name.is_empty()).then_some(name.as_str());
            let scouting = book.resolve(player_id, lookup_name, base_year);
            PlayerInput {
                player_id,
                age: input_age(&scouting, base_year),
                name,
                kind,
                lines,
                scouting,
            }
        })
        .collect()
}

/// Run one projection pass over everything `source` provides.
pub async fn run(config: &Config, source: &dyn DataSource) -> anyhow::Result<Report> {
    let projector =
        Projector::new(config.engine.clone()).context("invalid engine configuration")?;

    let data = load_inputs(source).await;
    let target_year = config.run.target_year;
    let base_year = resolve_base_year(config.run.base_year, &data, target_year);
    info!("projecting {} from context year {}", target_year, base_year);

    let all_lines: Vec<SeasonStatLine> = data
        .pitching
        .iter()
        .chain(data.batting.iter())
        .cloned()
        .collect();
    let league = projector.league_context(base_year, &all_lines);
    match (&league.pitching, &league.batting) {
        (Some(p), Some(b)) => info!(
            "league {}: {} qualifying pitchers, {} qualifying batters",
            base_year, p.qualifying, b.qualifying
        ),
        _ => warn!("league {} is missing a pitching or batting baseline", base_year),
    }

    let mut inputs = player_inputs(&data, PlayerKind::Pitcher, base_year);
    inputs.extend(player_inputs(&data, PlayerKind::Batter, base_year));
    info!("projecting {} players", inputs.len());

    let outcomes = projector.project_all(&inputs, &league, target_year);
    let report = Report::new(base_year, target_year, outcomes);
    info!(
        "projected {} players, {} with insufficient data",
        report.outcomes.len() - report.insufficient(),
        report.insufficient()
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use truerating_engine::types::{
        Level, PitcherSkills, PitchingCounts, SkillGrades, Split, StatCounts,
    };
    use truerating_engine::{ScoutingBook, ScoutingIndex, ScoutingSource};

    fn line(id: u32, name: &str, year: i32) -> SeasonStatLine {
        SeasonStatLine {
            player_id: id,
            name: name.to_string(),
            year,
            level: Level::Mlb,
            split: Split::Total,
            counts: StatCounts::Pitching(PitchingCounts {
                ip: 120.0,
                k: 110.0,
                bb: 40.0,
                hr: 14.0,
                er: 50.0,
            }),
        }
    }

    fn grade(id: u32, name: &str, age: Option<u32>, as_of: Option<NaiveDate>) -> ScoutingGrade {
        ScoutingGrade {
            player_id: id,
            name: Some(name.to_string()),
            skills: SkillGrades::Pitcher(PitcherSkills {
                stuff: 55.0,
                control: 50.0,
                hra: 50.0,
                stamina: 55.0,
            }),
            overall_stars: None,
            potential_stars: None,
            age,
            source: ScoutingSource::Primary,
            as_of,
        }
    }

    #[test]
    fn base_year_prefers_config_then_data() {
        let mut data = InputData::default();
        assert_eq!(resolve_base_year(None, &data, 2025), 2024);
        data.pitching = vec![line(1, "A", 2022), line(2, "B", 2023)];
        assert_eq!(resolve_base_year(None, &data, 2025), 2023);
        assert_eq!(resolve_base_year(Some(2021), &data, 2025), 2021);
    }

    #[test]
    fn inputs_group_lines_and_add_scouting_only_players() {
        let data = InputData {
            pitching: vec![
                line(1, "Old Name", 2022),
                line(2, "Other", 2024),
                line(1, "New Name", 2024),
            ],
            pitcher_scouting: ScoutingBook::new(
                ScoutingIndex::new(vec![
                    grade(1, "New Name", Some(30), None),
                    grade(9, "Prospect", Some(20), NaiveDate::from_ymd_opt(2023, 5, 1)),
                ]),
                ScoutingIndex::default(),
            ),
            ..InputData::default()
        };

        let inputs = player_inputs(&data, PlayerKind::Pitcher, 2024);
        let ids: Vec<u32> = inputs.iter().map(|i| i.player_id).collect();
        assert_eq!(ids, vec![1, 2, 9]);

        assert_eq!(inputs[0].name, "New Name");
        assert_eq!(inputs[0].lines.len(), 2);
        assert_eq!(inputs[0].age, Some(30));
        assert!(inputs[0].scouting.active.is_some());

        assert!(inputs[1].scouting.active.is_none());
        assert!(inputs[1].age.is_none());

        // Graded in 2023 at 20, so 21 during 2024.
        assert!(inputs[2].lines.is_empty());
        assert_eq!(inputs[2].age, Some(21));
        assert_eq!(inputs[2].name, "Prospect");

        assert!(player_inputs(&data, PlayerKind::Batter, 2024).is_empty());
    }
}
