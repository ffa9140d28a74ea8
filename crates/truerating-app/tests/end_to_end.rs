// End-to-end tests for the truerating app.
//
// Each test lays out a scratch project directory (defaults/, config/, data/),
// loads configuration the way the binary does, reads the CSV inputs through
// `FileSource`, and checks the resulting report.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use truerating_app::config::{ensure_config_files, load_config_from};
use truerating_app::report::{render_text, write_json};
use truerating_app::run::run;
use truerating_app::source::FileSource;
use truerating_engine::projection::ProjectedLine;
use truerating_engine::{
    InsufficientReason, PlayerKind, ProjectionNote, ProjectionOutcome, ScoutingSource,
};

// ===========================================================================
// Test helpers
// ===========================================================================

fn repo_defaults() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../defaults")
}

/// Scratch project with defaults copied into config/ and run.toml pointing
/// at data/ under the project.
fn project(name: &str) -> PathBuf {
    let root = std::env::temp_dir().join(format!("truerating_e2e_{name}"));
    let _ = fs::remove_dir_all(&root);
    fs::create_dir_all(root.join("defaults")).unwrap();
    fs::create_dir_all(root.join("data")).unwrap();
    for file in ["engine.toml", "run.toml"] {
        fs::copy(repo_defaults().join(file), root.join("defaults").join(file)).unwrap();
    }
    let copied = ensure_config_files(&root).unwrap();
    assert_eq!(copied.len(), 2);

    let run_toml = r#"
[run]
target_year = 2025
base_year = 2024

[data_paths]
pitching_stats = "data/pitching.csv"
batting_stats = "data/batting.csv"
pitcher_scouting_primary = "data/pitchers_primary.csv"
pitcher_scouting_fallback = "data/pitchers_fallback.csv"
batter_scouting_primary = "data/batters_primary.csv"
batter_scouting_fallback = "data/batters_fallback.csv"

[output]
json = "out/projections.json"
top = 5
"#;
    fs::write(root.join("config/run.toml"), run_toml).unwrap();
    root
}

/// Sixteen MLB pitchers over two seasons, plus one minor leaguer and one
/// partial split row that must not be aggregated.
fn pitching_csv() -> String {
    let mut csv = String::from("ID,Name,Year,Level,Split,IP,K,BB,HR,ER\n");
    for year in [2023, 2024] {
        for i in 0..16u32 {
            let f = i as f64;
            writeln!(
                csv,
                "{},Arm {},{},1,total,150.1,{},{},{},{}",
                100 + i,
                i,
                year,
                110.0 + 7.0 * f,
                60.0 - 2.0 * f,
                22.0 - 0.6 * f,
                75.0 - 2.0 * f
            )
            .unwrap();
        }
    }
    csv.push_str("115,Arm 15,2024,1,vsL,50.0,99,1,0,5\n");
    csv.push_str("300,Farm Hand,2024,AAA,total,120.2,130,40,10,50\n");
    csv
}

fn batting_csv() -> String {
    let mut csv = String::from("ID,Name,Year,Level,Split,PA,AB,H,2B,3B,HR,BB,K,SB\n");
    for i in 0..16u32 {
        let f = i as f64;
        let bb = 35.0 + 2.0 * f;
        writeln!(
            csv,
            "{},Bat {},2024,MLB,total,560,{},{},{},3,{},{},{},5",
            500 + i,
            i,
            560.0 - bb,
            120.0 + 3.0 * f,
            24.0 + f,
            10.0 + 1.5 * f,
            bb,
            150.0 - 3.0 * f
        )
        .unwrap();
    }
    csv
}

fn write_data(root: &Path) {
    let data = root.join("data");
    fs::write(data.join("pitching.csv"), pitching_csv()).unwrap();
    fs::write(data.join("batting.csv"), batting_csv()).unwrap();
    fs::write(
        data.join("pitchers_primary.csv"),
        "ID,Name,Stuff,Control,HRA,Stamina,OVR,POT,Age,AsOf\n\
         900,Draft Pick,60,55,50,55,1.5 Stars,4.0 Stars,21,2024-07-15\n\
         115,Arm 15,70,65,60,70,4.5 Stars,4.5 Stars,29,2024-03-01\n",
    )
    .unwrap();
    fs::write(
        data.join("pitchers_fallback.csv"),
        "ID,Name,Stuff,Control,HRA,Stamina,OVR,POT,Age,AsOf\n\
         115,Arm 15,60,60,55,65,4.0 Stars,4.0 Stars,29,2024-01-01\n\
         300,Farm Hand,55,50,50,60,2.0 Stars,3.5 Stars,23,2024-01-01\n",
    )
    .unwrap();
    // Batter scouting files are deliberately absent.
}

fn outcome(outcomes: &[ProjectionOutcome], id: u32) -> &ProjectionOutcome {
    outcomes
        .iter()
        .find(|o| o.player_id() == id)
        .unwrap_or_else(|| panic!("no outcome for player {id}"))
}

// ===========================================================================
// Full run
// ===========================================================================

#[tokio::test]
async fn full_run_projects_every_player() {
    let root = project("full_run");
    write_data(&root);

    let config = load_config_from(&root).unwrap();
    let report = run(&config, &FileSource::new(config.data_paths.clone()))
        .await
        .unwrap();

    assert_eq!(report.base_year, 2024);
    assert_eq!(report.target_year, 2025);
    // 16 MLB arms + farm hand + scouting-only draft pick, 16 batters.
    assert_eq!(report.outcomes.len(), 34);
    assert_eq!(report.insufficient(), 0);

    // Both sources: primary drives, fallback for display only.
    let ace = outcome(&report.outcomes, 115).projection().unwrap();
    assert_eq!(ace.source, Some(ScoutingSource::Primary));
    assert_eq!(
        ace.comparison.as_ref().map(|g| g.source),
        Some(ScoutingSource::Fallback)
    );
    assert_eq!(ace.age, Some(30));

    // Scouting only, no stat lines.
    let pick = outcome(&report.outcomes, 900).projection().unwrap();
    assert!(pick.notes.contains(&ProjectionNote::ScoutingOnly));
    assert_eq!(pick.source, Some(ScoutingSource::Primary));
    assert_eq!(pick.name, "Draft Pick");
    assert_eq!(pick.age, Some(22));

    // Minor leaguer is translated and blended with the fallback grade.
    let farm = outcome(&report.outcomes, 300).projection().unwrap();
    assert_eq!(farm.source, Some(ScoutingSource::Fallback));
    assert!(farm.scouting_weight > 0.0);

    // Batters have no scouting at all.
    let batters = report.leaders(PlayerKind::Batter);
    assert_eq!(batters.len(), 16);
    for b in &batters {
        assert_eq!(b.source, None);
        assert!(b.notes.contains(&ProjectionNote::StatsOnly));
        match &b.line {
            ProjectedLine::Batting { slash, pa, .. } => {
                assert!(slash.obp > slash.avg);
                assert!(*pa > 0.0);
            }
            other => panic!("expected batting line, got {other:?}"),
        }
    }
    // Sorted best first.
    assert!(batters[0].war >= batters[15].war);

    for p in report.outcomes.iter().filter_map(ProjectionOutcome::projection) {
        assert!((0.5..=5.0).contains(&p.rating.stars));
        assert!((0.5..=5.0).contains(&p.war_rating.stars));
    }

    let _ = fs::remove_dir_all(&root);
}

#[tokio::test]
async fn reports_are_written_and_rendered() {
    let root = project("reports");
    write_data(&root);

    let config = load_config_from(&root).unwrap();
    let report = run(&config, &FileSource::new(config.data_paths.clone()))
        .await
        .unwrap();

    let json_path = config.output.json.clone().unwrap();
    assert_eq!(json_path, root.join("out/projections.json"));
    write_json(&json_path, &report).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(value["outcomes"].as_array().unwrap().len(), 34);

    let text = render_text(&report, config.output.top).unwrap();
    assert!(text.contains("Projections for 2025 (context year 2024)"));
    assert!(text.contains(" OPS "));
    assert!(text.contains("Pitchers"));
    assert!(text.contains("Batters"));
    // Five rows per side plus headers.
    assert_eq!(text.lines().filter(|l| l.starts_with("Bat ")).count(), 5);

    let _ = fs::remove_dir_all(&root);
}

#[tokio::test]
async fn missing_stat_files_leave_only_scouting_players() {
    let root = project("no_stats");
    write_data(&root);
    fs::remove_file(root.join("data/pitching.csv")).unwrap();
    fs::remove_file(root.join("data/batting.csv")).unwrap();

    let config = load_config_from(&root).unwrap();
    let report = run(&config, &FileSource::new(config.data_paths.clone()))
        .await
        .unwrap();

    // Scouting-only pitchers remain, but there is no MLB baseline to value them.
    assert_eq!(report.outcomes.len(), 3);
    for o in &report.outcomes {
        match o {
            ProjectionOutcome::InsufficientData { reason, .. } => {
                assert_eq!(*reason, InsufficientReason::NoLeagueBaseline)
            }
            other => panic!("expected InsufficientData, got {other:?}"),
        }
    }

    let _ = fs::remove_dir_all(&root);
}
