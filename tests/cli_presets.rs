use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_chiller-staging"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("chiller-staging process should run")
}

fn stdout_of(args: &[&str]) -> String {
    let output = run(args);
    assert!(
        output.status.success(),
        "run failed for {args:?}: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout should be valid UTF-8")
}

/// Reads the `Total energy:` line of a KPI report.
fn total_energy(stdout: &str) -> f64 {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("Total energy:"))
        .and_then(|rest| rest.trim().trim_end_matches("kWh").trim().parse().ok())
        .expect("KPI report should contain total energy")
}

#[test]
fn presets_are_listed() {
    let stdout = stdout_of(&["presets"]);
    let names: Vec<&str> = stdout.lines().collect();
    assert_eq!(names, ["demo", "plant7"]);
}

#[test]
fn scenario_files_simulate_via_cli() {
    let demo = total_energy(&stdout_of(&["--scenario", "scenarios/demo.toml", "simulate"]));
    let plant3 = total_energy(&stdout_of(&["--scenario", "scenarios/plant3.toml", "simulate"]));

    assert!(demo > 0.0);
    assert!(plant3 > 0.0);
    assert!(
        (demo - plant3).abs() > 1.0,
        "expected distinct energies: demo={demo:.1}, plant3={plant3:.1}"
    );
}

#[test]
fn explicit_order_changes_the_plan() {
    let default = stdout_of(&["--scenario", "scenarios/plant3.toml", "simulate"]);
    let reversed = stdout_of(&[
        "--scenario",
        "scenarios/plant3.toml",
        "simulate",
        "--order",
        "CH03,CH02,CH01",
    ]);
    assert!(default.contains("Effective order:"));
    assert_ne!(total_energy(&default), total_energy(&reversed));
}

#[test]
fn rank_prints_the_leaderboard() {
    let stdout = stdout_of(&["--scenario", "scenarios/plant3.toml", "rank", "--top", "3"]);
    assert!(stdout.contains("Best order"));
    assert!(stdout.contains("--- KPI Report ---"));
}

#[test]
fn rank_writes_json() {
    let path = std::env::temp_dir().join(format!("chiller-ranking-{}.json", std::process::id()));
    let path_arg = path.to_string_lossy().to_string();
    stdout_of(&["--preset", "demo", "rank", "--json-out", &path_arg]);

    let content = std::fs::read_to_string(&path).expect("ranking file should exist");
    let value: serde_json::Value = serde_json::from_str(&content).expect("valid JSON");
    assert_eq!(value["evaluated"], 24);
    assert!(value["groups"].as_array().is_some_and(|g| !g.is_empty()));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn invalid_scenario_reports_every_error() {
    let path = std::env::temp_dir().join(format!("chiller-invalid-{}.toml", std::process::id()));
    std::fs::write(
        &path,
        "[profile]\nloads = [1.0, 2.0]\n\n[search]\nbatch_size = 0\n",
    )
    .expect("write temp scenario");

    let path_arg = path.to_string_lossy().to_string();
    let output = run(&["--scenario", &path_arg, "simulate"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("fleet.units"), "stderr={stderr}");
    assert!(stderr.contains("profile.loads"), "stderr={stderr}");
    assert!(stderr.contains("search.batch_size"), "stderr={stderr}");
    let _ = std::fs::remove_file(&path);
}

#[test]
fn rank_refuses_zero_top() {
    let output = run(&["--preset", "demo", "rank", "--top", "0"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--top"), "stderr={stderr}");
    assert!(!stderr.contains("no priority order produced"));
}

#[test]
fn unknown_preset_fails() {
    let output = run(&["--preset", "nope", "simulate"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown preset"));
}
