use std::{env, fs, path::PathBuf, process::Command};

fn run_bin(args: &[&str]) -> String {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_labdata"));

    let output = Command::new(bin)
        .args(args)
        .output()
        .expect("failed to execute command");

    let stdout_str =
        std::str::from_utf8(&output.stdout).expect("failed to convert stdout to string");
    let stderr_str =
        std::str::from_utf8(&output.stderr).expect("failed to convert stderr to string");

    assert!(
        output.status.success(),
        "failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"
    );

    stdout_str.to_string()
}

fn create_lab_dir(name: &str, config_contents: &str) -> PathBuf {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    fs::write(test_dir.join("config.toml"), config_contents).expect("failed to write config file");

    test_dir
}

#[test]
fn basic_workflow() {
    let config_contents = String::new()
        + "app_key = \"thermal-expansion\"\n"
        + "\n"
        + "[sheet]\n"
        + "rows = 2\n"
        + "cols = 4\n"
        + "row_headers = [\"T\", \"L\"]\n"
        + "default_values = [20.0, 40.0, 60.0, 80.0]\n"
        + "\n"
        + "[analysis]\n"
        + "x = 0\n"
        + "y = 1\n";
    let test_dir = create_lab_dir("basic_workflow", &config_contents);
    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    run_bin(&["--lab-dir", test_dir_str, "init"]);
    assert!(test_dir.join("thermal-expansion.toml").exists());

    for (cell, value) in [("L5", "500.10"), ("L6", "500.32"), ("L7", "500.49"), ("L8", "500.71")] {
        run_bin(&["--lab-dir", test_dir_str, "set", "--cell", cell, "--value", value]);
    }

    let grid = run_bin(&["--lab-dir", test_dir_str, "show"]);
    assert!(grid.contains("500.32"), "unexpected grid:\n{grid}");
    assert_eq!(grid.lines().count(), 2);

    let moved = run_bin(&["--lab-dir", test_dir_str, "move", "--cell", "L2", "--key", "down"]);
    assert_eq!(moved.trim(), "L6");
    let moved = run_bin(&["--lab-dir", test_dir_str, "move", "--cell", "L8", "--key", "enter"]);
    assert_eq!(moved.trim(), "L8");

    run_bin(&["--lab-dir", test_dir_str, "analyze"]);

    let results = fs::read_to_string(test_dir.join("results.json")).expect("failed to read results");
    let results: serde_json::Value = serde_json::from_str(&results).expect("failed to parse results");
    assert_eq!(results["samples"][0]["mean"], 50.0);
    assert_eq!(results["regression"]["fit"]["n"], 4);
    let slope = results["regression"]["fit"]["slope"]
        .as_f64()
        .expect("slope is not a number");
    assert!((slope - 0.01).abs() < 1e-3);

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn rejects_unknown_cell() {
    let test_dir = create_lab_dir(
        "rejects_unknown_cell",
        "app_key = \"pendulum\"\n[sheet]\nrows = 1\ncols = 3\n",
    );
    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    let output = Command::new(env!("CARGO_BIN_EXE_labdata"))
        .args(["--lab-dir", test_dir_str, "set", "--cell", "L9", "--value", "1"])
        .output()
        .expect("failed to execute command");
    assert!(!output.status.success());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn set_without_init_keeps_defaults() {
    let config_contents = String::new()
        + "app_key = \"spring\"\n"
        + "[sheet]\n"
        + "rows = 2\n"
        + "cols = 3\n"
        + "default_values = [1.0, 2.0, 3.0]\n"
        + "[analysis]\n"
        + "x = 0\n"
        + "y = 1\n";
    let test_dir = create_lab_dir("set_without_init_keeps_defaults", &config_contents);
    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    for (cell, value) in [("L4", "2"), ("L5", "4"), ("L6", "6")] {
        run_bin(&["--lab-dir", test_dir_str, "set", "--cell", cell, "--value", value]);
    }

    let output = Command::new(env!("CARGO_BIN_EXE_labdata"))
        .args(["--lab-dir", test_dir_str, "set", "--cell", "L04", "--value", "9"])
        .output()
        .expect("failed to execute command");
    assert!(!output.status.success());

    run_bin(&["--lab-dir", test_dir_str, "analyze"]);

    let results = fs::read_to_string(test_dir.join("results.json")).expect("failed to read results");
    let results: serde_json::Value = serde_json::from_str(&results).expect("failed to parse results");
    assert_eq!(results["samples"][0]["mean"], 2.0);
    assert_eq!(results["samples"][1]["mean"], 4.0);
    assert_eq!(results["regression"]["fit"]["slope"], 2.0);

    fs::remove_dir_all(&test_dir).ok();
}
