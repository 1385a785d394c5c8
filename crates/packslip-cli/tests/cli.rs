use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const FLOSS: &str = "Style no: F10854 Price: 16,40 EUR
Style name: Fresa Onesie Total: 49,20 EUR
Assortments 2Y 3Y 4Y Qty Assort. Total Acc.
Color: Blue Violet
total 1 1 1 3 3 49,20 49,20
";

const EAN: &str = "8435512929389
OMNIA SOL ECRU TESSA
KNITTED SWEATER
WKN00256,S
60,00€ 1 60,00€ 0% 60,00€
";

/// Command with an isolated config directory.
fn packslip(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("packslip").unwrap();
    cmd.env("PACKSLIP_CONFIG_DIR", config_dir.path());
    cmd
}

#[test]
fn parse_prints_json_records() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("floss.txt");
    fs::write(&input, FLOSS).unwrap();

    packslip(&dir)
        .args(["parse", "--format", "floss"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"style_or_barcode\":\"F10854\""))
        .stdout(predicate::str::contains("\"size\":\"4Y\""));
}

#[test]
fn parse_reads_stdin_and_writes_csv() {
    let dir = TempDir::new().unwrap();

    packslip(&dir)
        .args(["parse", "--format", "ean-sku", "-f", "csv", "-"])
        .write_stdin(EAN)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "8435512929389,WKN00256,OMNIA SOL ECRU TESSA KNITTED SWEATER,,S,1,60.00,60.00",
        ));
}

#[test]
fn parse_writes_output_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("ean.txt");
    let output = dir.path().join("out.json");
    fs::write(&input, EAN).unwrap();

    packslip(&dir)
        .args(["parse", "--format", "ean-sku", "-o"])
        .arg(&output)
        .arg(&input)
        .assert()
        .success();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["records"][0]["style_code"], "WKN00256");
    assert_eq!(json["totals"]["record_count"], 1);
}

#[test]
fn parse_noise_only_fails_with_sample() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("noise.txt");
    fs::write(&input, "Page 1 of 2\nIBAN ES91 2100 0418 4502\n").unwrap();

    packslip(&dir)
        .args(["parse", "--format", "ean-sku"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no line items recognized"))
        .stderr(predicate::str::contains("line 1: Page 1 of 2"));
}

#[test]
fn parse_without_format_fails() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("floss.txt");
    fs::write(&input, FLOSS).unwrap();

    packslip(&dir)
        .arg("parse")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No format given"));
}

#[test]
fn parse_with_format_file() {
    let dir = TempDir::new().unwrap();
    let spec = dir.path().join("us.json");
    let input = dir.path().join("us.txt");
    fs::write(
        &spec,
        r#"{
            "id": "us-basic",
            "name": "US basic",
            "decimal": "period",
            "style": "^SKU (?P<code>[A-Z0-9-]+)$",
            "size_marker": "^Size: (?P<size>\\S+)$",
            "data_row": {
                "min_numbers": 3,
                "columns": [{"role": "quantity"}, {"role": "unit_price"}, {"role": "line_total"}]
            }
        }"#,
    )
    .unwrap();
    fs::write(&input, "SKU TEE-01\nSize: XL\n2 12.50 25.00\n").unwrap();

    packslip(&dir)
        .args(["parse", "-f", "text", "--format-file"])
        .arg(&spec)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Format: us-basic"))
        .stdout(predicate::str::contains("Records:   1"));
}

#[test]
fn batch_writes_outputs_and_summary() {
    let dir = TempDir::new().unwrap();
    let inputs = dir.path().join("in");
    let outputs = dir.path().join("out");
    fs::create_dir_all(&inputs).unwrap();
    fs::write(inputs.join("a.txt"), EAN).unwrap();
    fs::write(inputs.join("b.txt"), EAN.replace("WKN00256,S", "WKN00256,M")).unwrap();
    fs::write(inputs.join("c.txt"), "Page 1\n").unwrap();

    packslip(&dir)
        .args(["batch", "--format", "ean-sku", "--summary", "--continue-on-error", "-j", "2"])
        .arg(format!("{}/*.txt", inputs.display()))
        .arg("--output-dir")
        .arg(&outputs)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 successful"));

    assert!(outputs.join("a.json").exists());
    assert!(outputs.join("b.json").exists());
    assert!(!outputs.join("c.json").exists());

    let summary = fs::read_to_string(outputs.join("summary.csv")).unwrap();
    assert_eq!(summary.lines().count(), 4);
    assert!(summary.contains("c.txt,error"));
}

#[test]
fn batch_stops_on_first_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("bad.txt"), "Page 1\n").unwrap();

    packslip(&dir)
        .args(["batch", "--format", "ean-sku"])
        .arg(format!("{}/*.txt", dir.path().display()))
        .assert()
        .failure();
}

#[test]
fn formats_list_and_show() {
    let dir = TempDir::new().unwrap();

    packslip(&dir)
        .args(["formats", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("floss"))
        .stdout(predicate::str::contains("ean-sku"))
        .stdout(predicate::str::contains("kids-nl"));

    packslip(&dir)
        .args(["formats", "show", "kids-nl"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"id\": \"kids-nl\""));

    packslip(&dir)
        .args(["formats", "show", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

#[test]
fn config_default_format_is_used() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("ean.txt");
    fs::write(&input, EAN).unwrap();

    packslip(&dir).args(["config", "init"]).assert().success();
    assert!(dir.path().join("config.json").exists());

    packslip(&dir)
        .args(["config", "set", "formats.default_format", "ean-sku"])
        .assert()
        .success();

    packslip(&dir)
        .args(["config", "get", "formats.default_format"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ean-sku\""));

    packslip(&dir)
        .arg("parse")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("8435512929389"));
}

#[test]
fn config_set_rejects_unknown_key() {
    let dir = TempDir::new().unwrap();

    packslip(&dir)
        .args(["config", "set", "session.nope", "3"])
        .assert()
        .failure();
}
