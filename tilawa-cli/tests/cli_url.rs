use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn url_subcommand_prints_the_padded_cdn_path() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tilawa"));
    cmd.args(["url", "7", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "https://verses.quran.com/Alafasy/mp3/007003.mp3",
        ));
}

#[test]
fn url_subcommand_pads_three_digit_surahs() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tilawa"));
    cmd.args(["url", "114", "6"])
        .assert()
        .success()
        .stdout(predicate::str::contains("114006.mp3"));
}

#[test]
fn url_subcommand_rejects_out_of_range_ayahs() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tilawa"));
    cmd.args(["url", "1", "8"]).assert().failure();
}

#[test]
fn url_subcommand_rejects_unknown_surahs() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tilawa"));
    cmd.args(["url", "115", "1"]).assert().failure();
}

#[test]
fn running_without_arguments_shows_help() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tilawa"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}
