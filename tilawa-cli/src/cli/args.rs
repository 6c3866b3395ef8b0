//! CLI argument definitions for `tilawa`.

use clap::{Arg, ArgAction, Command};

/// Build the CLI argument parser and command definitions.
pub fn build_cli() -> Command {
    Command::new("Tilawa")
        .version("0.1.0")
        .about("Play Quran recitation audio from the command line")
        .arg_required_else_help(true)
        .arg(
            Arg::new("SURAH")
                .help("Surah number (1-114)")
                .required(false)
                .index(1),
        )
        .arg(
            Arg::new("AYAH")
                .help("Ayah number within the surah (defaults to 1)")
                .required(false)
                .index(2),
        )
        .arg(
            Arg::new("surah-mode")
                .long("surah")
                .short('s')
                .action(ArgAction::SetTrue)
                .help("Play the whole surah continuously, starting at AYAH"),
        )
        .arg(
            Arg::new("loop")
                .long("loop")
                .short('l')
                .action(ArgAction::SetTrue)
                .help("Loop playback (the verse in single mode, the surah in surah mode)"),
        )
        .arg(
            Arg::new("volume")
                .long("volume")
                .short('v')
                .value_name("VOLUME")
                .default_value("0.8")
                .help("Playback volume (0.0-1.0)"),
        )
        .arg(
            Arg::new("rate")
                .long("rate")
                .short('r')
                .value_name("RATE")
                .help("Playback rate (0.5-2.0); persisted for future runs"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .action(ArgAction::SetTrue)
                .help("Suppress the progress display"),
        )
        .subcommand(
            Command::new("url")
                .about("Print the recitation audio URL for a verse, then exit")
                .arg(
                    Arg::new("SURAH")
                        .help("Surah number (1-114)")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("AYAH")
                        .help("Ayah number within the surah")
                        .required(true)
                        .index(2),
                ),
        )
}
