//! CLI execution: validates the requested verse and drives a [`Player`]
//! through the real audio backend until playback finishes.

use std::error::Error;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::thread::sleep;
use std::time::Duration;

use clap::ArgMatches;
use log::{error, info};

use tilawa_lib::playback::media::rodio::RodioBackend;
use tilawa_lib::playback::player::Player;
use tilawa_lib::playback::scheduler::ThreadScheduler;
use tilawa_lib::prefs::{JsonFilePreferences, MemoryPreferences, PreferenceStore};
use tilawa_lib::reporter::{Report, Reporter};
use tilawa_lib::verse;

const FINISH_POLL_MS: u64 = 200;
/// Consecutive idle polls before playback counts as finished. The longest
/// legitimate gap is the surah-advance delay, well under this window.
const IDLE_FINISH_POLLS: u32 = 8;

pub fn run(args: &ArgMatches) -> Result<i32, Box<dyn Error>> {
    if let Some(sub) = args.subcommand_matches("url") {
        let (surah, ayah) = parse_verse(
            sub.get_one::<String>("SURAH"),
            sub.get_one::<String>("AYAH"),
        )?;
        println!("{}", verse::audio_url(surah, ayah));
        return Ok(0);
    }

    let (surah, ayah) = parse_verse(
        args.get_one::<String>("SURAH"),
        args.get_one::<String>("AYAH"),
    )?;
    let total_ayahs = verse::ayah_count(surah).expect("surah validated by parse_verse");
    let surah_mode = args.get_flag("surah-mode");
    let quiet = args.get_flag("quiet");

    let prefs: Box<dyn PreferenceStore> = match JsonFilePreferences::default_path() {
        Some(path) => Box::new(JsonFilePreferences::open(path)),
        None => Box::new(MemoryPreferences::default()),
    };
    let player = Player::new(
        Box::new(RodioBackend::new()),
        Arc::new(ThreadScheduler::new()),
        prefs,
    );

    let volume = args
        .get_one::<String>("volume")
        .expect("volume has a default")
        .parse::<f32>()?;
    player.set_volume(volume);
    if let Some(rate) = args.get_one::<String>("rate") {
        player.set_playback_rate(rate.parse::<f32>()?);
    }
    if args.get_flag("loop") {
        player.set_looping(true);
    }

    if surah_mode {
        info!("playing surah {} from ayah {}", surah, ayah);
        player.play_surah(surah, total_ayahs, ayah);
    } else {
        info!("playing verse {}:{}", surah, ayah);
        player.play_verse(surah, ayah);
    }

    let reporter = if quiet {
        None
    } else {
        let callback: Arc<Mutex<dyn Fn(Report) + Send>> =
            Arc::new(Mutex::new(|report: Report| {
                if let Some(verse) = report.verse {
                    let marker = if report.loading {
                        "..."
                    } else if report.playing {
                        " > "
                    } else {
                        " | "
                    };
                    print!(
                        "\r{} {} {:>6.1}s / {:>6.1}s  ",
                        verse, marker, report.time, report.duration
                    );
                    let _ = std::io::stdout().flush();
                }
            }));
        let reporter = Reporter::new(
            player.store().clone(),
            callback,
            Duration::from_millis(250),
        );
        reporter.start();
        Some(reporter)
    };

    let code = wait_for_finish(&player);

    if let Some(reporter) = reporter {
        reporter.stop();
    }
    if !quiet {
        println!();
    }
    player.stop_audio();
    Ok(code)
}

/// Block until playback reaches a terminal state.
///
/// The gap between surah tracks is a legitimate idle period, so "finished"
/// means the player stayed idle for a full window after having started.
fn wait_for_finish(player: &Player) -> i32 {
    let mut started = false;
    let mut idle_polls = 0_u32;

    loop {
        sleep(Duration::from_millis(FINISH_POLL_MS));
        let state = player.snapshot();

        if let Some(message) = state.error {
            error!("{}", message);
            return -1;
        }

        let active = state.is_playing || state.is_loading || state.is_buffering;
        if active {
            started = true;
            idle_polls = 0;
            continue;
        }

        if started {
            idle_polls += 1;
            if idle_polls >= IDLE_FINISH_POLLS {
                return 0;
            }
        }
    }
}

fn parse_verse(
    surah_raw: Option<&String>,
    ayah_raw: Option<&String>,
) -> Result<(u32, u32), Box<dyn Error>> {
    let surah = surah_raw
        .ok_or("surah number is required")?
        .parse::<u32>()
        .map_err(|_| "surah must be a number")?;
    let total = verse::ayah_count(surah)
        .ok_or_else(|| format!("surah {} does not exist (expected 1-114)", surah))?;

    let ayah = match ayah_raw {
        Some(raw) => raw.parse::<u32>().map_err(|_| "ayah must be a number")?,
        None => 1,
    };
    if ayah == 0 || ayah > total {
        return Err(format!("surah {} has {} ayahs; got ayah {}", surah, total, ayah).into());
    }

    Ok((surah, ayah))
}
