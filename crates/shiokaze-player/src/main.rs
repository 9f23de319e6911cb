//! Headless control surface for the player core.
//!
//! Reads line commands from stdin, drains the session/timer event channel,
//! and prints the observable state as JSON after every command — a stand-in
//! frontend wired the same way a menu-bar shell would be.

use shiokaze_core::config::Config;
use shiokaze_core::prefs::JsonPrefStore;
use shiokaze_core::station::{load_catalog_from_toml, Catalog};
use shiokaze_player::app::App;
use shiokaze_player::probe::HttpProbeBackend;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

type RadioApp = App<HttpProbeBackend, JsonPrefStore>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    // File logging so stdout stays clean for the state printouts
    if let Some(parent) = config.paths.log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.paths.log_file)?;
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Log file: {:?}", config.paths.log_file);
    info!("Config loaded from: {:?}", Config::config_path());

    let catalog = load_catalog(&config);
    info!("Catalog has {} stations", catalog.len());

    let prefs = JsonPrefStore::open(config.paths.prefs_file.clone());
    let (mut app, mut events) = App::new(HttpProbeBackend::new(), catalog, prefs)?;

    print_state(&app);
    print_help();

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                app.handle_event(event);
            }
            line = lines.next_line() => {
                match line? {
                    None => break,
                    Some(line) => {
                        if !dispatch(&mut app, line.trim()) {
                            break;
                        }
                    }
                }
            }
        }
    }

    app.pause();
    Ok(())
}

fn load_catalog(config: &Config) -> Catalog {
    let path = &config.paths.stations_file;
    if path.exists() {
        match load_catalog_from_toml(path) {
            Ok(catalog) => {
                info!("Loaded {} stations from {:?}", catalog.len(), path);
                return catalog;
            }
            Err(e) => {
                warn!("Failed to load stations from {:?}: {}", path, e);
            }
        }
    }
    Catalog::builtin()
}

/// Applies one command line. Returns false when the loop should exit.
fn dispatch(app: &mut RadioApp, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    match parts.next() {
        None => return true,
        Some("play") => app.play(),
        Some("pause") => app.pause(),
        Some("toggle") => app.toggle_playback(),
        Some("next") => app.next_station(),
        Some("prev") => app.previous_station(),
        Some("station") => match parts.next() {
            Some(id) => {
                if let Err(e) = app.set_station(id) {
                    eprintln!("{e}");
                }
            }
            None => print_stations(app),
        },
        Some("stations") => print_stations(app),
        Some("vol") => match parts.next().and_then(|v| v.parse::<f32>().ok()) {
            Some(volume) => app.set_volume(volume),
            None => eprintln!("usage: vol <0.0..1.0>"),
        },
        Some("sleep") => match parts.next().and_then(parse_hhmm) {
            Some((hour, minute)) => {
                if let Err(e) = app.set_sleep_timer(hour, minute) {
                    eprintln!("{e}");
                }
            }
            None => eprintln!("usage: sleep HH:MM"),
        },
        Some("cancel") => app.cancel_sleep_timer(),
        Some("wake") => app.on_system_wake(),
        Some("state") => {}
        Some("quit") | Some("exit") => return false,
        Some(other) => {
            eprintln!("unknown command: {other}");
            return true;
        }
    }
    print_state(app);
    true
}

fn parse_hhmm(s: &str) -> Option<(u32, u32)> {
    let (h, m) = s.split_once(':')?;
    Some((h.parse().ok()?, m.parse().ok()?))
}

fn print_state(app: &RadioApp) {
    match serde_json::to_string(&app.state()) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("state serialization failed: {e}"),
    }
}

fn print_stations(app: &RadioApp) {
    for station in app.catalog().stations() {
        let marker = if station == app.current_station() {
            "*"
        } else {
            " "
        };
        println!("{marker} {:12} {:>6}  {}", station.id, station.frequency, station.name);
    }
}

fn print_help() {
    eprintln!(
        "commands: play pause toggle next prev station [<id>] vol <f> sleep HH:MM cancel wake state quit"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(parse_hhmm("22:30"), Some((22, 30)));
        assert_eq!(parse_hhmm("7:05"), Some((7, 5)));
        assert_eq!(parse_hhmm("2230"), None);
        assert_eq!(parse_hhmm("aa:bb"), None);
    }
}
