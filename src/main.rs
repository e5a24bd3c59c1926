use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::{env, panic, process};

use anyhow::{bail, Context, Result};
use crossterm::{cursor, event, execute, terminal};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use map_explorer::{
    app::Viewer,
    assets::{load_image, FileAssetStore},
    atlas::{Atlas, TimeState},
    config::ViewerConfig,
    playback::SequenceOpener,
    terminal::TerminalSurface,
};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

const RUN_USAGE: &str = "map-explorer run <atlas.json>";
const CHECK_USAGE: &str = "map-explorer check <atlas.json>";

fn run() -> Result<()> {
    let mut args = env::args().skip(1);

    match args.next().as_deref() {
        Some("run") => {
            let path = args.next().context(RUN_USAGE)?;
            view(&path)
        }
        Some("check") => {
            let path = args.next().context(CHECK_USAGE)?;
            check(&path)
        }
        _ => bail!("Map Explorer — interactive map viewer\n\nUsage:\n  {RUN_USAGE}\n  {CHECK_USAGE}"),
    }
}

fn view(path: &str) -> Result<()> {
    init_logging()?;

    let atlas = Atlas::load(Path::new(path)).with_context(|| format!("Failed to load {path}"))?;
    let config = ViewerConfig::load();

    let background = load_image(&atlas.background);
    let references = atlas.references.as_deref().map(load_image);

    let store = FileAssetStore::for_atlas(&atlas);
    let mut viewer = Viewer::new(atlas, config, store, SequenceOpener);
    match background {
        Ok(image) => viewer = viewer.with_background(&image),
        Err(e) => warn!("using a plain canvas: {e}"),
    }
    match references {
        Some(Ok(panel)) => viewer = viewer.with_references(panel),
        Some(Err(e)) => warn!("{e}"),
        None => {}
    }

    install_panic_hook();
    let mut surface = TerminalSurface::enter().context("Failed to initialise the terminal")?;
    viewer.run(&mut surface)?;
    Ok(())
}

/// Report every card and video source the atlas refers to that is missing.
fn check(path: &str) -> Result<()> {
    let atlas = Atlas::load(Path::new(path)).with_context(|| format!("Failed to load {path}"))?;
    let mut missing = 0;

    report("background", &atlas.background, &mut missing);
    if let Some(references) = &atlas.references {
        report("references", references, &mut missing);
    }
    for (id, location) in atlas.locations() {
        println!("{}", location.name);
        for time in TimeState::ALL {
            report(&format!("{time} card"), &atlas.card_path(id, time), &mut missing);
            report(&format!("{time} video"), &atlas.source_for(id, time).path, &mut missing);
        }
    }

    if missing > 0 {
        bail!("{missing} file(s) missing");
    }
    eprintln!("All assets present for {} locations", atlas.locations().count());
    Ok(())
}

fn report(what: &str, file: &Path, missing: &mut usize) {
    let status = if file.exists() {
        "ok     "
    } else {
        *missing += 1;
        "MISSING"
    };
    println!("  {status} {what}: {}", file.display());
}

/// Log to a file: the terminal belongs to the viewer while it runs.
fn init_logging() -> Result<()> {
    let log_path = env::temp_dir().join("map-explorer.log");
    let file = File::create(&log_path).with_context(|| format!("Failed to create {}", log_path.display()))?;
    let filter = EnvFilter::try_from_env("MAP_EXPLORER_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

fn install_panic_hook() {
    let original = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = execute!(
            io::stdout(),
            event::DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
        original(info);
    }));
}
