use std::env;
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::info;

use minimap_scene::{
    DemoApp, FixedTimestep, InputState, KeyCode, ManualClock, ManualFrames, SceneConfig,
    SummaryPresenter, SystemClock, TimeSource,
};

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;
    let config = match &options.scene {
        Some(path) => {
            let xml = fs::read_to_string(path)
                .with_context(|| format!("failed to read scene {path}"))?;
            SceneConfig::from_xml(&xml).with_context(|| format!("failed to parse scene {path}"))?
        }
        None => SceneConfig::default(),
    };

    println!(
        "Loaded scene: ground {0}x{0}, player speed {1:.2}, loop {2} Hz ({3:?} render)",
        config.ground.size, config.player.speed, config.timing.hz, config.timing.render
    );

    let input = Arc::new(InputState::new());
    for key in &options.hold {
        input.press_key(*key);
    }

    let mut app = DemoApp::new(config, input, SummaryPresenter::new());
    if options.toggle_minimap {
        app.toggle_minimap();
    }
    if let Some(hex) = &options.background {
        app.set_background(hex)?;
    }
    if let Some(value) = options.value {
        app.set_debug_value(value);
    }

    let interval = Duration::from_millis(options.frame_ms);
    let app = if options.realtime {
        drive(SystemClock::new(), thread::sleep, app, options.frames, interval)?
    } else {
        let clock = ManualClock::new();
        let ticker = clock.clone();
        drive(clock, move |gap| ticker.advance(gap), app, options.frames, interval)?
    };

    print!("{}", app.summary());
    Ok(())
}

/// Runs the fixed-step loop headless, firing one frame per `interval` for `frames` frames.
fn drive<C, W>(
    clock: C,
    wait: W,
    app: DemoApp<SummaryPresenter>,
    frames: u64,
    interval: Duration,
) -> Result<DemoApp<SummaryPresenter>>
where
    C: TimeSource,
    W: Fn(Duration),
{
    let config = app.config().scheduler_config();
    let requests = ManualFrames::new();
    let mut scheduler = FixedTimestep::new(config, clock, requests.clone(), app);
    scheduler.start()?;

    for _ in 0..frames {
        wait(interval);
        if !requests.fire() {
            break;
        }
        let report = scheduler.on_frame()?;
        scheduler.handler_mut().record_frame_time(report.raw_delta);
    }
    scheduler.stop();

    info!(
        "presented {} frames",
        scheduler.handler().presenter().frames()
    );
    println!(
        "Ran {} frames, {} ticks",
        scheduler.frames(),
        scheduler.ticks()
    );
    Ok(scheduler.into_handler())
}

struct CliOptions {
    scene: Option<String>,
    frames: u64,
    frame_ms: u64,
    hold: Vec<KeyCode>,
    toggle_minimap: bool,
    background: Option<String>,
    value: Option<f32>,
    realtime: bool,
}

const USAGE: &str = "Usage: minimap-scene [scene.xml] [--frames N] [--frame-ms MS] [--hold KEYS] \
[--toggle-minimap] [--background #RRGGBB] [--value V] [--realtime]";

impl CliOptions {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Self {
            scene: None,
            frames: 60,
            frame_ms: 16,
            hold: Vec::new(),
            toggle_minimap: false,
            background: None,
            value: None,
            realtime: false,
        };

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--frames" => options.frames = parse_number(&mut args, "--frames")?,
                "--frame-ms" => options.frame_ms = parse_number(&mut args, "--frame-ms")?,
                "--hold" => {
                    let keys = args
                        .next()
                        .ok_or_else(|| anyhow!("--hold needs a value. {USAGE}"))?;
                    for name in keys.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                        let key = KeyCode::from_name(name)
                            .ok_or_else(|| anyhow!("unknown key '{name}'"))?;
                        options.hold.push(key);
                    }
                }
                "--toggle-minimap" => options.toggle_minimap = true,
                "--background" => {
                    options.background = Some(
                        args.next()
                            .ok_or_else(|| anyhow!("--background needs a value. {USAGE}"))?,
                    )
                }
                "--value" => options.value = Some(parse_number(&mut args, "--value")?),
                "--realtime" => options.realtime = true,
                other if other.starts_with("--") => {
                    return Err(anyhow!("Unknown argument: {other}. {USAGE}"));
                }
                path => {
                    if options.scene.is_some() {
                        return Err(anyhow!("Unexpected argument: {path}. {USAGE}"));
                    }
                    options.scene = Some(path.to_string());
                }
            }
        }
        Ok(options)
    }
}

fn parse_number<T>(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = args
        .next()
        .ok_or_else(|| anyhow!("{flag} needs a value. {USAGE}"))?;
    raw.parse::<T>()
        .map_err(|err| anyhow!("invalid value '{raw}' for {flag}: {err}"))
}
