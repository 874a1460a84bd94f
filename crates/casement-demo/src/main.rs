//! Drive a scripted session against an in-memory framebuffer and write the
//! final frame as a PPM image.

use std::{fs, path::PathBuf};

use anyhow::Result;
use casement::{
    AppId, Toolkit,
    canvas::Color,
    config::Config,
    dump,
    event::RawEvent,
    geom::{Expanse, Rect},
    keycodes::{BTN_LEFT, KEY_ENTER, KEY_H, KEY_I},
    logging,
    testing::{MemoryFrameBuffer, ScriptedInput},
    widget::MinMax,
    widgets::{Button, Panel, Window},
};
use clap::Parser;
use tracing::{Level, info};

/// CLI flags for the demo.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Screen width, overriding the configuration.
    #[clap(long)]
    width: Option<u32>,

    /// Screen height, overriding the configuration.
    #[clap(long)]
    height: Option<u32>,

    /// Where to write the final frame.
    #[clap(long, default_value = "casement.ppm")]
    out: PathBuf,

    /// Log level.
    #[clap(long, default_value = "info")]
    log: Level,
}

/// Milliseconds between simulated cycles.
const CYCLE_MS: u64 = 20;

/// Run the demo.
fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log)?;

    let mut config = match &args.config {
        Some(p) => Config::load(p)?,
        None => Config::default(),
    };
    if let Some(w) = args.width {
        config.width = w;
    }
    if let Some(h) = args.height {
        config.height = h;
    }

    let (state, fb) = MemoryFrameBuffer::create(Expanse::new(config.width, config.height));
    let mut tk = Toolkit::init(config, Box::new(fb))?;
    let app = AppId(1);

    let back = tk.create(app, Window::new(Color::rgb(0xee, 0xe8, 0xd5)).with_title("back"));
    tk.place(back, Rect::new(20, 20, 300, 200))?;
    tk.release(back);

    let main = tk.create(app, Window::new(Color::rgb(0xfd, 0xf6, 0xe3)).with_title("main"));
    tk.place(main, Rect::new(120, 80, 240, 180))?;
    tk.release(main);
    let panel = tk.add_child(main, Panel::new().vertical(4))?;
    tk.set_geometry(panel, Rect::new(10, 10, 220, 160))?;
    let ok = tk.add_child(panel, Button::new("ok"))?;
    let cancel = tk.add_child(panel, Button::new("cancel"))?;
    for b in [ok, cancel] {
        tk.set_minmax(b, MinMax::fixed(Expanse::new(80, 24)))?;
    }
    tk.update(panel)?;

    let glass = tk.create(app, Window::new(Color::BLACK).with_title("glass").transparent());
    tk.place(glass, Rect::new(200, 150, 200, 120))?;
    tk.release(glass);

    let mut now = 0;
    tk.cycle(now, &mut ScriptedInput::new());

    // Click "ok", then type into it.
    let target = tk.tree().abs_rect(ok).unwrap_or_default();
    let script: ScriptedInput = [
        RawEvent::abs_motion(target.tl.x + 5, target.tl.y + 5),
        RawEvent::press(BTN_LEFT),
        RawEvent::release(BTN_LEFT),
        RawEvent::press(KEY_H),
        RawEvent::release(KEY_H),
        RawEvent::press(KEY_I),
        RawEvent::release(KEY_I),
        RawEvent::press(KEY_ENTER),
        RawEvent::release(KEY_ENTER),
    ]
    .into_iter()
    .collect();
    for ev in script {
        now += CYCLE_MS;
        tk.cycle(now, &mut [ev].into_iter());
    }
    tk.top(back)?;
    tk.cycle(now + CYCLE_MS, &mut ScriptedInput::new());
    tk.flush();

    for n in tk.take_notifications() {
        info!(app = %n.app, widget = ?n.widget, action = %n.action, "notification");
    }
    println!("{}", dump::window_table(&tk));
    println!("{}", dump::dump_tree(tk.tree(), main)?);

    fs::write(&args.out, state.borrow().to_ppm())?;
    let stats = tk.shutdown();
    info!(?stats, out = %args.out.display(), "frame written");
    Ok(())
}
