// What you SEE:
// • A car window photo with a misted pane and your message written in the mist.
// • Enter reveals the fog; 1-4 swap in a preset phrase.
// • Hold Left Mouse and drag: you wipe the condensation off the glass.
// • S saves the flattened picture (watermark included). R starts over. ESC quits.

mod draw;

use clap::Parser;
use draw::{draw_hud, Drawer};
use misted_glass::app::MistedGlass;
use misted_glass::config::Config;
use misted_glass::error::Error;
use misted_glass::export::{cover_backdrop, draw_fog, FsAssets, SaveToDirectory, ShareOutcome};
use misted_glass::font::{BlockFont, OutlineFont, Typeface};
use misted_glass::stroke::PointerInput;
use misted_glass::types::FrameBuffer;
use misted_glass::vision::pixmap_to_frame;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};
use tiny_skia::{Color, Pixmap};

/// Anything that looks like an HTML tag, closed or not.
const MARKUP: &str = r"<[^>]*>?";

#[derive(Debug, Parser)]
#[command(name = "misted-glass", about = "Write a message in the mist of a car window, then wipe it")]
struct Args {
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Message to write on the glass
    message: Option<String>,
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let markup = Regex::new(MARKUP)?;

    /* --- Typefaces ---
       Visual: hand-written look when a font file is configured, block capitals otherwise. */
    let typeface = load_typeface(config.font.as_deref());
    let watermark_face = match &config.watermark_font {
        Some(path) => load_typeface(Some(path)),
        None => Rc::clone(&typeface),
    };

    /* --- Window + glass --- */
    let (w, h) = (config.window_width, config.window_height);
    let mut drawer = Drawer::new(&config.export.title, w as usize, h as usize)?;
    let mut glass = MistedGlass::new(
        config.fog_settings(),
        config.brush.clone(),
        config.export.clone(),
        typeface,
        watermark_face,
        w,
        h,
    )?;

    let initial = strip_markup(&markup, args.message.as_deref().unwrap_or(&config.message));
    glass.set_message(&initial);

    /* --- Background photo ---
       Visual: shown sharp around the window and frosted inside it. */
    let assets = FsAssets::new(&config.asset_root);
    pollster::block_on(glass.load_background(&assets, &config.background));
    let mut saver = SaveToDirectory::new(&config.output_dir);

    /* --- Reusable screen buffer --- */
    let mut screen = FrameBuffer::new(w as usize, h as usize);
    let mut backdrop = make_backdrop(glass.background(), w, h);

    /* --- HUD / FPS --- */
    let mut status = String::new();
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut was_down = false;

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        let now = Instant::now();

        /* 1) Window resized? The fog repaints at the new size before any wipe. */
        let (ww, wh) = drawer.size();
        if ww > 0 && wh > 0 && (ww, wh) != (screen.width, screen.height) {
            glass.resize(ww as u32, wh as u32)?;
            screen = FrameBuffer::new(ww, wh);
            backdrop = make_backdrop(glass.background(), ww as u32, wh as u32);
        }

        /* 2) Keys */
        if let Some(i) = drawer.preset_pressed_once() {
            if let Some(phrase) = config.presets.get(i) {
                glass.set_message(&strip_markup(&markup, phrase));
            }
        }
        if drawer.r_pressed_once() {
            glass.reset(); // visual: clear glass again, ready for a new message
            glass.set_message(&initial);
            status.clear();
        }
        if drawer.enter_pressed_once() {
            glass.reveal(); // visual: the window mists over with the message in it
        }
        if drawer.s_pressed_once() && glass.is_active() {
            let shared = pollster::block_on(glass.export_and_share(&assets, &config.background, &mut saver));
            status = match shared {
                Ok(ShareOutcome::Saved(path)) => format!("SAVED {}", path.display()),
                Ok(ShareOutcome::Shared) => "SHARED".to_owned(),
                Ok(ShareOutcome::NotShared) => String::new(),
                Err(e) => {
                    log::error!("export failed: {e}");
                    "EXPORT FAILED".to_owned()
                }
            };
        }

        /* 3) Pointer: press starts a wipe, drag continues it, release ends it. */
        let down = drawer.left_mouse_down();
        if let Some((x, y)) = drawer.mouse_pos() {
            let input = PointerInput::Mouse { x, y };
            match (was_down, down) {
                (false, true) => {
                    glass.pointer_down(&input);
                }
                (true, true) => {
                    glass.pointer_move(&input);
                }
                _ => {}
            }
        }
        if was_down && !down {
            glass.pointer_up();
        }
        was_down = down;

        /* 4) Compose: photo, then the fog surface, then the HUD. */
        let Some(mut frame) = backdrop.clone() else {
            drawer.present(&screen)?;
            continue;
        };
        if glass.is_active() {
            draw_fog(&mut frame, glass.surface().pixmap());
        }
        let hint = if glass.is_active() {
            "DRAG: WIPE   1-4: PHRASE   S: SAVE   R: RESET   ESC: QUIT"
        } else {
            "ENTER: REVEAL   1-4: PHRASE   ESC: QUIT"
        };
        draw_hud(&mut frame, 8.0, 8.0, hint, 10.0);
        if !status.is_empty() {
            draw_hud(&mut frame, 8.0, 22.0, &status, 10.0);
        }
        pixmap_to_frame(&frame, &mut screen.pixels);

        /* 5) Present to the window */
        drawer.present(&screen)?;

        /* 6) FPS counter */
        frames_this_second += 1;
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            log::debug!("FPS: {:.1}", frames_this_second as f32 / secs);
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    Ok(())
}

/// Outline font from disk, or the built-in block font when none is set or it fails to load.
fn load_typeface(path: Option<&Path>) -> Rc<dyn Typeface> {
    let Some(path) = path else { return Rc::new(BlockFont) };
    match OutlineFont::from_file(path) {
        Ok(font) => {
            log::info!("using font {}", path.display());
            Rc::new(font)
        }
        Err(e) => {
            log::warn!("{e}, falling back to the block font");
            Rc::new(BlockFont)
        }
    }
}

/// Sharp photo behind the glass, or a dark night sky while it is missing.
fn make_backdrop(background: Option<&Pixmap>, width: u32, height: u32) -> Option<Pixmap> {
    match background {
        Some(photo) => cover_backdrop(photo, width, height),
        None => {
            let mut night = Pixmap::new(width, height)?;
            night.fill(Color::from_rgba8(24, 32, 48, 255));
            Some(night)
        }
    }
}

/// Drop tag-like runs from typed text before it reaches the glass.
fn strip_markup(markup: &Regex, input: &str) -> String {
    markup.replace_all(input, "").into_owned()
}
