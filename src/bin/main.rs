//! SDF Forge - Real-time ray-marched fractal explorer
//!
//! # Usage
//!
//! ```bash
//! sdf-forge
//! sdf-forge --fractal mandelbulb
//! sdf-forge --preview --dec kalibox.glsl
//! sdf-forge --list-snippets
//! sdf-forge --resolve-dec box.glsl
//! ```
//!
//! # Keyboard Shortcuts
//!
//! - 1-7: switch fractal kind
//! - P: toggle DEC snippet preview
//! - [ / ]: cycle DEC snippets
//! - ESC: quit

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sdf_forge::config;
use sdf_forge::shader_gen::{DEFAULT_KEY, FractalKind, ShaderContext};

#[derive(Parser)]
#[command(name = "sdf-forge")]
#[command(
    author,
    version,
    about = "SDF Forge - real-time ray-marched fractal explorer"
)]
struct Args {
    /// Fractal shown at startup: menger, mandelbulb, mandelbox, sierpinski,
    /// world, truchet, dec
    #[arg(long, short = 'f')]
    fractal: Option<String>,

    /// DEC snippet selection (full key, suffix, or basename)
    #[arg(long)]
    dec: Option<String>,

    /// Enable the DEC preview at startup
    #[arg(long, short = 'p')]
    preview: bool,

    /// Start in fullscreen (borderless window)
    #[arg(long)]
    fullscreen: bool,

    /// Disable the post composite pass (render directly to the surface)
    #[arg(long)]
    no_post: bool,

    /// List bundled DEC snippet keys and exit
    #[arg(long)]
    list_snippets: bool,

    /// Resolve a DEC selection against the registry and exit
    #[arg(long, value_name = "SPEC")]
    resolve_dec: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    if args.list_snippets {
        let ctx = ShaderContext::new();
        for key in ctx.registry().keys() {
            println!("{key}");
        }
        return;
    }

    if let Some(spec) = &args.resolve_dec {
        let ctx = ShaderContext::new();
        match ctx.resolve_dec_key(spec) {
            Some(key) => println!("{spec} -> {key}"),
            None => println!("{spec} -> no match (default: {DEFAULT_KEY})"),
        }
        return;
    }

    let mut config = config::load();
    if let Some(name) = &args.fractal {
        if FractalKind::from_name(name).is_none() {
            tracing::error!("unknown fractal \"{}\"", name);
            std::process::exit(1);
        }
        config.scene.fractal = name.to_ascii_lowercase();
    }
    if let Some(dec) = args.dec {
        config.scene.dec_snippet = Some(dec);
    }
    if args.preview {
        config.scene.dec_preview = true;
    }
    if args.fullscreen {
        config.video.fullscreen = true;
    }
    if args.no_post {
        config.video.post_fx = false;
    }

    if let Err(e) = sdf_forge::app::run(config) {
        tracing::error!("Application error: {}", e);
        std::process::exit(1);
    }
}
