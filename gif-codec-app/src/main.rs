use std::{env, error::Error, fs, process::ExitCode};

use rust_gif_codec::{
    effect::{apply_to_all, EffectKind, EffectSettings},
    gif, transport,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: gif-codec-app <input> <output> [effect] [speed] [saturation]";

struct Args {
    input: String,
    output: String,
    settings: EffectSettings,
}

fn parse_args() -> Result<Args, Box<dyn Error>> {
    let mut args = env::args().skip(1);
    let (Some(input), Some(output)) = (args.next(), args.next()) else {
        return Err(USAGE.into());
    };

    let mut settings = EffectSettings::default();
    if let Some(kind) = args.next() {
        settings.kind = kind.parse::<EffectKind>()?;
    }
    if let Some(speed) = args.next() {
        settings.speed = speed.parse()?;
    }
    if let Some(saturation) = args.next() {
        settings.saturation = saturation.parse::<f32>()?.clamp(0.0, 100.0);
    }

    Ok(Args {
        input,
        output,
        settings,
    })
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let raw = fs::read(&args.input)?;
    let bytes = if raw.starts_with(b"GIF") {
        raw
    } else {
        transport::decode_payload(&String::from_utf8_lossy(&raw))?
    };

    let mut animation = gif::decode(&bytes)?;
    info!(
        "Read {}x{} GIF with {} frames from {}",
        animation.width,
        animation.height,
        animation.frames.len(),
        args.input
    );

    apply_to_all(&mut animation, &args.settings);
    let encoded = gif::encode(&animation.frames, animation.width, animation.height)?;

    if args.output.ends_with(".txt") || args.output.ends_with(".b64") {
        fs::write(&args.output, transport::encode_payload(&encoded))?;
    } else {
        fs::write(&args.output, &encoded)?;
    }
    info!("Wrote {} bytes to {}", encoded.len(), args.output);
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let result = parse_args().and_then(|args| run(&args));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
