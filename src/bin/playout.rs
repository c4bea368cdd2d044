use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use playout::{
    AcceleratorSettings, AudioLayer, BlendMode, ChannelConfig, ChannelFrameFactory, ColorLayer,
    DecodeOutput, FrameFactory, LayerInput, LayerMap, Mixer, Packet, SourcePixelFormat,
    TestPatternCodec, TracingEventSink, VideoDecoder, VideoFormatDesc, create_accelerator,
};

#[derive(Parser, Debug)]
#[command(name = "playout", version)]
struct Cli {
    /// Channel config JSON; overrides `--format`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Video format preset.
    #[arg(long, global = true, default_value = "720p5000")]
    format: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose synthetic ticks and report timing.
    Mix(MixArgs),
    /// Decode a synthetic stream and report frame numbers.
    Decode(DecodeArgs),
}

#[derive(Parser, Debug)]
struct MixArgs {
    /// Number of ticks to compose.
    #[arg(long, default_value_t = 50)]
    ticks: u64,

    /// Blend mode of the overlay layer.
    #[arg(long, default_value = "normal")]
    blend: String,

    /// Override accelerator worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Write the last composite as PNG.
    #[arg(long)]
    png: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct DecodeArgs {
    /// Number of packets to feed.
    #[arg(long, default_value_t = 25)]
    frames: i64,

    /// Codec delay in frames.
    #[arg(long, default_value_t = 0)]
    delay: usize,

    /// Native pixel format of the synthetic codec.
    #[arg(long, default_value = "yuv420p")]
    pixel_format: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ChannelConfig::from_path(path)?,
        None => ChannelConfig::new(VideoFormatDesc::preset(&cli.format)?),
    };
    match cli.cmd {
        Command::Mix(args) => cmd_mix(&config, args),
        Command::Decode(args) => cmd_decode(&config, args),
    }
}

fn tone(format: &VideoFormatDesc, tick: u64, hz: f32) -> Vec<f32> {
    let channels = usize::from(format.audio_channels);
    let start = playout::frame_to_sample(tick, format.fps, format.audio_sample_rate);
    let n = format.audio_samples_for_tick(tick);
    let rate = format.audio_sample_rate as f32;
    (0..n)
        .flat_map(|i| {
            let t = (start + i as u64) as f32 / rate;
            let s = 0.25 * (2.0 * std::f32::consts::PI * hz * t).sin();
            std::iter::repeat_n(s, channels)
        })
        .collect()
}

fn cmd_mix(config: &ChannelConfig, args: MixArgs) -> anyhow::Result<()> {
    let format = &config.format;
    let mode: BlendMode = args.blend.parse()?;
    let accel = create_accelerator(&AcceleratorSettings {
        threads: args.threads,
        ..AcceleratorSettings::default()
    })?;
    let mixer = Mixer::new(&config.mixer, accel)?;
    mixer.set_blend_mode(10, mode);

    let background: Arc<dyn LayerInput> = Arc::new(ColorLayer::bgra(96, 32, 16, 255));
    let overlay: Arc<dyn LayerInput> = Arc::new(ColorLayer::bgra(0, 128, 255, 255).with_opacity(0.5));

    let mut compose = Vec::new();
    let mut resolve = Vec::new();
    let mut last = None;
    for tick in 0..args.ticks {
        let mut layers = LayerMap::new();
        layers.insert(0, Arc::clone(&background));
        layers.insert(10, Arc::clone(&overlay));
        layers.insert(20, Arc::new(AudioLayer::new(tone(format, tick, 440.0))));

        let t0 = Instant::now();
        let frame = mixer.compose(layers, format);
        let t1 = Instant::now();
        frame.image_data()?;
        compose.push(t1 - t0);
        resolve.push(t1.elapsed());
        last = Some(frame);
    }

    let info = mixer.info().get()?;
    eprintln!(
        "{} ticks of {} ({} failed); compose {}; resolve {}",
        args.ticks,
        format.name,
        info.ticks_failed,
        stats(&compose),
        stats(&resolve)
    );

    if let (Some(path), Some(frame)) = (args.png, last) {
        let pixels = frame.image_data()?;
        let rgba: Vec<u8> = pixels
            .plane(0)?
            .chunks_exact(4)
            .flat_map(|p| [p[2], p[1], p[0], p[3]])
            .collect();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        image::save_buffer_with_format(
            &path,
            &rgba,
            frame.width(),
            frame.height(),
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn stats(samples: &[Duration]) -> String {
    if samples.is_empty() {
        return "n/a".to_string();
    }
    let ms = |d: Duration| d.as_secs_f64() * 1e3;
    let min = samples.iter().copied().min().unwrap_or_default();
    let max = samples.iter().copied().max().unwrap_or_default();
    let mean = samples.iter().sum::<Duration>() / samples.len() as u32;
    format!("min {:.3}ms mean {:.3}ms max {:.3}ms", ms(min), ms(mean), ms(max))
}

fn cmd_decode(config: &ChannelConfig, args: DecodeArgs) -> anyhow::Result<()> {
    let format = &config.format;
    let pixel_format = SourcePixelFormat::from_name(&args.pixel_format)
        .with_context(|| format!("unknown pixel format '{}'", args.pixel_format))?;
    let codec = TestPatternCodec::new(format.width, format.height, format.fps)
        .with_format(pixel_format)
        .with_delay(args.delay)
        .with_declared_frames(args.frames.max(0) as u32);
    let factory: Arc<dyn FrameFactory> = Arc::new(ChannelFrameFactory::new(format.clone()));
    let mut decoder = VideoDecoder::open(Box::new(codec), 0, factory, &config.decoder)?
        .with_events(Arc::new(TracingEventSink));
    eprintln!("{}", decoder.print());

    for pts in 0..args.frames {
        decoder.push(Packet::new(0, Some(pts), vec![0u8; 16]));
    }
    decoder.push(Packet::end_of_stream());

    let mut decoded = 0u32;
    while decoder.ready() {
        match decoder.poll()? {
            Some(DecodeOutput::Frame(frame)) => {
                decoded += 1;
                println!(
                    "frame {} {}x{} {}",
                    frame.frame_number,
                    frame.width,
                    frame.height,
                    frame.field_mode.as_str()
                );
            }
            Some(DecodeOutput::Empty) | None => {}
            Some(DecodeOutput::Flush) => println!("flush"),
        }
    }
    eprintln!(
        "decoded {decoded} frames; nb_frames {}; state {:?}",
        decoder.nb_frames(),
        decoder.state()
    );
    Ok(())
}
