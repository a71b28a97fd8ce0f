use clap::{Parser, Subcommand};
use exportkit::config::{self, ExportSettings};
use exportkit::defaults::{ConfigMap, parse_assignment, set_path};
use exportkit::imaging::{
    BrandingOptions, ImageMime, ImageSession, ImageSource, LogoPosition, PlaceholderOptions,
    ValidationConstraints, WatermarkOptions, detect_image_format, detect_image_subtype, image_info,
    is_supported_image, parse_color, validate_files,
};
use exportkit::{naming, output};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "exportkit")]
#[command(about = "Export configuration defaults and branding images for POS reports")]
#[command(long_about = "\
Export configuration defaults and branding images for POS reports

Configuration is resolved in layers, later layers win:

  global defaults      filename, timestamp, auto-download
  format template      csv | json | excel | pdf | txt
  preset               compact | detailed | print | minimal | your own
  overrides            --set key=value (dotted keys reach nested blocks)

Settings are read from exportkit.toml in the working directory (or the
files given with --settings, later files win). Run 'exportkit gen-config'
to print a documented settings file.

Image sources may be a file path, an http(s) URL or a data: URL.")]
#[command(version)]
struct Cli {
    /// Settings file(s); defaults to ./exportkit.toml
    #[arg(long, global = true)]
    settings: Vec<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Shared output flag for commands that write an image.
#[derive(clap::Args, Clone)]
struct OutArgs {
    /// Where to write the encoded image
    #[arg(long)]
    out: PathBuf,

    /// Encoding: png, jpeg or webp (defaults to the --out extension, then png)
    #[arg(long)]
    mime: Option<ImageMime>,
}

impl OutArgs {
    fn mime(&self) -> ImageMime {
        self.mime
            .or_else(|| {
                self.out
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .and_then(|ext| ImageMime::from_extension(ext).ok())
            })
            .unwrap_or(ImageMime::Png)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print the effective configuration for a format
    Config {
        /// csv, json, excel (xlsx), pdf or txt
        format: String,
        /// Preset to layer on top of the format defaults
        #[arg(long)]
        preset: Option<String>,
        /// Override a key: --set delimiter=';' --set styles.header.font_size=20
        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,
        /// Print JSON instead of a tree
        #[arg(long)]
        json: bool,
    },
    /// Build an export filename
    Filename {
        base: String,
        format: String,
        /// Append a UTC timestamp
        #[arg(long)]
        timestamp: bool,
    },
    /// List supported export formats
    Formats,
    /// List presets and the formats each one covers
    Presets,
    /// Print a stock exportkit.toml with all options documented
    GenConfig,
    /// Resize a logo for export branding
    Logo {
        source: String,
        #[command(flatten)]
        out: OutArgs,
        #[arg(long, default_value_t = 150)]
        max_width: u32,
        #[arg(long, default_value_t = 50)]
        max_height: u32,
        /// Backdrop color (#rgb, #rrggbb, #rrggbbaa, white, ...)
        #[arg(long)]
        background: Option<String>,
        #[arg(long, default_value = "top-left")]
        position: LogoPosition,
    },
    /// Render a rotated, translucent text watermark
    Watermark {
        text: String,
        #[command(flatten)]
        out: OutArgs,
        #[arg(long, default_value_t = 400)]
        width: u32,
        #[arg(long, default_value_t = 200)]
        height: u32,
        #[arg(long, default_value_t = -45.0, allow_hyphen_values = true)]
        angle: f32,
        #[arg(long, default_value_t = 0.1)]
        opacity: f32,
    },
    /// Render a stand-in logo
    Placeholder {
        #[command(flatten)]
        out: OutArgs,
        #[arg(long, default_value = "LOGO")]
        text: String,
    },
    /// Sniff the image format of a source
    Detect { sources: Vec<String> },
    /// Load a source and report its dimensions
    Inspect { source: String },
    /// Check image files against dimension limits
    Validate {
        /// Files or directories (walked recursively)
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(long)]
        min_width: Option<u32>,
        #[arg(long)]
        max_width: Option<u32>,
        #[arg(long)]
        min_height: Option<u32>,
        #[arg(long)]
        max_height: Option<u32>,
        #[arg(long)]
        min_aspect_ratio: Option<f64>,
        #[arg(long)]
        max_aspect_ratio: Option<f64>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = load_settings(&cli.settings)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Command::Config {
            format,
            preset,
            overrides,
            json,
        } => {
            let mut layer = ConfigMap::new();
            for assignment in &overrides {
                let (key, value) = parse_assignment(assignment)?;
                set_path(&mut layer, &key, value);
            }
            let registry = settings.registry();
            let config = registry.resolve(&format, preset.as_deref(), &layer);
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                output::print_config_output(&format, preset.as_deref(), &config);
            }
        }
        Command::Filename {
            base,
            format,
            timestamp,
        } => {
            println!("{}", naming::generate_filename(&base, &format, timestamp));
        }
        Command::Formats => output::print_formats_output(),
        Command::Presets => output::print_presets_output(&settings.registry()),
        Command::GenConfig => {
            print!("{}", config::stock_settings_toml());
        }
        Command::Logo {
            source,
            out,
            max_width,
            max_height,
            background,
            position,
        } => {
            let options = BrandingOptions {
                max_width,
                max_height,
                background: background.as_deref().map(parse_color).transpose()?,
                position,
                mime: out.mime(),
                ..BrandingOptions::default()
            };
            let session = ImageSession::new(settings.images.session_config());
            let logo = runtime.block_on(session.process_logo(&ImageSource::parse(&source), &options))?;
            write_artifact(&out.out, &logo.artifact.blob.bytes)?;
            output::print_logo_output(&logo, &out.out);
        }
        Command::Watermark {
            text,
            out,
            width,
            height,
            angle,
            opacity,
        } => {
            let options = WatermarkOptions {
                width,
                height,
                angle,
                opacity,
                mime: out.mime(),
                ..WatermarkOptions::default()
            };
            let session = ImageSession::new(settings.images.session_config());
            let mark = session.create_watermark(&text, &options)?;
            write_artifact(&out.out, &mark.artifact.blob.bytes)?;
            output::print_watermark_output(&mark, &out.out);
        }
        Command::Placeholder { out, text } => {
            let options = PlaceholderOptions {
                text,
                mime: out.mime(),
                ..PlaceholderOptions::default()
            };
            let session = ImageSession::new(settings.images.session_config());
            let placeholder = session.generate_logo_placeholder(&options)?;
            write_artifact(&out.out, &placeholder.artifact.blob.bytes)?;
            output::print_placeholder_output(&placeholder, &out.out);
        }
        Command::Detect { sources } => {
            for reference in &sources {
                let source = ImageSource::parse(reference);
                let subtype = detect_image_subtype(&source);
                output::print_detect_output(
                    reference,
                    detect_image_format(&source),
                    subtype.as_deref(),
                );
            }
        }
        Command::Inspect { source } => {
            let session = ImageSession::new(settings.images.session_config());
            let image = runtime.block_on(session.load(&ImageSource::parse(&source)))?;
            output::print_info_output(&source, &image_info(&image));
        }
        Command::Validate {
            paths,
            min_width,
            max_width,
            min_height,
            max_height,
            min_aspect_ratio,
            max_aspect_ratio,
        } => {
            let constraints = ValidationConstraints {
                min_width,
                max_width,
                min_height,
                max_height,
                min_aspect_ratio,
                max_aspect_ratio,
            };
            let files = expand_paths(&paths);
            debug!(files = files.len(), "validating");
            let session = ImageSession::new(settings.images.session_config());
            let reports = validate_files(session.backend(), &files, &constraints);
            output::print_validation_output(&reports);
            if !reports.iter().all(|r| r.is_valid()) {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Log to stderr. `RUST_LOG` wins over `-v` when set.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("exportkit={level}")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_settings(paths: &[PathBuf]) -> Result<ExportSettings, config::ConfigError> {
    if paths.is_empty() {
        config::load_settings(Path::new("."))
    } else {
        config::load_settings_layers(paths)
    }
}

/// Files are taken as given; directories contribute every supported image
/// beneath them, in path order.
fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = walkdir::WalkDir::new(path)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_file() && is_supported_image(entry.path()))
                .map(|entry| entry.into_path())
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    files
}

fn write_artifact(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)
}
