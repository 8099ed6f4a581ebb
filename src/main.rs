use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use log::{debug, info, warn};
use std::path::Path;

use qcplay::cli::Args;
use qcplay::config::{self, PathConfig};
use qcplay::core::event_bus::EventBus;
use qcplay::core::frame_model::StatsTimeline;
use qcplay::core::player::Player;
use qcplay::core::player_events::{FilterGraphAppliedEvent, PlaybackEndedEvent};
use qcplay::core::reconciler::frame_info;
use qcplay::core::sim_transport::SimTransport;
use qcplay::filters::catalog::{self, SlotCapability};
use qcplay::filters::{FilterChain, FontResource, MAX_SLOTS, TokenContext, compose};
use qcplay::media::MediaInfo;
use qcplay::settings::AppSettings;

fn setup_logging(args: &Args, path_config: &PathConfig) -> Result<()> {
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .clone()
            .unwrap_or_else(|| config::data_file(config::LOG_FILE, path_config));
        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging (respects RUST_LOG if set)
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

fn print_catalog() {
    for (title, kind) in [("Views", SlotCapability::View), ("Adjustments", SlotCapability::Adjustment)] {
        println!("{}:", title);
        for name in catalog::names_for(kind) {
            let params: Vec<String> = catalog::lookup(name)
                .map(|f| f.params.iter().map(|p| format!("{}={}", p.name, p.default)).collect())
                .unwrap_or_default();
            if params.is_empty() {
                println!("  {}", name);
            } else {
                println!("  {} ({})", name, params.join(", "));
            }
        }
    }
}

/// Merge CLI overrides into the persisted settings.
fn apply_overrides(settings: &mut AppSettings, args: &Args) {
    if let Some(layout) = args.layout {
        settings.layout = layout;
    }
    if args.fit_to_grid {
        settings.fit_to_grid = true;
    }
    if args.graph_monitor {
        settings.graph_monitor = true;
    }
    if !args.filters.is_empty() {
        if args.filters.len() > MAX_SLOTS {
            warn!("Only the first {} filters are used", MAX_SLOTS);
        }
        settings.default_filters = args
            .filters
            .iter()
            .take(MAX_SLOTS)
            .map(|n| Some(n.clone()))
            .collect();
    }
    if let Some(adjustment) = &args.adjustment {
        settings.default_adjustment = Some(adjustment.clone());
    }
    if let Some(percent) = args.scale {
        settings.output_scale.set_percent(percent);
    }
}

/// Probe `path`, falling back to (and overridden by) explicit geometry flags.
fn media_info(path: &Path, args: &Args) -> Result<MediaInfo> {
    let probed = match MediaInfo::probe(path) {
        Ok(info) => Some(info),
        Err(e) => {
            info!("Probe failed ({}), using command-line geometry", e);
            None
        }
    };

    let frame_count = args.frame_count.or(probed.as_ref().map(|i| i.frame_count));
    let duration_ms = args.duration_ms.or(probed.as_ref().map(|i| i.duration_ms));
    let (Some(frame_count), Some(duration_ms)) = (frame_count, duration_ms) else {
        bail!("Media geometry unknown: pass --frame-count and --duration-ms");
    };
    Ok(MediaInfo::new(
        frame_count,
        duration_ms,
        args.width.or(probed.as_ref().map(|i| i.width)).unwrap_or(0),
        args.height.or(probed.as_ref().map(|i| i.height)).unwrap_or(0),
        args.dar.or(probed.as_ref().map(|i| i.dar)).unwrap_or(0.0),
    ))
}

fn run_session(path: &Path, info: MediaInfo, settings: &AppSettings, args: &Args) -> Result<()> {
    // Time-only sessions still need a clock granularity for the sim
    let sim_frames = if info.frame_count > 0 {
        info.frame_count
    } else {
        (info.duration_ms / 40).max(1) as usize
    };
    let (transport, events) = SimTransport::new(sim_frames, info.duration_ms);
    let bus = EventBus::new();
    bus.subscribe::<FilterGraphAppliedEvent, _>(|e| debug!("Installed graph: {}", e.graph));
    bus.subscribe::<PlaybackEndedEvent, _>(|e| info!("Playback ended at frame {}", e.frame));
    let mut player = Player::new(
        transport,
        events,
        StatsTimeline::new(info.frame_count),
        bus.clone(),
        settings.player_options(&std::env::temp_dir()),
    );
    let (vw, vh) = args.viewport.unwrap_or((info.width, info.height));
    player.set_viewport_size(vw, vh);

    player.set_file(path, info).context("Failed to open session")?;
    player.apply_filters().context("Failed to apply filters")?;

    if let Some(frame) = args.frame {
        player.set_frame(frame).context("Failed to land on frame")?;
    }
    if let Some(text) = &args.goto {
        let ms = player.go_to_time(text);
        debug!("Seeked to {} ms", ms);
    }
    player.pump_events();
    let _ = bus.poll();

    let position = player.sync().position();
    let landing = frame_info(player.model(), Some(position));
    println!("{}", player.current_graph());
    println!("{} @ {}", landing.frame_label, landing.time_label);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let path_config = PathConfig::from_env_and_cli(args.config_dir.clone());
    if let Err(e) = config::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create application directories: {}", e);
    }
    setup_logging(&args, &path_config)?;
    info!("qcplay {} starting", env!("CARGO_PKG_VERSION"));
    debug!("Command-line args: {:?}", args);

    if args.list_filters {
        print_catalog();
        return Ok(());
    }

    let settings_path = config::config_file(config::SETTINGS_FILE, &path_config);
    info!("Config path: {}", settings_path.display());
    let mut settings = AppSettings::load(&settings_path)?;
    apply_overrides(&mut settings, &args);
    if args.save_settings {
        settings.save(&settings_path)?;
    }

    let Some(path) = args.file_path.as_deref() else {
        if args.frame_count.is_none() && args.duration_ms.is_none() && !args.save_settings {
            let _ = Args::command().print_help();
            println!("\n");
        }
        // Compose-only: show the graph the settings produce
        let info = MediaInfo::new(
            0,
            0,
            args.width.unwrap_or(0),
            args.height.unwrap_or(0),
            args.dar.unwrap_or(0.0),
        );
        let mut chain = FilterChain::new();
        chain.load_defaults(&settings.default_filters, settings.default_adjustment.as_deref())?;
        let available = args.viewport.unwrap_or((info.width, info.height));
        let (window_width, window_height) = settings
            .output_scale
            .output_size((info.width, info.height), available);
        let tokens = TokenContext {
            width: info.width,
            height: info.height,
            dar: info.dar,
            window_width,
            window_height,
            fontfile: FontResource::new(settings.font_source.clone(), &std::env::temp_dir()).token_value(),
        };
        println!(
            "{}",
            compose(
                &chain.view_expressions(),
                &chain.adjustment_expression(),
                &settings.graph_options(),
                &tokens
            )
        );
        return Ok(());
    };

    info!("Input file: {}", path.display());
    let info = media_info(path, &args)?;
    run_session(path, info, &settings, &args)
}
