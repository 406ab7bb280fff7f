use anyhow::Result;
use clap::Parser;
use owo_colors::OwoColorize;
use safestep::cli::{Cli, Commands, ConfigAction};
use safestep::announce::channel::{AnnouncementChannel, SpeechChannel, StdoutChannel};
use safestep::camera::{CameraSource, DeviceCamera};
use safestep::config::Config;
use safestep::detection::client::{DetectionClient, HttpDetectionClient};
use safestep::monitor::{Monitor, render_event};
use safestep::{SafestepError, version_string};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            let config = apply_overrides(load_config(cli.config.as_deref())?, &cli);
            config.validate()?;
            run_monitor(config, &cli).await?;
        }
        Some(Commands::Check) => {
            let config = apply_overrides(load_config(cli.config.as_deref())?, &cli);
            run_check(config).await;
        }
        Some(Commands::Say { ref text }) => {
            let config = apply_overrides(load_config(cli.config.as_deref())?, &cli);
            let message = text.clone().unwrap_or_else(|| config.announce.message.clone());
            say_once(&config, &message)?;
        }
        Some(Commands::Config { ref action }) => {
            handle_config_command(action, cli.config.as_deref())?;
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/safestep/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        let default_path = Config::default_path();
        Config::load_or_default(&default_path)?
    };

    Ok(config.with_env_overrides())
}

/// Apply command-line overrides on top of the loaded configuration.
fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(endpoint) = &cli.endpoint {
        config.detection.endpoint = endpoint.clone();
    }
    if let Some(interval) = cli.interval {
        config.detection.poll_interval_ms = interval;
    }
    if let Some(suppression) = cli.suppression {
        config.announce.suppression_ms = suppression;
    }
    if let Some(message) = &cli.message {
        config.announce.message = message.clone();
    }
    if let Some(camera) = &cli.camera {
        config.camera.device = camera.clone();
    }
    if cli.no_camera {
        config.camera.enabled = false;
    }
    config
}

/// Run the monitor loop until SIGINT or SIGTERM.
async fn run_monitor(config: Config, cli: &Cli) -> Result<()> {
    let channel: Box<dyn AnnouncementChannel> = if cli.no_speech {
        Box::new(StdoutChannel)
    } else {
        Box::new(SpeechChannel::new(&config.announce))
    };

    let mut monitor = Monitor::new(config.clone()).with_channel(channel);

    if config.camera.enabled {
        monitor = monitor.with_camera(Box::new(DeviceCamera::new(&config.camera.device)));
    }

    // Verbose mode streams events to stderr from a plain thread; the
    // monitor side only ever try_sends.
    let mut event_thread = None;
    if cli.verbose > 0 && !cli.quiet {
        let (event_tx, event_rx) = crossbeam_channel::bounded(64);
        monitor = monitor.with_event_sender(event_tx);
        event_thread = Some(std::thread::spawn(move || {
            for event in event_rx.iter() {
                render_event(&event);
            }
        }));
    }

    if !cli.quiet {
        eprintln!(
            "safestep {} polling {} every {}ms (Ctrl+C to stop)",
            version_string(),
            config.detection.endpoint,
            config.detection.poll_interval_ms
        );
    }

    let handle = monitor.start()?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            if !cli.quiet {
                eprintln!("\nReceived SIGINT, shutting down...");
            }
        }
        res = wait_for_sigterm() => {
            if let Err(e) = res {
                eprintln!("Error setting up signal handler: {}", e);
            }
            if !cli.quiet {
                eprintln!("\nReceived SIGTERM, shutting down...");
            }
        }
    }

    handle.stop().await;

    if let Some(thread) = event_thread
        && thread.join().is_err()
    {
        eprintln!("safestep: event renderer thread panicked");
    }

    Ok(())
}

/// Probe the detection endpoint, camera, and speech backend.
async fn run_check(config: Config) {
    let mut failures = 0;

    match HttpDetectionClient::new(config.detection.endpoint.clone(), config.detection.request_timeout()) {
        Ok(client) => match client.fetch().await {
            Ok(detection) => {
                println!(
                    "{} detection endpoint {} (detected={}, confidence={:.2})",
                    "ok".green(),
                    config.detection.endpoint,
                    detection.detected,
                    detection.confidence
                );
            }
            Err(e) => {
                println!("{} detection endpoint: {}", "fail".red(), e);
                failures += 1;
            }
        },
        Err(e) => {
            println!("{} detection client: {}", "fail".red(), e);
            failures += 1;
        }
    }

    if config.camera.enabled {
        let mut camera = DeviceCamera::new(&config.camera.device);
        match camera.acquire() {
            Ok(()) => {
                println!("{} camera {}", "ok".green(), config.camera.device);
                if let Err(e) = camera.release() {
                    println!("{} camera release: {}", "fail".red(), e);
                }
            }
            Err(e) => {
                println!("{} camera: {}", "fail".red(), e);
                failures += 1;
            }
        }
    } else {
        println!("{} camera disabled", "skip".dimmed());
    }

    match std::process::Command::new("spd-say")
        .arg("--version")
        .output()
    {
        Ok(output) if output.status.success() => {
            println!("{} spd-say", "ok".green());
        }
        _ => {
            println!("{} spd-say not available (install speech-dispatcher)", "fail".red());
            failures += 1;
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
}

/// Speak one message and wait for it to finish.
fn say_once(config: &Config, message: &str) -> Result<()> {
    let mut channel = SpeechChannel::new(&config.announce);
    channel.announce(message)?;
    channel.wait()?;
    Ok(())
}

/// Handle configuration commands.
fn handle_config_command(action: &ConfigAction, custom_path: Option<&std::path::Path>) -> Result<()> {
    let config_path = custom_path
        .map(std::path::PathBuf::from)
        .unwrap_or_else(Config::default_path);

    match action {
        ConfigAction::Show => {
            let config = Config::load_or_default(&config_path)?.with_env_overrides();
            let rendered = toml::to_string_pretty(&config)
                .map_err(|e| SafestepError::Other(format!("failed to render config: {}", e)))?;
            print!("{}", rendered);
        }
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Wait for SIGTERM signal (used by systemd).
#[cfg(unix)]
async fn wait_for_sigterm() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| SafestepError::Other(format!("Failed to register SIGTERM handler: {}", e)))?;
    sigterm.recv().await;
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_sigterm() -> Result<()> {
    // On non-Unix, just wait forever (Ctrl+C will still work)
    std::future::pending::<()>().await
}
