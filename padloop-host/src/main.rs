mod commands;
mod midi_io;

use std::fs::File;
use std::io::BufRead;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use padloop_core::config::{self, Config};
use padloop_core::device::DeviceContext;
use padloop_core::settings_store;

use commands::{parse_command, Command};
use midi_io::{MidiInputManager, MidiOutputSink};

/// Fast cadence of the main loop.
const POLL_INTERVAL: Duration = Duration::from_micros(500);

fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = config::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("padloop.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path).or_else(|_| File::create("/tmp/padloop.log")) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("padloop: no log file ({}), logging disabled", e);
            return;
        }
    };

    if let Err(e) = WriteLogger::init(log_level, simplelog::Config::default(), log_file) {
        eprintln!("padloop: logger init failed: {}", e);
        return;
    }

    log::info!("padloop starting (log level: {:?})", log_level);
}

fn arg_value<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}

fn print_ports() {
    println!("MIDI inputs:");
    for port in midi_io::list_input_ports() {
        println!("  {}: {}", port.index, port.name);
    }
    println!("MIDI outputs:");
    for port in midi_io::list_output_ports() {
        println!("  {}: {}", port.index, port.name);
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    init_logging(verbose);

    if args.iter().any(|a| a == "--list") {
        print_ports();
        return;
    }

    let defaults = Config::load().settings();
    let settings_path = settings_store::settings_path();
    let settings = match &settings_path {
        Some(path) => settings_store::load_settings_or(path, defaults),
        None => defaults,
    };
    let mut device = DeviceContext::new(settings);

    let channel = arg_value::<u8>(&args, "--channel").unwrap_or(1).clamp(1, 16) - 1;
    let mut out = match arg_value::<usize>(&args, "--out") {
        Some(index) => match MidiOutputSink::connect(index, channel) {
            Ok(sink) => sink,
            Err(e) => {
                eprintln!("padloop: {}", e);
                log::error!(target: "midi", "output: {}", e);
                MidiOutputSink::disconnected(channel)
            }
        },
        None => MidiOutputSink::disconnected(channel),
    };

    let mut midi_in = MidiInputManager::new();
    if let Some(index) = arg_value::<usize>(&args, "--in") {
        if let Err(e) = midi_in.connect(index) {
            eprintln!("padloop: {}", e);
            log::error!(target: "midi", "input: {}", e);
        }
    }
    if let Some(name) = midi_in.connected_port_name() {
        println!("listening on {}", name);
    }

    let (cmd_tx, cmd_rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            if cmd_tx.send(parse_command(&line)).is_err() {
                break;
            }
        }
        let _ = cmd_tx.send(Ok(Command::Quit));
    });

    let epoch = Instant::now();
    'run: loop {
        for (at, msg) in midi_in.poll_messages() {
            let now = at.saturating_duration_since(epoch).as_secs_f64();
            device.handle_midi(msg, now, &mut out);
        }

        let now = epoch.elapsed().as_secs_f64();
        while let Ok(cmd) = cmd_rx.try_recv() {
            match cmd {
                Ok(Command::Quit) => break 'run,
                Ok(Command::Input(event)) => device.handle_input(event, now, &mut out),
                Err(e) => println!("{}", e),
            }
        }

        device.poll(now, &mut out);
        thread::sleep(POLL_INTERVAL);
    }

    // nothing may keep sounding after exit
    device.stop_all(epoch.elapsed().as_secs_f64(), &mut out);
    if let Some(path) = &settings_path {
        let _ = device.save_settings(path, &mut out);
    }
    log::info!("padloop exiting");
}
