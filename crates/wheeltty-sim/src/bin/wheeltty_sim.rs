use std::env;
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing_subscriber::EnvFilter;
use wheeltty_core::{BusWord, Printwheel, SessionConfig};
use wheeltty_sim::Rig;

struct Config {
    wheel: Option<Printwheel>,
    host: Vec<u8>,
    input: Option<PathBuf>,
    keys: Vec<u8>,
    toggle: bool,
    debug: Vec<u8>,
    line_mode: bool,
    log_json: bool,
}

fn print_usage() {
    eprintln!(
        "Usage: wheeltty-sim [--wheel <10p|12p|15p|ps|none|0xNNN>] [--host <text>] [--input <file|->]\n\
         \x20                   [--toggle] [--keys <text>] [--debug <text>] [--line] [--log-json]\n\
         \n\
         Host bytes are sent first, then the mode toggle, then keystrokes, then debug input.\n\
         The paper is printed to stdout; host and debug traffic go to stderr.\n\
         Session settings are read from WHEELTTY_* variables; RUST_LOG filters logs.\n\
         \n\
         Example:\n\
           wheeltty-sim --wheel 10p --host $'Hello\\r\\n\\x1bOWorld\\x1b&\\r\\n' --debug $'\\x1b\\x1av'"
    );
}

fn parse_wheel(value: &str) -> Result<Option<Printwheel>, String> {
    let wheel = match value.to_ascii_lowercase().as_str() {
        "none" => return Ok(None),
        "10p" => Printwheel::TenPitch,
        "12p" => Printwheel::TwelvePitch,
        "15p" => Printwheel::FifteenPitch,
        "ps" => Printwheel::Proportional,
        "missing" => Printwheel::Missing,
        other => {
            let digits = other.trim_start_matches("0x");
            let reply = u16::from_str_radix(digits, 16)
                .map_err(|_| format!("invalid --wheel value: {value}"))?;
            Printwheel::from_reply(BusWord::new(reply))
        }
    };
    Ok(Some(wheel))
}

fn parse_args() -> Result<Config, String> {
    let mut args = env::args().skip(1);
    let mut cfg = Config {
        wheel: Some(Printwheel::TwelvePitch),
        host: Vec::new(),
        input: None,
        keys: Vec::new(),
        toggle: false,
        debug: Vec::new(),
        line_mode: false,
        log_json: false,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--wheel" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--wheel requires a value".to_string())?;
                cfg.wheel = parse_wheel(&value)?;
            }
            "--host" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--host requires a value".to_string())?;
                cfg.host = value.into_bytes();
            }
            "--input" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--input requires a value".to_string())?;
                cfg.input = Some(PathBuf::from(value));
            }
            "--keys" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--keys requires a value".to_string())?;
                cfg.keys = value.into_bytes();
            }
            "--debug" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--debug requires a value".to_string())?;
                cfg.debug = value.into_bytes();
            }
            "--toggle" => cfg.toggle = true,
            "--line" => cfg.line_mode = true,
            "--log-json" => cfg.log_json = true,
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unexpected argument: {other}")),
        }
    }
    Ok(cfg)
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn read_input(path: &Path) -> io::Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut bytes = Vec::new();
        io::stdin().read_to_end(&mut bytes)?;
        Ok(bytes)
    } else {
        fs::read(path)
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cfg = parse_args().inspect_err(|_| {
        print_usage();
    })?;
    init_tracing(cfg.log_json);

    let mut host = cfg.host;
    if let Some(path) = &cfg.input {
        host.extend(read_input(path)?);
    }

    let mut config = SessionConfig::from_env()?;
    if cfg.line_mode {
        config = config.local_mode(false);
    }

    let mut rig = Rig::new(config, cfg.wheel)?;
    let wheel = rig.power_on()?;
    tracing::info!(
        wheel = %wheel.map_or_else(|| "none".to_string(), |w| w.to_string()),
        "handshake complete"
    );

    rig.host_send(&host)?;
    if cfg.toggle {
        rig.toggle_mode()?;
    }
    rig.type_text(&cfg.keys)?;
    rig.debug_send(&cfg.debug);

    print!("{}", rig.paper_text());
    let received = rig.host_received();
    if !received.is_empty() {
        eprintln!("host received: {}", received.escape_ascii());
    }
    let debug = rig.debug_received();
    if !debug.is_empty() {
        eprintln!("--- debug port ---\n{}", String::from_utf8_lossy(&debug));
    }
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("wheeltty-sim error: {err}");
        std::process::exit(1);
    }
}
