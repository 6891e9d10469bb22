use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use create_serial::{available_ports, create_serial, describe_port};
use line_format::LineFormat;
use line_reader::LineReader;
use log::{info, warn, LevelFilter};
use settings::{load_config, parse_timeout, PartialSettings};
use tokio::signal;

mod create_serial;
mod line_format;
mod line_reader;
mod settings;
mod terminal;

#[derive(Parser)]
#[command(name = "Anchor Terminal")]
#[command(bin_name = "anchor-terminal")]
#[command(about = "Print every line a serial device sends until interrupted")]
struct Cli {
    #[arg(help = "Serial port [default: /dev/ttyACM0]")]
    serial: Option<String>,

    #[arg(long, short, help = "Baud rate [default: 115200]")]
    baud_rate: Option<u32>,

    #[arg(long, short, value_parser = timeout_parser, help = "Read timeout in seconds [default: 1]")]
    timeout: Option<f64>,

    #[arg(long, short, value_enum, help = "Output format [default: escaped]")]
    format: Option<LineFormat>,

    #[arg(long, short, help = "JSON config file")]
    config: Option<PathBuf>,

    #[arg(long, help = "List all the serial ports connected to the host")]
    detect: bool,
}

impl Cli {
    fn overrides(&self) -> PartialSettings {
        PartialSettings {
            port: self.serial.clone(),
            baud_rate: self.baud_rate,
            timeout_secs: self.timeout,
            format: self.format,
        }
    }
}

fn timeout_parser(s: &str) -> Result<f64, String> {
    let secs: f64 = s.parse().map_err(|_| format!("{} is not a number", s))?;
    parse_timeout(secs).map_err(|e| e.to_string())?;
    Ok(secs)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .try_init();

    let args = Cli::parse();

    if args.detect {
        for port in available_ports()? {
            println!("{}", describe_port(&port));
        }
        return Ok(());
    }

    let settings = args
        .overrides()
        .or(load_config(args.config.as_deref())?)
        .resolve()?;

    let serial = create_serial(&settings)?;
    let mut reader = LineReader::new(serial, settings.timeout);
    let mut stdout = tokio::io::stdout();

    let interrupted = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Unable to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let stats = terminal::run(&mut reader, &mut stdout, settings.format, interrupted).await?;
    info!(
        "Read {} lines ({} bytes), {} timeouts",
        stats.lines, stats.bytes, stats.timeouts
    );
    Ok(())
}
