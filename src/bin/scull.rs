//! scull CLI
//!
//! Builds a set of in-memory devices from command-line configuration and
//! exercises them.

use std::io::{Read, SeekFrom};
use std::path::PathBuf;
use std::thread;

use clap::{Parser, Subcommand};
use scull::{CancelToken, Config, Handle, Manager, OpenMode};
use tracing_subscriber::{fmt, EnvFilter};

/// scull devices
#[derive(Parser, Debug)]
#[command(name = "scull")]
#[command(about = "Sparse segmented in-memory storage devices")]
#[command(version)]
struct Args {
    /// Bytes per block
    #[arg(short, long, default_value = "4000")]
    quantum: usize,

    /// Block slots per segment
    #[arg(short = 's', long, default_value = "1000")]
    qset: usize,

    /// Number of devices
    #[arg(short, long, default_value = "1")]
    nr_devs: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy a file (or stdin) into a device and verify it reads back
    Load {
        /// Target device index
        #[arg(short, long, default_value = "0")]
        device: usize,

        /// Input file; stdin when omitted
        file: Option<PathBuf>,
    },

    /// Hammer the devices from several threads
    Stress {
        /// Writer threads
        #[arg(short, long, default_value = "4")]
        threads: usize,

        /// Writes per thread
        #[arg(short, long, default_value = "256")]
        writes: usize,

        /// Bytes per write
        #[arg(short, long, default_value = "1024")]
        chunk: usize,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,scull=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("scull v{}", scull::VERSION);

    let config = Config::builder()
        .quantum(args.quantum)
        .qset(args.qset)
        .nr_devs(args.nr_devs)
        .build();

    let manager = match Manager::new(config) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!("Failed to initialize devices: {}", e);
            std::process::exit(1);
        }
    };

    let outcome = match args.command {
        Commands::Load { device, file } => load(&manager, device, file),
        Commands::Stress {
            threads,
            writes,
            chunk,
        } => stress(&manager, threads, writes, chunk),
    };

    manager.shutdown();

    match outcome {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether the data read back matches the input
fn load(manager: &Manager, device: usize, file: Option<PathBuf>) -> scull::Result<bool> {
    let input = match file {
        Some(path) => std::fs::read(path)?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };

    let cancel = CancelToken::new();

    let mut writer = Handle::open(manager, device, OpenMode::WriteOnly, cancel.clone())?;
    writer.write_all(&input)?;

    let mut reader = Handle::open(manager, device, OpenMode::ReadOnly, cancel.clone())?;
    let mut output = Vec::with_capacity(input.len());
    reader.read_to_end(&mut output)?;

    print!("{}", manager.report(&cancel)?);

    let written = crc32fast::hash(&input);
    let read_back = crc32fast::hash(&output);
    println!(
        "loaded {} bytes into device {}: crc32 in {:08x}, out {:08x}",
        input.len(),
        device,
        written,
        read_back
    );

    Ok(written == read_back && input.len() == output.len())
}

fn stress(manager: &Manager, threads: usize, writes: usize, chunk: usize) -> scull::Result<bool> {
    let cancel = CancelToken::new();
    let nr_devs = manager.len();

    let results: Vec<scull::Result<()>> = thread::scope(|scope| {
        let workers: Vec<_> = (0..threads)
            .map(|t| {
                let cancel = cancel.clone();
                scope.spawn(move || -> scull::Result<()> {
                    let payload = vec![t as u8; chunk];
                    let mut handle =
                        Handle::open(manager, t % nr_devs, OpenMode::ReadWrite, cancel)?;
                    for j in 0..writes {
                        let offset = ((j * threads + t) * chunk) as u64;
                        handle.seek(SeekFrom::Start(offset))?;
                        handle.write_all(&payload)?;
                    }
                    Ok(())
                })
            })
            .collect();

        workers
            .into_iter()
            .map(|worker| {
                worker.join().unwrap_or_else(|_| {
                    Err(scull::ScullError::Io(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        "writer thread panicked",
                    )))
                })
            })
            .collect()
    });

    for result in results {
        result?;
    }

    print!("{}", manager.report(&cancel)?);
    Ok(true)
}
