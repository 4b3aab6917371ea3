use anyhow::{Context, Result, bail};
use clap::Parser as CParser;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tinyasm_console::client::{ClientConfig, RemoteClient};
use tinyasm_console::console::Console;
use tinyasm_console::protocol::Segments;
use tinyasm_console::transport::{HttpTransport, LocalTransport, Transport};
use tinyasm_lang::runtime::parser::parse_immediate;
use tinyasm_lang::{Machine, MachineConfig, RegisterSet, RenderConfig};

#[derive(CParser)]
#[command(name = "tas")]
#[command(about = "Run tinyasm programs locally or on an execution backend")]
struct Args {
    input: PathBuf,

    /// Execution backend to delegate to, e.g. http://localhost:5000
    #[arg(long, env = "TAS_BACKEND_URL")]
    remote: Option<String>,

    /// Delegate to the built-in reference backend instead of a remote one
    #[arg(long, conflicts_with = "remote")]
    local_backend: bool,

    #[arg(long, default_value_t = 32)]
    memory_size: usize,

    /// Use the extended register set (SI DI BP SP and segment registers)
    #[arg(long)]
    extended: bool,

    /// Maximum number of memory rows to show
    #[arg(long)]
    max_rows: Option<usize>,

    /// Timeout for backend requests in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[arg(long, default_value = "0", value_parser = parse_int)]
    cs: i64,
    #[arg(long, default_value = "0", value_parser = parse_int)]
    ds: i64,
    #[arg(long, default_value = "0", value_parser = parse_int)]
    ss: i64,
    #[arg(long, default_value = "0", value_parser = parse_int)]
    es: i64,

    /// Read load/run/step/reset/dump commands from stdin
    #[arg(short, long)]
    interactive: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_int(text: &str) -> Result<i64, String> {
    parse_immediate(text).map_err(|e| e.to_string())
}

fn level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn build_console(args: &Args) -> Console<Box<dyn Transport>> {
    let segments = Segments {
        cs: args.cs,
        ds: args.ds,
        ss: args.ss,
        es: args.es,
    };

    let with_rows = |mut cfg: RenderConfig| {
        if args.max_rows.is_some() {
            cfg.max_memory_rows = args.max_rows;
        }
        cfg
    };

    let transport: Option<Box<dyn Transport>> = if let Some(url) = &args.remote {
        let config = ClientConfig {
            timeout: args.timeout_ms.map(Duration::from_millis),
        };
        Some(Box::new(HttpTransport::new(url, config)))
    } else if args.local_backend {
        Some(Box::new(LocalTransport::default()))
    } else {
        None
    };

    match transport {
        Some(transport) => Console::remote(
            RemoteClient::new(transport),
            segments,
            with_rows(RenderConfig::remote()),
        ),
        None => {
            let machine = Machine::new(MachineConfig {
                memory_size: args.memory_size,
                register_set: if args.extended {
                    RegisterSet::Extended
                } else {
                    RegisterSet::Base
                },
            });
            Console::local(machine, with_rows(RenderConfig::local()))
        }
    }
}

/// Tracks how much of the console log has been printed.
#[derive(Default)]
struct LogCursor {
    epoch: usize,
    printed: usize,
}

impl LogCursor {
    /// Print entries added since the last call. A cleared log is printed from the top.
    fn flush<T: Transport>(&mut self, console: &Console<T>) {
        if console.log_epoch() != self.epoch {
            self.epoch = console.log_epoch();
            self.printed = 0;
        }
        for entry in &console.log()[self.printed..] {
            println!("{}", entry);
        }
        self.printed = console.log().len();
    }
}

fn interactive(console: &mut Console<Box<dyn Transport>>, args: &Args) -> Result<()> {
    let stdin = io::stdin();
    let mut cursor = LogCursor::default();

    loop {
        print!("tas> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match line.trim() {
            "" => continue,
            "load" => {
                // Pick up edits made to the file since the last load
                console.editor = fs::read_to_string(&args.input)
                    .with_context(|| format!("reading {}", args.input.display()))?;
                console.load();
            }
            "run" => console.run(),
            "step" => console.step(),
            "reset" => console.reset(),
            "dump" => console.dump(),
            "show" => {}
            "quit" | "exit" => break,
            other => {
                println!("unknown command '{}' (load, run, step, reset, dump, show, quit)", other);
                continue;
            }
        }

        cursor.flush(console);
        print!("{}", console.view());
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    SimpleLogger::new().with_level(level(args.verbose)).init()?;

    if args.memory_size == 0 {
        bail!("--memory-size must be at least 1");
    }

    let mut console = build_console(&args);
    console.editor = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    if args.interactive {
        return interactive(&mut console, &args);
    }

    let mut cursor = LogCursor::default();
    console.load();
    cursor.flush(&console);
    console.run();
    cursor.flush(&console);
    print!("{}", console.view());

    Ok(())
}
