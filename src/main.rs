//! pagedit 命令行入口
//!
//! 静态/动态模式直接产出可编辑文档；交互模式产出捕获面页面，
//! 供支持弹窗的宿主环境使用。输出默认写到标准输出，`-o` 落盘。

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::Parser;

use pagedit::core::{
    CaptureDispatcher, CaptureError, CaptureMode, CaptureOptions, CaptureRequest, DisplaySink,
    DEFAULT_TIMEOUT_SECONDS, DEFAULT_WAIT_SECONDS,
};

const ANSI_COLOR_RED: &str = "\x1b[31m";
const ANSI_COLOR_RESET: &str = "\x1b[0m";

#[derive(Parser)]
#[command(
    name = "pagedit",
    version,
    about = "Capture a web page as a self-contained editable HTML document"
)]
struct Cli {
    /// Target URL (must start with http:// or https://)
    url: String,

    /// Capture mode: static, dynamic or iframe
    #[arg(short, long, default_value = "static")]
    mode: String,

    /// Extra wait before the page becomes editable (dynamic mode, seconds)
    #[arg(short, long, default_value_t = DEFAULT_WAIT_SECONDS)]
    wait: u64,

    /// Write the document to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Timeout per proxy request, in seconds
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    timeout: u64,

    /// Custom User-Agent for proxy requests
    #[arg(short = 'u', long)]
    user_agent: Option<String>,

    /// Print proxy endpoint statistics as JSON to stderr after the capture
    #[arg(long)]
    stats: bool,

    /// Suppress progress messages
    #[arg(short, long)]
    quiet: bool,

    /// Log proxy attempts and capture progress
    #[arg(short, long)]
    verbose: bool,
}

/// 把文档写入文件的显示面
struct FileSink {
    path: PathBuf,
    file: Option<fs::File>,
}

impl FileSink {
    fn new(path: PathBuf) -> Self {
        FileSink { path, file: None }
    }
}

impl DisplaySink for FileSink {
    fn open(&mut self) -> Result<(), CaptureError> {
        match fs::File::create(&self.path) {
            Ok(file) => {
                self.file = Some(file);
                Ok(())
            }
            Err(e) => Err(CaptureError::DisplaySinkBlocked(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn write_document(&mut self, html: &str) -> Result<(), CaptureError> {
        match self.file.as_mut() {
            Some(file) => file
                .write_all(html.as_bytes())
                .map_err(|e| CaptureError::SaveFailed(e.to_string())),
            None => Err(CaptureError::DisplaySinkBlocked(
                "surface was never opened".to_string(),
            )),
        }
    }
}

/// 把文档写到标准输出的显示面
struct StdoutSink;

impl DisplaySink for StdoutSink {
    fn open(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn write_document(&mut self, html: &str) -> Result<(), CaptureError> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(html.as_bytes())
            .and_then(|_| handle.write_all(b"\n"))
            .map_err(|e| CaptureError::SaveFailed(e.to_string()))
    }
}

fn print_error_message(msg: &str) {
    if atty::is(atty::Stream::Stderr) {
        eprintln!("{ANSI_COLOR_RED}{msg}{ANSI_COLOR_RESET}");
    } else {
        eprintln!("{msg}");
    }
}

fn run(cli: &Cli) -> Result<(), CaptureError> {
    let mode = CaptureMode::from_str(&cli.mode)?;
    let request = CaptureRequest::new(&cli.url, mode, cli.wait)?;

    let options = CaptureOptions {
        timeout: cli.timeout,
        user_agent: cli.user_agent.clone(),
        silent: cli.quiet,
    };
    let mut dispatcher = CaptureDispatcher::new(options)?;

    if !cli.quiet {
        eprintln!("Creating editable version...");
    }

    let result = match &cli.output {
        Some(path) => {
            let mut sink = FileSink::new(path.clone());
            dispatcher.dispatch(&request, &mut sink)
        }
        None => {
            let mut sink = StdoutSink;
            dispatcher.dispatch(&request, &mut sink)
        }
    };

    // 统计无论成败都输出，便于诊断端点状况
    if cli.stats {
        if let Ok(json) = serde_json::to_string_pretty(&dispatcher.proxy_stats()) {
            eprintln!("{json}");
        }
    }

    if result.is_ok() && !cli.quiet {
        if let Some(path) = &cli.output {
            eprintln!("Saved editable document to {}", path.display());
        }
    }

    result
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    if let Err(error) = run(&cli) {
        print_error_message(&format!("Error: {error}"));
        process::exit(1);
    }
}
