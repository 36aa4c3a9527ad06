//! Fabric Console: interactive monitor & search tool for the telemetry
//! fabric.
//!
//! Presents a numbered menu, dispatches selections to the session, and owns
//! the terminal. The bus connection is opened once at startup and released
//! once on the way out, whatever path got us there. The SIGINT listener is
//! installed before the first prompt, so an interrupt anywhere reaches the
//! shutdown path instead of the default process-killing disposition.

use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use fabric_bus::BusGateway;
use fabric_console::demo::{demo_fabric, spawn_demo_publisher};
use fabric_console::{InterruptListener, MenuOption, Session};
use fabric_events::OutputSink;
use fabric_types::DEFAULT_PAGE_SIZE;

/// Fabric Console: monitor fabric events and search remote services.
#[derive(Parser, Debug)]
#[command(name = "fabric-console")]
#[command(about = "Interactive monitor & search console for the telemetry fabric")]
struct Args {
    /// Run against an in-process demo fabric (no broker required)
    #[arg(long)]
    demo: bool,

    /// Endpoint-management service instance to target
    #[arg(short, long, default_value = "mgmt1")]
    instance_id: String,

    /// Page size for host-process searches
    #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Seconds between demo event publications
    #[arg(long, default_value = "5")]
    demo_interval: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // The vendor transport plugs in here; until one is configured, demo
    // mode is the only reachable fabric. A missing fabric is fatal at
    // startup by design.
    if !args.demo {
        bail!("no fabric transport configured; run with --demo");
    }

    let mut interrupts = InterruptListener::install();

    let fabric = demo_fabric();
    let sink: OutputSink = Arc::new(|line| println!("{line}"));
    let gateway: Arc<dyn BusGateway> = fabric.clone();
    let session = Session::new(gateway, args.instance_id, args.page_size, sink);

    session
        .connect()
        .await
        .context("failed to reach the fabric")?;
    spawn_demo_publisher(fabric, Duration::from_secs(args.demo_interval));

    let result = run_menu(&session, &mut interrupts).await;

    // The one place the connection is released, on success, error, and
    // interrupt alike.
    session.shutdown().await;
    result
}

async fn run_menu(session: &Session, interrupts: &mut InterruptListener) -> Result<()> {
    loop {
        println!("\n{}", Session::menu_text());
        let Some(selection) = prompt_or_interrupt("Please Select: ", interrupts).await? else {
            println!();
            break;
        };

        let option = match MenuOption::try_from(selection.as_str()) {
            Ok(option) => option,
            Err(e) => {
                warn!(input = %selection, "Unknown menu selection");
                println!("{e}");
                continue;
            }
        };

        match option {
            MenuOption::MonitorReputationChanges => {
                session.subscribe_reputation_changes()?;
                println!(
                    "Listening for reputation changes. Press <Control-C> to return to the menu."
                );
                interrupts.next().await;
                println!();
            }
            MenuOption::MonitorFirstInstance
            | MenuOption::MonitorDetonationReports
            | MenuOption::MonitorMgmtActivity => {
                session.subscribe_telemetry(option)?;
                println!("Handler registered; events will print as they arrive.");
            }
            MenuOption::HostProcessSearch => {
                let Some(ip) =
                    prompt_or_interrupt("Enter host IP address to search: ", interrupts).await?
                else {
                    println!();
                    break;
                };
                if !run_host_search(session, &ip, interrupts).await? {
                    break;
                }
            }
            MenuOption::TextSearch => {
                let Some(text) = prompt_or_interrupt("Enter search text: ", interrupts).await?
                else {
                    println!();
                    break;
                };
                match session.find_text(&text).await {
                    Ok(rendered) => println!("{rendered}"),
                    Err(e) => println!("Search failed: {e}"),
                }
            }
            MenuOption::Exit => break,
        }
    }
    Ok(())
}

/// Pull pages one at a time, Enter-gated between pages. Returns `false`
/// when the operator interrupted instead of paging on.
async fn run_host_search(
    session: &Session,
    ip: &str,
    interrupts: &mut InterruptListener,
) -> Result<bool> {
    let handle = match session.host_search(ip).await {
        Ok(handle) => handle,
        Err(e) => {
            println!("Search failed: {e}");
            return Ok(true);
        }
    };

    if !handle.has_results() {
        println!("No results.");
        return Ok(true);
    }

    let mut offset = 0;
    while offset < handle.result_count() {
        match session.host_search_page(&handle, offset).await {
            Ok(page) => print!("{}", Session::render_page(&page)),
            Err(e) => {
                // No retry here; the operator can re-run the search.
                println!("Page fetch failed: {e}");
                break;
            }
        }
        offset += session.page_size();
        if offset < handle.result_count()
            && prompt_or_interrupt("Press Enter for Next Page", interrupts)
                .await?
                .is_none()
        {
            println!();
            return Ok(false);
        }
    }
    Ok(true)
}

/// Prompt, racing the interrupt listener. `None` means the operator hit
/// <Control-C> instead of answering.
async fn prompt_or_interrupt(
    message: &str,
    interrupts: &mut InterruptListener,
) -> Result<Option<String>> {
    tokio::select! {
        line = prompt(message) => line.map(Some),
        () = interrupts.next() => Ok(None),
    }
}

/// Line-buffered prompt. Stdin blocks, so the read runs off the async
/// runtime's worker threads.
async fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    std::io::stdout().flush().context("flush failed")?;

    let line = tokio::task::spawn_blocking(|| {
        let mut buffer = String::new();
        std::io::stdin()
            .read_line(&mut buffer)
            .map(|_| buffer.trim().to_string())
    })
    .await
    .context("input task failed")??;
    Ok(line)
}
