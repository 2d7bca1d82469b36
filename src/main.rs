//! OS Concepts Simulator CLI.
//!
//! Loads a configuration, runs the selected components and prints a
//! statistics report. Individual events are printed with `--trace`.

use clap::{Parser, ValueEnum};
use std::fs;
use std::process;

use os_sim::sim::context::RunReport;
use os_sim::sim::{loader, SimContext};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Component {
    All,
    Scheduler,
    Memory,
    Paging,
    Sync,
    Ipc,
}

impl Component {
    fn includes(self, other: Component) -> bool {
        self == Component::All || self == other
    }
}

/// Command-line arguments for the OS simulator.
#[derive(Parser, Debug)]
#[command(author, version, about = "Operating-System Concepts Simulator")]
struct Args {
    #[arg(short, long, default_value = "configs/default.toml")]
    config: String,

    #[arg(long, value_enum, default_value = "all")]
    component: Component,

    /// Event budget for the dining table and the producer/consumer exchange.
    #[arg(long)]
    steps: Option<usize>,

    /// Write the full run report as JSON.
    #[arg(long)]
    json: Option<String>,

    #[arg(long)]
    trace: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = loader::load_config(&args.config).unwrap_or_else(|e| {
        eprintln!("\n[!] FATAL: {}", e);
        process::exit(1);
    });
    let trace = args.trace || config.general.trace || cfg!(feature = "always-trace");
    let steps = args.steps.unwrap_or(config.general.steps);

    let mut ctx = SimContext::from_config(config).unwrap_or_else(|e| {
        eprintln!("\n[!] FATAL: {}", e);
        process::exit(1);
    });

    let mut report = RunReport::default();

    if args.component.includes(Component::Scheduler) {
        match ctx.run_scheduler() {
            Ok(r) => {
                if trace {
                    for entry in r.timeline.entries() {
                        let slot = entry.pid().map(|p| p.to_string()).unwrap_or("idle".into());
                        println!("[sched] {:>4}..{:<4} {}", entry.start, entry.end, slot);
                    }
                }
                report.scheduler = Some(r);
            }
            Err(e) => eprintln!("[!] scheduler: {}", e),
        }
    }

    if args.component.includes(Component::Memory) {
        let r = ctx.run_memory();
        if trace {
            for step in &r.steps {
                match &step.error {
                    Some(e) => println!("[mem]   {:?} -> {}", step.op, e),
                    None => println!(
                        "[mem]   {:?} -> block {:?}, freed {}, fragmentation {}",
                        step.op, step.block, step.freed, step.fragmentation
                    ),
                }
            }
        }
        report.memory = Some(r);
    }

    if args.component.includes(Component::Paging) {
        match ctx.run_paging() {
            Ok(r) => {
                if trace {
                    for ev in &r.events {
                        println!(
                            "[page]  #{:<3} {:<6} {} frame {} evicted {:?}",
                            ev.step,
                            ev.page.to_string(),
                            if ev.hit { "hit " } else { "miss" },
                            ev.frame,
                            ev.evicted
                        );
                    }
                }
                report.paging = Some(r);
            }
            Err(e) => eprintln!("[!] paging: {}", e),
        }
    }

    if args.component.includes(Component::Sync) {
        let r = ctx.run_sync(steps);
        if trace {
            for ev in &r.events {
                println!("[sync]  t={:<4} {:?}", ev.at, ev.kind);
            }
        }
        report.sync = Some(r);
    }

    if args.component.includes(Component::Ipc) {
        let r = ctx.run_ipc(steps);
        if trace {
            for ev in &r.events {
                println!("[ipc]   t={:<4} {:?}", ev.at, ev.kind);
            }
        }
        report.ipc = Some(r);
    }

    ctx.stats().print();

    if let Some(path) = args.json {
        #[derive(serde::Serialize)]
        struct Export<'a> {
            stats: &'a os_sim::stats::SimStats,
            #[serde(flatten)]
            report: &'a RunReport,
        }
        let export = Export {
            stats: ctx.stats(),
            report: &report,
        };
        match serde_json::to_string_pretty(&export) {
            Ok(text) => {
                if let Err(e) = fs::write(&path, text) {
                    eprintln!("[!] could not write '{}': {}", path, e);
                    process::exit(1);
                }
                log::info!("wrote run report to {}", path);
            }
            Err(e) => {
                eprintln!("[!] could not serialise report: {}", e);
                process::exit(1);
            }
        }
    }
}
