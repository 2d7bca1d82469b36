//! Integration tests for configuration parsing and the simulation context.

use os_sim::common::{Pid, SimError};
use os_sim::config::{Config, MemoryOp};
use os_sim::ipc::IpcEventKind;
use os_sim::mem::{FitStrategy, PageAlgorithm};
use os_sim::sched::SchedulingAlgorithm;
use os_sim::sim::{load_config, Interleaving, SimContext};
use os_sim::sync::ForkPolicy;

const SAMPLE: &str = include_str!("../configs/default.toml");

/// Tests that an empty document yields the built-in defaults.
#[test]
fn test_defaults() {
    let config = Config::from_toml("").unwrap();
    assert_eq!(config.general.steps, 200);
    assert_eq!(config.interleaving(), Interleaving::RoundRobin);
    assert_eq!(config.scheduler.algorithm_val().unwrap(), SchedulingAlgorithm::Fcfs);
    assert_eq!(config.scheduler.processes.len(), 5);
    assert_eq!(config.memory.strategy_val().unwrap(), FitStrategy::FirstFit);
    assert_eq!(config.paging.algorithm_val().unwrap(), PageAlgorithm::Fifo);
    assert_eq!(config.paging.frames, 3);
    assert_eq!(config.sync.policy_val().unwrap(), ForkPolicy::Parity);
    assert_eq!(config.ipc.capacity, 10);
}

/// Tests parsing of the shipped sample configuration.
#[test]
fn test_sample_config() {
    let config = Config::from_toml(SAMPLE).unwrap();
    assert_eq!(
        config.scheduler.algorithm_val().unwrap(),
        SchedulingAlgorithm::RoundRobin { quantum: 2 }
    );
    assert_eq!(config.memory.strategy_val().unwrap(), FitStrategy::BestFit);
    assert_eq!(config.memory.ops.len(), 6);
    assert_eq!(config.memory.ops[3], MemoryOp::Free { owner: 2 });
    assert_eq!(config.memory.ops[5], MemoryOp::Compact);
    assert_eq!(config.paging.algorithm_val().unwrap(), PageAlgorithm::Lru);

    let workload = config.scheduler.workload().unwrap();
    assert_eq!(workload[0].pid, Pid(1));
    assert_eq!(workload[4].name, "P5");
}

/// Tests partial sections and the seeded interleaving.
#[test]
fn test_partial_sections() {
    let config = Config::from_toml(
        r#"
        [general]
        seed = 42

        [paging]
        algorithm = "clock"
        "#,
    )
    .unwrap();
    assert_eq!(config.interleaving(), Interleaving::Seeded(42));
    assert_eq!(config.paging.algorithm_val().unwrap(), PageAlgorithm::Clock);
    assert_eq!(config.paging.frames, 3);
    assert_eq!(config.paging.references.len(), 13);
}

/// Tests that unknown names surface as configuration errors.
#[test]
fn test_unknown_names() {
    for text in [
        "[scheduler]\nalgorithm = \"lottery\"",
        "[memory]\nstrategy = \"random-fit\"",
        "[paging]\nalgorithm = \"mru\"",
        "[sync]\npolicy = \"waiter\"",
    ] {
        let config = Config::from_toml(text).unwrap();
        assert!(
            matches!(SimContext::from_config(config), Err(SimError::ConfigurationError(_))),
            "accepted: {}",
            text
        );
    }
    assert!(matches!(
        Config::from_toml("[memory]\ntotal = \"lots\""),
        Err(SimError::ConfigurationError(_))
    ));
}

/// Tests that non-positive numbers are rejected before anything runs.
#[test]
fn test_invalid_parameters() {
    for text in [
        "[scheduler]\nalgorithm = \"rr\"\nquantum = 0",
        "[[scheduler.processes]]\nname = \"A\"\nburst = 0",
        "[memory]\ntotal = -4",
        "[[memory.ops]]\nop = \"alloc\"\nsize = 0",
        "[paging]\nframes = 0",
        "[sync]\nphilosophers = 1",
        "[sync]\neat_ticks = 0",
        "[ipc]\ncapacity = 0",
        "[ipc]\nproducers = [1, -1]",
    ] {
        let config = Config::from_toml(text).unwrap();
        assert!(
            matches!(SimContext::from_config(config), Err(SimError::InvalidParameter { .. })),
            "accepted: {}",
            text
        );
    }
}

/// Tests the memory script of the default configuration.
#[test]
fn test_run_memory_default_script() {
    let mut ctx = SimContext::from_config(Config::default()).unwrap();
    let report = ctx.run_memory();
    assert_eq!(report.steps.len(), 5);
    assert_eq!(report.steps[3].freed, 1);
    assert!(report.steps.iter().all(|s| s.error.is_none()));
    // P4 reuses the hole P2 left behind.
    let p4 = report
        .blocks
        .iter()
        .find(|b| b.owner == Some(Pid(4)))
        .unwrap();
    assert_eq!((p4.base, p4.size), (100, 150));
    assert_eq!(report.steps[4].fragmentation, 50);
    assert_eq!(ctx.stats().memory.as_ref().unwrap().occupancy.used, 300);
}

/// Tests that an oversized request is recorded and the script carries on.
#[test]
fn test_run_memory_records_failures() {
    let config = Config::from_toml(
        r#"
        [memory]
        total = 100
        ops = [
            { op = "alloc", size = 60, owner = 1 },
            { op = "alloc", size = 60, owner = 2 },
            { op = "free", owner = 1 },
            { op = "alloc", size = 60, owner = 2 },
        ]
        "#,
    )
    .unwrap();
    let mut ctx = SimContext::from_config(config).unwrap();
    let report = ctx.run_memory();
    assert!(report.steps[1].error.as_deref().unwrap().starts_with("OutOfMemory"));
    assert!(report.steps[3].block.is_some());
    assert_eq!(ctx.stats().memory.as_ref().unwrap().failures, 1);

    // A second run starts from an empty address space.
    assert_eq!(ctx.run_memory(), report);
}

/// Tests every component through the context with the sample file.
#[test]
fn test_context_runs_sample() {
    let mut ctx = SimContext::from_config(Config::from_toml(SAMPLE).unwrap()).unwrap();

    let sched = ctx.run_scheduler().unwrap();
    assert_eq!(sched.metrics.completed, 5);
    assert_eq!(sched.metrics.makespan, 22);

    let memory = ctx.run_memory();
    assert_eq!(memory.steps.last().unwrap().fragmentation, 0);

    let paging = ctx.run_paging().unwrap();
    assert_eq!(paging.faults, 9);

    let sync = ctx.run_sync(300);
    assert_eq!(sync.events.len(), 300);
    assert!(sync.snapshot.deadlocked.is_none());

    let ipc = ctx.run_ipc(300);
    assert!(!matches!(ipc.events[0].kind, IpcEventKind::ActorAdded { .. }));
    assert!(ipc.status.produced > 0);

    let stats = ctx.stats();
    assert!(stats.scheduler.is_some() && stats.memory.is_some());
    assert!(stats.paging.is_some() && stats.sync.is_some() && stats.ipc.is_some());
    assert!(serde_json::to_string(stats).is_ok());
}

/// Tests that repeated runs of the same context are identical.
#[test]
fn test_context_runs_repeatable() {
    let mut ctx = SimContext::from_config(Config::default()).unwrap();
    assert_eq!(ctx.run_scheduler().unwrap(), ctx.run_scheduler().unwrap());
    assert_eq!(ctx.run_paging().unwrap(), ctx.run_paging().unwrap());
    assert_eq!(ctx.run_sync(120), ctx.run_sync(120));
    assert_eq!(ctx.run_ipc(120), ctx.run_ipc(120));
}

/// Tests file loading.
#[test]
fn test_load_config_file() {
    let path = std::env::temp_dir().join(format!("os-sim-config-{}.toml", std::process::id()));
    std::fs::write(&path, "[paging]\nframes = 4\n").unwrap();
    let config = load_config(path.to_str().unwrap()).unwrap();
    assert_eq!(config.paging.frames, 4);
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(
        load_config("/nonexistent/os-sim.toml"),
        Err(SimError::ConfigurationError(_))
    ));
}
