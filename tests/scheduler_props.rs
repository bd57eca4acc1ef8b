// tests/scheduler_props.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder};

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use sitepipe::config::ConfigFile;
use sitepipe::dag::{Scheduler, TaskRegistry, TaskRunState};
use sitepipe::types::TaskOutcome;

// Acyclic by construction: task N may only depend on tasks 0..N-1.
fn dag_config_strategy(max_tasks: usize) -> impl Strategy<Value = ConfigFile> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        let deps_strat = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        );

        deps_strat.prop_map(move |raw_deps| {
            let mut builder = ConfigFileBuilder::new();
            for (i, potential_deps) in raw_deps.into_iter().enumerate() {
                let name = format!("task_{i}");
                let mut task_builder = TaskConfigBuilder::cmd(&format!("echo {name}"));

                let valid_deps: HashSet<usize> = if i == 0 {
                    HashSet::new()
                } else {
                    potential_deps.into_iter().map(|d| d % i).collect()
                };
                for dep_idx in valid_deps {
                    task_builder = task_builder.after(&format!("task_{dep_idx}"));
                }
                builder = builder.with_task(&name, task_builder.build());
            }
            builder.build()
        })
    })
}

fn deps_of(cfg: &ConfigFile) -> HashMap<String, Vec<String>> {
    cfg.tasks()
        .iter()
        .map(|(name, t)| (name.clone(), t.after.clone()))
        .collect()
}

fn closure(target: &str, deps: &HashMap<String, Vec<String>>) -> HashSet<String> {
    let mut seen = HashSet::new();
    let mut stack = vec![target.to_string()];
    while let Some(task) = stack.pop() {
        if seen.insert(task.clone()) {
            stack.extend(deps[&task].iter().cloned());
        }
    }
    seen
}

proptest! {
    #[test]
    fn every_dependency_runs_once_and_first(
        cfg in dag_config_strategy(10),
        target_idx in 0..10usize,
        failing_idx in proptest::collection::vec(0..10usize, 0..4),
    ) {
        let registry = TaskRegistry::from_config(&cfg).unwrap();
        let deps = deps_of(&cfg);
        let n = deps.len();
        let target = format!("task_{}", target_idx % n);
        let failing: HashSet<String> = failing_idx
            .iter()
            .map(|i| format!("task_{}", i % n))
            .collect();

        let mut scheduler = Scheduler::plan(&registry, &target, 1).unwrap();
        let mut succeeded: HashSet<String> = HashSet::new();
        let mut executed: Vec<String> = Vec::new();

        while let Some(task) = scheduler.next_ready() {
            // Only tasks whose dependencies all succeeded are handed out.
            for dep in &deps[&task.name] {
                prop_assert!(succeeded.contains(dep), "{} ran before {}", task.name, dep);
            }
            prop_assert!(!executed.contains(&task.name), "{} ran twice", task.name);
            executed.push(task.name.clone());

            let outcome = if failing.contains(&task.name) {
                TaskOutcome::Failed
            } else {
                succeeded.insert(task.name.clone());
                TaskOutcome::Success
            };
            scheduler.handle_completion(&task.name, outcome);
        }

        prop_assert!(scheduler.is_finished());

        // Exactly the target's closure takes part; every member ends either
        // executed or skipped.
        let in_run = closure(&target, &deps);
        let mut planned = scheduler.tasks_in_run();
        planned.sort();
        let mut expected: Vec<String> = in_run.iter().cloned().collect();
        expected.sort();
        prop_assert_eq!(planned, expected);

        for task in &in_run {
            let state = scheduler.run_state_of(task);
            if executed.contains(task) {
                prop_assert!(matches!(
                    state,
                    Some(TaskRunState::DoneSuccess | TaskRunState::DoneFailed)
                ));
            } else {
                prop_assert_eq!(state, Some(TaskRunState::Skipped));
            }
        }

        // Without failures the whole closure runs.
        if in_run.is_disjoint(&failing) {
            prop_assert_eq!(executed.len(), in_run.len());
        }
    }

    #[test]
    fn registration_order_is_a_topological_order(cfg in dag_config_strategy(12)) {
        let registry = TaskRegistry::from_config(&cfg).unwrap();
        let deps = deps_of(&cfg);
        let order: Vec<&str> = registry.task_names().collect();

        prop_assert_eq!(order.len(), deps.len());
        for (pos, task) in order.iter().enumerate() {
            for dep in &deps[*task] {
                let dep_pos = order.iter().position(|t| t == dep).unwrap();
                prop_assert!(dep_pos < pos, "{} registered after {}", dep, task);
            }
        }
    }
}
