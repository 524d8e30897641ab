#[cfg(not(feature = "prof"))]
pub fn main() {
    println!("benchmarks not supported -- enable 'prof' crate feature")
}

#[derive(Debug)]
struct Row {
    name: &'static str,
    agents: usize,
    tasks: usize,
    assigned: usize,
    makespan: f32,
    recharges: u32,
    rounds: usize,
    time_ms: f32,
}

#[cfg(feature = "prof")]
fn baseline5() -> uavsched_structs::scenario::Scenario {
    use uavsched_structs::scenario::{AgentSpec, Scenario};
    use uavsched_structs::task::{Task, TaskKind};
    use uavsched_structs::Point;
    Scenario {
        base: Point::new(0.0, 0.0),
        agents: vec![
            AgentSpec {
                id: "U1".to_string(),
                payload: 15.0,
                endurance: 500.0,
                hover: 30.0,
            },
            AgentSpec {
                id: "U2".to_string(),
                payload: 10.0,
                endurance: 600.0,
                hover: 60.0,
            },
            AgentSpec {
                id: "U3".to_string(),
                payload: 20.0,
                endurance: 450.0,
                hover: 20.0,
            },
        ],
        tasks: vec![
            Task::new("T1", Point::new(1200.0, 800.0), TaskKind::Delivery(10.0), 2),
            Task::new("T2", Point::new(300.0, 450.0), TaskKind::Recon(20.0), 1),
            Task::new("T3", Point::new(950.0, 200.0), TaskKind::Delivery(5.0), 3),
            Task::new("T4", Point::new(600.0, 1200.0), TaskKind::Urgent(8.0), 1),
            Task::new("T5", Point::new(1500.0, 500.0), TaskKind::Recon(15.0), 2),
        ],
        obstacles: Vec::new(),
    }
}

#[cfg(feature = "prof")]
fn blocked() -> uavsched_structs::scenario::Scenario {
    use uavsched_structs::obstacle::Obstacle;
    use uavsched_structs::Point;
    let mut s = baseline5();
    // Sits on the straight line from base to T3.
    s.obstacles.push(Obstacle::new(Point::new(475.0, 100.0), 80.0));
    s
}

#[cfg(feature = "prof")]
fn coverage12() -> uavsched_structs::scenario::Scenario {
    use uavsched_structs::scenario::{AgentSpec, Scenario};
    use uavsched_structs::task::{Task, TaskKind};
    use uavsched_structs::Point;
    let ring = [
        (900.0, 100.0),
        (1300.0, 300.0),
        (1500.0, 700.0),
        (1400.0, 1100.0),
        (1100.0, 1400.0),
        (700.0, 1500.0),
        (300.0, 1400.0),
        (100.0, 1000.0),
        (200.0, 600.0),
        (500.0, 300.0),
        (800.0, 700.0),
        (1000.0, 1000.0),
    ];
    Scenario {
        base: Point::new(0.0, 0.0),
        agents: (0..4)
            .map(|i| AgentSpec {
                id: format!("U{}", i + 1),
                payload: 10.0,
                endurance: 600.0,
                hover: 30.0,
            })
            .collect(),
        tasks: ring
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| {
                Task::new(&format!("C{}", i + 1), Point::new(x, y), TaskKind::Recon(10.0), 1)
            })
            .collect(),
        obstacles: Vec::new(),
    }
}

#[cfg(feature = "prof")]
pub fn main() {
    use std::time::Instant;
    use uavsched_planner::{assign, savings, Params};
    use uavsched_structs::obstacle::Obstacle;
    use uavsched_structs::task::{Task, TaskKind};
    use uavsched_structs::Point;

    env_logger::init();

    println!("----------------------------");
    println!("uavsched planner benchmarking");
    println!("----------------------------");
    println!();

    let params = Params::default();
    let mut rows: Vec<Row> = Vec::new();
    std::fs::create_dir_all("bench").unwrap();

    for (name, scenario) in [("baseline5", baseline5()), ("blocked", blocked())] {
        let _p = hprof::enter("instance");
        std::fs::write(
            format!("bench/{}.json", name),
            serde_json::to_string_pretty(&scenario).unwrap(),
        )
        .unwrap();
        println!(
            " * instance {} with {} agents {} tasks {} obstacles",
            name,
            scenario.agents.len(),
            scenario.tasks.len(),
            scenario.obstacles.len()
        );
        let mut fleet = scenario.fleet();
        let mut tasks = scenario.tasks.clone();
        let t0 = Instant::now();
        let plan = {
            let _p0 = hprof::enter("plan");
            assign::plan(&mut fleet, &mut tasks, &scenario.obstacles, &params)
        };
        rows.push(Row {
            name,
            agents: scenario.agents.len(),
            tasks: tasks.len(),
            assigned: plan.assignments.len(),
            makespan: plan.makespan(),
            recharges: plan.routes.iter().map(|r| r.recharges).sum(),
            rounds: plan.rounds,
            time_ms: t0.elapsed().as_secs_f32() * 1000.0,
        });
    }

    // Re-planning turnaround: finish the baseline mission, then inject a
    // keep-out zone and an urgent task and time only the replan.
    {
        let _p = hprof::enter("instance");
        let scenario = baseline5();
        println!(" * instance inject, replanning after the baseline run");
        let mut fleet = scenario.fleet();
        let mut tasks = scenario.tasks.clone();
        let mut obstacles = scenario.obstacles.clone();
        assign::plan(&mut fleet, &mut tasks, &obstacles, &params);
        obstacles.push(Obstacle::new(Point::new(900.0, 250.0), 100.0));
        tasks.push(Task::new(
            "T6",
            Point::new(800.0, 600.0),
            TaskKind::Urgent(6.0),
            1,
        ));
        let snapshot = uavsched_structs::scenario::Scenario {
            base: scenario.base,
            agents: scenario.agents.clone(),
            tasks: tasks.clone(),
            obstacles: obstacles.clone(),
        };
        std::fs::write(
            "bench/inject.json",
            serde_json::to_string_pretty(&snapshot).unwrap(),
        )
        .unwrap();
        let pending = tasks.iter().filter(|t| !t.assigned).count();
        let t0 = Instant::now();
        let plan = {
            let _p0 = hprof::enter("replan");
            assign::replan(&mut fleet, &mut tasks, &obstacles, &params)
        };
        rows.push(Row {
            name: "inject",
            agents: scenario.agents.len(),
            tasks: pending,
            assigned: plan.assignments.len(),
            makespan: plan.makespan(),
            recharges: plan.routes.iter().map(|r| r.recharges).sum(),
            rounds: plan.rounds,
            time_ms: t0.elapsed().as_secs_f32() * 1000.0,
        });
    }

    // Coverage sweep over the task coordinates, routes instead of rounds.
    {
        let _p = hprof::enter("instance");
        let scenario = coverage12();
        std::fs::write(
            "bench/coverage12.json",
            serde_json::to_string_pretty(&scenario).unwrap(),
        )
        .unwrap();
        println!(
            " * instance coverage12 with {} agents {} targets",
            scenario.agents.len(),
            scenario.tasks.len()
        );
        let targets = scenario.tasks.iter().map(|t| t.coord).collect::<Vec<_>>();
        let t0 = Instant::now();
        let routes = {
            let _p0 = hprof::enter("coverage");
            savings::plan_coverage(&scenario.base, &targets, scenario.agents.len(), &params)
        };
        let covered = routes.iter().map(|r| r.stops.len()).sum::<usize>();
        let makespan = routes
            .iter()
            .map(|r| savings::route_time(&scenario.base, &targets, r))
            .fold(0.0, f32::max);
        rows.push(Row {
            name: "coverage12",
            agents: scenario.agents.len(),
            tasks: targets.len(),
            assigned: covered,
            makespan,
            recharges: 0,
            rounds: 0,
            time_ms: t0.elapsed().as_secs_f32() * 1000.0,
        });
    }

    println!();
    println!("# PROFILER");
    hprof::profiler().print_timing();
    println!();

    println!("# RESULTS");
    use std::io::Write;
    let table = Vec::new();
    let mut tablewriter = tabwriter::TabWriter::new(table);
    writeln!(
        &mut tablewriter,
        "instance\tagents\ttasks\tassigned\tmakespan\trecharges\trounds\ttime_ms"
    )
    .unwrap();
    writeln!(
        &mut tablewriter,
        "---\t---\t---\t---\t---\t---\t---\t---"
    )
    .unwrap();
    for r in &rows {
        writeln!(
            &mut tablewriter,
            "{}\t{}\t{}\t{}\t{:.1}\t{}\t{}\t{:.2}",
            r.name, r.agents, r.tasks, r.assigned, r.makespan, r.recharges, r.rounds, r.time_ms
        )
        .unwrap();
    }
    let written = String::from_utf8(tablewriter.into_inner().unwrap()).unwrap();
    println!("{}", written);

    let mut wtr = csv::Writer::from_path("bench_results.csv").unwrap();
    wtr.write_record([
        "instance",
        "agents",
        "tasks",
        "assigned",
        "makespan",
        "recharges",
        "rounds",
        "time_ms",
    ])
    .unwrap();
    for r in &rows {
        wtr.write_record([
            r.name.to_string(),
            r.agents.to_string(),
            r.tasks.to_string(),
            r.assigned.to_string(),
            format!("{:.1}", r.makespan),
            r.recharges.to_string(),
            r.rounds.to_string(),
            format!("{:.2}", r.time_ms),
        ])
        .unwrap();
    }
    wtr.flush().unwrap();
    println!("wrote bench_results.csv");
}
