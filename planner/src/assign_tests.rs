#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use uavsched_structs::drone::{Drone, Fleet};
    use uavsched_structs::obstacle::Obstacle;
    use uavsched_structs::plan::MissionPlan;
    use uavsched_structs::scenario::Scenario;
    use uavsched_structs::task::{Task, TaskKind};
    use uavsched_structs::Point;

    use crate::assign;
    use crate::Params;

    fn base() -> Point {
        Point::new(0.0, 0.0)
    }

    fn fleet3() -> Fleet {
        let b = base();
        Fleet::new(
            b,
            vec![
                Drone::new("U1", 15.0, 500.0, 30.0, b),
                Drone::new("U2", 10.0, 600.0, 60.0, b),
                Drone::new("U3", 20.0, 450.0, 20.0, b),
            ],
        )
    }

    fn tasks5() -> Vec<Task> {
        vec![
            Task::new("T1", Point::new(1200.0, 800.0), TaskKind::Delivery(10.0), 2),
            Task::new("T2", Point::new(300.0, 450.0), TaskKind::Recon(20.0), 1),
            Task::new("T3", Point::new(950.0, 200.0), TaskKind::Delivery(5.0), 3),
            Task::new("T4", Point::new(600.0, 1200.0), TaskKind::Urgent(8.0), 1),
            Task::new("T5", Point::new(1500.0, 500.0), TaskKind::Recon(15.0), 2),
        ]
    }

    fn pairs(plan: &MissionPlan) -> Vec<(String, String)> {
        plan.assignments
            .iter()
            .map(|a| (a.task.clone(), a.agent.clone()))
            .collect()
    }

    #[test]
    pub fn five_tasks_three_agents_full_assignment() {
        let _ = env_logger::try_init();
        let mut fleet = fleet3();
        let mut tasks = tasks5();
        let plan = assign::plan(&mut fleet, &mut tasks, &[], &Params::default());
        plan.print();

        // Nearest-first per pass: U1 opens on T2, the second pass mops up.
        assert_eq!(
            pairs(&plan),
            vec![
                ("T2".to_string(), "U1".to_string()),
                ("T3".to_string(), "U2".to_string()),
                ("T4".to_string(), "U3".to_string()),
                ("T1".to_string(), "U1".to_string()),
                ("T5".to_string(), "U2".to_string()),
            ]
        );
        assert_eq!(plan.rounds, 2);
        assert!(plan.unassigned.is_empty());
        assert!(plan.unassignable.is_empty());

        let taken = plan
            .assignments
            .iter()
            .map(|a| a.task.as_str())
            .collect::<HashSet<_>>();
        assert_eq!(taken.len(), tasks.len());

        for route in &plan.routes {
            assert!(!route.stranded);
            assert_eq!(route.recharges, 0);
            assert!(route.waypoints.last().unwrap().0.eq_approx(&base()));
        }
        // U3 flies out to T4 and straight back.
        assert!((plan.routes[2].total_distance() - 2683.3).abs() < 0.5);
        assert!((plan.makespan() - 78.97).abs() < 0.05);
        assert!(fleet.drones[0].is_leader);
    }

    #[test]
    pub fn obstacle_defers_direct_assignment() {
        let _ = env_logger::try_init();
        let b = base();
        let mut fleet = Fleet::new(b, vec![Drone::new("U1", 10.0, 600.0, 30.0, b)]);
        let mut tasks = vec![Task::new(
            "T",
            Point::new(1000.0, 0.0),
            TaskKind::Delivery(5.0),
            1,
        )];
        let obs = Obstacle::new(Point::new(500.0, 0.0), 100.0);
        let plan = assign::plan(&mut fleet, &mut tasks, &[obs], &Params::default());

        assert_eq!(pairs(&plan), vec![("T".to_string(), "U1".to_string())]);
        assert_eq!(plan.rounds, 1);
        let route = &plan.routes[0];
        assert!(route.waypoints.len() > 3);
        assert!(route.waypoints.last().unwrap().0.eq_approx(&b));
        let arrival = route.waypoints[route.waypoints.len() - 2].0;
        assert!(arrival.eq_approx(&Point::new(1000.0, 0.0)));
        // Every outbound hop clears the obstacle. The final recall leg is a
        // straight line and exempt.
        let outbound = &route.waypoints[..route.waypoints.len() - 1];
        for w in outbound.windows(2) {
            assert!(!obs.blocks(&w[0].0, &w[1].0));
        }
    }

    #[test]
    pub fn far_pair_regroups_on_leader_before_assigning() {
        let _ = env_logger::try_init();
        let mut fleet = fleet3();
        fleet.drones[1].pos = Point::new(0.0, 800.0);
        fleet.drones[2].pos = Point::new(1001.0, 800.0);
        fleet.checkpoint();
        let mut tasks = vec![Task::new(
            "T_A",
            Point::new(200.0, 100.0),
            TaskKind::Delivery(5.0),
            1,
        )];
        let plan = assign::plan(&mut fleet, &mut tasks, &[], &Params::default());

        // U2 and U3 sit 1001 apart, inside the band around the communication
        // range. Both step 200 toward the leader before anything is assigned.
        let u2 = &plan.routes[1];
        assert!(u2.waypoints[0].0.eq_approx(&Point::new(0.0, 800.0)));
        assert!(u2.waypoints[1].0.dist(&Point::new(0.0, 600.0)) < 0.5);
        assert!((u2.waypoints[1].1 - 4.0).abs() < 1e-2);
        let u3 = &plan.routes[2];
        assert!(u3.waypoints[1].0.dist(&Point::new(844.77, 675.14)) < 0.5);
        assert_eq!(pairs(&plan), vec![("T_A".to_string(), "U1".to_string())]);
        assert_eq!(plan.rounds, 2);
    }

    #[test]
    pub fn close_pair_pushed_apart() {
        let _ = env_logger::try_init();
        let b = base();
        let mut fleet = Fleet::new(
            b,
            vec![
                Drone::new("U1", 10.0, 600.0, 30.0, b),
                Drone::new("U2", 10.0, 600.0, 30.0, b),
            ],
        );
        fleet.drones[0].pos = Point::new(300.0, 300.0);
        fleet.drones[1].pos = Point::new(320.0, 300.0);
        fleet.checkpoint();
        let mut tasks = vec![Task::new(
            "T",
            Point::new(1000.0, 1000.0),
            TaskKind::Delivery(5.0),
            1,
        )];
        let plan = assign::plan(&mut fleet, &mut tasks, &[], &Params::default());

        // 20 apart and both off base: each backs off 50 along the pair axis.
        let u1 = &plan.routes[0];
        let u2 = &plan.routes[1];
        assert!(u1.waypoints[1].0.eq_approx(&Point::new(250.0, 300.0)));
        assert!(u2.waypoints[1].0.eq_approx(&Point::new(370.0, 300.0)));
        assert!((u1.waypoints[1].1 - 1.0).abs() < 1e-3);
        assert_eq!(pairs(&plan), vec![("T".to_string(), "U1".to_string())]);
        assert_eq!(plan.rounds, 2);
        assert!(u1.waypoints.last().unwrap().0.eq_approx(&b));
        assert!(u2.waypoints.last().unwrap().0.eq_approx(&b));
    }

    #[test]
    pub fn low_margin_triggers_recall_and_recharge() {
        let _ = env_logger::try_init();
        let b = base();
        let mut fleet = Fleet::new(b, vec![Drone::new("U1", 10.0, 600.0, 30.0, b)]);
        fleet.drones[0].pos = Point::new(500.0, 0.0);
        fleet.checkpoint();
        // 2 s of margin after the flight home, under the 20 s floor.
        fleet.drones[0].remaining_endurance = 12.0;
        let mut tasks = vec![Task::new(
            "T",
            Point::new(200.0, 0.0),
            TaskKind::Delivery(5.0),
            1,
        )];
        let plan = assign::plan(&mut fleet, &mut tasks, &[], &Params::default());

        let route = &plan.routes[0];
        assert_eq!(route.recharges, 1);
        assert!(!route.stranded);
        // Recall lands at 10 s, the pad stop shifts the next departure.
        assert!(route.waypoints[1].0.eq_approx(&b));
        assert!((route.waypoints[1].1 - 10.0).abs() < 1e-3);
        assert!((route.waypoints[2].1 - 74.0).abs() < 1e-3);
        assert!((route.total_time - 78.0).abs() < 1e-3);
        assert_eq!(pairs(&plan), vec![("T".to_string(), "U1".to_string())]);
    }

    #[test]
    pub fn stranded_agent_sits_out_and_is_reported() {
        let _ = env_logger::try_init();
        let b = base();
        let mut fleet = Fleet::new(
            b,
            vec![
                Drone::new("U1", 10.0, 600.0, 30.0, b),
                Drone::new("U2", 10.0, 600.0, 30.0, b),
            ],
        );
        fleet.drones[0].pos = Point::new(500.0, 0.0);
        fleet.checkpoint();
        // The flight home needs 10 s; 5 s strands U1 where it is.
        fleet.drones[0].remaining_endurance = 5.0;
        let mut tasks = vec![Task::new(
            "T",
            Point::new(100.0, 0.0),
            TaskKind::Delivery(5.0),
            1,
        )];
        let plan = assign::plan(&mut fleet, &mut tasks, &[], &Params::default());

        let u1 = &plan.routes[0];
        assert!(u1.stranded);
        assert_eq!(u1.waypoints.len(), 1);
        assert!(u1.waypoints[0].0.eq_approx(&Point::new(500.0, 0.0)));
        let u2 = &plan.routes[1];
        assert!(!u2.stranded);
        assert_eq!(u2.recharges, 1);
        assert!((u2.total_time - 66.0).abs() < 1e-3);
        assert_eq!(pairs(&plan), vec![("T".to_string(), "U2".to_string())]);
        assert_eq!(plan.rounds, 1);
    }

    #[test]
    pub fn unassignable_task_reported_without_spinning() {
        let _ = env_logger::try_init();
        let b = base();
        let mut fleet = Fleet::new(
            b,
            vec![
                Drone::new("U1", 10.0, 600.0, 30.0, b),
                Drone::new("U2", 15.0, 600.0, 30.0, b),
            ],
        );
        let mut tasks = vec![Task::new(
            "T_big",
            Point::new(400.0, 0.0),
            TaskKind::Delivery(100.0),
            1,
        )];
        let plan = assign::plan(&mut fleet, &mut tasks, &[], &Params::default());

        assert_eq!(plan.unassignable, vec!["T_big".to_string()]);
        assert!(plan.assignments.is_empty());
        assert!(plan.unassigned.is_empty());
        assert_eq!(plan.rounds, 0);
        for route in &plan.routes {
            assert!(route.waypoints.last().unwrap().0.eq_approx(&b));
        }
    }

    #[test]
    pub fn blocked_everywhere_stops_at_the_round_bound() {
        let _ = env_logger::try_init();
        let b = base();
        let mut fleet = Fleet::new(b, vec![Drone::new("U1", 10.0, 600.0, 30.0, b)]);
        // The task sits at the center of a keep-out zone, unreachable even
        // on the grid.
        let coord = Point::new(1000.0, 1000.0);
        let obs = Obstacle::new(coord, 100.0);
        let mut tasks = vec![Task::new("T", coord, TaskKind::Delivery(5.0), 1)];
        let mut params = Params::default();
        params.max_rounds = 5;
        let plan = assign::plan(&mut fleet, &mut tasks, &[obs], &params);

        assert_eq!(plan.rounds, 5);
        assert_eq!(plan.unassigned, vec!["T".to_string()]);
        assert!(plan.assignments.is_empty());
        assert!(plan.unassignable.is_empty());
        // One recall per no-progress round after the first.
        assert_eq!(plan.routes[0].recharges, 4);
        assert!(!plan.routes[0].stranded);
    }

    #[test]
    pub fn injected_hazard_and_task_replanned() {
        let _ = env_logger::try_init();
        let mut fleet = fleet3();
        let mut tasks = tasks5();
        let mut obstacles: Vec<Obstacle> = Vec::new();
        let first = assign::plan(&mut fleet, &mut tasks, &obstacles, &Params::default());
        assert!(first.unassigned.is_empty());

        // Mid-run injection: a hazard appears and an urgent task comes in.
        obstacles.push(Obstacle::new(Point::new(900.0, 250.0), 100.0));
        tasks.push(Task::new(
            "T6",
            Point::new(800.0, 600.0),
            TaskKind::Urgent(6.0),
            1,
        ));
        let second = assign::replan(&mut fleet, &mut tasks, &obstacles, &Params::default());

        assert_eq!(pairs(&second), vec![("T6".to_string(), "U1".to_string())]);
        assert!(second.unassigned.is_empty());
        // Completed work stays completed; routes restart at the snapshot.
        for route in &second.routes {
            assert!(route.waypoints[0].0.eq_approx(&base()));
            assert_eq!(route.waypoints[0].1, 0.0);
        }
        assert_eq!(second.routes[0].waypoints.len(), 3);
    }

    #[test]
    pub fn replan_restarts_accounting_and_keeps_endurance() {
        let _ = env_logger::try_init();
        let b = base();
        let mut fleet = Fleet::new(b, vec![Drone::new("U1", 10.0, 600.0, 30.0, b)]);
        fleet.drones[0]
            .move_to(Point::new(500.0, 500.0), 0.0)
            .unwrap();
        let mut tasks = vec![Task::new(
            "T",
            Point::new(700.0, 500.0),
            TaskKind::Delivery(5.0),
            1,
        )];
        let plan = assign::replan(&mut fleet, &mut tasks, &[], &Params::default());

        let route = &plan.routes[0];
        assert!(route.waypoints[0].0.eq_approx(&Point::new(500.0, 500.0)));
        assert_eq!(route.waypoints[0].1, 0.0);
        assert_eq!(pairs(&plan), vec![("T".to_string(), "U1".to_string())]);
        // Endurance spent before the checkpoint stays spent.
        assert!(fleet.drones[0].remaining_endurance < 600.0);
    }

    #[test]
    pub fn scenario_round_trips_through_json() {
        let _ = env_logger::try_init();
        let raw = r#"{
            "base": {"x": 0.0, "y": 0.0},
            "agents": [
                {"id": "U1", "payload": 12.0, "endurance": 600.0, "hover": 30.0}
            ],
            "tasks": [
                {
                    "id": "T1",
                    "coord": {"x": 400.0, "y": 300.0},
                    "priority": 1,
                    "kind": {"Delivery": 6.0}
                }
            ]
        }"#;
        let scenario: Scenario = serde_json::from_str(raw).unwrap();
        assert!(scenario.obstacles.is_empty());
        let mut fleet = scenario.fleet();
        let mut tasks = scenario.tasks.clone();
        let plan = assign::plan(&mut fleet, &mut tasks, &scenario.obstacles, &Params::default());
        assert_eq!(pairs(&plan), vec![("T1".to_string(), "U1".to_string())]);

        let back = serde_json::to_string(&scenario).unwrap();
        let again: Scenario = serde_json::from_str(&back).unwrap();
        assert_eq!(again.tasks[0].id, "T1");
        assert!(serde_json::to_string(&plan).is_ok());
    }
}
