use super::*;

fn run_all(seed: u64) -> DalgonaSim {
    let mut rng = Rng::new(seed);
    let mut sim = DalgonaSim::new(DalgonaConfig::default(), &mut rng);
    for frame in 0..sim.total_frames() {
        sim.step(frame, &mut rng).expect("frame in range");
        sim.log_frame(frame);
    }
    sim
}

fn phase_start(sim: &DalgonaSim, phase: DalgonaPhase) -> u32 {
    (0..sim.total_frames())
        .find(|frame| sim.table.resolve(*frame).map(|cursor| cursor.phase) == Some(phase))
        .expect("phase has frames")
}

#[test]
fn builds_lineup_in_shape_order() {
    let mut rng = Rng::new(42);
    let sim = DalgonaSim::new(DalgonaConfig::default(), &mut rng);
    assert_eq!(sim.participants.len(), 186);
    assert_eq!(sim.participants[0].group, "Circle");
    assert_eq!(sim.participants[43].group, "Triangle");
    assert_eq!(sim.participants[185].group, "Umbrella");
    assert_eq!(sim.total_frames(), 77);

    assert_eq!(sim.schedule.timeout_set().len(), 16);
    assert_eq!(sim.count(Status::Queued), 63);
    for id in sim.schedule.timeout_set() {
        let participant = &sim.participants[*id];
        assert_eq!(participant.status, Status::Working);
        assert_eq!(participant.fail_mode, Some(FailMode::Timeout));
    }
}

#[test]
fn ends_with_literal_outcome_counts() {
    let sim = run_all(42);
    let summary = sim.summary();
    assert_eq!(summary.finished, 107);
    assert_eq!(summary.failed, 79);
    assert_eq!(summary.active, 0);
    assert!(sim.participants.iter().all(|p| p.status.is_terminal()));

    for outcome in &sim.config.outcomes {
        let group: Vec<_> = sim
            .participants
            .iter()
            .filter(|p| p.group == outcome.shape)
            .collect();
        let finished = group.iter().filter(|p| p.status == Status::Finished).count();
        let failed = group.iter().filter(|p| p.status == Status::Failed).count();
        assert_eq!(finished, outcome.survived, "{}", outcome.shape);
        assert_eq!(failed, outcome.failed, "{}", outcome.shape);
    }
}

#[test]
fn statuses_only_move_forward() {
    let mut rng = Rng::new(7);
    let mut sim = DalgonaSim::new(DalgonaConfig::default(), &mut rng);
    let initial: Vec<Status> = sim.participants.iter().map(|p| p.status).collect();
    let mut previous = initial.clone();
    let mut terminal = 0usize;
    let carving_start = phase_start(&sim, DalgonaPhase::Carving);
    assert_eq!(carving_start, 33);
    for frame in 0..sim.total_frames() {
        sim.step(frame, &mut rng).expect("frame in range");
        if frame < carving_start {
            let now: Vec<Status> = sim.participants.iter().map(|p| p.status).collect();
            assert_eq!(now, initial, "frame {frame}");
        }
        for (before, now) in previous.iter().zip(&sim.participants) {
            if before.is_terminal() {
                assert_eq!(*before, now.status, "frame {frame}, id {}", now.id);
            }
            assert!(before.can_become(now.status), "frame {frame}, id {}", now.id);
        }
        let now_terminal = sim
            .participants
            .iter()
            .filter(|p| p.status.is_terminal())
            .count();
        assert!(now_terminal >= terminal);
        terminal = now_terminal;
        previous = sim.participants.iter().map(|p| p.status).collect();
    }
}

#[test]
fn failed_participants_stay_where_they_fell() {
    let mut rng = Rng::new(42);
    let mut sim = DalgonaSim::new(DalgonaConfig::default(), &mut rng);
    let mut fallen: Vec<Option<Vec2>> = vec![None; sim.participants.len()];
    for frame in 0..sim.total_frames() {
        sim.step(frame, &mut rng).expect("frame in range");
        for participant in &sim.participants {
            if participant.status != Status::Failed {
                continue;
            }
            match fallen[participant.id] {
                Some(position) => assert_eq!(
                    participant.position, position,
                    "frame {frame}, id {}",
                    participant.id
                ),
                None => fallen[participant.id] = Some(participant.position),
            }
        }
    }
    assert_eq!(fallen.iter().filter(|p| p.is_some()).count(), 79);
}

#[test]
fn timeout_failers_flip_exactly_on_first_timeout_frame() {
    let mut rng = Rng::new(42);
    let mut sim = DalgonaSim::new(DalgonaConfig::default(), &mut rng);
    let timeout_ids = sim.schedule.timeout_set().to_vec();
    let timeout_start = phase_start(&sim, DalgonaPhase::Timeout);
    assert_eq!(timeout_start, 61);

    for frame in 0..sim.total_frames() {
        sim.step(frame, &mut rng).expect("frame in range");
        let flipped = timeout_ids
            .iter()
            .filter(|id| sim.participants[**id].status == Status::Failed)
            .count();
        if frame < timeout_start {
            assert_eq!(flipped, 0, "frame {frame}");
        } else {
            assert_eq!(flipped, timeout_ids.len(), "frame {frame}");
        }
    }

    assert_eq!(sim.timeout_log.len(), 16);
    for record in &sim.timeout_log {
        assert_eq!(record.frame, 61);
        assert_eq!(record.timeleft, 50);
    }
}

#[test]
fn replaying_the_timeout_frame_does_not_flip_twice() {
    let mut rng = Rng::new(3);
    let mut sim = DalgonaSim::new(DalgonaConfig::default(), &mut rng);
    for frame in 0..=61 {
        sim.step(frame, &mut rng).expect("frame in range");
    }
    sim.step(61, &mut rng).expect("frame in range");
    assert_eq!(sim.timeout_log.len(), 16);
}

#[test]
fn group_counts_never_decrease() {
    let sim = run_all(11);
    let steps = sim.metrics.by_group_steps();
    assert_eq!(steps.len(), 77 * 4);
    let mut last: std::collections::HashMap<String, (usize, usize)> = Default::default();
    for row in &sim.metrics.by_group_sorted() {
        if let Some((fin, elim)) = last.get(&row.shape) {
            assert!(row.finished_cum >= *fin);
            assert!(row.eliminated_cum >= *elim);
        }
        last.insert(row.shape.clone(), (row.finished_cum, row.eliminated_cum));
    }
    let eliminated: usize = steps.iter().map(|row| row.eliminated_step).sum();
    let finished: usize = steps.iter().map(|row| row.finished_step).sum();
    assert_eq!(eliminated, 79);
    assert_eq!(finished, 107);
}

#[test]
fn overall_rows_follow_the_countdown() {
    let sim = run_all(42);
    let overall = sim.metrics.overall();
    assert_eq!(overall.len(), 77);
    assert_eq!(overall[0].timeleft, 600);
    assert_eq!(overall[0].phase, "Lineup");
    assert_eq!(overall[33].phase, "Carving");
    assert_eq!(overall[33].timeleft, 420);
    assert_eq!(overall[66].timeleft, 0);
    assert_eq!(overall[76].phase, "Exit");
    assert_eq!(overall[60].finished_total, 107);
    assert_eq!(overall[60].eliminated_total, 63);
}

#[test]
fn advance_matches_in_place_stepping() {
    let mut rng_a = Rng::new(5);
    let mut rng_b = Rng::new(5);
    let mut in_place = DalgonaSim::new(DalgonaConfig::default(), &mut rng_a);
    let mut pure = DalgonaSim::new(DalgonaConfig::default(), &mut rng_b);
    for frame in 0..40 {
        in_place.step(frame, &mut rng_a).expect("frame in range");
        pure = advance(pure, frame, &mut rng_b).expect("frame in range");
    }
    assert_eq!(in_place.participants, pure.participants);
}

#[test]
fn stepping_past_the_end_is_rejected() {
    let mut rng = Rng::new(42);
    let sim = DalgonaSim::new(DalgonaConfig::default(), &mut rng);
    let result = advance(sim, 77, &mut rng);
    assert!(matches!(
        result,
        Err(SimError::FrameOutOfRange {
            frame: 77,
            total: 77
        })
    ));
}

#[test]
fn snapshot_caption_reports_counts() {
    let sim = run_all(42);
    let snapshot = sim.snapshot(76);
    assert_eq!(snapshot.phase, "Exit");
    assert_eq!(
        snapshot.caption,
        "Phase: Finished exit   |   Finished (Survived): 107   Eliminated: 79"
    );
    assert_eq!(snapshot.extras["timer"], "Time left: 0 sec");
    assert_eq!(snapshot.participants.len(), 186);
}
