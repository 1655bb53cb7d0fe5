use dotlink::core::refill::is_compact;
use dotlink::core::{
    collapse_column, is_valid_connection, refill_column, shuffle_grid, Config, Grid, NullSink,
    RefillQueue, Session, SimpleRng, Solver,
};
use dotlink::types::{Command, CoreEvent, DotColor, DragEvent, DragState, PieceKind, Position};

fn grid(rows: &[&str]) -> Grid {
    Grid::from_rows(rows, 1.0).unwrap()
}

fn column_count(g: &Grid, x: i32) -> usize {
    g.column(x).filter(|&p| g.is_occupied(p)).count()
}

fn sorted_colors(g: &Grid) -> Vec<String> {
    let mut colors: Vec<String> = g
        .positions()
        .filter_map(|p| g.piece_at(p))
        .map(|p| format!("{:?}/{:?}", p.kind(), p.color()))
        .collect();
    colors.sort();
    colors
}

#[test]
fn test_collapse_every_column_is_compact() {
    let mut g = grid(&[
        "R.GB.",
        ".Y.L.",
        "B..GR",
        "..C.Y",
        "P.R..",
    ]);
    for x in 0..g.width() as i32 {
        let before = column_count(&g, x);
        collapse_column(&mut g, x, &mut NullSink);
        assert!(is_compact(&g, x), "column {} has a gap", x);
        assert_eq!(column_count(&g, x), before);
    }
    assert!(g.check_invariants());
}

#[test]
fn test_collapse_reports_target_anchor() {
    let mut g = grid(&["R", ".", "."]);
    let mut events = Vec::new();
    let moves = collapse_column(&mut g, 0, &mut events);
    assert_eq!(moves, 1);
    match &events[..] {
        [CoreEvent::PieceMoved { from, to, target, .. }] => {
            assert_eq!(*from, Position::new(0, 2));
            assert_eq!(*to, Position::new(0, 0));
            assert_eq!(Some(*target), g.anchor(Position::new(0, 0)));
        }
        other => panic!("unexpected events {:?}", other),
    }
}

#[test]
fn test_refill_fills_top_rows_first_from_above() {
    let mut g = grid(&[".", ".", "R"]);
    let mut rng = SimpleRng::new(3);
    let mut events = Vec::new();
    let spawned = refill_column(&mut g, 0, &mut rng, &DotColor::ALL, 5, &mut events);

    assert_eq!(spawned.len(), 2);
    assert_eq!(column_count(&g, 0), 3);
    let spawns: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            CoreEvent::PieceSpawned { position, kind, from, to, .. } => {
                Some((*position, *kind, from.y - to.y))
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        spawns,
        vec![
            (Position::new(0, 2), PieceKind::Normal, 5.0),
            (Position::new(0, 1), PieceKind::Normal, 5.0),
        ]
    );
}

#[test]
fn test_refill_queue_runs_columns_in_schedule_order() {
    let mut g = grid(&["...", "R.B"]);
    let mut queue = RefillQueue::new();
    queue.schedule(2);
    queue.schedule(0);
    queue.schedule(2);
    assert_eq!(queue.pending().collect::<Vec<_>>(), vec![2, 0]);

    let mut rng = SimpleRng::new(9);
    let step = queue.run_next(&mut g, &mut rng, &DotColor::ALL, 5, &mut NullSink);
    assert_eq!(step, Some((2, 1)));
    assert_eq!(column_count(&g, 0), 1);

    let total = queue.run_all(&mut g, &mut rng, &DotColor::ALL, 5, &mut NullSink);
    assert_eq!(total, 1);
    assert!(queue.is_empty());
    // Column 1 was never scheduled.
    assert_eq!(column_count(&g, 1), 0);
}

#[test]
fn test_shuffle_preserves_pieces_and_occupied_cells() {
    let mut g = grid(&[
        "RGB.Y",
        "L.PCR",
        "GGRB.",
    ]);
    let occupied: Vec<Position> = g.positions().filter(|&p| g.is_occupied(p)).collect();
    let colors = sorted_colors(&g);
    let mut rng = SimpleRng::new(12345);

    for _ in 0..20 {
        shuffle_grid(&mut g, &mut rng, &mut NullSink);
        let now: Vec<Position> = g.positions().filter(|&p| g.is_occupied(p)).collect();
        assert_eq!(now, occupied);
        assert_eq!(sorted_colors(&g), colors);
        assert!(g.check_invariants());
    }
}

#[test]
fn test_solver_path_is_valid_chain() {
    let g = grid(&[
        "RGBYP",
        "GBYPR",
        "BYPRG",
        "GGGRB",
    ]);
    let solver = Solver::new(500, 3);
    let mut rng = SimpleRng::new(77);
    let report = solver.search(&g, &mut rng);

    assert!(report.probed);
    assert!(report.attempts <= 500);
    let path = report.path.expect("a run of three greens exists");
    assert!(path.len() >= 3);
    for pair in path.windows(2) {
        assert!(pair[0].is_orthogonal_neighbor(pair[1]));
        assert_eq!(g.color_at(pair[0]), g.color_at(pair[1]));
    }
}

#[test]
fn test_solver_never_exceeds_cap() {
    // A lone line bomb passes the probe but flood fill finds nothing long enough.
    let g = grid(&["RGB", "GLR", "BRG"]);
    let solver = Solver::new(64, 3);
    let mut rng = SimpleRng::new(5);
    let report = solver.search(&g, &mut rng);
    assert!(report.probed);
    assert_eq!(report.path, None);
    assert_eq!(report.attempts, solver.max_attempts());
}

#[test]
fn test_solver_path_with_color_bomb_endpoint_is_playable() {
    let layout = ["CRR", "GBY"];
    for seed in 1..50 {
        let g = grid(&layout);
        let mut rng = SimpleRng::new(seed);
        let path = Solver::default()
            .try_find_line_solution(&g, &mut rng)
            .expect("the red pair and the bomb form a chain");
        assert_eq!(path.len(), 3);
        assert_eq!(
            g.piece_at(path[0]).map(|p| p.kind()),
            Some(PieceKind::Normal),
            "seed {} starts on {:?}",
            seed,
            path[0]
        );

        let mut check = g.clone();
        for pair in path.windows(2) {
            let (a, b) = (check.occupant(pair[0]), check.occupant(pair[1]));
            assert!(is_valid_connection(&mut check, a, b), "seed {}: {:?}", seed, pair);
        }

        let mut session = Session::with_grid(Config::default(), g, seed).unwrap();
        let mut events = Vec::new();
        let sample = |state, pos| {
            Command::Drag(DragEvent {
                state,
                position: Some(pos),
            })
        };
        session.apply(sample(DragState::Started, path[0]), &mut events);
        for &pos in &path[1..] {
            session.apply(sample(DragState::Updated, pos), &mut events);
        }
        assert_eq!(session.drag_chain(), path);
        session.apply(sample(DragState::Ended, path[2]), &mut events);
        assert!(events.iter().any(|e| matches!(e, CoreEvent::ChainResolved(_))));
    }
}

#[test]
fn test_solver_rejects_chain_headed_only_by_bombs() {
    // Flanked by bombs, the single red cannot start a chain of three.
    let g = grid(&["CRC", "GBG", "BGB"]);
    let solver = Solver::new(200, 3);
    let mut rng = SimpleRng::new(8);
    assert_eq!(solver.search(&g, &mut rng).path, None);
}
