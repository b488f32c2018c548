use quickcheck::quickcheck;

use rcsp::{BiDirectional, Direction, SelectionMethod};

/// Build a solver over a random DAG on `n` vertices with integer weights and
/// a unit resource bounded by the vertex count. Edges always point from the
/// smaller to the larger index, so every instance terminates quickly, and
/// integer-valued weights keep float comparisons exact.
fn random_dag(n: usize, raw_edges: &[(u8, u8, i8)]) -> BiDirectional {
    let mut alg = BiDirectional::new(n, raw_edges.len(), 0, n - 1, vec![n as f64], vec![0.0]);
    alg.add_nodes(0..n);
    for &(a, b, weight) in raw_edges {
        let tail = a as usize % n;
        let head = b as usize % n;
        if tail < head {
            alg.add_edge(tail, head, f64::from(weight), vec![1.0]);
        }
    }
    alg
}

fn cost_with(mut alg: BiDirectional, configure: impl FnOnce(&mut BiDirectional)) -> f64 {
    configure(&mut alg);
    alg.run();
    alg.total_cost()
}

quickcheck! {
    fn all_directions_agree_on_random_dags(size: u8, raw_edges: Vec<(u8, u8, i8)>) -> bool {
        let n = size as usize % 7 + 2;
        let both = cost_with(random_dag(n, &raw_edges), |_| {});
        let forward = cost_with(random_dag(n, &raw_edges), |alg| {
            alg.set_direction(Direction::Forward);
        });
        let backward = cost_with(random_dag(n, &raw_edges), |alg| {
            alg.set_direction(Direction::Backward);
        });
        forward == both && backward == both
    }

    fn options_do_not_change_the_cost(size: u8, raw_edges: Vec<(u8, u8, i8)>) -> bool {
        let n = size as usize % 7 + 2;
        let baseline = cost_with(random_dag(n, &raw_edges), |_| {});
        let variants = [
            cost_with(random_dag(n, &raw_edges), |alg| {
                alg.set_method(SelectionMethod::Processed);
            }),
            cost_with(random_dag(n, &raw_edges), |alg| {
                alg.set_method(SelectionMethod::Generated);
            }),
            cost_with(random_dag(n, &raw_edges), |alg| {
                alg.set_bounds_pruning(true);
            }),
            cost_with(random_dag(n, &raw_edges), |alg| {
                alg.set_find_critical_res(true);
            }),
            cost_with(random_dag(n, &raw_edges), |alg| {
                alg.set_elementary(true);
            }),
        ];
        variants.iter().all(|&cost| cost == baseline)
    }

    fn rerunning_is_idempotent(size: u8, raw_edges: Vec<(u8, u8, i8)>) -> bool {
        let n = size as usize % 7 + 2;
        let mut alg = random_dag(n, &raw_edges);
        alg.run();
        let (path, cost) = (alg.path(), alg.total_cost());
        alg.run();
        path == alg.path() && cost == alg.total_cost()
    }
}
