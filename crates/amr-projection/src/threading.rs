//! Choice between variable-level and level-level parallelism.

/// Whether to parallelize across variables rather than AMR levels.
///
/// - never with a single thread or a single variable
/// - always when there are at least as many variables as threads
/// - otherwise when the average work per variable exceeds twice the average
///   work per level
pub fn should_use_variable_threading(
    n_variables: usize,
    max_threads: usize,
    n_levels: usize,
    total_cells: usize,
) -> bool {
    if max_threads <= 1 || n_variables <= 1 {
        return false;
    }
    if n_variables >= max_threads {
        return true;
    }
    let per_variable = total_cells as f64 / n_variables as f64;
    let per_level = total_cells as f64 / n_levels.max(1) as f64;
    per_variable > 2.0 * per_level
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_thread_never() {
        for vars in 0..10 {
            for levels in 0..10 {
                assert!(!should_use_variable_threading(vars, 1, levels, 1_000_000));
                assert!(!should_use_variable_threading(vars, 0, levels, 1_000_000));
            }
        }
    }

    #[test]
    fn test_single_variable_never() {
        assert!(!should_use_variable_threading(1, 16, 1, 10));
        assert!(!should_use_variable_threading(0, 16, 20, 10));
    }

    #[test]
    fn test_many_variables() {
        assert!(should_use_variable_threading(4, 4, 12, 1_000));
        assert!(should_use_variable_threading(9, 2, 30, 0));
    }

    #[test]
    fn test_work_ratio() {
        // per variable 500, per level 100
        assert!(should_use_variable_threading(2, 8, 10, 1_000));
        // per variable 500, per level 250
        assert!(!should_use_variable_threading(2, 8, 4, 1_000));
        // exactly 2x is not enough
        assert!(!should_use_variable_threading(3, 8, 6, 600));
    }

    #[test]
    fn test_deterministic() {
        let a = should_use_variable_threading(3, 8, 7, 123_456);
        for _ in 0..100 {
            assert_eq!(should_use_variable_threading(3, 8, 7, 123_456), a);
        }
    }
}
