//! Fan-out/fan-in over independent tasks.
//!
//! Every task writes its result into a slot owned by the caller; the calling
//! thread gathers the slots and is the only one that sees progress. Workers
//! never touch shared mutable state.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
#[cfg(feature = "parallel")]
use std::sync::mpsc;

/// Controls whether batches run on the Rayon pool or on the calling thread.
#[derive(Clone, Copy, Debug)]
pub struct ParallelOptions {
    enabled: bool,
    min_tasks_for_parallel: usize,
}

impl ParallelOptions {
    pub fn new(enabled: bool, min_tasks_for_parallel: usize) -> Self {
        Self {
            enabled,
            min_tasks_for_parallel: min_tasks_for_parallel.max(1),
        }
    }

    /// Run every batch sequentially on the calling thread.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            min_tasks_for_parallel: usize::MAX,
        }
    }

    pub fn should_parallelize(&self, task_count: usize) -> bool {
        self.enabled && task_count >= self.min_tasks_for_parallel
    }
}

impl Default for ParallelOptions {
    fn default() -> Self {
        Self {
            enabled: cfg!(feature = "parallel"),
            min_tasks_for_parallel: 64,
        }
    }
}

/// Evaluate `task(i)` for `i in 0..len` and return the results in index order.
///
/// `on_done(completed)` is invoked on the calling thread once per finished
/// task, with the running count of completed tasks.
pub fn scatter_gather<T, F, P>(
    len: usize,
    options: ParallelOptions,
    task: F,
    mut on_done: P,
) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync,
    P: FnMut(usize),
{
    if options.should_parallelize(len) {
        #[cfg(feature = "parallel")]
        {
            return scatter_gather_parallel(len, task, on_done);
        }
    }

    (0..len)
        .map(|i| {
            let value = task(i);
            on_done(i + 1);
            value
        })
        .collect()
}

#[cfg(feature = "parallel")]
fn scatter_gather_parallel<T, F, P>(len: usize, task: F, mut on_done: P) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync,
    P: FnMut(usize),
{
    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(len).collect();
    let (tx, rx) = mpsc::channel::<(usize, T)>();
    let task = &task;

    std::thread::scope(|scope| {
        scope.spawn(move || {
            (0..len).into_par_iter().for_each_with(tx, |tx, i| {
                // The receiver outlives the batch, so a send can only fail
                // if the gathering thread already panicked.
                let _ = tx.send((i, task(i)));
            });
        });
        for (completed, (i, value)) in rx.iter().enumerate() {
            slots[i] = Some(value);
            on_done(completed + 1);
        }
    });

    let gathered: Vec<T> = slots.into_iter().flatten().collect();
    debug_assert_eq!(gathered.len(), len);
    gathered
}
