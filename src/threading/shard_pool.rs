use anyhow::{bail, Result};
use crossbeam::channel;
use log::{debug, warn};

/// Run one job per shard on a pool of `workers` threads and block until
/// every job has finished (barrier semantics). Jobs are independent and
/// unordered; results are collected per shard and the failure of the
/// lowest-numbered failing shard is propagated after the barrier.
pub fn run_shard_pool<F>(workers: usize, jobs: Vec<F>) -> Result<()>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    let n_jobs = jobs.len();
    let pool = threadpool::ThreadPool::new(workers);
    let (tx_done, rx_done) = channel::bounded::<(usize, Result<()>)>(n_jobs);

    for (shard_index, job) in jobs.into_iter().enumerate() {
        let tx_done = tx_done.clone();
        pool.execute(move || {
            debug!("Shard worker {} started", shard_index + 1);
            let result = job();
            let _ = tx_done.send((shard_index, result));
        });
    }
    drop(tx_done);

    // Barrier: one message per job, channel closes when all workers are done
    let mut failures: Vec<(usize, anyhow::Error)> = Vec::new();
    let mut n_done = 0;
    for (shard_index, result) in rx_done.iter() {
        n_done += 1;
        if let Err(e) = result {
            warn!("Shard {} failed: {}", shard_index + 1, e);
            failures.push((shard_index, e));
        }
    }
    pool.join();

    if n_done != n_jobs {
        bail!("{} of {} shard workers did not report back", n_jobs - n_done, n_jobs);
    }

    failures.sort_by_key(|(shard_index, _)| *shard_index);
    if let Some((shard_index, e)) = failures.into_iter().next() {
        bail!("shard {} failed: {}", shard_index + 1, e);
    }
    Ok(())
}
