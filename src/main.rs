use promise_pool::pool::ExecutorPoolInner;
use std::time::Instant;

fn main() {
    let pool = ExecutorPoolInner::new(num_cpus::get());
    pool.run();

    let now = Instant::now();
    let futures: Vec<_> = (0..100_000u64)
        .map(|i| pool.post_task(move |_| i * 2))
        .collect();

    let mut sum = 0u64;
    for mut future in futures {
        sum += future.get().unwrap();
    }
    println!("sum: {}, elapsed: {:?}", sum, now.elapsed());

    pool.shutdown();
}
