#[cfg(test)]
mod tests {
    use promise_pool::{
        errors::payload_message,
        handle::Promise,
        model::ExecutorState,
        pool::{Config, Executor, ExecutorPoolInner},
    };
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        thread,
        time::{Duration, Instant},
    };

    fn measure<T>(name: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        println!("✓ {}: {:?}", name, start.elapsed());
        result
    }

    #[test]
    fn load_test_1_fifo_order_through_pool() {
        println!("\n=== LOAD TEST 1: Порядок FIFO через пул ===");
        let pool = ExecutorPoolInner::new(1);
        pool.run();

        // 500 задач — несколько границ бинов очереди
        let (tx, rx) = crossbeam::channel::unbounded();
        let futures: Vec<_> = (0..500usize)
            .map(|i| {
                let tx = tx.clone();
                pool.post_task(move |_| {
                    tx.send(i).unwrap();
                })
            })
            .collect();

        for mut future in futures {
            future.get().unwrap();
        }
        drop(tx);

        let order: Vec<_> = rx.iter().collect();
        assert_eq!(order, (0..500).collect::<Vec<_>>(), "единственный исполнитель обязан сохранять порядок постановки");
        pool.shutdown();
    }

    #[test]
    fn load_test_2_targeted_wake_exactly_once() {
        println!("\n=== LOAD TEST 2: Адресная побудка ===");
        let pool = ExecutorPoolInner::new(2);
        pool.run();

        let unrelated = Promise::new(&pool);
        let mut unrelated_future = unrelated.get_future();
        let awaited = Promise::new(&pool);
        let mut awaited_future = awaited.get_future();

        let wakes = Arc::new(AtomicUsize::new(0));
        let wakes_in_task = wakes.clone();
        let mut result_future = pool.post_task(move |executor| {
            let value = executor.wait(&mut awaited_future).unwrap();
            wakes_in_task.fetch_add(1, Ordering::SeqCst);
            value
        });

        // Исполнитель успевает зарегистрироваться адресатом
        thread::sleep(Duration::from_millis(50));
        unrelated.set_result(9).unwrap();
        thread::sleep(Duration::from_millis(50));
        assert!(!result_future.is_ready(), "чужое выполнение не должно будить");
        assert_eq!(wakes.load(Ordering::SeqCst), 0);

        awaited.set_result(7).unwrap();
        assert_eq!(result_future.get().unwrap(), 7);
        assert_eq!(wakes.load(Ordering::SeqCst), 1, "ровно одна побудка на выполнение");

        // Результат без ожидающего просто остался готовым к выборке
        assert_eq!(unrelated_future.get().unwrap(), 9);
        pool.shutdown();
    }

    #[test]
    fn load_test_3_inline_dispatch_keeps_thread_productive() {
        println!("\n=== LOAD TEST 3: Встроенная диспетчеризация ===");
        let pool = ExecutorPoolInner::new(1);

        let relay = Promise::new(&pool);
        let mut relay_future = relay.get_future();

        // Обе задачи в очереди до старта: ожидающая стоит первой и обязана
        // прокрутить выполняющую изнутри wait()
        let mut sum_future =
            pool.post_task(move |executor| executor.wait(&mut relay_future).unwrap() + 1);
        pool.post(move |_: &Executor| {
            relay.set_result(41).unwrap();
        });

        pool.run();
        assert_eq!(sum_future.get().unwrap(), 42);
        pool.shutdown();
    }

    #[test]
    fn load_test_4_many_tasks() {
        println!("\n=== LOAD TEST 4: 10k задач ===");
        let pool = ExecutorPoolInner::with_config(Config::default());
        pool.run();

        let n = 10_000u64;
        let futures: Vec<_> = measure("постановка 10k задач", || {
            (0..n).map(|i| pool.post_task(move |_| i)).collect()
        });
        let sum: u64 = measure("выборка 10k результатов", || {
            futures.into_iter().map(|mut f| f.get().unwrap()).sum()
        });
        assert_eq!(sum, n * (n - 1) / 2);

        pool.shutdown();
        let metrics = pool.metrics();
        println!("  Поставлено: {}", metrics.posted_tasks);
        println!("  Завершено: {}", metrics.completed_tasks);
        println!("  Утилизация: {:.1}%", metrics.utilization() * 100.0);
        assert_eq!(metrics.posted_tasks, n as usize);
        assert_eq!(metrics.completed_tasks, n as usize);
        assert_eq!(metrics.queued_tasks, 0);
    }

    #[test]
    fn load_test_5_panic_becomes_error() {
        println!("\n=== LOAD TEST 5: Паника задачи как груз ошибки ===");
        let old_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));

        let pool = ExecutorPoolInner::new(2);
        pool.run();

        let mut future = pool.post_task(|_| -> u32 { panic!("boom in task") });
        let error = future.get().unwrap_err();
        let payload = error.into_payload().expect("ожидали груз производителя");
        assert!(payload_message(&payload).contains("boom in task"));

        pool.shutdown();
        std::panic::set_hook(old_hook);
    }

    #[test]
    fn load_test_6_external_waiters() {
        println!("\n=== LOAD TEST 6: Внешние ожидающие потоки ===");
        let pool = ExecutorPoolInner::new(2);
        pool.run();

        let promise = Promise::new(&pool);
        let mut future = promise.get_future();

        crossbeam::scope(|s| {
            s.spawn(|_| {
                thread::sleep(Duration::from_millis(30));
                promise.set_result(String::from("из другого потока")).unwrap();
            });
            assert_eq!(future.get().unwrap(), "из другого потока");
        })
        .unwrap();

        pool.shutdown();
    }

    #[test]
    fn load_test_7_shutdown_joins_workers() {
        println!("\n=== LOAD TEST 7: Остановка пула ===");
        let pool = ExecutorPoolInner::new(4);
        pool.run();

        let futures: Vec<_> = (0..100usize).map(|i| pool.post_task(move |_| i * 2)).collect();
        for (i, mut future) in futures.into_iter().enumerate() {
            assert_eq!(future.get().unwrap(), i * 2);
        }

        pool.shutdown();
        assert!(pool
            .executor_states()
            .iter()
            .all(|state| *state == ExecutorState::Stopped));

        // Повторная остановка — no-op
        pool.shutdown();
    }
}
