use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam::utils::CachePadded;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

use crate::handle::{Future, Promise};
use crate::model::{ExecutorState, PoolMetrics};
use crate::queue::SegmentedQueue;
use crate::result::{ResultProbe, WaitResult};

/// Конфигурация пула исполнителей
#[derive(Debug, Clone)]
pub struct Config {
    pub num_executors: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_executors: num_cpus::get(),
        }
    }
}

pub type ExecutorPool = Arc<ExecutorPoolInner>;

#[inline(always)]
fn unlikely(b: bool) -> bool {
    #[cold]
    fn cold() {}
    if !b {
        cold()
    }
    b
}

/// Единица работы: вызывается с исполняющим её Executor в качестве контекста.
/// Возвращаемого значения нет — результат передаётся через Promise,
/// захваченный замыканием.
pub trait Task: Send {
    fn run(self: Box<Self>, executor: &Executor);
}

impl<F> Task for F
where
    F: FnOnce(&Executor) + Send,
{
    fn run(self: Box<Self>, executor: &Executor) {
        (*self)(executor)
    }
}

type BoxedTask = Box<dyn Task>;

struct ExecutorCore {
    state: ExecutorState,
    /// Токен побудки: notify() ставит, спящая сторона снимает
    notified: bool,
    /// Стек ячеек, на которых исполнитель заблокирован; глубина больше
    /// единицы возникает при вложенных wait через встроенную
    /// диспетчеризацию proceed()
    awaiting: Vec<Arc<dyn ResultProbe>>,
}

/// Один воркер, привязанный к собственному OS-потоку.
pub struct Executor {
    index: u16,
    core: Mutex<ExecutorCore>,
    activation: Condvar,
}

impl Executor {
    fn new(index: u16) -> Self {
        Self {
            index,
            core: Mutex::new(ExecutorCore {
                state: ExecutorState::Idle,
                notified: false,
                awaiting: Vec::new(),
            }),
            activation: Condvar::new(),
        }
    }

    #[inline]
    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn state(&self) -> ExecutorState {
        self.core.lock().state
    }

    /// Блокируется на future изнутри выполняемой задачи.
    pub fn wait<T: Send + 'static>(&self, future: &mut Future<T>) -> WaitResult<T> {
        future.wait(self)
    }

    /// Будит именно этот исполнитель. Скоуповый захват мьютекса до сигнала
    /// публикует токен для спящей стороны; вызывается из любого потока.
    pub(crate) fn notify(&self) {
        {
            let mut core = self.core.lock();
            core.notified = true;
        }
        self.activation.notify_one();
    }

    /// Сон без работы: до установки токена побудки.
    fn wait_for_task(&self) {
        let mut core = self.core.lock();
        core.state = ExecutorState::Idle;
        while !core.notified {
            self.activation.wait(&mut core);
        }
        core.notified = false;
    }

    /// Сон в ожидании конкретного результата. Кадр перепроверяет свою
    /// ячейку после каждой побудки, поэтому сигнал, потреблённый вложенным
    /// кадром, не теряется: внешний кадр увидит готовность до засыпания.
    pub(crate) fn await_fulfillment(&self, probe: Arc<dyn ResultProbe>) {
        let mut core = self.core.lock();
        core.awaiting.push(probe);
        let previous = core.state;
        // Верх стека — ячейка текущего кадра: вложенные кадры из proceed()
        // завершаются до засыпания внешнего
        while core.awaiting.last().map_or(false, |p| !p.is_fulfilled()) {
            core.state = ExecutorState::Awaiting;
            while !core.notified {
                self.activation.wait(&mut core);
            }
            core.notified = false;
        }
        core.awaiting.pop();
        core.state = previous;
    }

    fn set_state(&self, state: ExecutorState) {
        self.core.lock().state = state;
    }
}

struct PoolCore {
    tasks: SegmentedQueue<BoxedTask>,
    /// Исполнители, зарегистрировавшиеся спящими без работы
    idle: Vec<u16>,
    /// Исполнитель, выполняющий встроенную диспетчеризацию, если есть
    active_executor: Option<u16>,
}

/// Пул исполнителей: владеет воркерами и общей очередью задач, решает
/// стратегию побудки при выполнении promise.
pub struct ExecutorPoolInner {
    core: Mutex<PoolCore>,
    executors: Vec<CachePadded<Executor>>,
    started: AtomicBool,
    shutdown: AtomicBool,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
    posted_tasks: AtomicUsize,
    completed_tasks: AtomicUsize,
}

impl ExecutorPoolInner {
    pub fn new(num_executors: usize) -> ExecutorPool {
        Self::with_config(Config { num_executors })
    }

    pub fn with_config(config: Config) -> ExecutorPool {
        assert!(config.num_executors > 0, "pool requires at least one executor");
        assert!(
            config.num_executors <= usize::from(u16::MAX),
            "executor index is 16-bit"
        );

        let executors = (0..config.num_executors)
            .map(|index| CachePadded::new(Executor::new(index as u16)))
            .collect();

        Arc::new(Self {
            core: Mutex::new(PoolCore {
                tasks: SegmentedQueue::new(),
                idle: Vec::with_capacity(config.num_executors),
                active_executor: None,
            }),
            executors,
            started: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            workers: Mutex::new(Vec::with_capacity(config.num_executors)),
            posted_tasks: AtomicUsize::new(0),
            completed_tasks: AtomicUsize::new(0),
        })
    }

    #[inline]
    pub fn num_executors(&self) -> usize {
        self.executors.len()
    }

    /// Запускает по одному воркер-потоку на исполнителя. Повторный запуск
    /// отклоняется.
    pub fn run(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("executor pool is already running");
            return;
        }
        let mut workers = self.workers.lock();
        for index in 0..self.executors.len() {
            let pool = Arc::clone(self);
            let handle = thread::Builder::new()
                .name(format!("executor-{index}"))
                .spawn(move || pool.worker_loop(index))
                .expect("failed to spawn executor thread");
            workers.push(handle);
        }
    }

    /// Ставит задачу в очередь; результат, если нужен, задача передаёт через
    /// захваченный Promise.
    pub fn post(&self, task: impl Task + 'static) {
        self.push_task(Box::new(task));
    }

    /// Оборачивает замыкание в задачу с готовой парой promise/future.
    /// Паника замыкания ловится и становится грузом ошибки результата.
    pub fn post_task<F, R>(self: &Arc<Self>, f: F) -> Future<R>
    where
        F: FnOnce(&Executor) -> R + Send + 'static,
        R: Send + 'static,
    {
        let promise = Promise::new(self);
        let future = promise.get_future();
        self.push_task(Box::new(move |executor: &Executor| {
            match catch_unwind(AssertUnwindSafe(|| f(executor))) {
                Ok(value) => {
                    let _ = promise.set_result(value);
                }
                Err(payload) => {
                    let _ = promise.set_panic(payload);
                }
            }
        }));
        future
    }

    /// Останавливает пул: флаг остановки, побудка всех исполнителей, join
    /// всех воркеров. Вызывается снаружи пула; повторный вызов — no-op.
    /// Исполнитель, заблокированный на так и не выполненном promise,
    /// остановку не увидит — разрешайте все promise до неё.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("executor pool shutting down");
        self.core.lock().idle.clear();
        for executor in self.executors.iter() {
            executor.notify();
        }
        let mut workers = self.workers.lock();
        for handle in workers.drain(..) {
            let _ = handle.join();
        }
    }

    pub fn metrics(&self) -> PoolMetrics {
        let core = self.core.lock();
        PoolMetrics {
            num_executors: self.executors.len(),
            queued_tasks: core.tasks.len(),
            idle_executors: core.idle.len(),
            posted_tasks: self.posted_tasks.load(Ordering::Relaxed),
            completed_tasks: self.completed_tasks.load(Ordering::Relaxed),
        }
    }

    pub fn executor_states(&self) -> Vec<ExecutorState> {
        self.executors.iter().map(|e| e.state()).collect()
    }

    /// Адресная побудка: исполнитель, зарегистрированный на результате,
    /// сигналится напрямую, минуя общий путь разбора очереди.
    pub(crate) fn notify_executor(&self, index: u16) {
        trace!(executor = index, "targeted wake");
        self.executors[usize::from(index)].notify();
    }

    /// Встроенная диспетчеризация: исполнитель, собирающийся блокироваться,
    /// прокручивает одну задачу из очереди, чтобы поток оставался полезным.
    pub(crate) fn proceed(&self, executor: &Executor) {
        let (task, previous) = {
            let mut core = self.core.lock();
            match core.tasks.pop() {
                Some(task) => (Some(task), core.active_executor.replace(executor.index())),
                None => (None, core.active_executor),
            }
        };
        if let Some(task) = task {
            trace!(executor = executor.index(), "inline dispatch");
            self.run_task(task, executor);
            self.core.lock().active_executor = previous;
        }
    }

    fn push_task(&self, task: BoxedTask) {
        self.posted_tasks.fetch_add(1, Ordering::Relaxed);
        let sleeper = {
            let mut core = self.core.lock();
            core.tasks.push(task);
            // Соня выбирается той же критической секцией, что и push
            core.idle.pop()
        };
        trace!("task queued");
        if let Some(index) = sleeper {
            self.executors[usize::from(index)].notify();
        }
    }

    fn run_task(&self, task: BoxedTask, executor: &Executor) {
        executor.set_state(ExecutorState::Running);
        task.run(executor);
        self.completed_tasks.fetch_add(1, Ordering::Relaxed);
    }

    fn worker_loop(&self, index: usize) {
        let executor: &Executor = &self.executors[index];
        debug!(index, "executor started");
        loop {
            if unlikely(self.shutdown.load(Ordering::Acquire)) {
                break;
            }
            // Наблюдение пустой очереди и регистрация спящим — одна
            // критическая секция, иначе push_task может не увидеть соню
            let task = {
                let mut core = self.core.lock();
                core.idle.retain(|&i| i != executor.index);
                match core.tasks.pop() {
                    Some(task) => Some(task),
                    None => {
                        core.idle.push(executor.index);
                        None
                    }
                }
            };
            match task {
                Some(task) => self.run_task(task, executor),
                None => executor.wait_for_task(),
            }
        }
        executor.set_state(ExecutorState::Stopped);
        debug!(index, "executor stopped");
    }
}
