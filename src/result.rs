use parking_lot::{Condvar, Mutex};

use crate::errors::{ErrorPayload, FutureError, PromiseError};
use crate::pool::ExecutorPool;

pub type WaitResult<T> = Result<T, FutureError>;

/// Машина состояний результата: из Empty ровно один переход в Value либо
/// Error, дальше только Consumed при единственном потреблении.
pub(crate) enum ResultState<T> {
    Empty,
    Value(T),
    Error(ErrorPayload),
    Consumed,
}

struct SupplierCore<T> {
    result: ResultState<T>,
    /// Исполнитель, заблокированный именно на этом результате; None — никто
    awaiting_executor: Option<u16>,
}

/// Разделяемая ячейка результата за парой promise/future.
///
/// Время жизни несут ссылки Arc: одна у Promise (сторона производителя),
/// по одной у каждого Future (сторона потребителей). Ячейка освобождается
/// ровно один раз, когда обе стороны отпустили свои ссылки, в любом порядке
/// и из любого потока.
pub(crate) struct ResultSupplier<T> {
    pool: ExecutorPool,
    core: Mutex<SupplierCore<T>>,
    /// Побудка внешних (не-исполнительских) ожидающих
    ready: Condvar,
}

impl<T> ResultSupplier<T> {
    pub(crate) fn new(pool: ExecutorPool) -> Self {
        Self {
            pool,
            core: Mutex::new(SupplierCore {
                result: ResultState::Empty,
                awaiting_executor: None,
            }),
            ready: Condvar::new(),
        }
    }

    pub(crate) fn pool(&self) -> &ExecutorPool {
        &self.pool
    }

    pub(crate) fn is_ready(&self) -> bool {
        !matches!(self.core.lock().result, ResultState::Empty)
    }

    /// Записывает терминальное состояние и принимает решение о побудке
    /// атомарно с ним: зарегистрированный исполнитель забирается под тем же
    /// локом, что и запись. Сигналы уходят после освобождения лока —
    /// готовность к этому моменту уже опубликована, побудка потеряться
    /// не может.
    pub(crate) fn fulfill(&self, outcome: ResultState<T>) -> Result<(), PromiseError> {
        let awaiting = {
            let mut core = self.core.lock();
            if !matches!(core.result, ResultState::Empty) {
                return Err(PromiseError::AlreadySet);
            }
            core.result = outcome;
            core.awaiting_executor.take()
        };
        if let Some(index) = awaiting {
            self.pool.notify_executor(index);
        }
        self.ready.notify_all();
        Ok(())
    }

    /// Регистрирует исполнителя единственным адресатом побудки.
    /// Ok(true) — результат уже готов, спать не нужно.
    pub(crate) fn register_awaiter(&self, executor_index: u16) -> Result<bool, FutureError> {
        let mut core = self.core.lock();
        if !matches!(core.result, ResultState::Empty) {
            return Ok(true);
        }
        if core.awaiting_executor.is_some() {
            return Err(FutureError::AlreadyAwaited);
        }
        core.awaiting_executor = Some(executor_index);
        Ok(false)
    }

    /// Неблокирующее извлечение: None, пока результат не поставлен.
    pub(crate) fn try_take(&self) -> Option<WaitResult<T>> {
        let mut core = self.core.lock();
        Self::take_locked(&mut core)
    }

    /// Блокирующее извлечение для внешних потоков: ждёт готовности на
    /// собственной условной переменной ячейки. Исполнители сюда попадают
    /// только с уже готовым результатом.
    pub(crate) fn take_blocking(&self) -> WaitResult<T> {
        let mut core = self.core.lock();
        loop {
            if let Some(result) = Self::take_locked(&mut core) {
                return result;
            }
            self.ready.wait(&mut core);
        }
    }

    fn take_locked(core: &mut SupplierCore<T>) -> Option<WaitResult<T>> {
        match std::mem::replace(&mut core.result, ResultState::Consumed) {
            ResultState::Empty => {
                core.result = ResultState::Empty;
                None
            }
            ResultState::Value(value) => Some(Ok(value)),
            ResultState::Error(payload) => Some(Err(FutureError::Failed(payload))),
            ResultState::Consumed => Some(Err(FutureError::AlreadyConsumed)),
        }
    }
}

/// Нетипизированный зонд готовности для стека ожиданий исполнителя.
pub(crate) trait ResultProbe: Send + Sync {
    fn is_fulfilled(&self) -> bool;
}

impl<T: Send> ResultProbe for ResultSupplier<T> {
    fn is_fulfilled(&self) -> bool {
        self.is_ready()
    }
}
