use std::any::Any;
use std::sync::Arc;

use crate::errors::{BrokenPromise, ErrorPayload, PromiseError};
use crate::pool::{Executor, ExecutorPool};
use crate::result::{ResultProbe, ResultState, ResultSupplier, WaitResult};

/// Пишущая сторона пары promise/future: единственное присваивание результата.
///
/// Promise не клонируется; разветвление на несколько ожидающих делается
/// повторными вызовами get_future().
pub struct Promise<T> {
    supplier: Arc<ResultSupplier<T>>,
}

impl<T> Promise<T> {
    /// Свежая ячейка результата, привязанная к пулу ради адресной побудки.
    pub fn new(pool: &ExecutorPool) -> Self {
        Self {
            supplier: Arc::new(ResultSupplier::new(Arc::clone(pool))),
        }
    }

    /// Новый Future над той же ячейкой; может вызываться многократно.
    pub fn get_future(&self) -> Future<T> {
        Future {
            supplier: Arc::clone(&self.supplier),
        }
    }

    pub fn set_result(&self, value: T) -> Result<(), PromiseError> {
        self.supplier.fulfill(ResultState::Value(value))
    }

    /// Захватывает произвольную ошибку производителя; get() перебросит её
    /// без изменений.
    pub fn set_exception<E: Any + Send + 'static>(&self, exception: E) -> Result<(), PromiseError> {
        self.supplier.fulfill(ResultState::Error(Box::new(exception)))
    }

    /// Payload пойманной паники задачи, как есть.
    pub(crate) fn set_panic(&self, payload: ErrorPayload) -> Result<(), PromiseError> {
        self.supplier.fulfill(ResultState::Error(payload))
    }
}

impl<T> Drop for Promise<T> {
    fn drop(&mut self) {
        // Производитель ушёл без результата: потребители получают
        // BrokenPromise. Если результат уже стоит — no-op.
        let _ = self.supplier.fulfill(ResultState::Error(Box::new(BrokenPromise)));
    }
}

/// Читающая сторона: извлекает результат перемещением, при необходимости
/// блокируясь. Потребление единственное — повторный get() вернёт
/// FutureError::AlreadyConsumed, в том числе через другой Future той же
/// ячейки.
pub struct Future<T> {
    supplier: Arc<ResultSupplier<T>>,
}

impl<T> Future<T> {
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.supplier.is_ready()
    }

    /// Неблокирующее извлечение: None, пока результата нет.
    pub fn try_get(&mut self) -> Option<WaitResult<T>> {
        self.supplier.try_take()
    }

    /// Извлекает значение либо перебрасывает ошибку производителя.
    /// Внешний поток блокируется на условной переменной ячейки; изнутри
    /// задач используйте wait() с исполнителем.
    pub fn get(&mut self) -> WaitResult<T> {
        self.supplier.take_blocking()
    }
}

impl<T: Send + 'static> Future<T> {
    /// Блокирующий примитив исполнителя: сперва прокручивает одну чужую
    /// задачу из очереди (поток остаётся полезным), затем регистрируется
    /// адресатом побудки и спит до уведомления.
    pub fn wait(&mut self, executor: &Executor) -> WaitResult<T> {
        let pool = Arc::clone(self.supplier.pool());
        pool.proceed(executor);

        if !self.supplier.register_awaiter(executor.index())? {
            let probe: Arc<dyn ResultProbe> = self.supplier.clone();
            executor.await_fulfillment(probe);
        }
        self.supplier.take_blocking()
    }
}
