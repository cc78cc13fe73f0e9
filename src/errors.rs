use std::any::Any;
use std::fmt;

use thiserror::Error;

/// Непрозрачный груз ошибки производителя: паника задачи или произвольное
/// значение из set_exception. Перебрасывается на стороне get() без изменений.
pub type ErrorPayload = Box<dyn Any + Send + 'static>;

/// Сообщение из груза, если он строковый (как у payload паники).
pub fn payload_message(payload: &ErrorPayload) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string payload"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PromiseError {
    /// Нарушение единственного присваивания результата
    #[error("result is already set")]
    AlreadySet,
}

/// Производитель уничтожен, не поставив результат; потребители получают
/// этот груз вместо вечного ожидания.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("promise dropped before supplying a result")]
pub struct BrokenPromise;

#[derive(Error)]
pub enum FutureError {
    /// Ошибка производителя, переброшенная как есть
    #[error("task failed: {}", payload_message(.0))]
    Failed(ErrorPayload),
    /// Нарушение единственного потребления
    #[error("result is already consumed")]
    AlreadyConsumed,
    /// На этой ячейке уже зарегистрирован другой исполнитель
    #[error("another executor is already awaiting this result")]
    AlreadyAwaited,
}

impl FutureError {
    /// Груз ошибки производителя, если он есть.
    pub fn into_payload(self) -> Option<ErrorPayload> {
        match self {
            Self::Failed(payload) => Some(payload),
            _ => None,
        }
    }
}

// Ручной Debug: груз не обязан реализовывать Debug
impl fmt::Debug for FutureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(payload) => f
                .debug_tuple("Failed")
                .field(&payload_message(payload))
                .finish(),
            Self::AlreadyConsumed => f.write_str("AlreadyConsumed"),
            Self::AlreadyAwaited => f.write_str("AlreadyAwaited"),
        }
    }
}

/// Базовая ошибка рантайма
#[derive(Debug, Error)]
pub enum Error {
    #[error("promise error: {0}")]
    Promise(#[from] PromiseError),
    #[error("future error: {0}")]
    Future(#[from] FutureError),
}
