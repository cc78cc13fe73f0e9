//! Синхронный пул исполнителей с координацией через typed promise/future
//!
//! # Features
//! - Сегментированная FIFO-очередь задач с амортизированной аллокацией
//! - Promise/Future с единственным присваиванием и единственным потреблением
//! - Адресная побудка исполнителя, заблокированного на конкретном результате
//! - Встроенная диспетчеризация: ожидающий поток прокручивает чужие задачи
//! - Graceful shutdown с join всех воркеров
//! - Метрики пула

pub mod errors;
pub mod handle;
pub mod model;
pub mod pool;
pub mod queue;
pub mod result;

pub use handle::{Future, Promise};
pub use pool::{Config, Executor, ExecutorPool, ExecutorPoolInner, Task};
