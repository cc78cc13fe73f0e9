/// Состояние исполнителя
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    /// Ищет работу или спит без неё
    Idle,
    /// Выполняет задачу
    Running,
    /// Заблокирован на конкретном результате
    Awaiting,
    /// Вышел из рабочего цикла при остановке пула
    Stopped,
}

#[derive(Debug, Clone)]
pub struct PoolMetrics {
    pub num_executors: usize,
    pub queued_tasks: usize,
    pub idle_executors: usize,
    pub posted_tasks: usize,
    pub completed_tasks: usize,
}

impl PoolMetrics {
    pub fn utilization(&self) -> f64 {
        if self.num_executors == 0 {
            return 0.0;
        }
        (self.num_executors - self.idle_executors) as f64 / self.num_executors as f64
    }

    pub fn queue_pressure(&self) -> f64 {
        self.queued_tasks as f64
    }
}
