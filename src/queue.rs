use std::collections::VecDeque;
use std::mem::MaybeUninit;

/// Сегментированная FIFO-очередь: цепочка бинов фиксированной ёмкости.
///
/// Очередь растёт по одному бину за раз и никогда не перекладывает элементы:
/// адреса записанных элементов стабильны до извлечения. Исчерпанный головной
/// бин освобождается лениво, при следующей попытке pop. Очередь не
/// синхронизирована — все мутации выполняются под внешним локом пула.
pub struct SegmentedQueue<T, const BIN_CAPACITY: usize = 128> {
    // Бины в Box: рост VecDeque двигает только указатели, не слоты
    bins: VecDeque<Box<Bin<T, BIN_CAPACITY>>>,
    len: usize,
}

struct Bin<T, const N: usize> {
    size: usize,
    read_index: usize,
    slots: [MaybeUninit<T>; N],
}

impl<T, const N: usize> Bin<T, N> {
    fn new() -> Self {
        Self {
            size: 0,
            read_index: 0,
            // SAFETY: массив MaybeUninit не требует инициализации
            slots: unsafe { MaybeUninit::<[MaybeUninit<T>; N]>::uninit().assume_init() },
        }
    }

    #[inline(always)]
    fn is_full(&self) -> bool {
        self.size == N
    }

    #[inline(always)]
    fn can_pop(&self) -> bool {
        self.read_index < self.size
    }

    fn push(&mut self, value: T) {
        debug_assert!(self.size < N);
        self.slots[self.size].write(value);
        self.size += 1;
    }

    fn pop(&mut self) -> T {
        debug_assert!(self.can_pop());
        let index = self.read_index;
        self.read_index += 1;
        // SAFETY: слоты read_index..size записаны и ещё не извлечены
        unsafe { self.slots[index].assume_init_read() }
    }
}

impl<T, const N: usize> Drop for Bin<T, N> {
    fn drop(&mut self) {
        // Записанные, но не извлечённые элементы
        for slot in &mut self.slots[self.read_index..self.size] {
            // SAFETY: инвариант бина, см. pop()
            unsafe { slot.assume_init_drop() };
        }
    }
}

impl<T, const BIN_CAPACITY: usize> SegmentedQueue<T, BIN_CAPACITY> {
    pub fn new() -> Self {
        Self {
            bins: VecDeque::new(),
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Добавляет элемент в хвост, при необходимости аллоцируя новый бин.
    pub fn push(&mut self, value: T) {
        self.write_bin().push(value);
        self.len += 1;
    }

    /// Извлекает самый старый элемент; None на пустой очереди.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        loop {
            match self.bins.front_mut() {
                Some(bin) if bin.can_pop() => {
                    self.len -= 1;
                    return Some(bin.pop());
                }
                // Исчерпанный бин уничтожается при попытке pop по нему
                Some(_) => {
                    self.bins.pop_front();
                }
                None => return None,
            }
        }
    }

    /// Хвостовой бин для записи; новый создаётся, когда текущий заполнен
    /// или цепочка пуста.
    fn write_bin(&mut self) -> &mut Bin<T, BIN_CAPACITY> {
        if self.bins.back().map_or(true, |bin| bin.is_full()) {
            self.bins.push_back(Box::new(Bin::new()));
        }
        self.bins.back_mut().unwrap()
    }
}

impl<T, const BIN_CAPACITY: usize> Default for SegmentedQueue<T, BIN_CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}
