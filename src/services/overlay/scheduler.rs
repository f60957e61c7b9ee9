use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};
use tokio::time::Instant;

/// Отложенные тики анимации: не больше одного ожидающего тика на персонажа.
///
/// Отмена удаляет тик из очереди сразу, поэтому после `cancel` он уже не сработает.
#[derive(Debug, Default)]
pub struct TickScheduler {
    queue: BTreeMap<(Instant, u64), String>,
    pending: HashMap<String, (Instant, u64)>,
    next_seq: u64,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Запланировать тик, заменив уже ожидающий
    pub fn schedule(&mut self, id: &str, deadline: Instant) {
        self.cancel(id);

        let key = (deadline, self.next_seq);
        self.next_seq = self.next_seq.wrapping_add(1);
        self.queue.insert(key, id.to_string());
        self.pending.insert(id.to_string(), key);
    }

    pub fn cancel(&mut self, id: &str) -> bool {
        match self.pending.remove(id) {
            Some(key) => {
                self.queue.remove(&key);
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn deadline(&self, id: &str) -> Option<Instant> {
        self.pending.get(id).map(|(deadline, _)| *deadline)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Забрать все тики со сроком не позже `now`, в порядке сроков
    pub fn pop_due(&mut self, now: Instant) -> SmallVec<[String; 4]> {
        let mut due = SmallVec::new();
        while let Some(entry) = self.queue.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let id = entry.remove();
            self.pending.remove(&id);
            due.push(id);
        }
        due
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.pending.clear();
    }
}
