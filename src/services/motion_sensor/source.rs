use crate::config::MotionConfig;
use crate::events::{MotionSample, RawSensorEvent};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::filter::SwayFilter;
use super::r#trait::{create_sensor_backend, SensorBackend};

/// Единственный получатель вычисленного раскачивания
pub type MotionCallback = Box<dyn FnMut(MotionSample) + Send>;

const RAW_QUEUE_CAPACITY: usize = 128;

struct SwayPipeline {
    filter: SwayFilter,
    callback: Option<MotionCallback>,
}

impl SwayPipeline {
    fn handle(&mut self, event: &RawSensorEvent) -> MotionSample {
        let sample = self.filter.update(event);
        if let Some(callback) = self.callback.as_mut() {
            callback(sample);
        }
        sample
    }
}

/// Сглаженный сигнал раскачивания устройства.
///
/// Отсутствие датчиков не ошибка: источник просто ничего не присылает.
pub struct MotionSensorSource {
    backend: Option<Box<dyn SensorBackend>>,
    initialized: bool,
    pipeline: Arc<Mutex<SwayPipeline>>,
    listener: Option<JoinHandle<()>>,
}

impl MotionSensorSource {
    pub fn new() -> Self {
        Self {
            backend: None,
            initialized: false,
            pipeline: Arc::new(Mutex::new(SwayPipeline {
                filter: SwayFilter::new(),
                callback: None,
            })),
            listener: None,
        }
    }

    #[cfg(test)]
    pub fn with_backend(backend: Box<dyn SensorBackend>) -> Self {
        let mut source = Self::new();
        source.backend = Some(backend);
        source.initialized = true;
        source
    }

    /// Найти датчики. Повторный вызов ничего не делает.
    pub fn initialize(&mut self, config: &MotionConfig, dry_run: bool) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        self.backend = create_sensor_backend(config, dry_run);

        if let Some(backend) = &self.backend {
            info!("Источник движения: {}", backend.name());
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    /// Заменить получателя раскачивания (последний записавший побеждает)
    pub fn set_motion_callback(&self, callback: MotionCallback) {
        self.pipeline.lock().callback = Some(callback);
    }

    pub fn start_listening(&mut self) {
        if self.listener.is_some() {
            return;
        }

        let Some(backend) = self.backend.as_mut() else {
            debug!("Датчиков нет, подписка на движение пропущена");
            return;
        };

        if tokio::runtime::Handle::try_current().is_err() {
            warn!("Нет активного runtime, датчики движения не запущены");
            return;
        }

        let (tx, mut rx) = mpsc::channel(RAW_QUEUE_CAPACITY);
        if let Err(e) = backend.start(tx) {
            warn!("Не удалось запустить датчики движения: {}", e);
            return;
        }

        let pipeline = Arc::clone(&self.pipeline);
        self.listener = Some(tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                pipeline.lock().handle(&event);
            }
        }));

        info!("Подписка на датчики движения запущена");
    }

    pub fn stop_listening(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };

        listener.abort();
        if let Some(backend) = self.backend.as_mut() {
            backend.stop();
        }
        info!("Подписка на датчики движения остановлена");
    }

    /// Обработать одно сырое событие так же, как это делает подписка
    #[cfg(test)]
    pub fn handle_raw_event(&self, event: &RawSensorEvent) -> MotionSample {
        self.pipeline.lock().handle(event)
    }

    pub fn cleanup(&mut self) {
        self.stop_listening();
        self.pipeline.lock().callback = None;
        self.backend = None;
    }
}

impl Default for MotionSensorSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MotionSensorSource {
    fn drop(&mut self) {
        self.stop_listening();
    }
}
