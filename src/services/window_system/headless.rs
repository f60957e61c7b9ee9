use super::r#trait::{WindowError, WindowHandle, WindowLayout, WindowSystem};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct TableState {
    windows: BTreeMap<WindowHandle, (String, WindowLayout)>,
    next_handle: u64,
    add_attempts: usize,
    remove_attempts: usize,
    permission_revoked: bool,
}

/// Read-only view of the headless window table.
#[derive(Debug, Clone, Default)]
pub struct WindowTable {
    state: Arc<RwLock<TableState>>,
}

impl WindowTable {
    pub fn window_count(&self) -> usize {
        self.state.read().windows.len()
    }

    #[cfg(test)]
    pub fn layout(&self, handle: WindowHandle) -> Option<WindowLayout> {
        self.state.read().windows.get(&handle).map(|(_, layout)| layout.clone())
    }

    /// Layout of the first window created for `tag`
    #[cfg(test)]
    pub fn layout_by_tag(&self, tag: &str) -> Option<WindowLayout> {
        self.state
            .read()
            .windows
            .values()
            .find(|(t, _)| t == tag)
            .map(|(_, layout)| layout.clone())
    }

    pub fn add_attempts(&self) -> usize {
        self.state.read().add_attempts
    }

    pub fn remove_attempts(&self) -> usize {
        self.state.read().remove_attempts
    }

    #[cfg(test)]
    pub fn revoke_permission(&self) {
        self.state.write().permission_revoked = true;
    }
}

/// Оконная система без дисплея: ведёт таблицу окон и пишет операции в лог
pub struct HeadlessWindowSystem {
    table: WindowTable,
}

impl HeadlessWindowSystem {
    pub fn new() -> Self {
        info!("Инициализация HeadlessWindowSystem");
        Self {
            table: WindowTable::default(),
        }
    }

    pub fn table(&self) -> WindowTable {
        self.table.clone()
    }

    fn validate(layout: &WindowLayout) -> Result<(), WindowError> {
        if layout.width <= 0 || layout.height <= 0 {
            return Err(WindowError::InvalidLayout(format!(
                "размер {}x{}",
                layout.width, layout.height
            )));
        }
        if !layout.rotation.is_finite() {
            return Err(WindowError::InvalidLayout(format!("поворот {}", layout.rotation)));
        }
        Ok(())
    }
}

impl Default for HeadlessWindowSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowSystem for HeadlessWindowSystem {
    fn try_add_window(&mut self, tag: &str, layout: &WindowLayout) -> Result<WindowHandle, WindowError> {
        let mut state = self.table.state.write();
        state.add_attempts += 1;

        if state.permission_revoked {
            return Err(WindowError::PermissionDenied);
        }
        Self::validate(layout)?;

        state.next_handle += 1;
        let handle = WindowHandle(state.next_handle);
        state.windows.insert(handle, (tag.to_string(), layout.clone()));

        info!(
            "Окно {} для {} создано: {}x{} в ({}, {}), {:?}, {}",
            handle, tag, layout.width, layout.height, layout.x, layout.y, layout.gravity, layout.image
        );
        Ok(handle)
    }

    fn try_update_window(&mut self, handle: WindowHandle, layout: &WindowLayout) -> Result<(), WindowError> {
        Self::validate(layout)?;

        let mut state = self.table.state.write();
        match state.windows.get_mut(&handle) {
            Some((_, current)) => {
                *current = layout.clone();
                crate::trace_if_enabled!(
                    "Окно {}: ({}, {}) rot={:.1} mirror={} visible={} {}",
                    handle,
                    layout.x,
                    layout.y,
                    layout.rotation,
                    layout.mirrored,
                    layout.visible,
                    layout.image
                );
                Ok(())
            }
            None => Err(WindowError::NotAttached(handle)),
        }
    }

    fn try_remove_window(&mut self, handle: WindowHandle) -> Result<(), WindowError> {
        let mut state = self.table.state.write();
        state.remove_attempts += 1;

        match state.windows.remove(&handle) {
            Some((tag, _)) => {
                debug!("Окно {} ({}) удалено", handle, tag);
                Ok(())
            }
            None => Err(WindowError::NotAttached(handle)),
        }
    }
}
