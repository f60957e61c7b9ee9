use crate::config::DisplayConfig;
use crate::services::window_system::Gravity;

/// Высота системной панели на платформах без API отступов, в dp
pub const LEGACY_STATUS_BAR_DP: f32 = 24.0;

/// Высота системной панели и то, как она получена
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemBarInset {
    /// Реальное значение от платформы
    Measured(i32),
    /// Константа 24 dp для старых платформ
    Legacy(i32),
}

impl SystemBarInset {
    pub fn height(&self) -> i32 {
        match self {
            SystemBarInset::Measured(px) | SystemBarInset::Legacy(px) => *px,
        }
    }
}

/// Read-only screen context shared by every overlay entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenMetrics {
    pub width_px: i32,
    pub height_px: i32,
    pub density: f32,
    pub system_bar: SystemBarInset,
}

impl Default for ScreenMetrics {
    fn default() -> Self {
        Self {
            width_px: 0,
            height_px: 0,
            density: 1.0,
            system_bar: SystemBarInset::Legacy(LEGACY_STATUS_BAR_DP as i32),
        }
    }
}

impl ScreenMetrics {
    pub fn new(width_px: i32, height_px: i32, density: f32, system_bar: SystemBarInset) -> Self {
        Self {
            width_px,
            height_px,
            density,
            system_bar,
        }
    }

    pub fn from_config(display: &DisplayConfig) -> Self {
        let system_bar = match (display.inset_api, display.status_bar_inset_px) {
            (true, Some(px)) => SystemBarInset::Measured(px),
            _ => SystemBarInset::Legacy((LEGACY_STATUS_BAR_DP * display.density).round() as i32),
        };

        Self::new(
            display.width_px as i32,
            display.height_px as i32,
            display.density,
            system_bar,
        )
    }

    /// dp -> px
    pub fn scale(&self, dp: u32) -> i32 {
        (dp as f32 * self.density).round() as i32
    }

    pub fn gravity(at_bottom: bool) -> Gravity {
        if at_bottom {
            Gravity::BottomStart
        } else {
            Gravity::TopStart
        }
    }

    /// Вертикальная координата окна от выбранного края.
    ///
    /// У верхнего края с реальным отступом окно поднимается на треть системной панели.
    pub fn vertical_offset(&self, y_position: i32, at_bottom: bool) -> i32 {
        if at_bottom {
            return y_position;
        }
        match self.system_bar {
            SystemBarInset::Measured(px) => y_position.saturating_sub(px / 3),
            SystemBarInset::Legacy(_) => y_position,
        }
    }

    /// Правая граница прогулки для окна шириной `scaled_width`
    pub fn walk_bound(&self, scaled_width: i32) -> i32 {
        (self.width_px - scaled_width).max(0)
    }

    /// Те же метрики после поворота экрана
    pub fn oriented(&self, landscape: bool) -> Self {
        let long = self.width_px.max(self.height_px);
        let short = self.width_px.min(self.height_px);
        let (width_px, height_px) = if landscape { (long, short) } else { (short, long) };
        Self {
            width_px,
            height_px,
            ..*self
        }
    }
}
