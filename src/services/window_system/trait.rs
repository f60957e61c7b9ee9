use crate::catalog::{HangerDecoration, ImageSource};
use std::fmt;
use thiserror::Error;

/// Идентификатор окна, выданный оконной системой
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowHandle(pub u64);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// Край экрана, от которого отсчитывается вертикальная координата
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gravity {
    TopStart,
    BottomStart,
}

/// Параметры раскладки оверлейного окна (в пикселях и градусах)
#[derive(Debug, Clone, PartialEq)]
pub struct WindowLayout {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub gravity: Gravity,
    pub rotation: f32,
    pub mirrored: bool,
    pub visible: bool,
    pub image: ImageSource,
    pub hanger: Option<HangerDecoration>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("нет разрешения на показ поверх других окон")]
    PermissionDenied,

    #[error("окно {0} не присоединено")]
    NotAttached(WindowHandle),

    #[error("некорректные параметры окна: {0}")]
    InvalidLayout(String),
}

/// Оконная система, умеющая показывать окна поверх всех приложений.
///
/// Не потокобезопасна: все вызовы идут из одного цикла сервиса.
pub trait WindowSystem {
    fn try_add_window(&mut self, tag: &str, layout: &WindowLayout) -> Result<WindowHandle, WindowError>;
    fn try_update_window(&mut self, handle: WindowHandle, layout: &WindowLayout) -> Result<(), WindowError>;
    fn try_remove_window(&mut self, handle: WindowHandle) -> Result<(), WindowError>;
}
