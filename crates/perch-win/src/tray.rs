//! `tray-icon` integration: the status item and its context menu.

use perch_core::PerchConfig;
use perch_platform::{
    ContextMenu, EventTarget, InputEvent, MouseButton, Rect, Result, StatusItem, Vec2,
};
use tracing::{debug, warn};
use tray_icon::dpi::{PhysicalPosition, Position};
use tray_icon::menu::{ContextMenu as _, Menu, MenuId, MenuItem, PredefinedMenuItem};
use tray_icon::{Icon, MouseButtonState, TrayIcon, TrayIconBuilder, TrayIconEvent};

use crate::hooks::current_modifiers;
use crate::overlay::{primary_height, shell_point};
use crate::{box_err, post, ShellEvent};

/// Menu entries the message loop reacts to.
pub struct MenuIds {
    pub open: MenuId,
    pub grow: MenuId,
    pub shrink: MenuId,
    pub exit: MenuId,
}

pub struct TrayStatusItem {
    tray: TrayIcon,
}

impl StatusItem for TrayStatusItem {
    fn anchor_rect(&self) -> Option<Rect> {
        let rect = self.tray.rect()?;
        let height = rect.size.height as f32;
        Some(Rect::new(
            rect.position.x as f32,
            (primary_height() as f64 - rect.position.y) as f32 - height,
            rect.size.width as f32,
            height,
        ))
    }

    fn set_highlighted(&mut self, highlighted: bool) {
        // The notification area has no pressed state for icons.
        debug!("tray highlight -> {highlighted}");
    }

    fn set_visible(&mut self, visible: bool) {
        if let Err(err) = self.tray.set_visible(visible) {
            warn!("failed to set tray icon visibility: {err}");
        }
    }

    fn set_title(&mut self, title: &str) {
        if let Err(err) = self.tray.set_tooltip(Some(title)) {
            warn!("failed to set tray tooltip: {err}");
        }
    }
}

pub struct TrayMenu {
    menu: Menu,
    owner_hwnd: isize,
}

impl ContextMenu for TrayMenu {
    fn pop_up(&mut self, at: Vec2) {
        let position = PhysicalPosition::new(
            at.x.round() as i32,
            (primary_height() as f32 - at.y).round() as i32,
        );
        let shown = unsafe {
            self.menu
                .show_context_menu_for_hwnd(self.owner_hwnd, Some(Position::Physical(position)))
        };
        if !shown {
            warn!("tray context menu did not open");
        }
    }
}

fn load_icon(config: &PerchConfig) -> Result<Icon> {
    if let Some(path) = &config.icon_path {
        let image = image::open(path).map_err(box_err)?.into_rgba8();
        let (width, height) = image.dimensions();
        return Icon::from_rgba(image.into_raw(), width, height).map_err(box_err);
    }
    // Placeholder 16x16 white square icon
    let (w, h) = (16, 16);
    let mut rgba = vec![0u8; (w * h * 4) as usize];
    for px in rgba.chunks_exact_mut(4) {
        px.copy_from_slice(&[255, 255, 255, 255]);
    }
    Icon::from_rgba(rgba, w, h).map_err(box_err)
}

pub fn create_status_item(
    config: &PerchConfig,
    owner_hwnd: isize,
) -> Result<(TrayStatusItem, TrayMenu, MenuIds)> {
    let icon = load_icon(config)?;

    let menu = Menu::new();
    let open_item = MenuItem::new("Open", true, None);
    let grow_item = MenuItem::new("Taller Content", true, None);
    let shrink_item = MenuItem::new("Shorter Content", true, None);
    let exit_item = MenuItem::new("Exit", true, None);
    let ids = MenuIds {
        open: open_item.id().clone(),
        grow: grow_item.id().clone(),
        shrink: shrink_item.id().clone(),
        exit: exit_item.id().clone(),
    };
    menu.append(&open_item).map_err(box_err)?;
    menu.append(&grow_item).map_err(box_err)?;
    menu.append(&shrink_item).map_err(box_err)?;
    menu.append(&PredefinedMenuItem::separator()).map_err(box_err)?;
    menu.append(&exit_item).map_err(box_err)?;

    // The indicator decides when the menu shows, so it is not attached to the icon.
    let tray = TrayIconBuilder::new()
        .with_icon(icon)
        .with_tooltip(&config.title)
        .build()
        .map_err(box_err)?;

    Ok((TrayStatusItem { tray }, TrayMenu { menu, owner_hwnd }, ids))
}

/// Forwards tray presses to the loop, where local monitors see them.
pub fn route_tray_events() {
    TrayIconEvent::set_event_handler(Some(|event: TrayIconEvent| {
        if let TrayIconEvent::Click {
            position,
            button,
            button_state: MouseButtonState::Down,
            ..
        } = event
        {
            let button = match button {
                tray_icon::MouseButton::Left => MouseButton::Primary,
                tray_icon::MouseButton::Right => MouseButton::Secondary,
                _ => MouseButton::Other,
            };
            let press = InputEvent::press(button, EventTarget::Indicator)
                .with_modifiers(current_modifiers())
                .at(shell_point(position.x as i32, position.y as i32));
            post(ShellEvent::TrayPress(press));
        }
    }));
}

pub fn route_menu_events() {
    tray_icon::menu::MenuEvent::set_event_handler(Some(|event: tray_icon::menu::MenuEvent| {
        post(ShellEvent::Menu(event.id().clone()));
    }));
}
