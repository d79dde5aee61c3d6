//! Outside-interaction detection and navigation targets.

use std::sync::Mutex;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Visual bounds of the widget (input plus dropdown).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub origin: Point,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            width,
            height,
        }
    }

    /// Half-open: the far edges belong to whatever is next to the widget.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.origin.x
            && p.y >= self.origin.y
            && p.x < self.origin.x + self.width
            && p.y < self.origin.y + self.height
    }
}

/// Keys the widget reacts to directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
}

/// Client-side route transition (no page reload).
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Navigator that only records the routes it was asked to visit.
#[derive(Debug, Default)]
pub struct RouteHistory {
    routes: Mutex<Vec<String>>,
}

impl RouteHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<String> {
        self.routes
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<String> {
        self.routes.lock().ok().and_then(|r| r.last().cloned())
    }
}

impl Navigator for RouteHistory {
    fn navigate(&self, route: &str) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.push(route.to_string());
        }
    }
}
