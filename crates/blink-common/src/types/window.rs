use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque native window handle assigned by the engine at window creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub isize);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window-{}", self.0)
    }
}

/// Native UI message kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageKind(pub u32);

impl MessageKind {
    pub const NULL: Self = Self(0x0000);
    pub const DESTROY: Self = Self(0x0002);
    pub const CLOSE: Self = Self(0x0010);
    /// First kind available for application-defined messages.
    pub const USER: Self = Self(0x0400);

    pub fn name(self) -> &'static str {
        match self {
            Self::NULL => "null",
            Self::DESTROY => "destroy",
            Self::CLOSE => "close",
            _ if self.0 >= Self::USER.0 => "user",
            _ => "native",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:04x})", self.name(), self.0)
    }
}

/// One inbound UI message: target window, kind, and two machine words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub window: WindowId,
    pub kind: MessageKind,
    pub wparam: usize,
    pub lparam: isize,
}

impl Message {
    pub fn new(window: WindowId, kind: MessageKind) -> Self {
        Self {
            window,
            kind,
            wparam: 0,
            lparam: 0,
        }
    }

    pub fn with_params(mut self, wparam: usize, lparam: isize) -> Self {
        self.wparam = wparam;
        self.lparam = lparam;
        self
    }
}

/// Result of offering a message to its owner before default dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Disposition {
    /// The owner handled the message; skip default dispatch.
    Consumed,
    /// Continue with default translation and dispatch.
    Propagate,
}

impl Disposition {
    pub fn from_consumed(consumed: bool) -> Self {
        if consumed {
            Self::Consumed
        } else {
            Self::Propagate
        }
    }

    pub fn should_dispatch(self) -> bool {
        self == Self::Propagate
    }
}
