//! Reusable UI components
//!
//! - `keybindings` - key to action mapping per mode, nav bar and help content
//! - `help_overlay` - centered key reference window

pub mod help_overlay;
pub mod keybindings;
