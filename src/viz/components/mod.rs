pub mod help;
pub mod log;
pub mod maze;
pub mod sliders;

use crossterm::event::Event;
pub use log::Logs;
pub use maze::MazeView;
use ratatui::widgets::WidgetRef;
pub use sliders::Sliders;

pub trait Component: WidgetRef {
    /// Returns `true` if the event was consumed
    fn handle_ui_event(&mut self, event: &Event) -> bool;
}
