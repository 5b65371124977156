use crossterm::event::{Event, KeyCode};
use ratatui::{prelude::*, widgets::*};

use crate::viz::util::event_keycode;

use super::Component;

/// Number of slider increments between 0 and 1
const RESOLUTION: u8 = 100;

struct Slider {
    label: &'static str,
    /// Value in hundredths
    ticks: u8,
}

impl Slider {
    fn new(label: &'static str, value: f32) -> Self {
        let ticks = (value.clamp(0.0, 1.0) * RESOLUTION as f32).round() as u8;
        Self { label, ticks }
    }

    fn value(&self) -> f32 {
        self.ticks as f32 / RESOLUTION as f32
    }

    fn nudge(&mut self, up: bool) {
        self.ticks = if up {
            (self.ticks + 1).min(RESOLUTION)
        } else {
            self.ticks.saturating_sub(1)
        };
    }
}

/// The learning rate and exploration rate controls
///
/// Up/Down selects a slider, Left/Right moves it by 0.01.
pub struct Sliders {
    sliders: [Slider; 2],
    selected: usize,
}

impl Sliders {
    pub fn new(alpha: f32, epsilon: f32) -> Self {
        Self {
            sliders: [
                Slider::new("Alpha (Learning Rate)", alpha),
                Slider::new("Epsilon (Exploration Rate)", epsilon),
            ],
            selected: 0,
        }
    }

    pub fn alpha(&self) -> f32 {
        self.sliders[0].value()
    }

    pub fn epsilon(&self) -> f32 {
        self.sliders[1].value()
    }
}

impl WidgetRef for Sliders {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let areas = Layout::vertical([Constraint::Length(3); 2]).split(area);

        for (i, (slider, area)) in self.sliders.iter().zip(areas.iter()).enumerate() {
            let border_style = if i == self.selected {
                Style::default().light_green()
            } else {
                Style::default().dark_gray()
            };

            Gauge::default()
                .block(
                    Block::bordered()
                        .border_type(BorderType::Rounded)
                        .border_style(border_style)
                        .title(slider.label),
                )
                .gauge_style(Color::Cyan)
                .ratio(slider.value() as f64)
                .label(format!("{:.2}", slider.value()))
                .render(*area, buf);
        }
    }
}

impl Component for Sliders {
    fn handle_ui_event(&mut self, event: &Event) -> bool {
        let Some(key) = event_keycode(event) else {
            return false;
        };

        match key {
            KeyCode::Up | KeyCode::Down => {
                self.selected = (self.selected + 1) % self.sliders.len();
            }
            KeyCode::Left => self.sliders[self.selected].nudge(false),
            KeyCode::Right => self.sliders[self.selected].nudge(true),
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyEvent, KeyModifiers};

    use super::*;

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn nudging_stays_in_range() {
        let mut sliders = Sliders::new(0.99, 0.0);
        assert!(sliders.handle_ui_event(&press(KeyCode::Right)));
        assert!(sliders.handle_ui_event(&press(KeyCode::Right)));
        assert_eq!(sliders.alpha(), 1.0);

        sliders.handle_ui_event(&press(KeyCode::Down));
        sliders.handle_ui_event(&press(KeyCode::Left));
        assert_eq!(sliders.epsilon(), 0.0);
        sliders.handle_ui_event(&press(KeyCode::Right));
        assert_eq!(sliders.epsilon(), 0.01);
        assert_eq!(sliders.alpha(), 1.0, "Only the selected slider moves");
    }

    #[test]
    fn other_keys_are_ignored() {
        let mut sliders = Sliders::new(0.1, 0.2);
        assert!(!sliders.handle_ui_event(&press(KeyCode::Char('x'))));
        assert_eq!(sliders.alpha(), 0.1);
        assert_eq!(sliders.epsilon(), 0.2);
    }
}
