use std::collections::HashMap;

use ratatui::{prelude::*, widgets::*};

use crate::gym::{Action, Cell, GridWorld};

const CELL_WIDTH: u16 = 7;
const CELL_HEIGHT: u16 = 3;

/// The grid with its obstacles, start and exit markers, the agent and the
/// currently preferred action in each learned cell
pub struct MazeView {
    world: GridWorld,
    agent: Cell,
    policy: HashMap<Cell, Action>,
}

impl MazeView {
    pub fn new(world: GridWorld) -> Self {
        Self {
            agent: world.start(),
            world,
            policy: HashMap::new(),
        }
    }

    /// Columns and rows needed to draw the full grid, borders included
    pub fn size(&self) -> (u16, u16) {
        let n = self.world.size() as u16;
        (n * CELL_WIDTH + 2, n * CELL_HEIGHT + 2)
    }

    pub fn move_agent(&mut self, cell: Cell) {
        self.agent = cell;
    }

    pub fn set_policy(&mut self, policy: HashMap<Cell, Action>) {
        self.policy = policy;
    }

    /// Agent back to the start and no policy arrows
    pub fn reset(&mut self) {
        self.agent = self.world.start();
        self.policy.clear();
    }

    fn cell_area(&self, inner: Rect, cell: Cell) -> Option<Rect> {
        let area = Rect::new(
            inner.x + cell.x as u16 * CELL_WIDTH,
            inner.y + cell.y as u16 * CELL_HEIGHT,
            CELL_WIDTH,
            CELL_HEIGHT,
        );
        (area.right() <= inner.right() && area.bottom() <= inner.bottom()).then_some(area)
    }

    fn label(&self, cell: Cell) -> (&'static str, Style) {
        if cell == self.agent {
            ("●", Style::new().red().bold())
        } else if cell == self.world.exit() {
            ("E", Style::new().green().bold())
        } else if cell == self.world.start() {
            ("S", Style::new().blue().bold())
        } else {
            let arrow = match self.policy.get(&cell) {
                Some(Action::Up) => "↑",
                Some(Action::Down) => "↓",
                Some(Action::Left) => "←",
                Some(Action::Right) => "→",
                None => "",
            };
            (arrow, Style::new().dark_gray())
        }
    }
}

impl WidgetRef for MazeView {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title("Maze");
        let inner = block.inner(area);
        block.render(area, buf);

        for cell in self.world.cells() {
            let Some(cell_area) = self.cell_area(inner, cell) else {
                continue;
            };

            let background = if self.world.is_obstacle(cell) && cell != self.world.exit() {
                Color::Black
            } else {
                Color::Gray
            };
            buf.set_style(cell_area, Style::new().bg(background));

            let (label, style) = self.label(cell);
            Paragraph::new(label)
                .alignment(Alignment::Center)
                .style(style.bg(background))
                .render(cell_area.inner(&Margin::new(0, 1)), buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(view: &MazeView) -> Buffer {
        let (width, height) = view.size();
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        view.render_ref(area, &mut buf);
        buf
    }

    fn symbol_at(buf: &Buffer, cell: Cell) -> String {
        let x = 1 + cell.x as u16 * CELL_WIDTH + CELL_WIDTH / 2;
        let y = 1 + cell.y as u16 * CELL_HEIGHT + CELL_HEIGHT / 2;
        buf.get(x, y).symbol().to_string()
    }

    #[test]
    fn markers() {
        let mut view = MazeView::new(GridWorld::new());
        let buf = rendered(&view);
        assert_eq!(symbol_at(&buf, Cell::new(0, 0)), "●", "Agent covers the start");
        assert_eq!(symbol_at(&buf, Cell::new(4, 4)), "E");

        view.move_agent(Cell::new(2, 2));
        view.set_policy(HashMap::from([(Cell::new(1, 1), Action::Down)]));
        let buf = rendered(&view);
        assert_eq!(symbol_at(&buf, Cell::new(0, 0)), "S");
        assert_eq!(symbol_at(&buf, Cell::new(2, 2)), "●");
        assert_eq!(symbol_at(&buf, Cell::new(1, 1)), "↓");

        view.reset();
        let buf = rendered(&view);
        assert_eq!(symbol_at(&buf, Cell::new(0, 0)), "●");
        assert_eq!(symbol_at(&buf, Cell::new(1, 1)), " ");
    }

    #[test]
    fn obstacles_are_dark() {
        let view = MazeView::new(GridWorld::new());
        let buf = rendered(&view);
        let corner = |cell: Cell| {
            buf.get(1 + cell.x as u16 * CELL_WIDTH, 1 + cell.y as u16 * CELL_HEIGHT)
                .bg
        };
        assert_eq!(corner(Cell::new(1, 0)), Color::Black);
        assert_eq!(corner(Cell::new(0, 1)), Color::Gray);
    }

    #[test]
    fn small_areas_do_not_panic() {
        let view = MazeView::new(GridWorld::new());
        let area = Rect::new(0, 0, 10, 5);
        let mut buf = Buffer::empty(area);
        view.render_ref(area, &mut buf);
    }
}
