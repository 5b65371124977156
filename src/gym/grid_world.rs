use std::{collections::HashSet, fmt};

use log::warn;
use strum::{Display, EnumIter, VariantArray};

use crate::env::{DiscreteActionSpace, Environment};

/// Reward for entering the exit cell
pub const EXIT_REWARD: f32 = 100.0;
/// Penalty for entering an obstacle
pub const OBSTACLE_REWARD: f32 = -1.0;
/// Reward for (re-)entering the start cell
pub const START_REWARD: f32 = 0.0;
/// Reward for entering any other cell
pub const PATH_REWARD: f32 = 1.0;

/// The cells of the default maze that are not obstacles
const DEFAULT_PATH: [Cell; 9] = [
    Cell::new(0, 1),
    Cell::new(1, 1),
    Cell::new(1, 2),
    Cell::new(2, 2),
    Cell::new(2, 3),
    Cell::new(3, 3),
    Cell::new(4, 3),
    Cell::new(4, 4),
    Cell::new(0, 0),
];

/// A position on the grid. `x` grows to the right, `y` grows downward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(usize, usize)> for Cell {
    fn from((x, y): (usize, usize)) -> Self {
        Self { x, y }
    }
}

/// A move to a neighboring cell
///
/// The declaration order is the enumeration order used to break ties between
/// equally valued actions.
#[derive(EnumIter, VariantArray, Display, Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    /// Coordinate change `(dx, dy)` of this action
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Action::Up => (0, -1),
            Action::Down => (0, 1),
            Action::Left => (-1, 0),
            Action::Right => (1, 0),
        }
    }
}

/// A square maze with a start cell, an exit cell and a fixed set of obstacles
///
/// Obstacles do not block movement, they only make entering them costly.
/// Moving into the outer wall leaves the agent where it is.
#[derive(Clone, Debug, PartialEq)]
pub struct GridWorld {
    size: usize,
    start: Cell,
    exit: Cell,
    obstacles: HashSet<Cell>,
}

impl GridWorld {
    /// The 5x5 maze with start `(0, 0)`, exit `(4, 4)` and a single winding
    /// path between them; every other cell is an obstacle
    pub fn new() -> Self {
        Self::with_path(5, Cell::new(0, 0), Cell::new(4, 4), &DEFAULT_PATH)
    }

    /// Build a maze where every cell not listed in `path` is an obstacle
    ///
    /// The obstacle set is derived from `path` alone. Leaving `exit` out of
    /// `path` therefore makes the exit an obstacle as well; this is allowed
    /// and only logged, [`reward_for`](Self::reward_for) still pays the exit
    /// reward for it.
    ///
    /// **Panics** if any cell lies outside the grid or if `start` is not in `path`
    pub fn with_path(size: usize, start: Cell, exit: Cell, path: &[Cell]) -> Self {
        let in_bounds = |c: &Cell| c.x < size && c.y < size;
        assert!(in_bounds(&start), "Start cell {start} is outside the grid.");
        assert!(in_bounds(&exit), "Exit cell {exit} is outside the grid.");
        assert!(
            path.iter().all(in_bounds),
            "Every path cell must lie inside the {size}x{size} grid."
        );
        assert!(
            path.contains(&start),
            "Start cell {start} must be on the path."
        );

        let obstacles = (0..size)
            .flat_map(|x| (0..size).map(move |y| Cell::new(x, y)))
            .filter(|c| !path.contains(c))
            .collect::<HashSet<_>>();

        if obstacles.contains(&exit) {
            warn!("Exit cell {exit} is not on the path and is also an obstacle");
        }

        Self {
            size,
            start,
            exit,
            obstacles,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn start(&self) -> Cell {
        self.start
    }

    pub fn exit(&self) -> Cell {
        self.exit
    }

    pub fn obstacles(&self) -> &HashSet<Cell> {
        &self.obstacles
    }

    pub fn is_obstacle(&self, cell: Cell) -> bool {
        self.obstacles.contains(&cell)
    }

    /// All cells of the grid, column by column
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.size).flat_map(move |x| (0..self.size).map(move |y| Cell::new(x, y)))
    }

    /// Reward for entering `cell`
    ///
    /// The exit check comes first, so a cell that is both exit and obstacle
    /// pays [`EXIT_REWARD`].
    pub fn reward_for(&self, cell: Cell) -> f32 {
        if cell == self.exit {
            EXIT_REWARD
        } else if self.obstacles.contains(&cell) {
            OBSTACLE_REWARD
        } else if cell == self.start {
            START_REWARD
        } else {
            PATH_REWARD
        }
    }

    /// The neighbor of `cell` in the direction of `action`, or `cell` itself
    /// if that neighbor would be off the grid
    pub fn apply_action(&self, cell: Cell, action: Action) -> Cell {
        let (dx, dy) = action.delta();
        match (
            cell.x.checked_add_signed(dx),
            cell.y.checked_add_signed(dy),
        ) {
            (Some(x), Some(y)) if x < self.size && y < self.size => Cell::new(x, y),
            _ => cell,
        }
    }
}

impl Default for GridWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for GridWorld {
    type State = Cell;
    type Action = Action;

    fn start(&self) -> Self::State {
        self.start
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        *state == self.exit
    }

    fn transition(&self, state: &Self::State, action: Self::Action) -> Self::State {
        self.apply_action(*state, action)
    }

    fn reward(&self, state: &Self::State) -> f32 {
        self.reward_for(*state)
    }
}

impl DiscreteActionSpace for GridWorld {
    fn actions(&self) -> &[Self::Action] {
        Action::VARIANTS
    }
}
