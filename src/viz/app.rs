use std::{
    collections::HashMap,
    io,
    sync::mpsc::{Receiver, Sender, TryRecvError},
    time::Duration,
};

use crossterm::event::{self, Event, KeyCode};
use ratatui::{prelude::*, widgets::*};

use super::{
    components::{help::render_help, Component, Logs, MazeView, Sliders},
    tui,
    util::event_keycode,
};
use crate::{
    algo::{EpisodeSummary, StepEvent},
    gym::{Action, Cell, GridWorld},
};

const TABS: [&str; 2] = ["Maze", "Logs"];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum State {
    #[default]
    Idle,
    Learning,
    Error(&'static str),
    Quit,
}

/// Sent by whoever drives the agent, to be shown by the [`App`]
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// The agent took a step
    Step(StepEvent<Cell, Action>),
    /// An episode reached the exit
    Finished { summary: EpisodeSummary, episode: u32 },
    /// An episode was cut short
    Stopped(EpisodeSummary),
    /// The table was cleared and the agent is back at the start
    Reset,
    /// Best known action per learned cell
    Policy(HashMap<Cell, Action>),
}

/// Sent by the [`App`] in response to key presses
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Configure the agent with the slider values and learn one path
    Start { alpha: f32, epsilon: f32 },
    /// Forget everything learned
    Reset,
    Quit,
}

/// The root TUI component which holds the main app state and runs the render loop
pub struct App {
    state: State,
    selected_tab: usize,
    show_help: bool,
    maze: MazeView,
    sliders: Sliders,
    logs: Logs,
    status: String,
    reward: String,
    episode: u32,
}

impl App {
    pub fn new(world: GridWorld, alpha: f32, epsilon: f32) -> Self {
        Self {
            state: State::default(),
            selected_tab: 0,
            show_help: false,
            maze: MazeView::new(world),
            sliders: Sliders::new(alpha, epsilon),
            logs: Logs::new(),
            status: String::from("Status: Waiting to start..."),
            reward: String::from("Current Reward: 0"),
            episode: 0,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn reward(&self) -> &str {
        &self.reward
    }

    /// Initialize the terminal and run the main loop until the user quits
    ///
    /// Restores the terminal on exit and tells the driver to quit.
    pub fn run(&mut self, updates: Receiver<Update>, commands: Sender<Command>) -> io::Result<()> {
        let mut terminal = tui::init()?;

        while self.state != State::Quit {
            self.drain(&updates);

            terminal.draw(|frame| frame.render_widget(&*self, frame.size()))?;

            if event::poll(Duration::from_millis(16))? {
                let event = event::read()?;
                if let Some(command) = self.handle_ui_event(&event) {
                    if commands.send(command).is_err() {
                        self.state = State::Error("Driver disconnected.");
                    }
                }
            }
        }

        let _ = commands.send(Command::Quit);
        tui::restore()
    }

    /// Apply every pending update without blocking
    fn drain(&mut self, updates: &Receiver<Update>) {
        loop {
            match updates.try_recv() {
                Ok(update) => self.apply(update),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.state != State::Quit {
                        self.state = State::Error("Channel disconnected.");
                    }
                    break;
                }
            }
        }
    }

    fn apply(&mut self, update: Update) {
        match update {
            Update::Step(event) => {
                self.maze.move_agent(event.state);
                self.reward = format!(
                    "Current Reward: {} | Total Reward: {}",
                    event.reward, event.cumulative_reward
                );
            }
            Update::Finished { summary, episode } => {
                self.episode = episode;
                self.status = format!("Status: Exit reached in {} steps!", summary.steps);
                self.state = State::Idle;
            }
            Update::Stopped(summary) => {
                self.status = format!("Status: Stopped after {} steps.", summary.steps);
                self.state = State::Idle;
            }
            Update::Reset => {
                self.maze.reset();
                self.episode = 0;
                self.status = String::from("Status: Maze reset, start learning!");
                self.reward = String::from("Current Reward: 0");
                self.state = State::Idle;
            }
            Update::Policy(policy) => self.maze.set_policy(policy),
        }
    }

    /// Returns the command to send to the driver, if any
    fn handle_ui_event(&mut self, event: &Event) -> Option<Command> {
        let key = event_keycode(event)?;

        match key {
            KeyCode::Char('q') => {
                self.state = State::Quit;
                return None;
            }
            KeyCode::Char('h') => {
                self.show_help = !self.show_help;
                return None;
            }
            KeyCode::Esc if self.show_help => {
                self.show_help = false;
                return None;
            }
            KeyCode::Tab => {
                self.selected_tab = (self.selected_tab + 1) % TABS.len();
                return None;
            }
            _ => {}
        }

        if self.selected_tab == 1 {
            self.logs.handle_ui_event(event);
            return None;
        }

        match key {
            KeyCode::Char('s') if self.state == State::Idle => {
                self.state = State::Learning;
                self.status = String::from("Status: Learning...");
                self.reward = String::from("Current Reward: 0");
                Some(Command::Start {
                    alpha: self.sliders.alpha(),
                    epsilon: self.sliders.epsilon(),
                })
            }
            KeyCode::Char('r') => Some(Command::Reset),
            _ => {
                self.sliders.handle_ui_event(event);
                None
            }
        }
    }

    fn render_maze_tab(&self, area: Rect, buf: &mut Buffer) {
        let (maze_width, maze_height) = self.maze.size();
        let [maze_area, side_area] =
            Layout::horizontal([Constraint::Length(maze_width), Constraint::Fill(1)]).areas(area);
        let [maze_area, _] =
            Layout::vertical([Constraint::Length(maze_height), Constraint::Fill(1)])
                .areas(maze_area);
        let [sliders_area, info_area] =
            Layout::vertical([Constraint::Length(6), Constraint::Fill(1)]).areas(side_area);

        self.maze.render_ref(maze_area, buf);
        self.sliders.render_ref(sliders_area, buf);

        let state = match self.state {
            State::Idle => Span::raw("idle").green(),
            State::Learning => Span::raw("learning").yellow(),
            State::Error(msg) => Span::raw(msg).light_red(),
            State::Quit => Span::raw("quitting"),
        };
        Paragraph::new(vec![
            Line::from(vec![Span::raw("Agent: "), state]),
            Line::from(format!("Episodes: {}", self.episode)),
            Line::from(""),
            Line::from(vec![
                Span::from("s").light_cyan().bold(),
                Span::raw(" start  "),
                Span::from("r").light_cyan().bold(),
                Span::raw(" reset  "),
                Span::from("h").light_cyan().bold(),
                Span::raw(" help"),
            ]),
        ])
        .block(
            Block::bordered()
                .border_type(BorderType::Rounded)
                .title("Info"),
        )
        .render(info_area, buf);
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Layout
        let [menu_area, main_area, status_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(4),
        ])
        .areas(area);

        // Menu
        Tabs::new(TABS)
            .block(Block::default().padding(Padding::uniform(1)))
            .white()
            .bold()
            .highlight_style(Style::default().light_green())
            .select(self.selected_tab)
            .render(menu_area, buf);

        // Main
        match self.selected_tab {
            0 => self.render_maze_tab(main_area, buf),
            1 => self.logs.render_ref(main_area, buf),
            _ => {}
        }

        // Status
        Paragraph::new(vec![
            Line::from(self.status.as_str()),
            Line::from(self.reward.as_str()),
        ])
        .block(
            Block::bordered()
                .border_type(BorderType::Rounded)
                .title("Status"),
        )
        .render(status_area, buf);

        if self.show_help {
            render_help(area, buf, self.selected_tab);
        }
    }
}
