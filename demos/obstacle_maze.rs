use std::{
    error::Error,
    ops::ControlFlow,
    sync::mpsc::{self, Receiver, Sender, TryRecvError},
    thread,
    time::Duration,
};

use log::LevelFilter;
use qmaze::{
    algo::{QLearningAgent, QLearningAgentConfig},
    gym::GridWorld,
    viz::{App, Command, Update},
};

/// Pause after every step so the agent can be followed on screen
const STEP_DELAY: Duration = Duration::from_millis(40);

/// Owns the agent and runs it on request, reporting every step to the UI
fn drive(mut agent: QLearningAgent<GridWorld>, commands: Receiver<Command>, updates: Sender<Update>) {
    while let Ok(command) = commands.recv() {
        match command {
            Command::Start { alpha, epsilon } => {
                agent.configure(alpha, epsilon);

                let mut interrupt = None;
                let summary = agent.learn_path(|event| {
                    let _ = updates.send(Update::Step(event.clone()));
                    thread::sleep(STEP_DELAY);
                    match commands.try_recv() {
                        Ok(Command::Start { .. }) | Err(TryRecvError::Empty) => {
                            ControlFlow::Continue(())
                        }
                        Ok(other) => {
                            interrupt = Some(other);
                            ControlFlow::Break(())
                        }
                        Err(TryRecvError::Disconnected) => {
                            interrupt = Some(Command::Quit);
                            ControlFlow::Break(())
                        }
                    }
                });

                let update = if summary.reached_exit {
                    Update::Finished {
                        summary,
                        episode: agent.episodes(),
                    }
                } else {
                    Update::Stopped(summary)
                };
                let _ = updates.send(update);
                let _ = updates.send(Update::Policy(agent.greedy_policy()));

                match interrupt {
                    Some(Command::Quit) => return,
                    Some(Command::Reset) => {
                        agent.reset();
                        let _ = updates.send(Update::Reset);
                    }
                    _ => {}
                }
            }
            Command::Reset => {
                agent.reset();
                let _ = updates.send(Update::Reset);
            }
            Command::Quit => return,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tui_logger::init_logger(LevelFilter::Trace)?;
    tui_logger::set_default_level(LevelFilter::Trace);

    let world = GridWorld::new();
    let config = QLearningAgentConfig::default();
    let mut app = App::new(world.clone(), config.alpha, config.epsilon);
    let agent = QLearningAgent::new(world, config);

    let (command_tx, command_rx) = mpsc::channel();
    let (update_tx, update_rx) = mpsc::channel();

    let driver = thread::spawn(move || drive(agent, command_rx, update_tx));

    app.run(update_rx, command_tx)?;

    driver
        .join()
        .map_err(|_| "Learning thread panicked")?;

    Ok(())
}
