//! Live threaded runner.
//!
//! Runs any [`Steppable`] engine on its own thread at a fixed cadence. The
//! engine sits behind a mutex, so `snapshot()` never observes a half-applied
//! step. Control commands go in and events come out over channels.

use super::traits::Steppable;
use crate::common::SimError;
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Pause,
    Resume,
    Stop,
}

pub struct LiveRun<M: Steppable> {
    model: Arc<Mutex<M>>,
    commands: Sender<Command>,
    events: Receiver<M::Event>,
    handle: Option<JoinHandle<Result<u64, SimError>>>,
}

impl<M> LiveRun<M>
where
    M: Steppable + Send + 'static,
    M::Event: Send + 'static,
{
    /// Spawns the runner. `cadence` is slept between steps.
    pub fn start(model: M, cadence: Duration) -> Self {
        let model = Arc::new(Mutex::new(model));
        let (cmd_tx, cmd_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        let worker = Arc::clone(&model);
        let handle = thread::spawn(move || run_loop(worker, cmd_rx, event_tx, cadence));
        Self {
            model,
            commands: cmd_tx,
            events: event_rx,
            handle: Some(handle),
        }
    }

    pub fn pause(&self) {
        let _ = self.commands.send(Command::Pause);
    }

    pub fn resume(&self) {
        let _ = self.commands.send(Command::Resume);
    }

    /// Takes the engine lock, so the view is never torn.
    pub fn snapshot(&self) -> M::Snapshot {
        self.model.lock().snapshot()
    }

    pub fn events(&self) -> &Receiver<M::Event> {
        &self.events
    }

    /// Events produced so far and not yet received.
    pub fn drain_events(&self) -> Vec<M::Event> {
        self.events.try_iter().collect()
    }

    /// Returns `true` once the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map(|h| h.is_finished()).unwrap_or(true)
    }

    /// Waits for the engine to run out of work and returns the step count.
    ///
    /// The engine keeps its final state.
    pub fn join(mut self) -> Result<(u64, M::Snapshot), SimError> {
        let steps = self.wait()?;
        Ok((steps, self.model.lock().snapshot()))
    }

    /// Stops the worker, joins it and resets the engine.
    pub fn stop(mut self) -> Result<u64, SimError> {
        let _ = self.commands.send(Command::Stop);
        let steps = self.wait();
        self.model.lock().reset();
        steps
    }

    fn wait(&mut self) -> Result<u64, SimError> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| SimError::config("live run worker panicked"))?,
            None => Ok(0),
        }
    }
}

impl<M: Steppable> Drop for LiveRun<M> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.commands.send(Command::Stop);
            let _ = handle.join();
        }
    }
}

fn run_loop<M: Steppable>(
    model: Arc<Mutex<M>>,
    commands: Receiver<Command>,
    events: Sender<M::Event>,
    cadence: Duration,
) -> Result<u64, SimError> {
    let name = model.lock().name().to_string();
    let mut steps = 0;
    let mut paused = false;
    loop {
        let command = if paused {
            commands.recv().ok().or(Some(Command::Stop))
        } else {
            match commands.try_recv() {
                Ok(command) => Some(command),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => Some(Command::Stop),
            }
        };
        match command {
            Some(Command::Stop) => break,
            Some(Command::Pause) => {
                paused = true;
                continue;
            }
            Some(Command::Resume) => paused = false,
            None => {}
        }

        let event = model.lock().step()?;
        match event {
            Some(event) => {
                steps += 1;
                if events.send(event).is_err() {
                    break;
                }
            }
            None => break,
        }
        if !cadence.is_zero() {
            thread::sleep(cadence);
        }
    }
    log::debug!("live run '{}' finished after {} steps", name, steps);
    Ok(steps)
}
