//! Timer-driven host loop.
//!
//! The engine moves into its own thread.  Commands arrive over an `mpsc`
//! channel and are applied between ticks; events go back over a second
//! channel.  While the engine is running it ticks once per wall-clock
//! interval; while paused it only services commands.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info};

use rail_network::Router;

use crate::{Command, Engine, Event, SimError, SimResult};

/// What the host thread accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum HostMessage {
    Command(Command),
    Shutdown,
}

/// Host side of a running engine thread.
pub struct HostHandle {
    commands: Sender<HostMessage>,
    events:   Receiver<Event>,
    thread:   Option<JoinHandle<()>>,
}

impl HostHandle {
    /// Queue a command for the next loop iteration.
    pub fn send(&self, command: Command) -> SimResult<()> {
        self.commands.send(HostMessage::Command(command)).map_err(|_| SimError::HostClosed)
    }

    /// Every event emitted so far, without blocking.
    pub fn try_events(&self) -> Vec<Event> {
        self.events.try_iter().collect()
    }

    /// Wait up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> SimResult<Option<Event>> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(SimError::HostClosed),
        }
    }

    /// Stop the loop and wait for the thread to finish.
    pub fn shutdown(mut self) -> SimResult<()> {
        self.stop()
    }

    fn stop(&mut self) -> SimResult<()> {
        let _ = self.commands.send(HostMessage::Shutdown);
        match self.thread.take() {
            Some(handle) => handle.join().map_err(|_| SimError::HostClosed),
            None => Ok(()),
        }
    }
}

impl Drop for HostHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Move `engine` into a new thread that ticks every `interval` while running.
///
/// The first event on the returned handle is always [`Event::Ready`].
pub fn spawn_host<R>(engine: Engine<R>, interval: Duration) -> SimResult<HostHandle>
where
    R: Router + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel::<HostMessage>();
    let (event_tx, event_rx) = mpsc::channel::<Event>();

    let thread = thread::Builder::new()
        .name("rail-sim-host".into())
        .spawn(move || run_host(engine, interval, cmd_rx, event_tx))?;

    Ok(HostHandle { commands: cmd_tx, events: event_rx, thread: Some(thread) })
}

/// The loop.  Runs until `Shutdown`, or until either channel disconnects.
fn run_host<R: Router>(
    mut engine: Engine<R>,
    interval:   Duration,
    commands:   Receiver<HostMessage>,
    events:     Sender<Event>,
) {
    if events.send(engine.ready_event()).is_err() {
        return;
    }
    info!("host loop started ({} ms per tick)", interval.as_millis());

    let mut next_tick = Instant::now();
    'outer: loop {
        // 1. Drain pending commands
        let mut out = Vec::new();
        loop {
            match commands.try_recv() {
                Ok(HostMessage::Command(cmd)) => out.extend(engine.handle(cmd)),
                Ok(HostMessage::Shutdown) | Err(TryRecvError::Disconnected) => break 'outer,
                Err(TryRecvError::Empty) => break,
            }
        }

        // 2. Advance one tick if running
        if engine.is_running() {
            out.extend(engine.tick());
        }

        // 3. Emit
        for event in out {
            if events.send(event).is_err() {
                debug!("event receiver dropped");
                break 'outer;
            }
        }

        // 4. Sleep until the next deadline
        next_tick += interval;
        let now = Instant::now();
        if next_tick > now {
            thread::sleep(next_tick - now);
        } else if now - next_tick > interval * 2 {
            // Too far behind; skip the backlog instead of bursting.
            next_tick = now;
        }
    }

    info!("host loop stopped at {}", engine.clock);
}
