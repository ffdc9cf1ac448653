// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interrupt-driven reload controller.
//!
//! One interrupt reloads the session. A second one inside the debounce
//! window exits. Once the window passes without a second interrupt the
//! controller is idle again, so sparse interrupts always reload.

use async_trait::async_trait;
use podbug_core::Clock;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Controller phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ReloadPending,
    Exiting,
}

podbug_core::simple_display! {
    Phase {
        Idle => "idle",
        ReloadPending => "reload-pending",
        Exiting => "exiting",
    }
}

/// What an interrupt means in the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Reload,
    Exit,
    /// Already exiting.
    Ignored,
}

/// Debounce state machine.
pub struct Debouncer<C: Clock> {
    clock: C,
    window: Duration,
    phase: Phase,
    pending_since: Option<Instant>,
}

impl<C: Clock> Debouncer<C> {
    pub fn new(clock: C, window: Duration) -> Self {
        Self { clock, window, phase: Phase::Idle, pending_since: None }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Return to idle once the debounce window has passed.
    pub fn tick(&mut self) {
        if self.phase != Phase::ReloadPending {
            return;
        }
        let expired = match self.pending_since {
            Some(since) => self.clock.now().duration_since(since) >= self.window,
            None => true,
        };
        if expired {
            tracing::info!("resetting termination timer");
            self.phase = Phase::Idle;
            self.pending_since = None;
        }
    }

    pub fn on_interrupt(&mut self) -> Interrupt {
        self.tick();
        match self.phase {
            Phase::Idle => {
                self.phase = Phase::ReloadPending;
                self.pending_since = Some(self.clock.now());
                Interrupt::Reload
            }
            Phase::ReloadPending => {
                self.phase = Phase::Exiting;
                Interrupt::Exit
            }
            Phase::Exiting => Interrupt::Ignored,
        }
    }
}

/// External interrupt events, decoupled from OS signal delivery.
#[async_trait]
pub trait InterruptSource: Send + 'static {
    /// Next interrupt; `None` once the source is closed.
    async fn next(&mut self) -> Option<std::io::Result<()>>;
}

/// Ctrl-C / SIGINT via tokio.
#[derive(Debug, Default)]
pub struct CtrlC;

#[async_trait]
impl InterruptSource for CtrlC {
    async fn next(&mut self) -> Option<std::io::Result<()>> {
        Some(tokio::signal::ctrl_c().await)
    }
}

/// Interrupts fed through a channel.
pub struct ChannelSource(pub mpsc::UnboundedReceiver<()>);

#[async_trait]
impl InterruptSource for ChannelSource {
    async fn next(&mut self) -> Option<std::io::Result<()>> {
        self.0.recv().await.map(Ok)
    }
}

/// Instruction for the session loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    Reload(String),
    Exit,
    Error(String),
}

/// Turn interrupts into [`Control`] messages on a background task.
///
/// The task ends when the source closes, fails, or the receiver is dropped.
pub fn listen_for_interrupts<S, C>(mut source: S, clock: C, window: Duration) -> mpsc::UnboundedReceiver<Control>
where
    S: InterruptSource,
    C: Clock,
{
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut debouncer = Debouncer::new(clock, window);
        while let Some(event) = source.next().await {
            let control = match event {
                Ok(()) => match debouncer.on_interrupt() {
                    Interrupt::Reload => {
                        tracing::info!(window_ms = window.as_millis() as u64, "interrupt: reloading, interrupt again to exit");
                        Control::Reload("interrupt => reload".to_string())
                    }
                    Interrupt::Exit => {
                        tracing::info!("interrupt: exiting");
                        Control::Exit
                    }
                    Interrupt::Ignored => {
                        tracing::warn!("already exiting, ignoring interrupt");
                        continue;
                    }
                },
                Err(e) => {
                    let _ = tx.send(Control::Error(e.to_string()));
                    break;
                }
            };
            if tx.send(control).is_err() {
                break;
            }
        }
    });
    rx
}

#[cfg(test)]
#[path = "interrupt_tests.rs"]
mod tests;
