//! Clocked machine abstraction
//!
//! Every machine in this crate is a pure transition function. A driving loop
//! calls [`Clocked::tick`] once per global clock tick and commits the
//! returned state; nothing is shared between machines during a tick.

/// A synchronous machine advanced once per clock tick
pub trait Clocked: Copy {
    /// Inputs sampled on a tick
    type Inputs: Copy;
    /// Outputs produced on a tick
    type Outputs: Copy;

    /// Registers after power-on reset
    fn power_on() -> Self;

    /// Compute the next state and this tick's outputs
    fn tick(self, inputs: Self::Inputs) -> (Self, Self::Outputs);

    /// Current frame position, for invariant checks and tracing
    fn frame_position(&self) -> u8;

    /// Drive the machine with one input per tick
    ///
    /// The returned iterator yields the outputs of each tick and leaves the
    /// final state available through [`Run::machine`].
    fn run<I>(self, inputs: I) -> Run<Self, I::IntoIter>
    where
        I: IntoIterator<Item = Self::Inputs>,
    {
        Run {
            machine: self,
            inputs: inputs.into_iter(),
        }
    }
}

/// Iterator produced by [`Clocked::run`]
#[derive(Debug, Clone)]
pub struct Run<M, I> {
    machine: M,
    inputs: I,
}

impl<M: Clocked, I: Iterator<Item = M::Inputs>> Run<M, I> {
    /// State after the ticks consumed so far
    pub fn machine(&self) -> M {
        self.machine
    }
}

impl<M: Clocked, I: Iterator<Item = M::Inputs>> Iterator for Run<M, I> {
    type Item = M::Outputs;

    fn next(&mut self) -> Option<M::Outputs> {
        let inputs = self.inputs.next()?;
        let (next, outputs) = self.machine.tick(inputs);
        self.machine = next;
        Some(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameFormat, Level};
    use crate::receiver::{Receiver, RxInputs};
    use crate::transmitter::{Transmitter, TxInputs};

    #[test]
    fn test_run_transmitter() {
        let inputs = core::iter::once(TxInputs::send(0x55))
            .chain(core::iter::repeat(TxInputs::idle()).take(10));
        let mut run = Transmitter::<8>::power_on().run(inputs);

        let first = run.next().unwrap();
        assert!(first.acknowledge);

        let serial = run.by_ref().map(|out| out.serial);
        assert!(serial.eq(FrameFormat::<8>::levels(0x55)));
        assert!(run.machine().is_idle());
    }

    #[test]
    fn test_run_receiver() {
        let inputs = FrameFormat::<8>::levels(0xC3).map(RxInputs::sample);
        let last = Receiver::<8>::power_on().run(inputs).last().unwrap();
        assert_eq!(last.result(), Some(Ok(0xC3)));
    }

    #[test]
    fn test_frame_position_reported() {
        let (rx, _) = Receiver::<8>::power_on().tick(RxInputs::sample(Level::START));
        assert_eq!(rx.frame_position(), 1);
        assert_eq!(Transmitter::<8>::power_on().frame_position(), 9);
    }
}
