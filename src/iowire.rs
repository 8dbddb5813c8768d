use embedded_hal::digital::{Error, ErrorType, InputPin, OutputPin};

/// Line direction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Actively driven to the latched level
    Output,
    /// High impedance, the pull-up recovers the line high
    InputPullUp,
}

/// A single tri-state 1-Wire line.
pub trait LineDriver {
    type Error: Error;

    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error>;

    /// Latches the output level. Takes effect while the direction is [`Direction::Output`].
    fn write_level(&mut self, high: bool) -> Result<(), Self::Error>;

    /// Samples the current logic level of the line
    fn read_level(&mut self) -> Result<bool, Self::Error>;
}

/// Single open-drain pin with an external pull-up.
///
/// Releasing the line drives the open-drain output high, which leaves the
/// line floating on the pull-up.
pub struct OpenDrain<P> {
    pin: P,
    direction: Direction,
    level: bool,
}

impl<P> OpenDrain<P> {
    pub fn new(pin: P) -> Self {
        OpenDrain {
            pin,
            direction: Direction::InputPullUp,
            level: true,
        }
    }

    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P> LineDriver for OpenDrain<P>
where
    P: ErrorType + InputPin + OutputPin,
{
    type Error = P::Error;

    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        self.direction = direction;
        match direction {
            Direction::Output => apply_level(&mut self.pin, self.level),
            Direction::InputPullUp => self.pin.set_high(),
        }
    }

    fn write_level(&mut self, high: bool) -> Result<(), Self::Error> {
        self.level = high;
        if self.direction == Direction::Output {
            apply_level(&mut self.pin, high)?;
        }
        Ok(())
    }

    fn read_level(&mut self) -> Result<bool, Self::Error> {
        self.pin.is_high()
    }
}

/// Separate input and output pins, e.g. an output buffered through a transistor
pub struct SplitLine<I, O> {
    input: I,
    output: O,
    direction: Direction,
    level: bool,
}

impl<I, O> SplitLine<I, O> {
    pub fn new(input: I, output: O) -> Self {
        SplitLine {
            input,
            output,
            direction: Direction::InputPullUp,
            level: true,
        }
    }

    pub fn into_inner(self) -> (I, O) {
        (self.input, self.output)
    }
}

impl<E, I, O> LineDriver for SplitLine<I, O>
where
    E: Error,
    I: ErrorType<Error = E> + InputPin,
    O: ErrorType<Error = E> + OutputPin,
{
    type Error = E;

    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        self.direction = direction;
        match direction {
            Direction::Output => apply_level(&mut self.output, self.level),
            Direction::InputPullUp => self.output.set_high(),
        }
    }

    fn write_level(&mut self, high: bool) -> Result<(), Self::Error> {
        self.level = high;
        if self.direction == Direction::Output {
            apply_level(&mut self.output, high)?;
        }
        Ok(())
    }

    fn read_level(&mut self) -> Result<bool, Self::Error> {
        self.input.is_high()
    }
}

#[inline(always)]
fn apply_level<O: OutputPin>(pin: &mut O, high: bool) -> Result<(), O::Error> {
    if high {
        pin.set_high()
    } else {
        pin.set_low()
    }
}
