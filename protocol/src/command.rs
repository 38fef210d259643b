/// The three request kinds the broker understands. The wire value is the
/// frame's command byte, echoed back unchanged on the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    Produce = 1,
    AcquireNext = 2,
    Settle = 3,
}

impl Command {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Command {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            1 => Ok(Command::Produce),
            2 => Ok(Command::AcquireNext),
            3 => Ok(Command::Settle),
            other => Err(other),
        }
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> Self {
        command.as_u8()
    }
}
