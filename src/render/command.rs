use std::fmt;

use crate::{buffer::BufferKey, image::ImageKey};

/// A recorded GPU command. Stands in for a backend command buffer entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    BeginPass { name: String, waits: usize },
    Clear(ImageKey),
    Sample(ImageKey),
    Draw {
        target: ImageKey,
        vertices: u32,
        instances: u32,
    },
    Dispatch { groups: [u32; 3] },
    ReadBuffer(BufferKey),
    WriteBuffer(BufferKey),
    EndPass,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::BeginPass { name, waits } => write!(f, "BeginPass(name={}, waits={})", name, waits),
            Command::Clear(_) => f.write_str("Clear"),
            Command::Sample(_) => f.write_str("Sample"),
            Command::Draw {
                vertices,
                instances,
                ..
            } => write!(f, "Draw(vertices={}, instances={})", vertices, instances),
            Command::Dispatch { groups } => {
                write!(f, "Dispatch(groups={}x{}x{})", groups[0], groups[1], groups[2])
            }
            Command::ReadBuffer(_) => f.write_str("ReadBuffer"),
            Command::WriteBuffer(_) => f.write_str("WriteBuffer"),
            Command::EndPass => f.write_str("EndPass"),
        }
    }
}

/// Commands of one frame, grouped into passes.
#[derive(Default, Debug)]
pub struct CommandList {
    commands: Vec<Command>,
    open: Option<String>,
}

impl CommandList {
    pub fn begin_pass(&mut self, name: impl Into<String>, waits: usize) -> anyhow::Result<()> {
        let name = name.into();
        if let Some(open) = &self.open {
            anyhow::bail!("cannot begin pass '{}' while '{}' is recording", name, open);
        }
        self.commands.push(Command::BeginPass {
            name: name.clone(),
            waits,
        });
        self.open = Some(name);
        Ok(())
    }

    pub fn end_pass(&mut self) -> anyhow::Result<()> {
        if self.open.take().is_none() {
            anyhow::bail!("end_pass without a recording pass");
        }
        self.commands.push(Command::EndPass);
        Ok(())
    }

    pub fn record(&mut self, command: Command) -> anyhow::Result<()> {
        if self.open.is_none() {
            anyhow::bail!("{} recorded outside of a pass", command);
        }
        self.commands.push(command);
        Ok(())
    }

    pub fn is_recording(&self) -> bool {
        self.open.is_some()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Names of the recorded passes in submission order.
    pub fn pass_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.iter().filter_map(|command| match command {
            Command::BeginPass { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn take(&mut self) -> Vec<Command> {
        self.open = None;
        std::mem::take(&mut self.commands)
    }
}
