use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How a received line is printed to stdout
#[derive(Serialize, Deserialize, ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LineFormat {
    /// Printable ASCII as-is, everything else escaped, one output line per read
    #[default]
    Escaped,
    /// Bytes written through untouched
    Raw,
}

impl LineFormat {
    pub fn format(&self, line: &[u8]) -> Vec<u8> {
        match self {
            LineFormat::Escaped => {
                let mut formatted = Vec::with_capacity(line.len() + 1);
                for byte in line {
                    formatted.extend(std::ascii::escape_default(*byte));
                }
                formatted.push(b'\n');
                formatted
            }
            LineFormat::Raw => line.to_vec(),
        }
    }
}
