use anyhow::{Result, bail};
use clap::ValueEnum;
use serde::Serialize;

/// Output format for structured data
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Machine-parseable JSON
    Json,
}

impl OutputFormat {
    /// Serialize data to the requested format
    pub fn serialize<T: Serialize>(self, data: &T) -> Result<String> {
        match self {
            Self::Json => serde_json::to_string_pretty(data)
                .map_err(|e| anyhow::anyhow!("JSON serialization failed: {e}")),
            // Text format shouldn't use this path - caller should print directly
            Self::Text => bail!("text format should not use serialize()"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_serializes_pretty() {
        #[derive(Serialize)]
        struct Sample {
            name: &'static str,
        }
        let out = OutputFormat::Json.serialize(&Sample { name: "main" }).unwrap();
        assert!(out.contains("\"name\": \"main\""));
    }

    #[test]
    fn text_rejects_serialize() {
        assert!(OutputFormat::Text.serialize(&42).is_err());
    }
}
