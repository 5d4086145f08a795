use crate::config::TrackConfigOverrides;
use crate::path::{BankInterpolation, OverrunPolicy};
use anyhow::{anyhow, bail, Context, Result};

/// Flags shared by the track tooling. Positional arguments are collected in
/// order and left to the caller.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliOverrides {
    segment_length: Option<f32>,
    overrun: Option<OverrunPolicy>,
    bank: Option<BankInterpolation>,
    pub verbose: bool,
    pub positional: Vec<String>,
}

impl CliOverrides {
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        while let Some(raw) = iter.next() {
            let arg = raw.as_ref();
            let Some(key) = arg.strip_prefix("--") else {
                overrides.positional.push(arg.to_string());
                continue;
            };
            if key == "verbose" {
                overrides.verbose = true;
                continue;
            }
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{arg}'"))?.as_ref().to_string();
            match key {
                "segment-length" => {
                    overrides.segment_length = Some(
                        value.parse::<f32>().with_context(|| format!("Invalid segment length '{value}'"))?,
                    );
                }
                "overrun" => overrides.overrun = Some(parse_overrun(&value)?),
                "bank" => overrides.bank = Some(parse_bank(&value)?),
                _ => bail!("Unknown flag '{arg}'. Supported flags: --segment-length, --overrun, --bank, --verbose."),
            }
        }
        Ok(overrides)
    }

    pub fn config_overrides(&self) -> TrackConfigOverrides {
        TrackConfigOverrides {
            segment_length: self.segment_length,
            overrun: self.overrun,
            bank_interpolation: self.bank,
        }
    }
}

fn parse_overrun(value: &str) -> Result<OverrunPolicy> {
    match value.to_ascii_lowercase().as_str() {
        "extrapolate" => Ok(OverrunPolicy::Extrapolate),
        "loop" => Ok(OverrunPolicy::Loop),
        other => bail!("Invalid overrun policy '{other}'. Use extrapolate or loop."),
    }
}

fn parse_bank(value: &str) -> Result<BankInterpolation> {
    match value.to_ascii_lowercase().as_str() {
        "linear" => Ok(BankInterpolation::Linear),
        "bezier" | "cubic" => Ok(BankInterpolation::Bezier),
        other => bail!("Invalid bank interpolation '{other}'. Use linear or bezier."),
    }
}
