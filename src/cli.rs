use crate::config::SimMode;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub frames: Option<u32>,
    pub mode: Option<SimMode>,
}

impl CliArgs {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = CliArgs::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            if !flag.starts_with("--") {
                bail!("Unexpected argument '{flag}'. Use --config/--catalog/--frames/--mode with values.");
            }
            let key = &flag[2..];
            let value = iter
                .next()
                .ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?
                .as_ref()
                .to_string();
            match key {
                "config" => parsed.config = Some(PathBuf::from(value)),
                "catalog" => parsed.catalog = Some(PathBuf::from(value)),
                "frames" => {
                    parsed.frames = Some(
                        value
                            .parse::<u32>()
                            .with_context(|| format!("Invalid frame count '{value}'"))?,
                    );
                }
                "mode" => {
                    parsed.mode = Some(SimMode::parse(&value).ok_or_else(|| {
                        anyhow!("Invalid mode '{value}'. Use 'drive' or 'static'.")
                    })?);
                }
                _ => bail!(
                    "Unknown flag '{flag}'. Supported flags: --config, --catalog, --frames, --mode."
                ),
            }
        }
        Ok(parsed)
    }
}
