// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments for the scanwerk driver.

use std::path::PathBuf;

use clap::Parser;
use scanwerk_document::OutputSpace;

#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "scanwerk")]
#[command(about = "Find the document outline in each image and print its corners as JSON lines")]
#[command(version)]
pub struct CliArgs {
    /// Write the effective detector config to the data directory.
    #[arg(long)]
    pub save_config: bool,

    /// Coordinate space for reported corners: sensor (the input file's own
    /// pixel grid), native, analysis, or WxH.
    #[arg(long, value_parser = parse_space, default_value = "sensor")]
    pub space: OutputSpace,

    /// Images to analyse, in order.
    #[arg(required_unless_present = "save_config")]
    pub images: Vec<PathBuf>,
}

fn parse_space(value: &str) -> Result<OutputSpace, String> {
    match value {
        "sensor" => Ok(OutputSpace::Sensor),
        "native" => Ok(OutputSpace::Native),
        "analysis" => Ok(OutputSpace::Analysis),
        custom => {
            let (w, h) = custom
                .split_once(['x', 'X'])
                .ok_or_else(|| format!("expected sensor, native, analysis or WxH, got {custom:?}"))?;
            let width: u32 = w.parse().map_err(|_| format!("bad width in {custom:?}"))?;
            let height: u32 = h.parse().map_err(|_| format!("bad height in {custom:?}"))?;
            if width == 0 || height == 0 {
                return Err(format!("{custom} has a zero dimension"));
            }
            Ok(OutputSpace::Custom { width, height })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(list: &[&str]) -> Result<CliArgs, clap::Error> {
        CliArgs::try_parse_from(std::iter::once("scanwerk").chain(list.iter().copied()))
    }

    #[test]
    fn command_definition_is_consistent() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn defaults_to_sensor_space() {
        let parsed = parse(&["page.jpg"]).expect("parse");
        assert_eq!(parsed.space, OutputSpace::Sensor);
        assert_eq!(parsed.images, vec![PathBuf::from("page.jpg")]);
        assert!(!parsed.save_config);
    }

    #[test]
    fn parses_spaces_and_flags() {
        let parsed = parse(&["--save-config", "--space", "1080x1920", "a.png", "b.png"]).expect("parse");
        assert!(parsed.save_config);
        assert_eq!(parsed.space, OutputSpace::Custom { width: 1080, height: 1920 });
        assert_eq!(parsed.images.len(), 2);

        assert_eq!(parse(&["--space", "native", "a.png"]).expect("parse").space, OutputSpace::Native);
        assert_eq!(parse(&["--space=analysis", "a.png"]).expect("parse").space, OutputSpace::Analysis);
    }

    #[test]
    fn save_config_alone_is_enough() {
        assert!(parse(&["--save-config"]).is_ok());
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse(&["--space"]).is_err());
        assert!(parse(&["--space", "wide", "a.png"]).is_err());
        assert!(parse(&["--space", "0x10", "a.png"]).is_err());
        assert!(parse(&["--verbose", "a.png"]).is_err());
    }
}
