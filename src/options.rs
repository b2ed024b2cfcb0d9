//! Parsing Options.
//! `pn-reach [OPTIONS] <MODEL>...`, one report entry per model file.

use anyhow::{Context, Result, anyhow};
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;

use crate::analysis::symbolic::ImageStrategy;

fn make_options_parser() -> clap::Command {
    Command::new("pn-reach")
        .version("v0.1.0")
        .about("Reachability, deadlock and optimization analysis of 1-safe Petri nets")
        .arg(
            Arg::new("models")
                .value_name("MODEL")
                .help("Net descriptions (.json or .ron)")
                .required(true)
                .num_args(1..)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML file with analysis limits"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Path to file where the JSON report will be stored")
                .default_value("report.json"),
        )
        .arg(
            Arg::new("dot")
                .long("dot")
                .value_name("DIR")
                .help("Write each explicit reachability graph as DOT into DIR"),
        )
        .arg(
            Arg::new("objective")
                .long("objective")
                .value_name("PLACE=WEIGHT,...")
                .help("Objective weights; unnamed places weigh 0"),
        )
        .arg(
            Arg::new("image")
                .long("image")
                .help("Symbolic image computation")
                .value_parser(["semi-symbolic", "relational"]),
        )
}

#[derive(Debug, Default)]
pub struct Options {
    pub models: Vec<PathBuf>,
    pub config: Option<PathBuf>,
    pub output: PathBuf,
    pub dot_dir: Option<PathBuf>,
    pub objective: Option<Vec<(String, f64)>>,
    pub image: Option<ImageStrategy>,
}

impl Options {
    /// `args` starts with the binary name, as `std::env::args` does.
    pub fn parse_from_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = make_options_parser().try_get_matches_from(args)?;

        let models = matches
            .get_many::<String>("models")
            .map(|values| values.map(PathBuf::from).collect())
            .unwrap_or_default();
        let output = matches
            .get_one::<String>("output")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("report.json"));
        let objective = matches
            .get_one::<String>("objective")
            .map(|spec| parse_objective(spec))
            .transpose()?;
        let image = match matches.get_one::<String>("image").map(String::as_str) {
            Some("semi-symbolic") => Some(ImageStrategy::SemiSymbolic),
            Some("relational") => Some(ImageStrategy::Relational),
            Some(other) => return Err(anyhow!("unsupported image strategy `{}`", other)),
            None => None,
        };

        Ok(Options {
            models,
            config: matches.get_one::<String>("config").map(PathBuf::from),
            output,
            dot_dir: matches.get_one::<String>("dot").map(PathBuf::from),
            objective,
            image,
        })
    }
}

/// `p1=10,p2=2.5` into `[("p1", 10.0), ("p2", 2.5)]`.
fn parse_objective(spec: &str) -> Result<Vec<(String, f64)>> {
    spec.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (place, weight) = entry
                .split_once('=')
                .ok_or_else(|| anyhow!("objective entry `{}` is not PLACE=WEIGHT", entry))?;
            let weight = weight
                .trim()
                .parse::<f64>()
                .with_context(|| format!("bad weight in objective entry `{}`", entry))?;
            Ok((place.trim().to_string(), weight))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let options = Options::parse_from_args([
            "pn-reach",
            "-c",
            "limits.toml",
            "--objective",
            "c1=10, r1=2",
            "--image",
            "relational",
            "a.json",
            "b.ron",
        ])
        .unwrap();
        assert_eq!(options.models, vec![PathBuf::from("a.json"), PathBuf::from("b.ron")]);
        assert_eq!(options.config, Some(PathBuf::from("limits.toml")));
        assert_eq!(options.output, PathBuf::from("report.json"));
        assert_eq!(
            options.objective,
            Some(vec![("c1".to_string(), 10.0), ("r1".to_string(), 2.0)])
        );
        assert_eq!(options.image, Some(ImageStrategy::Relational));
    }

    #[test]
    fn test_parse_from_args_err() {
        assert!(Options::parse_from_args(["pn-reach"]).is_err());
        assert!(Options::parse_from_args(["pn-reach", "--image", "magic", "a.json"]).is_err());
        assert!(Options::parse_from_args(["pn-reach", "--objective", "p1:3", "a.json"]).is_err());
    }
}
