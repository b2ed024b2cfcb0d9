use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use pn_reach::config::AnalysisConfig;
use pn_reach::net::io::load_net;
use pn_reach::optimize::Objective;
use pn_reach::options::Options;
use pn_reach::pipeline;

fn main() -> Result<()> {
    if std::env::var("PN_LOG").is_ok() {
        let e = env_logger::Env::new()
            .filter("PN_LOG")
            .write_style("PN_LOG_STYLE");
        env_logger::init_from_env(e);
    }

    let options = Options::parse_from_args(std::env::args_os())?;
    log::debug!("PN options: {:?}", options);

    let mut config = match &options.config {
        Some(path) => AnalysisConfig::load_from_file(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(image) = options.image {
        config.symbolic.image = image;
    }
    if let Some(dir) = &options.dot_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create DOT directory {:?}", dir))?;
    }

    let mut reports = Vec::with_capacity(options.models.len());
    for path in &options.models {
        let net = load_net(path).with_context(|| format!("Failed to load net {:?}", path))?;
        let model = model_name(path);
        let objective = options
            .objective
            .as_ref()
            .map(|weights| {
                Objective::from_names(&net, weights.iter().map(|(p, w)| (p.as_str(), *w)))
            })
            .transpose()
            .with_context(|| format!("Invalid objective for {}", model))?;

        let analysis = pipeline::analyze(&model, &net, &config, objective.as_ref());
        if let Some(dir) = &options.dot_dir {
            let dot_path = dir.join(format!("{}.dot", model));
            analysis
                .state_graph
                .write_dot(&net, &dot_path)
                .with_context(|| format!("Failed to write {:?}", dot_path))?;
        }
        println!("{}", analysis.report);
        reports.push(analysis.report);
    }

    let json = serde_json::to_string_pretty(&reports)?;
    fs::write(&options.output, json)
        .with_context(|| format!("Failed to write report {:?}", options.output))?;
    log::info!("report written to {:?}", options.output);
    Ok(())
}

fn model_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string())
}
