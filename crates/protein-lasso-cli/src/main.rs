use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;
use std::str::FromStr;

use protein_lasso::ProbabilityReduction;
use protein_lasso_cli::commands::infer::{
    load_infer_config, prepare_problem, run_inference, write_infer_output, InferConfig,
};

fn relation_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("identifications")
                .help("Peptide identification table (*.tsv or *.csv)")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("detectability")
                .help("Peptide detectability table (*.tsv or *.csv)")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to a JSON inference configuration file")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("reduction")
                .short('r')
                .long("reduction")
                .help("How repeated peptide probabilities are combined. Overrides the config file.")
                .value_parser(["average", "max", "constant-one"])
                .value_hint(ValueHint::Other),
        )
}

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(
            env_logger::Env::default().filter_or("PROTEIN_LASSO_LOG", "error,protein_lasso=info"),
        )
        .init();

    let matches = Command::new("protein-lasso")
        .version(clap::crate_version!())
        .about("Protein inference from peptide evidence with L1-regularized coordinate descent")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            relation_args(Command::new("infer"))
                .about("Infer protein probabilities at a single penalty")
                .arg(
                    Arg::new("lambda")
                        .short('l')
                        .long("lambda")
                        .help("Absolute L1 penalty. Overrides the config file.")
                        .value_parser(clap::value_parser!(f64))
                        .conflicts_with("lambda_fraction"),
                )
                .arg(
                    Arg::new("lambda_fraction")
                        .long("lambda-fraction")
                        .help("Penalty as a fraction of lambda_max. Overrides the config file.")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("max_sweeps")
                        .long("max-sweeps")
                        .help("Maximum number of coordinate descent sweeps")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("unbounded")
                        .long("unbounded")
                        .help("Sweep until stable with no sweep cap")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("max_sweeps"),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output")
                        .help("Path to write the protein table (TSV or CSV). Defaults to stdout.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            relation_args(Command::new("lambda-max"))
                .about("Print the smallest penalty that zeroes every protein"),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("infer", sub_m)) => handle_infer(sub_m),
        Some(("lambda-max", sub_m)) => handle_lambda_max(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn load_config(matches: &ArgMatches) -> Result<InferConfig> {
    let mut config = if let Some(config_path) = matches.get_one::<PathBuf>("config") {
        log::info!("[ProteinLasso] Using config: {:?}", config_path);
        load_infer_config(config_path)?
    } else {
        let default_config = InferConfig::default();
        log::debug!(
            "[ProteinLasso] No config provided; using defaults:\n{}",
            serde_json::to_string_pretty(&default_config).unwrap_or_default()
        );
        default_config
    };

    if let Some(reduction) = matches.get_one::<String>("reduction") {
        config.inference.reduction =
            ProbabilityReduction::from_str(reduction).map_err(anyhow::Error::msg)?;
    }
    Ok(config)
}

fn handle_infer(matches: &ArgMatches) -> Result<()> {
    let ids: &PathBuf = matches.get_one("identifications").unwrap();
    let dets: &PathBuf = matches.get_one("detectability").unwrap();
    let output_path: Option<&PathBuf> = matches.get_one("output_file");

    let mut config = load_config(matches)?;
    if let Some(&lambda) = matches.get_one::<f64>("lambda") {
        config.lambda = Some(lambda);
        config.lambda_fraction = None;
    }
    if let Some(&fraction) = matches.get_one::<f64>("lambda_fraction") {
        config.lambda = None;
        config.lambda_fraction = Some(fraction);
    }
    if let Some(&max_sweeps) = matches.get_one::<usize>("max_sweeps") {
        config.inference.max_sweeps = Some(max_sweeps);
    }
    if matches.get_flag("unbounded") {
        config.inference.max_sweeps = None;
    }

    log::info!("[ProteinLasso] Inferring proteins from {:?} and {:?}", ids, dets);
    let result = match run_inference(ids, dets, &config) {
        Ok(result) => result,
        Err(e) => {
            log::error!("Inference failed: {:#}", e);
            std::process::exit(1)
        }
    };
    write_infer_output(&result, output_path.map(PathBuf::as_path))?;

    log::info!(
        "[ProteinLasso] Completed: {} proteins, {} with nonzero probability at lambda {} ({} sweeps)",
        result.proteins.len(),
        result.outcome.support_size(),
        result.outcome.lambda,
        result.outcome.sweeps
    );
    Ok(())
}

fn handle_lambda_max(matches: &ArgMatches) -> Result<()> {
    let ids: &PathBuf = matches.get_one("identifications").unwrap();
    let dets: &PathBuf = matches.get_one("detectability").unwrap();
    let config = load_config(matches)?;

    let problem = match prepare_problem(ids, dets, &config) {
        Ok(problem) => problem,
        Err(e) => {
            log::error!("Failed to prepare inference problem: {:#}", e);
            std::process::exit(1)
        }
    };
    println!("{}", problem.lambda_max());
    Ok(())
}
