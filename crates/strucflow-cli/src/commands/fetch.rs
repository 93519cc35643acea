use super::{open_session, reporter, toolbox};
use crate::cli::FetchArgs;
use crate::config::AppConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use strucflow::core::assertions::assert_full_success;
use strucflow::engine::command::ExportOptions;
use strucflow::tools::registry::Tool;
use strucflow::workflows::error::PipelineError;
use strucflow::workflows::fetch::{FetchParams, fetch};
use tracing::info;

fn fetch_params(args: &FetchArgs) -> FetchParams {
    let params = FetchParams::new(&args.pdb_id).no_heteroatoms(args.no_heteroatoms);
    match args.assembly {
        Some(assembly) => params.assembly(assembly),
        None => params,
    }
}

pub fn run(args: FetchArgs, config: &AppConfig) -> Result<()> {
    let tools = toolbox(config);
    tools
        .preflight(&[Tool::Curl, Tool::Zcat])
        .map_err(PipelineError::from)?;

    let params = fetch_params(&args);
    let mut session = open_session(config)?;
    let progress_handler = CliProgressHandler::new();
    let reporter = reporter(&progress_handler);

    println!("Fetching {} from RCSB PDB...", args.pdb_id);
    let outcome = fetch(&mut session, &tools, &params, &reporter)?;
    info!(url = %outcome.url, object = %outcome.object_name, "Structure downloaded.");

    let exported = session
        .export_atoms(ExportOptions::pdb(&args.output).on_object(&outcome.object_name))
        .map_err(PipelineError::from)?;
    assert_full_success(&exported, "Failed to export fetched structure")
        .map_err(PipelineError::from)?;

    let source = match outcome.assembly {
        0 => "asymmetric unit".to_string(),
        n => format!("assembly {n}"),
    };
    println!(
        "✓ {} ({}) written to: {}",
        outcome.object_name,
        source,
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(assembly: Option<u32>, no_heteroatoms: bool) -> FetchArgs {
        FetchArgs {
            pdb_id: "1crn".to_string(),
            output: "1crn.pdb".into(),
            assembly,
            no_heteroatoms,
        }
    }

    #[test]
    fn assembly_is_only_pinned_when_given() {
        assert_eq!(fetch_params(&args(None, false)).assembly, None);
        assert_eq!(fetch_params(&args(Some(0), false)).assembly, Some(0));
    }

    #[test]
    fn heteroatom_flag_is_forwarded() {
        let params = fetch_params(&args(Some(2), true));
        assert!(params.no_heteroatoms);
        assert_eq!(params.pdb_id, "1crn");
    }
}
