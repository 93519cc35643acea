use super::error::PipelineError;
use crate::core::assertions::{assert_full_success, assert_partial_success};
use crate::core::result::object_names;
use crate::engine::command::{ExportOptions, ImportOptions};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::session::{Engine, Session};
use crate::tools::Toolbox;
use crate::tools::invoker::{ToolRunner, is_nonempty_file};
use crate::tools::registry::Tool;
use tracing::{info, instrument, warn};

/// Replaces the side chains of `object` with ones rebuilt by Scwrl4.
///
/// The object is exported, rebuilt, deleted and re-imported under the same name, so any
/// adjuncts previously attached to its atoms are lost.
#[instrument(skip_all, name = "side_chain_workflow", fields(object = %object))]
pub fn rebuild_side_chains<E: Engine, R: ToolRunner>(
    session: &mut Session<E>,
    tools: &Toolbox<R>,
    object: &str,
) -> Result<(), PipelineError> {
    let program = tools.require(Tool::Scwrl)?;

    tools
        .scoped("strucflow-scwrl-", |ws| {
            let input = ws.file("input.pdb");
            let output = ws.file("output.pdb");

            let exported = session.export_atoms(ExportOptions::pdb(&input).on_object(object))?;
            assert_full_success(&exported, "Failed to export atoms")?;

            let command = tools
                .command(Tool::Scwrl)?
                .arg("-i")
                .arg(&input)
                .arg("-o")
                .arg(&output);
            let run = tools.run(&command)?;
            // Scwrl4 may exit non-zero after writing a usable structure.
            if !is_nonempty_file(&output) {
                return Err(PipelineError::tool_failure(
                    program,
                    format!("No rebuilt structure produced: {}", run.stderr.trim()),
                ));
            }
            if !run.success() {
                warn!(exit_status = ?run.exit_status, "{program} exited unsuccessfully but produced output.");
            }

            let deleted = session.delete_objects(&[object])?;
            assert_full_success(&deleted, "Failed to delete original object")?;
            let imported = session.import(ImportOptions::pdb(&output).title(object))?;
            assert_partial_success(&imported, "Failed to import rebuilt structure")?;
            Ok(())
        })
        .map_err(|e: PipelineError| e.with_context(program))?;

    info!("Side chains rebuilt.");
    Ok(())
}

/// Rebuilds side chains of every loaded object.
pub fn rebuild_side_chains_all<E: Engine, R: ToolRunner>(
    session: &mut Session<E>,
    tools: &Toolbox<R>,
    reporter: &ProgressReporter,
) -> Result<usize, PipelineError> {
    tools.require(Tool::Scwrl)?;

    let listed = session.list_objects(&[], false)?;
    assert_full_success(&listed, "No objects available")?;
    let names = object_names(&listed);

    reporter.report(Progress::TaskStart {
        total_steps: names.len() as u64,
    });
    for name in &names {
        rebuild_side_chains(session, tools, name)?;
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    Ok(names.len())
}
