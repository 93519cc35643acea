use super::error::PipelineError;
use crate::core::assertions::assert_partial_success;
use crate::core::utils::identifiers::PdbId;
use crate::engine::command::ImportOptions;
use crate::engine::progress::ProgressReporter;
use crate::engine::session::{Engine, Session};
use crate::tools::Toolbox;
use crate::tools::invoker::{ToolRunner, is_nonempty_file};
use crate::tools::registry::Tool;
use crate::workspace::Workspace;
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

pub const RCSB_DOWNLOAD_BASE: &str = "https://files.rcsb.org/download";

/// Assembly used when none is requested; `0` is the asymmetric unit.
pub const DEFAULT_ASSEMBLY: u32 = 1;

/// Download address of a gzipped PDB-format entry.
pub fn download_url(id: &PdbId, assembly: u32) -> String {
    if assembly == 0 {
        format!("{RCSB_DOWNLOAD_BASE}/{id}.pdb.gz")
    } else {
        format!("{RCSB_DOWNLOAD_BASE}/{id}.pdb{assembly}.gz")
    }
}

/// Engine object title for an entry: `<ID>` or `<ID>_as_<N>`.
pub fn object_title(id: &PdbId, assembly: u32) -> String {
    if assembly == 0 {
        id.to_string()
    } else {
        format!("{id}_as_{assembly}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchParams {
    pub pdb_id: String,
    /// Explicit assembly number. When `None`, assembly 1 is tried first and the asymmetric
    /// unit is used if it is unavailable.
    pub assembly: Option<u32>,
    pub no_heteroatoms: bool,
}

impl FetchParams {
    pub fn new(pdb_id: impl Into<String>) -> Self {
        Self {
            pdb_id: pdb_id.into(),
            assembly: None,
            no_heteroatoms: false,
        }
    }

    pub fn assembly(mut self, assembly: u32) -> Self {
        self.assembly = Some(assembly);
        self
    }

    pub fn no_heteroatoms(mut self, no_heteroatoms: bool) -> Self {
        self.no_heteroatoms = no_heteroatoms;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub object_name: String,
    pub assembly: u32,
    pub url: String,
}

/// Downloads and decompresses one entry into `ws`, returning the PDB file path on success.
fn download<R: ToolRunner>(
    tools: &Toolbox<R>,
    ws: &Workspace,
    id: &PdbId,
    assembly: u32,
) -> Result<Option<PathBuf>, PipelineError> {
    let url = download_url(id, assembly);
    let archive = ws.file(&format!("{id}_{assembly}.pdb.gz"));
    let structure = ws.file(&format!("{id}_{assembly}.pdb"));

    let curl = tools
        .command(Tool::Curl)?
        .args(["-s", "-f", "-L", "-o"])
        .arg(&archive)
        .arg(&url);
    let fetched = tools.run(&curl)?;
    if !fetched.success() || !is_nonempty_file(&archive) {
        debug!(%url, exit_status = ?fetched.exit_status, "Download failed.");
        return Ok(None);
    }

    let zcat = tools.command(Tool::Zcat)?.arg(&archive).stdout_to(&structure);
    let unpacked = tools.run(&zcat)?;
    if !unpacked.success() || !is_nonempty_file(&structure) {
        debug!(%url, stderr = %unpacked.stderr.trim(), "Decompression failed.");
        return Ok(None);
    }
    Ok(Some(structure))
}

/// Fetches a structure from the RCSB archive and imports it into the session.
#[instrument(skip_all, name = "fetch_workflow", fields(pdb_id = %params.pdb_id))]
pub fn fetch<E: Engine, R: ToolRunner>(
    session: &mut Session<E>,
    tools: &Toolbox<R>,
    params: &FetchParams,
    reporter: &ProgressReporter,
) -> Result<FetchOutcome, PipelineError> {
    let id: PdbId = params.pdb_id.parse()?;
    tools.preflight(&[Tool::Curl, Tool::Zcat])?;

    let requested = params.assembly.unwrap_or(DEFAULT_ASSEMBLY);
    let mut candidates = vec![requested];
    if params.assembly.is_none() && requested != 0 {
        candidates.push(0);
    }

    tools.scoped("strucflow-fetch-", |ws| {
        let mut downloaded = None;
        reporter.phase("Downloading", || -> Result<(), PipelineError> {
            for &assembly in &candidates {
                if let Some(path) = download(tools, ws, &id, assembly)? {
                    downloaded = Some((assembly, path));
                    break;
                }
                if params.assembly.is_none() && assembly != 0 {
                    warn!(assembly, "Assembly unavailable; falling back to the asymmetric unit.");
                }
            }
            Ok(())
        })?;
        let Some((assembly, path)) = downloaded else {
            return Err(PipelineError::tool_failure(
                tools.paths().get(Tool::Curl),
                "No data downloaded",
            ));
        };

        let title = object_title(&id, assembly);
        let imported = session.import(
            ImportOptions::pdb(&path)
                .title(&title)
                .as_assembly(assembly != 0)
                .include_heteroatoms(!params.no_heteroatoms),
        )?;
        assert_partial_success(&imported, "Failed to import PDB file")?;

        let object_name = imported
            .output_field::<String>("object_name")
            .unwrap_or(title);
        info!(object = %object_name, assembly, "Structure fetched.");
        Ok(FetchOutcome {
            object_name,
            assembly,
            url: download_url(&id, assembly),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::ScriptedEngine;
    use crate::tools::invoker::{ToolCommand, ToolOutput};
    use crate::tools::registry::ToolPaths;
    use crate::tools::testing::{ScriptedRunner, exit_ok, exit_with};
    use crate::workflows::error::ErrorKind;
    use std::path::Path;

    /// curl writes a placeholder archive unless the URL contains `missing`.
    fn archive(missing: &'static str) -> impl Fn(&ToolCommand) -> ToolOutput {
        move |cmd| {
            let url = cmd.args[5].to_string_lossy().into_owned();
            if url.contains(missing) {
                return exit_with(22, "The requested URL returned error: 404");
            }
            std::fs::write(Path::new(&cmd.args[4]), "gz").unwrap();
            exit_ok("")
        }
    }

    fn toolbox(runner: ScriptedRunner, root: &Path) -> Toolbox<ScriptedRunner> {
        Toolbox::new(runner, ToolPaths::default()).with_workspace_root(root)
    }

    #[test]
    fn urls_and_titles_follow_the_archive_layout() {
        let id: PdbId = "1crn".parse().unwrap();

        assert_eq!(
            download_url(&id, 0),
            "https://files.rcsb.org/download/1CRN.pdb.gz"
        );
        assert_eq!(
            download_url(&id, 2),
            "https://files.rcsb.org/download/1CRN.pdb2.gz"
        );
        assert_eq!(object_title(&id, 0), "1CRN");
        assert_eq!(object_title(&id, 2), "1CRN_as_2");
    }

    #[test]
    fn default_assembly_is_imported_as_an_assembly() {
        let root = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new()
            .on("curl", archive("never"))
            .on("zcat", |_| exit_ok("ATOM      1  N   THR A   1\n"));
        let tools = toolbox(runner, root.path());
        let mut session = Session::new(ScriptedEngine::new());

        let outcome = fetch(
            &mut session,
            &tools,
            &FetchParams::new("1crn"),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(outcome.assembly, 1);
        assert_eq!(outcome.object_name, "1CRN_as_1");
        let lines = session.engine().command_lines();
        let line = &lines[0];
        assert!(line.contains("-title '1CRN_as_1' -as-assembly -include-heteroatoms"));
        assert_eq!(tools.runner().programs(), vec!["curl", "zcat"]);
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_default_assembly_falls_back_to_the_asymmetric_unit() {
        let root = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new()
            .on("curl", archive(".pdb1.gz"))
            .on("zcat", |_| exit_ok("ATOM\n"));
        let tools = toolbox(runner, root.path());
        let mut session = Session::new(ScriptedEngine::new());
        let params = FetchParams::new("4hhb").no_heteroatoms(true);

        let outcome = fetch(&mut session, &tools, &params, &ProgressReporter::new()).unwrap();

        assert_eq!(outcome.assembly, 0);
        assert_eq!(outcome.url, "https://files.rcsb.org/download/4HHB.pdb.gz");
        let lines = session.engine().command_lines();
        let line = &lines[0];
        assert!(line.contains("-title '4HHB'"));
        assert!(!line.contains("-as-assembly"));
        assert!(!line.contains("-include-heteroatoms"));
    }

    #[test]
    fn explicit_assembly_never_falls_back() {
        let root = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new().on("curl", archive(".pdb"));
        let tools = toolbox(runner, root.path());
        let mut session = Session::new(ScriptedEngine::new());

        let err = fetch(
            &mut session,
            &tools,
            &FetchParams::new("1CRN").assembly(2),
            &ProgressReporter::new(),
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "No data downloaded");
        assert_eq!(err.kind(), ErrorKind::ToolFailure);
        assert_eq!(tools.runner().calls().len(), 1);
        assert!(session.engine().commands.is_empty());
    }

    #[test]
    fn empty_decompressed_output_counts_as_no_data() {
        let root = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new()
            .on("curl", archive("never"))
            .on("zcat", |_| exit_ok(""));
        let tools = toolbox(runner, root.path());
        let mut session = Session::new(ScriptedEngine::new());

        let err = fetch(
            &mut session,
            &tools,
            &FetchParams::new("1CRN").assembly(0),
            &ProgressReporter::new(),
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "No data downloaded");
    }

    #[test]
    fn invalid_identifier_and_missing_tools_fail_before_downloading() {
        let root = tempfile::tempdir().unwrap();
        let mut session = Session::new(ScriptedEngine::new());

        let tools = toolbox(ScriptedRunner::new(), root.path());
        let err = fetch(
            &mut session,
            &tools,
            &FetchParams::new("0ABC"),
            &ProgressReporter::new(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid PDB ID '0ABC'");
        assert!(tools.runner().calls().is_empty());

        let tools = toolbox(ScriptedRunner::with_available(&["curl"]), root.path());
        let err = fetch(
            &mut session,
            &tools,
            &FetchParams::new("1CRN"),
            &ProgressReporter::new(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert_eq!(err.to_string(), "No 'zcat' executable");
        assert!(tools.runner().calls().is_empty());
    }
}
