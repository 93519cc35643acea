use super::command::{
    AdjunctExpression, EngineCommand, ExportOptions, GuiAction, ImportOptions, PoolingMode,
    ScoringMethod, VERTICAL_AXIS,
};
use super::error::EngineError;
use crate::core::result::CommandResult;
use crate::core::transform::RigidTransform;
use std::path::Path;
use tracing::{debug, trace};

/// Executes catalog operations against one analysis-engine instance.
pub trait Engine {
    /// Runs one command and returns the engine's structured reply.
    ///
    /// # Errors
    ///
    /// An `Err` means the command could not be delivered or its reply could not be read.
    /// A delivered command that failed inside the engine is an `Ok` reply whose
    /// success flags are false.
    fn execute(&mut self, command: &EngineCommand) -> Result<CommandResult, EngineError>;
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn execute(&mut self, command: &EngineCommand) -> Result<CommandResult, EngineError> {
        (**self).execute(command)
    }
}

/// The loaded structures, selections and view state a pipeline operates on.
///
/// A session owns exactly one engine. Pipelines receive it by `&mut`, so two pipelines can
/// never interleave commands on the same scene; running pipelines concurrently means
/// creating one session per pipeline.
pub struct Session<E: Engine> {
    engine: E,
    last: Option<CommandResult>,
}

impl<E: Engine> Session<E> {
    pub fn new(engine: E) -> Self {
        Self { engine, last: None }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// The reply to the most recent command, if any command has run.
    pub fn last_output(&self) -> Option<&CommandResult> {
        self.last.as_ref()
    }

    /// Executes an arbitrary catalog command.
    pub fn run(&mut self, command: EngineCommand) -> Result<CommandResult, EngineError> {
        debug!(command = %command.to_command_line(), "Engine command");
        let result = self.engine.execute(&command)?;
        trace!(
            full_success = result.is_full_success(),
            partial_success = result.is_partial_success(),
            "Engine reply"
        );
        self.last = Some(result.clone());
        Ok(result)
    }

    pub fn import(&mut self, options: ImportOptions) -> Result<CommandResult, EngineError> {
        self.run(EngineCommand::Import(options))
    }

    pub fn export_atoms(&mut self, options: ExportOptions) -> Result<CommandResult, EngineError> {
        self.run(EngineCommand::ExportAtoms(options))
    }

    pub fn select_atoms(
        &mut self,
        object: &str,
        selection: &str,
    ) -> Result<CommandResult, EngineError> {
        self.run(EngineCommand::SelectAtoms {
            objects: Some(object.to_string()),
            selection: selection.to_string(),
        })
    }

    pub fn construct_contacts(&mut self) -> Result<CommandResult, EngineError> {
        self.run(EngineCommand::ConstructContacts)
    }

    pub fn compute_scores(&mut self, method: ScoringMethod) -> Result<CommandResult, EngineError> {
        self.run(EngineCommand::ComputeScores(method))
    }

    pub fn set_reference_sequence(
        &mut self,
        adjunct: &str,
        sequence_file: &Path,
        alignment_file: Option<&Path>,
    ) -> Result<CommandResult, EngineError> {
        self.run(EngineCommand::SetReferenceSequence {
            adjunct: adjunct.to_string(),
            sequence_file: sequence_file.to_path_buf(),
            alignment_file: alignment_file.map(Path::to_path_buf),
        })
    }

    pub fn renumber_by_adjunct(&mut self, adjunct: &str) -> Result<CommandResult, EngineError> {
        self.run(EngineCommand::RenumberByAdjunct {
            adjunct: adjunct.to_string(),
        })
    }

    pub fn pool_residue_adjunct(
        &mut self,
        source: &str,
        destination: &str,
        mode: PoolingMode,
        smoothing_window: u32,
    ) -> Result<CommandResult, EngineError> {
        self.run(EngineCommand::PoolResidueAdjunct {
            source: source.to_string(),
            destination: destination.to_string(),
            mode,
            smoothing_window,
        })
    }

    pub fn transform_adjunct(
        &mut self,
        expression: AdjunctExpression,
        input: &str,
        output: &str,
    ) -> Result<CommandResult, EngineError> {
        self.run(EngineCommand::TransformAdjunct {
            expression,
            inputs: vec![input.to_string()],
            output: output.to_string(),
        })
    }

    pub fn export_atom_adjuncts(
        &mut self,
        file: &Path,
        adjuncts: &[&str],
    ) -> Result<CommandResult, EngineError> {
        self.run(EngineCommand::ExportAtomAdjuncts {
            file: file.to_path_buf(),
            adjuncts: adjuncts.iter().map(|a| a.to_string()).collect(),
        })
    }

    pub fn rename_object(&mut self, from: &str, to: &str) -> Result<CommandResult, EngineError> {
        self.run(EngineCommand::RenameObject {
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    /// Lists the named objects, or every object when `names` is empty.
    pub fn list_objects(
        &mut self,
        names: &[&str],
        picked_only: bool,
    ) -> Result<CommandResult, EngineError> {
        self.run(EngineCommand::ListObjects {
            names: names.iter().map(|n| n.to_string()).collect(),
            picked_only,
        })
    }

    pub fn move_atoms(
        &mut self,
        object: &str,
        transform: RigidTransform,
    ) -> Result<CommandResult, EngineError> {
        self.run(EngineCommand::MoveAtoms {
            objects: object.to_string(),
            transform,
        })
    }

    pub fn zoom_by_atoms(
        &mut self,
        object: &str,
        selection: &str,
    ) -> Result<CommandResult, EngineError> {
        self.run(EngineCommand::ZoomByAtoms {
            objects: object.to_string(),
            selection: selection.to_string(),
        })
    }

    /// Rotates the view about the vertical screen axis.
    pub fn rotate(&mut self, angle_degrees: f64) -> Result<CommandResult, EngineError> {
        self.run(EngineCommand::Rotate {
            axis: VERTICAL_AXIS,
            angle_degrees,
        })
    }

    pub fn screenshot(&mut self, file: &Path) -> Result<CommandResult, EngineError> {
        self.run(EngineCommand::Screenshot {
            file: file.to_path_buf(),
        })
    }

    /// Deletes the named objects, or every object when `names` is empty.
    pub fn delete_objects(&mut self, names: &[&str]) -> Result<CommandResult, EngineError> {
        self.run(EngineCommand::DeleteObjects {
            names: names.iter().map(|n| n.to_string()).collect(),
        })
    }

    pub fn configure_gui(&mut self, action: GuiAction) -> Result<CommandResult, EngineError> {
        self.run(EngineCommand::ConfigureGui(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::ScriptedEngine;
    use serde_json::json;

    #[test]
    fn last_output_tracks_the_most_recent_reply() {
        let mut engine = ScriptedEngine::new();
        engine.respond(
            "list-objects",
            CommandResult::success(json!({"objects": [{"name": "a"}]})),
        );
        let mut session = Session::new(engine);
        assert!(session.last_output().is_none());

        session.list_objects(&[], false).unwrap();
        assert!(session.last_output().unwrap().first_output().is_some());

        session.construct_contacts().unwrap();
        assert_eq!(session.last_output().unwrap().first_output(), Some(&json!({})));
    }

    #[test]
    fn typed_methods_issue_the_matching_catalog_commands() {
        let mut session = Session::new(ScriptedEngine::new());

        session.rotate(15.0).unwrap();
        session.delete_objects(&[]).unwrap();
        session.rename_object("a", "b").unwrap();

        let engine = session.into_engine();
        assert_eq!(
            engine.command_lines(),
            vec![
                "rotate -axis 0 1 0 -angle 15".to_string(),
                "delete-objects".to_string(),
                "rename-object 'a' 'b'".to_string(),
            ]
        );
    }

    #[test]
    fn transport_errors_propagate_without_recording_a_reply() {
        let mut engine = ScriptedEngine::new();
        engine.fail_with("construct-contacts", "engine went away");
        let mut session = Session::new(engine);

        let err = session.construct_contacts().unwrap_err();

        assert!(matches!(err, EngineError::Terminated { .. }));
        assert!(session.last_output().is_none());
    }
}
