use crate::core::transform::RigidTransform;
use std::path::{Path, PathBuf};

/// How per-residue values are pooled from per-atom adjuncts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolingMode {
    Min,
    Max,
    Mean,
}

impl PoolingMode {
    fn as_str(self) -> &'static str {
        match self {
            PoolingMode::Min => "min",
            PoolingMode::Max => "max",
            PoolingMode::Mean => "mean",
        }
    }
}

/// Global quality-scoring procedures offered by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoringMethod {
    /// Classic VoroMQA; optionally stores smoothed residue scores under a custom adjunct.
    VoromqaGlobal {
        residue_adjunct: Option<String>,
        smoothing_window: Option<u32>,
    },
    /// The neural-network variant; requires `VoromqaGlobal` to have run first.
    VoromqaDarkGlobal,
}

/// Element-wise expressions for deriving one atom adjunct from others.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdjunctExpression {
    /// A reversed sigmoid mapping raw quality scores to expected local distance errors.
    ReverseS { parameters: [f64; 5] },
}

impl AdjunctExpression {
    fn name(&self) -> &'static str {
        match self {
            AdjunctExpression::ReverseS { .. } => "_reverse_s",
        }
    }

    fn parameters(&self) -> &[f64] {
        match self {
            AdjunctExpression::ReverseS { parameters } => parameters,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuiAction {
    /// Saves the current GUI state on a stack.
    Push,
    /// Restores the most recently pushed GUI state.
    Pop,
    /// Hides interactive widgets so they do not appear in captured frames.
    DisableWidgets,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportOptions {
    pub file: PathBuf,
    pub format: Option<String>,
    pub title: Option<String>,
    pub as_assembly: bool,
    pub include_heteroatoms: bool,
}

impl ImportOptions {
    pub fn pdb(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            format: Some("pdb".to_string()),
            title: None,
            as_assembly: false,
            include_heteroatoms: false,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn as_assembly(mut self, as_assembly: bool) -> Self {
        self.as_assembly = as_assembly;
        self
    }

    pub fn include_heteroatoms(mut self, include: bool) -> Self {
        self.include_heteroatoms = include;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub file: PathBuf,
    pub objects: Option<String>,
    pub selection: Option<String>,
    /// Atom adjunct written into the PDB temperature-factor column.
    pub b_factor_adjunct: Option<String>,
}

impl ExportOptions {
    pub fn pdb(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            objects: None,
            selection: None,
            b_factor_adjunct: None,
        }
    }

    pub fn on_object(mut self, object: impl Into<String>) -> Self {
        self.objects = Some(object.into());
        self
    }

    pub fn selection(mut self, selection: impl Into<String>) -> Self {
        self.selection = Some(selection.into());
        self
    }

    pub fn b_factor(mut self, adjunct: impl Into<String>) -> Self {
        self.b_factor_adjunct = Some(adjunct.into());
        self
    }
}

/// One operation of the analysis engine's catalog.
///
/// Each variant renders to exactly one engine command line, so the set of operations the
/// pipelines can issue is fixed at compile time.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    Import(ImportOptions),
    ExportAtoms(ExportOptions),
    SelectAtoms {
        objects: Option<String>,
        selection: String,
    },
    ConstructContacts,
    ComputeScores(ScoringMethod),
    SetReferenceSequence {
        adjunct: String,
        sequence_file: PathBuf,
        alignment_file: Option<PathBuf>,
    },
    RenumberByAdjunct {
        adjunct: String,
    },
    PoolResidueAdjunct {
        source: String,
        destination: String,
        mode: PoolingMode,
        smoothing_window: u32,
    },
    TransformAdjunct {
        expression: AdjunctExpression,
        inputs: Vec<String>,
        output: String,
    },
    ExportAtomAdjuncts {
        file: PathBuf,
        adjuncts: Vec<String>,
    },
    RenameObject {
        from: String,
        to: String,
    },
    ListObjects {
        names: Vec<String>,
        picked_only: bool,
    },
    MoveAtoms {
        objects: String,
        transform: RigidTransform,
    },
    ZoomByAtoms {
        objects: String,
        selection: String,
    },
    Rotate {
        axis: [f64; 3],
        angle_degrees: f64,
    },
    Screenshot {
        file: PathBuf,
    },
    DeleteObjects {
        names: Vec<String>,
    },
    ConfigureGui(GuiAction),
}

/// Vertical screen axis, the default turntable axis.
pub const VERTICAL_AXIS: [f64; 3] = [0.0, 1.0, 0.0];

impl EngineCommand {
    /// The engine's hyphenated operation name.
    pub fn name(&self) -> &'static str {
        match self {
            EngineCommand::Import(_) => "import",
            EngineCommand::ExportAtoms(_) => "export-atoms",
            EngineCommand::SelectAtoms { .. } => "select-atoms",
            EngineCommand::ConstructContacts => "construct-contacts",
            EngineCommand::ComputeScores(ScoringMethod::VoromqaGlobal { .. }) => "voromqa-global",
            EngineCommand::ComputeScores(ScoringMethod::VoromqaDarkGlobal) => {
                "voromqa-dark-global"
            }
            EngineCommand::SetReferenceSequence { .. } => {
                "set-adjunct-of-atoms-by-sequence-alignment"
            }
            EngineCommand::RenumberByAdjunct { .. } => {
                "restrict-atoms-and-renumber-residues-by-adjunct"
            }
            EngineCommand::PoolResidueAdjunct { .. } => "set-adjunct-of-atoms-by-residue-pooling",
            EngineCommand::TransformAdjunct { .. } => "set-adjunct-of-atoms-by-expression",
            EngineCommand::ExportAtomAdjuncts { .. } => "export-adjuncts-of-atoms",
            EngineCommand::RenameObject { .. } => "rename-object",
            EngineCommand::ListObjects { .. } => "list-objects",
            EngineCommand::MoveAtoms { .. } => "move-atoms",
            EngineCommand::ZoomByAtoms { .. } => "zoom-by-atoms",
            EngineCommand::Rotate { .. } => "rotate",
            EngineCommand::Screenshot { .. } => "screenshot",
            EngineCommand::DeleteObjects { .. } => "delete-objects",
            EngineCommand::ConfigureGui(GuiAction::Push) => "configure-gui-push",
            EngineCommand::ConfigureGui(GuiAction::Pop) => "configure-gui-pop",
            EngineCommand::ConfigureGui(GuiAction::DisableWidgets) => {
                "configure-gui-disable-widgets"
            }
        }
    }

    /// Renders the command as a single engine command line.
    pub fn to_command_line(&self) -> String {
        let mut line = CommandLine::new(self.name());
        match self {
            EngineCommand::Import(opts) => {
                line.path("-file", &opts.file);
                line.opt_text("-format", opts.format.as_deref());
                line.opt_text("-title", opts.title.as_deref());
                line.flag_if("-as-assembly", opts.as_assembly);
                line.flag_if("-include-heteroatoms", opts.include_heteroatoms);
            }
            EngineCommand::ExportAtoms(opts) => {
                line.opt_text("-on-objects", opts.objects.as_deref());
                line.opt_text("-use", opts.selection.as_deref());
                line.flag("-as-pdb");
                line.opt_text("-pdb-b-factor", opts.b_factor_adjunct.as_deref());
                line.path("-file", &opts.file);
            }
            EngineCommand::SelectAtoms { objects, selection } => {
                line.opt_text("-on-objects", objects.as_deref());
                line.text("-use", selection);
            }
            EngineCommand::ConstructContacts
            | EngineCommand::ComputeScores(ScoringMethod::VoromqaDarkGlobal)
            | EngineCommand::ConfigureGui(_) => {}
            EngineCommand::ComputeScores(ScoringMethod::VoromqaGlobal {
                residue_adjunct,
                smoothing_window,
            }) => {
                line.opt_text("-adj-residue-quality", residue_adjunct.as_deref());
                if let Some(window) = smoothing_window {
                    line.numbers("-smoothing-window", &[f64::from(*window)]);
                }
            }
            EngineCommand::SetReferenceSequence {
                adjunct,
                sequence_file,
                alignment_file,
            } => {
                line.text("-name", adjunct);
                line.path("-sequence-file", sequence_file);
                if let Some(alignment) = alignment_file {
                    line.path("-alignment-file", alignment);
                }
            }
            EngineCommand::RenumberByAdjunct { adjunct } => {
                line.text("-name", adjunct);
            }
            EngineCommand::PoolResidueAdjunct {
                source,
                destination,
                mode,
                smoothing_window,
            } => {
                line.text("-source-name", source);
                line.text("-destination-name", destination);
                line.text("-pooling-mode", mode.as_str());
                line.numbers("-smoothing-window", &[f64::from(*smoothing_window)]);
            }
            EngineCommand::TransformAdjunct {
                expression,
                inputs,
                output,
            } => {
                line.text("-expression", expression.name());
                line.texts("-input-adjuncts", inputs);
                line.numbers("-parameters", expression.parameters());
                line.text("-output-adjunct", output);
            }
            EngineCommand::ExportAtomAdjuncts { file, adjuncts } => {
                line.path("-file", file);
                line.texts("-adjuncts", adjuncts);
                line.flag("-no-serial");
                line.flag("-no-name");
            }
            EngineCommand::RenameObject { from, to } => {
                line.positional(from);
                line.positional(to);
            }
            EngineCommand::ListObjects { names, picked_only } => {
                for name in names {
                    line.positional(name);
                }
                line.flag_if("-picked", *picked_only);
            }
            EngineCommand::MoveAtoms { objects, transform } => {
                line.text("-on-objects", objects);
                line.numbers("-rotate-by-matrix", &transform.rotation_row_major());
                line.numbers("-translate", &transform.translation_components());
            }
            EngineCommand::ZoomByAtoms { objects, selection } => {
                line.text("-on-objects", objects);
                line.text("-use", selection);
            }
            EngineCommand::Rotate {
                axis,
                angle_degrees,
            } => {
                line.numbers("-axis", axis);
                line.numbers("-angle", &[*angle_degrees]);
            }
            EngineCommand::Screenshot { file } => {
                line.path("-file", file);
            }
            EngineCommand::DeleteObjects { names } => {
                for name in names {
                    line.positional(name);
                }
            }
        }
        line.finish()
    }
}

/// Quotes a textual argument value: single quotes unless the value contains one, then
/// double quotes unless it contains one of those too.
///
/// Every value is quoted, so a path or title starting with `-` is never read as an option.
/// Option names are emitted by the catalog itself and never pass through here.
pub fn quote_argument(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{value}'")
    } else if !value.contains('"') {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}

struct CommandLine {
    buf: String,
}

impl CommandLine {
    fn new(name: &str) -> Self {
        Self {
            buf: name.to_string(),
        }
    }

    fn raw(&mut self, token: &str) {
        self.buf.push(' ');
        self.buf.push_str(token);
    }

    fn flag(&mut self, option: &str) {
        self.raw(option);
    }

    fn flag_if(&mut self, option: &str, enabled: bool) {
        if enabled {
            self.flag(option);
        }
    }

    fn positional(&mut self, value: &str) {
        let quoted = quote_argument(value);
        self.raw(&quoted);
    }

    fn text(&mut self, option: &str, value: &str) {
        self.raw(option);
        self.positional(value);
    }

    fn opt_text(&mut self, option: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.text(option, value);
        }
    }

    fn texts(&mut self, option: &str, values: &[String]) {
        self.raw(option);
        for value in values {
            self.positional(value);
        }
    }

    fn path(&mut self, option: &str, path: &Path) {
        self.text(option, &path.to_string_lossy());
    }

    fn numbers(&mut self, option: &str, values: &[f64]) {
        self.raw(option);
        for value in values {
            self.raw(&value.to_string());
        }
    }

    fn finish(self) -> String {
        self.buf
    }
}
