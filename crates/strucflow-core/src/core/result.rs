use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The two independent completion tiers reported by every engine call.
///
/// `full_success` means every sub-operation succeeded; `partial_success` means at least
/// one meaningful unit of work succeeded. They are deliberately separate flags: a file
/// import may be acceptable with some atoms skipped while a scoring step is not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsSummary {
    #[serde(default)]
    pub full_success: bool,
    #[serde(default)]
    pub partial_success: bool,
}

/// One per-sub-operation record of a [`CommandResult`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    /// Operation-specific payload (object lists, scores, sequence lengths, ...).
    #[serde(default)]
    pub output: Value,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// The structured reply of a single engine operation.
///
/// Created fresh by each engine call and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    #[serde(default)]
    pub results: Vec<CommandRecord>,
    #[serde(default)]
    pub results_summary: ResultsSummary,
}

impl CommandResult {
    /// A fully successful reply carrying a single output record.
    pub fn success(output: Value) -> Self {
        Self {
            results: vec![CommandRecord {
                output,
                errors: Vec::new(),
            }],
            results_summary: ResultsSummary {
                full_success: true,
                partial_success: true,
            },
        }
    }

    /// A reply where some, but not all, of the requested work succeeded.
    pub fn partial(output: Value, errors: Vec<String>) -> Self {
        Self {
            results: vec![CommandRecord { output, errors }],
            results_summary: ResultsSummary {
                full_success: false,
                partial_success: true,
            },
        }
    }

    /// A reply where nothing succeeded.
    pub fn failure(errors: Vec<String>) -> Self {
        Self {
            results: vec![CommandRecord {
                output: Value::Null,
                errors,
            }],
            results_summary: ResultsSummary::default(),
        }
    }

    pub fn is_full_success(&self) -> bool {
        self.results_summary.full_success
    }

    pub fn is_partial_success(&self) -> bool {
        self.results_summary.partial_success
    }

    pub fn first_output(&self) -> Option<&Value> {
        self.results.first().map(|r| &r.output)
    }

    /// Reads `key` from the first record's output and deserializes it.
    ///
    /// Returns `None` when the record, the key, or a compatible value is missing.
    pub fn output_field<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.first_output()?.get(key)?;
        serde_json::from_value(value.clone()).ok()
    }

    /// All error strings across every record, in order.
    pub fn errors(&self) -> Vec<&str> {
        self.results
            .iter()
            .flat_map(|r| r.errors.iter().map(String::as_str))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ObjectEntry {
    name: String,
}

/// Names from an object-listing reply (`output.objects[].name`).
pub fn object_names(result: &CommandResult) -> Vec<String> {
    result
        .output_field::<Vec<ObjectEntry>>("objects")
        .unwrap_or_default()
        .into_iter()
        .map(|o| o.name)
        .collect()
}
