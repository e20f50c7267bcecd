mod error;

pub use error::MrpError;

use std::collections::HashMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

/// A model run as described by the Model Run Protocol: the user-supplied
/// input section, the files attached to the model and where output goes.
pub struct Environment<I = ()> {
    input_json: serde_json::Map<String, Value>,
    pub input: Option<I>,
    pub seed: u64,
    pub replicate: u64,
    pub files: HashMap<String, PathBuf>,
    output: Value,
}

impl Environment {
    pub fn from_json(data: Value) -> Self {
        let mut input_json = data
            .get("input")
            .and_then(|v| v.as_object())
            .cloned()
            .unwrap_or_default();

        let seed = input_json
            .remove("seed")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        let replicate = input_json
            .remove("replicate")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        let files = data
            .get("model")
            .and_then(|m| m.get("files"))
            .and_then(|f| f.as_object())
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), PathBuf::from(s))))
                    .collect()
            })
            .unwrap_or_default();

        let output = data.get("output").cloned().unwrap_or(Value::Null);

        Self {
            input_json,
            input: None,
            seed,
            replicate,
            files,
            output,
        }
    }

    pub fn from_stdin() -> Result<Self, MrpError> {
        Self::from_reader(io::stdin())
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, MrpError> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        if raw.trim().is_empty() {
            return Err(MrpError::EmptyInput);
        }
        let data: Value = serde_json::from_str(&raw)?;
        Ok(Self::from_json(data))
    }

    /// Same document layout as the JSON form, written as TOML tables.
    pub fn from_toml_str(raw: &str) -> Result<Self, MrpError> {
        let data: Value = toml::from_str(raw)?;
        Ok(Self::from_json(data))
    }

    pub fn from_path(path: &Path) -> Result<Self, MrpError> {
        let raw = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::from_json(serde_json::from_str(&raw)?)),
            Some("toml") => Self::from_toml_str(&raw),
            _ => Err(MrpError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    pub fn with_input_type<I: DeserializeOwned>(self) -> Result<Environment<I>, MrpError> {
        let input_value = Value::Object(self.input_json.clone());
        let input = serde_json::from_value(input_value).map_err(MrpError::Input)?;
        Ok(Environment {
            input_json: self.input_json,
            input: Some(input),
            seed: self.seed,
            replicate: self.replicate,
            files: self.files,
            output: self.output,
        })
    }
}

impl<I: DeserializeOwned> Environment<I> {
    pub fn load() -> Result<Self, MrpError> {
        Self::load_from(io::stdin())
    }

    pub fn load_from<R: Read>(reader: R) -> Result<Self, MrpError> {
        Environment::from_reader(reader)?.with_input_type::<I>()
    }
}

impl<I> Environment<I> {
    pub fn input_json(&self) -> &serde_json::Map<String, Value> {
        &self.input_json
    }

    /// Copies the numeric inputs named by `names` into `buffer`, in order.
    ///
    /// This is the host half of a model's parameter initializer: the model
    /// declares how many values it expects through the buffer length, and the
    /// return value is the number of values this environment supplied.
    pub fn fill_parameters(&self, names: &[&str], buffer: &mut [f64]) -> Result<usize, MrpError> {
        if names.len() != buffer.len() {
            return Err(MrpError::ParameterCount {
                expected: buffer.len(),
                found: names.len(),
            });
        }
        for (name, slot) in names.iter().zip(buffer.iter_mut()) {
            let value = self
                .input_json
                .get(*name)
                .ok_or_else(|| MrpError::MissingParameter(name.to_string()))?;
            *slot = value.as_f64().ok_or_else(|| MrpError::InvalidParameter {
                name: name.to_string(),
                value: value.to_string(),
            })?;
            debug!("parameter {name} = {slot}");
        }
        Ok(names.len())
    }

    /// SHA-256 of the input section, seed and replicate included.
    ///
    /// `serde_json::Map` keeps keys sorted, so equal inputs hash equally
    /// regardless of the order they were written in.
    pub fn input_digest(&self) -> String {
        let canonical = json!({
            "input": self.input_json,
            "seed": self.seed,
            "replicate": self.replicate,
        });
        hex::encode(Sha256::digest(canonical.to_string().as_bytes()))
    }

    pub fn output_dir(&self) -> Option<PathBuf> {
        let output = &self.output;

        // Check flat output
        if output.get("spec").and_then(|v| v.as_str()) == Some("filesystem") {
            if let Some(dir) = output.get("dir").and_then(|v| v.as_str()) {
                return Some(PathBuf::from(dir));
            }
            return None;
        }

        // Check profiled output, resolving the default profile
        if let Some(profiles) = output.get("profile").and_then(|v| v.as_object()) {
            let selected = profiles
                .get("default")
                .or_else(|| profiles.values().next());
            if let Some(profile) = selected
                && profile.get("spec").and_then(|v| v.as_str()) == Some("filesystem")
                && let Some(dir) = profile.get("dir").and_then(|v| v.as_str())
            {
                return Some(PathBuf::from(dir));
            }
        }

        None
    }

    pub fn write(&self, filename: &str, data: &[u8]) -> Result<(), MrpError> {
        if let Some(dir) = self.output_dir() {
            fs::create_dir_all(&dir)?;
            let path = dir.join(filename);
            fs::write(&path, data)?;
            info!("wrote {}", path.display());
        } else {
            io::stdout().write_all(data)?;
        }
        Ok(())
    }

    pub fn write_json<T: Serialize>(&self, filename: &str, value: &T) -> Result<(), MrpError> {
        let mut data = serde_json::to_vec_pretty(value)?;
        data.push(b'\n');
        self.write(filename, &data)
    }

    pub fn write_csv(
        &self,
        filename: &str,
        headers: &[&str],
        rows: &[Vec<String>],
    ) -> Result<(), MrpError> {
        if let Some(dir) = self.output_dir() {
            fs::create_dir_all(&dir)?;
            let path = dir.join(filename);
            let file = fs::File::create(&path)?;
            write_records(csv::Writer::from_writer(file), headers, rows)?;
            info!("wrote {} rows to {}", rows.len(), path.display());
        } else {
            write_records(csv::Writer::from_writer(io::stdout()), headers, rows)?;
        }
        Ok(())
    }
}

fn write_records<W: Write>(
    mut wtr: csv::Writer<W>,
    headers: &[&str],
    rows: &[Vec<String>],
) -> Result<(), MrpError> {
    wtr.write_record(headers)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}
